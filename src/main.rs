//! sitetrack - analytics event tracking for static sites
//!
//! CLI entry point.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sitetrack::cli::backends_cmd::{BackendsOptions, BackendsOutput};
use sitetrack::cli::clean_value::CleanValueOptions;
use sitetrack::cli::replay::{ReplayOptions, ReplayOutput};
use sitetrack::error::exit_codes;
use sitetrack::{BackendsCommand, CleanValueCommand, Config, ReplayCommand, TrackError};

// =============================================================================
// CLI Definition
// =============================================================================

/// sitetrack - analytics event tracking for static sites
#[derive(Parser)]
#[command(name = "sitetrack")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay recorded DOM events (JSON lines) through a tracker
    Replay {
        /// Event file; reads stdin when omitted
        file: Option<PathBuf>,
        /// Define the callable event sender global
        #[arg(long)]
        ga: bool,
        /// Define the legacy command queue global
        #[arg(long)]
        gaq: bool,
        /// Track clicks on .js-track elements
        #[arg(long)]
        track_links: bool,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Normalize a value into a lowercase token
    CleanValue {
        /// The value to normalize
        value: String,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Show which analytics backend would be detected
    Backends {
        /// Define the callable event sender global
        #[arg(long)]
        ga: bool,
        /// Define the legacy command queue global
        #[arg(long)]
        gaq: bool,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },
}

// =============================================================================
// Main Entry Point
// =============================================================================

fn main() -> ExitCode {
    init_logging();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("sitetrack error: {}", e);
            ExitCode::from(exit_codes::ERROR as u8)
        }
    }
}

/// Log to stderr, filtered by `SITETRACK_LOG` (default `warn`).
fn init_logging() {
    let filter = EnvFilter::try_from_env("SITETRACK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Run the CLI and return the exit code.
fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Replay {
            file,
            ga,
            gaq,
            track_links,
            json,
            quiet,
        } => {
            let options = ReplayOptions {
                ga,
                gaq,
                track_links,
                json,
                quiet,
            };
            run_replay(file, &options)
        }
        Commands::CleanValue { value, json, quiet } => {
            run_clean_value(&value, &CleanValueOptions { json, quiet })
        }
        Commands::Backends {
            ga,
            gaq,
            json,
            quiet,
        } => run_backends(&BackendsOptions {
            ga,
            gaq,
            json,
            quiet,
        }),
    }
}

// =============================================================================
// Command Implementations
// =============================================================================

fn print_nonempty(formatted: &str) {
    if !formatted.is_empty() {
        println!("{}", formatted);
    }
}

fn run_replay(
    file: Option<PathBuf>,
    options: &ReplayOptions,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cmd = ReplayCommand::new(Config::load());

    let output = match file {
        Some(path) => {
            let reader = File::open(&path).map_err(|e| TrackError::storage(&path, e))?;
            cmd.run(BufReader::new(reader), options)
        }
        None => cmd.run(io::stdin().lock(), options),
    };
    print_nonempty(&cmd.format_output(&output, options));

    Ok(ExitCode::from(replay_exit_code(&output) as u8))
}

fn replay_exit_code(output: &ReplayOutput) -> i32 {
    if !output.success {
        exit_codes::ERROR
    } else if !output.is_bound() {
        exit_codes::NO_BACKEND
    } else {
        exit_codes::SUCCESS
    }
}

fn run_clean_value(
    value: &str,
    options: &CleanValueOptions,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cmd = CleanValueCommand::new();
    let output = cmd.run(value);
    print_nonempty(&cmd.format_output(&output, options));
    Ok(ExitCode::from(exit_codes::SUCCESS as u8))
}

fn run_backends(options: &BackendsOptions) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cmd = BackendsCommand::new(Config::load());
    let output = cmd.run(options);
    print_nonempty(&cmd.format_output(&output, options));

    Ok(ExitCode::from(backends_exit_code(&output) as u8))
}

fn backends_exit_code(output: &BackendsOutput) -> i32 {
    if output.active.is_some() {
        exit_codes::SUCCESS
    } else {
        exit_codes::NO_BACKEND
    }
}

// =============================================================================
// Tests
// =============================================================================
