//! Replay command for sitetrack.
//!
//! Feeds recorded DOM events (one JSON object per line) through a tracker
//! built from the loaded configuration and reports what reached the
//! analytics backend.

use std::io::BufRead;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::backends::{AnalyticsGlobals, CommandQueue, SendFn};
use crate::config::Config;
use crate::dom::{DocumentBody, DomEvent, EventSource};
use crate::error::Result;
use crate::tracker::{Tracker, TrackerOptions};

/// Options for the replay command.
#[derive(Debug, Clone, Default)]
pub struct ReplayOptions {
    /// Define the callable event sender global.
    pub ga: bool,
    /// Define the legacy command queue global.
    pub gaq: bool,
    /// Register the `.js-track` click watcher regardless of config.
    pub track_links: bool,
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Output format for the replay command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayOutput {
    /// Whether the command was successful.
    pub success: bool,
    /// The backend the tracker bound.
    pub backend: String,
    /// Page name the tracker reported under.
    pub page_name: String,
    /// Site name the tracker reported under.
    pub site_name: String,
    /// Events read from the input.
    pub events: usize,
    /// Listener invocations across all events.
    pub fired: usize,
    /// Input lines that were not valid events.
    pub invalid: usize,
    /// Argument lists delivered to the backend, in order.
    pub reported: Vec<Vec<String>>,
    /// Error message if command failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReplayOutput {
    /// Create a failed output.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            backend: "none".to_string(),
            page_name: String::new(),
            site_name: String::new(),
            events: 0,
            fired: 0,
            invalid: 0,
            reported: Vec::new(),
            error: Some(error.into()),
        }
    }

    /// Whether a backend was bound.
    pub fn is_bound(&self) -> bool {
        self.backend != "none"
    }
}

/// The replay command implementation.
pub struct ReplayCommand {
    config: Config,
}

impl ReplayCommand {
    /// Create a new replay command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run the replay command over `input`.
    pub fn run(&self, input: impl BufRead, options: &ReplayOptions) -> ReplayOutput {
        let sent: Arc<Mutex<Vec<Vec<String>>>> = Arc::new(Mutex::new(Vec::new()));
        let queue = CommandQueue::new();

        let mut globals = AnalyticsGlobals::empty();
        if options.ga {
            let sink = sent.clone();
            let sender: SendFn = Arc::new(move |args: &[String]| -> Result<()> {
                if let Ok(mut calls) = sink.lock() {
                    calls.push(args.to_vec());
                }
                Ok(())
            });
            globals = globals.with_ga(sender);
        }
        if options.gaq {
            globals = globals.with_gaq(queue.clone());
        }

        let tracker_options = match TrackerOptions::from_config(&self.config) {
            Ok(o) => o,
            Err(e) => return ReplayOutput::failure(e.to_string()),
        };

        let body = DocumentBody::shared();
        let tracker = match Tracker::new(tracker_options, &globals, body.clone()) {
            Ok(t) => t,
            Err(e) => return ReplayOutput::failure(e.to_string()),
        };

        if options.track_links || self.config.tracker.track_links {
            if let Err(e) = tracker.track_links() {
                return ReplayOutput::failure(e.to_string());
            }
        }

        let mut events = 0;
        let mut fired = 0;
        let mut invalid = 0;

        for (index, line) in input.lines().enumerate() {
            let line = match line {
                Ok(line) => line,
                Err(e) => return ReplayOutput::failure(format!("reading input: {e}")),
            };
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<DomEvent>(&line) {
                Ok(event) => {
                    events += 1;
                    fired += body.dispatch(&event);
                }
                Err(e) => {
                    warn!(line = index + 1, error = %e, "skipping invalid event");
                    invalid += 1;
                }
            }
        }

        let mut reported = sent.lock().map(|calls| calls.clone()).unwrap_or_default();
        reported.extend(queue.snapshot());

        ReplayOutput {
            success: true,
            backend: tracker.backend_name().to_string(),
            page_name: tracker.page_name().to_string(),
            site_name: tracker.site_name().to_string(),
            events,
            fired,
            invalid,
            reported,
            error: None,
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &ReplayOutput, options: &ReplayOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    fn format_human_readable(&self, output: &ReplayOutput) -> String {
        if let Some(ref error) = output.error {
            return format!("Replay failed: {}", error);
        }

        let mut lines = Vec::new();
        lines.push(format!(
            "Replayed {} event(s) on {}/{} ({} listener call(s), {} invalid line(s))",
            output.events, output.site_name, output.page_name, output.fired, output.invalid
        ));

        if !output.is_bound() {
            lines.push("No analytics backend bound; nothing was reported.".to_string());
            return lines.join("\n");
        }

        lines.push(format!("Backend: {}", output.backend));
        if output.reported.is_empty() {
            lines.push("  (no events reported)".to_string());
        }
        for args in &output.reported {
            lines.push(format!("  {}", args.join(" ")));
        }

        lines.join("\n")
    }
}
