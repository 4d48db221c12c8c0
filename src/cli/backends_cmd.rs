//! Backends command for sitetrack.
//!
//! Shows which analytics backend detection would bind for a given set of
//! page globals.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::backends::{select_backend, AnalyticsGlobals, BackendType, CommandQueue, SendFn};
use crate::config::Config;
use crate::error::Result;

/// Options for the backends command.
#[derive(Debug, Clone, Default)]
pub struct BackendsOptions {
    /// Define the callable event sender global.
    pub ga: bool,
    /// Define the legacy command queue global.
    pub gaq: bool,
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Output format for the backends command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendsOutput {
    /// Whether the command was successful.
    pub success: bool,
    /// Backends in probe order.
    pub backends: Vec<BackendDetail>,
    /// The backend detection selects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<String>,
}

/// Detail for one entry of the discovery list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendDetail {
    /// Name as written in the discovery list.
    pub name: String,
    /// Whether the name is a known backend.
    pub known: bool,
    /// Whether overrides leave it enabled.
    pub enabled: bool,
    /// Whether its global is defined.
    pub present: bool,
    /// Whether detection selects it.
    pub is_primary: bool,
}

/// The backends command implementation.
pub struct BackendsCommand {
    config: Config,
}

impl BackendsCommand {
    /// Create a new backends command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run the backends command.
    pub fn run(&self, options: &BackendsOptions) -> BackendsOutput {
        let mut globals = AnalyticsGlobals::empty();
        if options.ga {
            let sender: SendFn = Arc::new(|_args: &[String]| -> Result<()> { Ok(()) });
            globals = globals.with_ga(sender);
        }
        if options.gaq {
            globals = globals.with_gaq(CommandQueue::new());
        }

        let backends_config = &self.config.backends;
        let active = select_backend(&globals, backends_config);

        let backends = backends_config
            .discovery
            .iter()
            .map(|name| {
                let backend_type = BackendType::parse(name);
                BackendDetail {
                    name: name.clone(),
                    known: backend_type.is_some(),
                    enabled: backends_config.overrides.get(name) != Some(&false),
                    present: backend_type.is_some_and(|t| globals.has(t)),
                    is_primary: backend_type.is_some() && backend_type == active,
                }
            })
            .collect();

        BackendsOutput {
            success: true,
            backends,
            active: active.map(|t| t.as_str().to_string()),
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &BackendsOutput, options: &BackendsOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    fn format_human_readable(&self, output: &BackendsOutput) -> String {
        let mut lines = vec!["Analytics backends (probe order):".to_string()];

        for backend in &output.backends {
            let status = if !backend.known {
                "unknown"
            } else if !backend.enabled {
                "disabled"
            } else if backend.present {
                "present"
            } else {
                "absent"
            };
            let marker = if backend.is_primary { " (active)" } else { "" };
            lines.push(format!("  {} - {}{}", backend.name, status, marker));
        }

        match output.active {
            Some(ref active) => lines.push(format!("Active backend: {}", active)),
            None => lines.push("No analytics backend found.".to_string()),
        }

        lines.join("\n")
    }
}
