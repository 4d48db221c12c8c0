//! Analytics backend detection.
//!
//! The page exposes at most two analytics globals: a callable event sender
//! (`ga`) and a legacy command queue (`_gaq`). Detection probes them in the
//! configured order and binds the first one present. The default order
//! prefers the callable sender.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::backends::command::{CommandReporter, SendFn};
use crate::backends::queue::{CommandQueue, QueueReporter};
use crate::backends::traits::Reporter;
use crate::config::BackendsConfig;

/// Backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendType {
    /// Callable event sender.
    Ga,
    /// Legacy command queue.
    Gaq,
}

impl BackendType {
    /// Get the backend name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ga => "ga",
            Self::Gaq => "gaq",
        }
    }

    /// Parse a backend name from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "ga" | "analytics" | "command" => Some(Self::Ga),
            "gaq" | "_gaq" | "queue" | "legacy" => Some(Self::Gaq),
            _ => None,
        }
    }
}

impl fmt::Display for BackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The analytics globals visible to a page.
#[derive(Clone, Default)]
pub struct AnalyticsGlobals {
    /// The callable event sender, if defined.
    pub ga: Option<SendFn>,
    /// The legacy command queue, if defined.
    pub gaq: Option<CommandQueue>,
}

impl AnalyticsGlobals {
    /// A page with no analytics globals.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Define the callable event sender.
    pub fn with_ga(mut self, sender: SendFn) -> Self {
        self.ga = Some(sender);
        self
    }

    /// Define the legacy command queue.
    pub fn with_gaq(mut self, queue: CommandQueue) -> Self {
        self.gaq = Some(queue);
        self
    }

    /// Check whether a global of the given type is defined.
    pub fn has(&self, backend_type: BackendType) -> bool {
        match backend_type {
            BackendType::Ga => self.ga.is_some(),
            BackendType::Gaq => self.gaq.is_some(),
        }
    }

    /// Types of every defined global.
    pub fn present(&self) -> Vec<BackendType> {
        [BackendType::Ga, BackendType::Gaq]
            .into_iter()
            .filter(|t| self.has(*t))
            .collect()
    }
}

impl fmt::Debug for AnalyticsGlobals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyticsGlobals")
            .field("ga", &self.ga.is_some())
            .field("gaq", &self.gaq)
            .finish()
    }
}

/// Select the backend type detection would bind, without binding it.
pub fn select_backend(globals: &AnalyticsGlobals, config: &BackendsConfig) -> Option<BackendType> {
    for backend_name in &config.discovery {
        if let Some(false) = config.overrides.get(backend_name) {
            continue;
        }

        let Some(backend_type) = BackendType::parse(backend_name) else {
            tracing::warn!(backend = %backend_name, "unknown analytics backend in discovery list");
            continue;
        };

        if globals.has(backend_type) {
            return Some(backend_type);
        }
    }

    None
}

/// Detect the analytics backend and bind a reporter to it.
///
/// Returns `None` when no configured backend is present.
pub fn detect_reporter(
    globals: &AnalyticsGlobals,
    config: &BackendsConfig,
) -> Option<Arc<dyn Reporter>> {
    let reporter: Arc<dyn Reporter> = match select_backend(globals, config)? {
        BackendType::Ga => Arc::new(CommandReporter::new(globals.ga.clone()?)),
        BackendType::Gaq => Arc::new(QueueReporter::new(globals.gaq.clone()?)),
    };
    Some(reporter)
}
