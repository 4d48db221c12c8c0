//! sitetrack - analytics event tracking for static sites
//!
//! A [`Tracker`] binds to whichever analytics backend the page provides,
//! turns delegated DOM events into `[category, action, label]` events through
//! watch declarations, and reports them through a single push path.

pub mod backends;
pub mod cli;
pub mod config;
pub mod dom;
pub mod error;
pub mod event;
pub mod extract;
pub mod tracker;

pub use backends::{
    detect_reporter, AbsentReporter, AnalyticsGlobals, BackendType, CommandQueue,
    CommandReporter, QueueReporter, Reporter, SendFn,
};
pub use config::Config;
pub use dom::{DocumentBody, DomEvent, Element, EventSource, Listener, Selector};
pub use error::{FailOpen, Result, TrackError};
pub use event::{clean_value, EventPayload, TrackedEvent};
pub use extract::Extractor;
pub use tracker::{Tracker, TrackerOptions, WatchDeclaration};

// CLI commands
pub use cli::{BackendsCommand, CleanValueCommand, ReplayCommand};
