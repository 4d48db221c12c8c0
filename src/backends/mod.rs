//! Analytics backends for sitetrack.
//!
//! This module provides the reporter trait, its implementations and the
//! detection that picks one at tracker construction.
//!
//! Available backends:
//! - **ga**: callable event sender, bound with `"send", "event"`
//! - **gaq**: legacy command queue, events tagged `"_trackEvent"`
//! - **none**: stand-in when neither global is present

pub mod absent;
pub mod command;
pub mod detect;
pub mod queue;
pub mod traits;

pub use absent::AbsentReporter;
pub use command::{CommandReporter, SendFn, SEND_EVENT};
pub use detect::{detect_reporter, select_backend, AnalyticsGlobals, BackendType};
pub use queue::{CommandQueue, QueueReporter, TRACK_EVENT};
pub use traits::Reporter;
