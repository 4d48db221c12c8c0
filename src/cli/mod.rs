//! CLI commands for sitetrack.
//!
//! - **replay**: dispatch recorded DOM events through a tracker
//! - **clean-value**: normalize a label the way the tracker does
//! - **backends**: show which analytics backend detection selects

pub mod backends_cmd;
pub mod clean_value;
pub mod replay;

pub use backends_cmd::BackendsCommand;
pub use clean_value::CleanValueCommand;
pub use replay::ReplayCommand;
