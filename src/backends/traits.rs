//! Reporter trait for sitetrack.
//!
//! A reporter is the single capability the tracker needs from an analytics
//! backend: deliver one normalized `[category, action, label]` event.

use std::sync::Arc;

use crate::error::Result;
use crate::event::TrackedEvent;

/// Trait for analytics backends that receive tracked events.
///
/// Reporters are shared between a tracker and the listeners it registers,
/// so they must be thread-safe.
pub trait Reporter: Send + Sync {
    /// Deliver one event to the backend.
    fn report(&self, event: &TrackedEvent) -> Result<()>;

    /// Backend name for logging and CLI output.
    fn name(&self) -> &'static str;

    /// Whether a real backend sits behind this reporter.
    ///
    /// Only the absent reporter returns false.
    fn is_bound(&self) -> bool {
        true
    }
}

/// Blanket implementation for shared reporters.
impl<T: Reporter + ?Sized> Reporter for Arc<T> {
    fn report(&self, event: &TrackedEvent) -> Result<()> {
        (**self).report(event)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn is_bound(&self) -> bool {
        (**self).is_bound()
    }
}
