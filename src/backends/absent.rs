//! Stand-in reporter used when no analytics backend was detected.

use tracing::debug;

use crate::backends::traits::Reporter;
use crate::error::Result;
use crate::event::TrackedEvent;

/// Reporter that drops every event.
///
/// Bound by a tracker that found no backend, so pushes stay safe without
/// special-casing them.
#[derive(Debug, Clone, Copy, Default)]
pub struct AbsentReporter;

impl Reporter for AbsentReporter {
    fn report(&self, event: &TrackedEvent) -> Result<()> {
        debug!(%event, "no analytics backend bound, dropping event");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "none"
    }

    fn is_bound(&self) -> bool {
        false
    }
}
