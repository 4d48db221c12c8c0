//! Command-style analytics backend.
//!
//! The modern analytics global is a single callable taking a command verb,
//! a hit type and the hit fields. The reporter binds the leading
//! `"send", "event"` arguments once so each report appends only the triple.

use std::fmt;
use std::sync::Arc;

use crate::backends::traits::Reporter;
use crate::error::Result;
use crate::event::TrackedEvent;

/// Leading arguments bound in front of every event.
pub const SEND_EVENT: [&str; 2] = ["send", "event"];

/// The callable analytics global. Receives the full positional argument list.
pub type SendFn = Arc<dyn Fn(&[String]) -> Result<()> + Send + Sync>;

/// Reporter over a callable analytics global.
#[derive(Clone)]
pub struct CommandReporter {
    sender: SendFn,
    leading: Vec<String>,
}

impl CommandReporter {
    /// Bind `sender` with the `"send", "event"` leading arguments.
    pub fn new(sender: SendFn) -> Self {
        Self::with_leading(sender, &SEND_EVENT)
    }

    /// Bind `sender` with custom leading arguments.
    pub fn with_leading(sender: SendFn, leading: &[&str]) -> Self {
        Self {
            sender,
            leading: leading.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// The bound leading arguments.
    pub fn leading(&self) -> &[String] {
        &self.leading
    }
}

impl fmt::Debug for CommandReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandReporter")
            .field("leading", &self.leading)
            .finish_non_exhaustive()
    }
}

impl Reporter for CommandReporter {
    fn report(&self, event: &TrackedEvent) -> Result<()> {
        let mut args = self.leading.clone();
        args.extend(event.args().iter().map(|s| s.to_string()));
        (self.sender)(&args)
    }

    fn name(&self) -> &'static str {
        "ga"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrackError;
    use std::sync::Mutex;

    fn recording_sender() -> (SendFn, Arc<Mutex<Vec<Vec<String>>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = calls.clone();
        let sender: SendFn = Arc::new(move |args: &[String]| -> Result<()> {
            sink.lock().unwrap().push(args.to_vec());
            Ok(())
        });
        (sender, calls)
    }

    #[test]
    fn test_report_prepends_send_event() {
        let (sender, calls) = recording_sender();
        let reporter = CommandReporter::new(sender);

        reporter
            .report(&TrackedEvent::new("docs", "click", "intro"))
            .unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], vec!["send", "event", "docs", "click", "intro"]);
    }

    #[test]
    fn test_custom_leading_arguments() {
        let (sender, calls) = recording_sender();
        let reporter = CommandReporter::with_leading(sender, &["tracker2.send", "event"]);
        assert_eq!(reporter.leading(), ["tracker2.send", "event"]);

        reporter.report(&TrackedEvent::new("c", "a", "l")).unwrap();
        assert_eq!(calls.lock().unwrap()[0][0], "tracker2.send");
    }

    #[test]
    fn test_sender_error_propagates() {
        let sender: SendFn = Arc::new(|_args: &[String]| -> Result<()> {
            Err(TrackError::backend("offline"))
        });
        let reporter = CommandReporter::new(sender);

        let err = reporter
            .report(&TrackedEvent::new("c", "a", "l"))
            .unwrap_err();
        assert!(err.to_string().contains("offline"));
    }

    #[test]
    fn test_name() {
        let (sender, _) = recording_sender();
        let reporter = CommandReporter::new(sender);
        assert_eq!(reporter.name(), "ga");
        assert!(reporter.is_bound());
    }
}
