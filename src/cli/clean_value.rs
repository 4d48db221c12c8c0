//! Clean-value command for sitetrack.
//!
//! Prints the token a string normalizes to, so labels can be checked
//! before they are written into markup.

use serde::{Deserialize, Serialize};

use crate::event::clean_value;

/// Options for the clean-value command.
#[derive(Debug, Clone, Default)]
pub struct CleanValueOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Output format for the clean-value command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CleanValueOutput {
    /// The input string.
    pub input: String,
    /// The normalized token.
    pub value: String,
}

/// The clean-value command implementation.
#[derive(Debug, Default)]
pub struct CleanValueCommand;

impl CleanValueCommand {
    /// Create a new clean-value command.
    pub fn new() -> Self {
        Self
    }

    /// Run the clean-value command.
    pub fn run(&self, input: &str) -> CleanValueOutput {
        CleanValueOutput {
            input: input.to_string(),
            value: clean_value(input),
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &CleanValueOutput, options: &CleanValueOptions) -> String {
        if options.quiet {
            String::new()
        } else if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            output.value.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_value_command() {
        let cmd = CleanValueCommand::new();
        let output = cmd.run("Get Started!");
        assert_eq!(output.value, "get_started_");
        assert_eq!(
            cmd.format_output(&output, &CleanValueOptions::default()),
            "get_started_"
        );
    }

    #[test]
    fn test_clean_value_json() {
        let cmd = CleanValueCommand::new();
        let output = cmd.run("A--B  C");
        let json = cmd.format_output(
            &output,
            &CleanValueOptions {
                json: true,
                quiet: false,
            },
        );
        let parsed: CleanValueOutput = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, output);
        assert_eq!(parsed.value, "a_b_c");
    }
}
