//! Event payloads and the normalized event triple sent to reporters.
//!
//! A payload is what an extractor produces from a DOM event. Every field is
//! optional, and each of category/action/label has a `ga`-prefixed alias
//! (the name the data attributes use on tracked links). A payload resolves to
//! a [`TrackedEvent`] before it reaches a reporter.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Category used when a payload provides neither `category` nor `gaCategory`.
pub const DEFAULT_CATEGORY: &str = "category";

/// Action used when a payload provides neither `action` nor `gaAction`.
pub const DEFAULT_ACTION: &str = "action";

/// Label used when a payload provides neither `label` nor `gaLabel`.
pub const DEFAULT_LABEL: &str = "label";

/// Event data produced by an extractor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EventPayload {
    pub category: Option<String>,
    pub ga_category: Option<String>,
    pub action: Option<String>,
    pub ga_action: Option<String>,
    pub label: Option<String>,
    pub ga_label: Option<String>,
}

impl EventPayload {
    /// Create an empty payload (every field resolves to its default).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the category.
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set the action.
    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Set the label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Build a payload from an element's dataset.
    ///
    /// Keys are the camel-cased attribute names (`data-ga-category` is
    /// `gaCategory`). Unrelated keys are ignored.
    pub fn from_dataset(dataset: &BTreeMap<String, String>) -> Self {
        let get = |key: &str| dataset.get(key).cloned();
        Self {
            category: get("category"),
            ga_category: get("gaCategory"),
            action: get("action"),
            ga_action: get("gaAction"),
            label: get("label"),
            ga_label: get("gaLabel"),
        }
    }

    /// Resolve the payload into the ordered triple a reporter receives.
    ///
    /// Each field falls back to its `ga` alias, then to the literal default.
    /// Empty strings count as missing.
    pub fn resolve(&self) -> TrackedEvent {
        TrackedEvent {
            category: pick(&self.category, &self.ga_category, DEFAULT_CATEGORY),
            action: pick(&self.action, &self.ga_action, DEFAULT_ACTION),
            label: pick(&self.label, &self.ga_label, DEFAULT_LABEL),
        }
    }
}

fn pick(primary: &Option<String>, alias: &Option<String>, default: &str) -> String {
    [primary, alias]
        .into_iter()
        .flatten()
        .find(|value| !value.is_empty())
        .cloned()
        .unwrap_or_else(|| default.to_string())
}

/// A normalized analytics event: `[category, action, label]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedEvent {
    pub category: String,
    pub action: String,
    pub label: String,
}

impl TrackedEvent {
    /// Create an event from its three parts.
    pub fn new(
        category: impl Into<String>,
        action: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            action: action.into(),
            label: label.into(),
        }
    }

    /// The positional arguments, in reporting order.
    pub fn args(&self) -> [&str; 3] {
        [&self.category, &self.action, &self.label]
    }
}

impl fmt::Display for TrackedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {} / {}", self.category, self.action, self.label)
    }
}

fn non_word_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9_]+").expect("valid non-word pattern"))
}

fn underscore_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"_+").expect("valid underscore pattern"))
}

/// Normalize a string into a lowercase token.
///
/// Runs of non-word characters become a single underscore, repeated
/// underscores collapse, and the result is lowercased. Word characters are
/// ASCII letters, digits and underscore.
///
/// ```
/// use sitetrack::clean_value;
///
/// assert_eq!(clean_value("Hello, World!!"), "hello_world_");
/// ```
pub fn clean_value(value: &str) -> String {
    let replaced = non_word_run().replace_all(value, "_");
    underscore_run()
        .replace_all(&replaced, "_")
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_value_examples() {
        assert_eq!(clean_value("Hello World"), "hello_world");
        assert_eq!(clean_value("A--B  C"), "a_b_c");
        assert_eq!(clean_value("Hello, World!!"), "hello_world_");
    }

    #[test]
    fn test_clean_value_collapses_existing_underscores() {
        assert_eq!(clean_value("snake__case___name"), "snake_case_name");
        assert_eq!(clean_value("a_-_b"), "a_b");
    }

    #[test]
    fn test_clean_value_non_ascii_is_non_word() {
        assert_eq!(clean_value("Café Menu"), "caf_menu");
    }

    #[test]
    fn test_clean_value_empty() {
        assert_eq!(clean_value(""), "");
    }

    #[test]
    fn test_resolve_defaults_for_empty_payload() {
        let event = EventPayload::new().resolve();
        assert_eq!(event, TrackedEvent::new("category", "action", "label"));
    }

    #[test]
    fn test_resolve_prefers_primary_over_alias() {
        let payload = EventPayload {
            category: Some("primary".to_string()),
            ga_category: Some("alias".to_string()),
            ..Default::default()
        };
        assert_eq!(payload.resolve().category, "primary");
    }

    #[test]
    fn test_resolve_falls_back_to_alias() {
        let payload = EventPayload {
            ga_action: Some("download".to_string()),
            ga_label: Some("readme".to_string()),
            ..Default::default()
        };
        let event = payload.resolve();
        assert_eq!(event.category, "category");
        assert_eq!(event.action, "download");
        assert_eq!(event.label, "readme");
    }

    #[test]
    fn test_resolve_treats_empty_as_missing() {
        let payload = EventPayload {
            label: Some(String::new()),
            ga_label: Some("fallback".to_string()),
            category: Some(String::new()),
            ..Default::default()
        };
        let event = payload.resolve();
        assert_eq!(event.label, "fallback");
        assert_eq!(event.category, "category");
    }

    #[test]
    fn test_from_dataset_reads_known_keys() {
        let mut dataset = BTreeMap::new();
        dataset.insert("gaCategory".to_string(), "nav".to_string());
        dataset.insert("action".to_string(), "click".to_string());
        dataset.insert("unrelated".to_string(), "x".to_string());

        let payload = EventPayload::from_dataset(&dataset);
        assert_eq!(payload.ga_category.as_deref(), Some("nav"));
        assert_eq!(payload.action.as_deref(), Some("click"));
        assert_eq!(payload.label, None);
    }

    #[test]
    fn test_payload_deserializes_camel_case() {
        let payload: EventPayload =
            serde_json::from_str(r#"{"gaCategory":"docs","label":"intro"}"#).unwrap();
        assert_eq!(payload.ga_category.as_deref(), Some("docs"));
        assert_eq!(payload.label.as_deref(), Some("intro"));
    }

    #[test]
    fn test_tracked_event_args_order() {
        let event = TrackedEvent::new("c", "a", "l");
        assert_eq!(event.args(), ["c", "a", "l"]);
        assert_eq!(event.to_string(), "c / a / l");
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // Property: cleaning twice is the same as cleaning once
            #[test]
            fn prop_clean_value_idempotent(input in ".*") {
                let once = clean_value(&input);
                prop_assert_eq!(clean_value(&once), once);
            }

            // Property: output only holds lowercase word characters, no doubled underscores
            #[test]
            fn prop_clean_value_charset(input in ".*") {
                let cleaned = clean_value(&input);
                prop_assert!(cleaned
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'));
                prop_assert!(!cleaned.contains("__"));
            }
        }
    }
}
