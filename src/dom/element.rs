//! Element and DOM event model.
//!
//! Elements carry just enough of the DOM for delegation and extraction:
//! tag name, id, classes, attributes and the chain of parents up to the
//! body. Events deserialize from JSON so a recorded session can be replayed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Prefix of attributes exposed through [`Element::dataset`].
const DATA_PREFIX: &str = "data-";

/// A DOM element and its ancestors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Element {
    /// Tag name (`a`, `button`, ...).
    pub tag: String,
    /// The `id` attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// The class list.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    /// Every other attribute, `data-*` included.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    /// The parent element, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<Box<Element>>,
}

impl Element {
    /// Create an element with the given tag name.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Set the id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add a class.
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    /// Set an attribute.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Set a `data-*` attribute; `name` is given without the prefix.
    pub fn with_data(self, name: &str, value: impl Into<String>) -> Self {
        self.with_attr(format!("{DATA_PREFIX}{name}"), value)
    }

    /// Nest this element inside `parent`.
    pub fn within(mut self, parent: Element) -> Self {
        self.parent = Some(Box::new(parent));
        self
    }

    /// Check for a class.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Look up an attribute. `id` and `class` resolve to their dedicated fields.
    pub fn attribute(&self, name: &str) -> Option<String> {
        match name {
            "id" => self.id.clone(),
            "class" if !self.classes.is_empty() => Some(self.classes.join(" ")),
            _ => self.attributes.get(name).cloned(),
        }
    }

    /// This element followed by its parents, innermost first.
    pub fn ancestors(&self) -> impl Iterator<Item = &Element> {
        std::iter::successors(Some(self), |el| el.parent.as_deref())
    }

    /// The `data-*` attributes keyed by their camel-cased names.
    ///
    /// `data-ga-category` becomes `gaCategory`, the way jQuery's `.data()`
    /// exposes them.
    pub fn dataset(&self) -> BTreeMap<String, String> {
        self.attributes
            .iter()
            .filter_map(|(name, value)| {
                name.strip_prefix(DATA_PREFIX)
                    .map(|key| (camel_case(key), value.clone()))
            })
            .collect()
    }
}

fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for c in name.chars() {
        if c == '-' {
            upper_next = true;
        } else if upper_next {
            out.push(c.to_ascii_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// An event dispatched to the document body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomEvent {
    /// Event type (`click`, `submit`, ...).
    #[serde(rename = "type")]
    pub event_type: String,
    /// The element the event originated on.
    pub target: Element,
}

impl DomEvent {
    /// Create an event.
    pub fn new(event_type: impl Into<String>, target: Element) -> Self {
        Self {
            event_type: event_type.into(),
            target,
        }
    }

    /// Shorthand for a click on `target`.
    pub fn click(target: Element) -> Self {
        Self::new("click", target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_camel_cases_names() {
        let el = Element::new("a")
            .with_data("ga-category", "nav")
            .with_data("label", "home")
            .with_attr("href", "/");

        let dataset = el.dataset();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset["gaCategory"], "nav");
        assert_eq!(dataset["label"], "home");
    }

    #[test]
    fn test_ancestors_innermost_first() {
        let el = Element::new("span").within(Element::new("a").within(Element::new("body")));
        let tags: Vec<&str> = el.ancestors().map(|e| e.tag.as_str()).collect();
        assert_eq!(tags, vec!["span", "a", "body"]);
    }

    #[test]
    fn test_attribute_lookup() {
        let el = Element::new("a")
            .with_id("cta")
            .with_class("btn")
            .with_class("js-track")
            .with_attr("href", "/docs");

        assert_eq!(el.attribute("id").as_deref(), Some("cta"));
        assert_eq!(el.attribute("class").as_deref(), Some("btn js-track"));
        assert_eq!(el.attribute("href").as_deref(), Some("/docs"));
        assert_eq!(el.attribute("title"), None);
    }

    #[test]
    fn test_event_from_json() {
        let json = r#"{
            "type": "click",
            "target": {
                "tag": "a",
                "classes": ["js-track"],
                "attributes": {"data-ga-action": "download"},
                "parent": {"tag": "nav"}
            }
        }"#;

        let event: DomEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.event_type, "click");
        assert!(event.target.has_class("js-track"));
        assert_eq!(event.target.dataset()["gaAction"], "download");
        assert_eq!(event.target.parent.as_ref().unwrap().tag, "nav");
    }
}
