//! Extractors: turn a DOM event into event data.
//!
//! An extractor returning `None` means "nothing to report" and the event is
//! skipped.

use std::sync::Arc;

use crate::config::ExtractorConfig;
use crate::dom::{DomEvent, Selector};
use crate::event::{clean_value, EventPayload};

/// Function producing event data from a DOM event.
pub type Extractor = Arc<dyn Fn(&DomEvent) -> Option<EventPayload> + Send + Sync>;

/// Read the event target's `data-*` attributes.
pub fn dataset() -> Extractor {
    Arc::new(|event: &DomEvent| Some(EventPayload::from_dataset(&event.target.dataset())))
}

/// Always report the same values.
pub fn fixed(payload: EventPayload) -> Extractor {
    Arc::new(move |_event: &DomEvent| Some(payload.clone()))
}

/// Report the event type as action and the matched element's cleaned id
/// (or tag name, when it has no id) as label.
pub fn element(selector: Selector, category: Option<String>) -> Extractor {
    Arc::new(move |event: &DomEvent| {
        let matched = selector.closest(&event.target).unwrap_or(&event.target);
        let name = matched.id.as_deref().unwrap_or(&matched.tag);
        Some(EventPayload {
            category: category.clone(),
            action: Some(event.event_type.clone()),
            label: Some(clean_value(name)),
            ..Default::default()
        })
    })
}

/// Build the extractor a watch declaration names.
pub fn from_config(config: &ExtractorConfig, selector: &Selector) -> Extractor {
    match config {
        ExtractorConfig::Dataset => dataset(),
        ExtractorConfig::Fixed {
            category,
            action,
            label,
        } => fixed(EventPayload {
            category: category.clone(),
            action: action.clone(),
            label: label.clone(),
            ..Default::default()
        }),
        ExtractorConfig::Element { category } => element(selector.clone(), category.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Element;

    #[test]
    fn test_dataset_reads_target() {
        let link = Element::new("a")
            .with_class("js-track")
            .with_data("ga-category", "nav")
            .with_data("ga-label", "home");
        let payload = dataset()(&DomEvent::click(link)).unwrap();

        assert_eq!(payload.ga_category.as_deref(), Some("nav"));
        assert_eq!(payload.ga_label.as_deref(), Some("home"));
        assert_eq!(payload.resolve().action, "action");
    }

    #[test]
    fn test_fixed_ignores_event() {
        let extractor = fixed(EventPayload::new().category("cta").action("open"));
        let payload = extractor(&DomEvent::click(Element::new("div"))).unwrap();
        assert_eq!(payload.category.as_deref(), Some("cta"));
        assert_eq!(payload.action.as_deref(), Some("open"));
    }

    #[test]
    fn test_element_uses_matched_ancestor() {
        let selector = Selector::parse("button").unwrap();
        let extractor = element(selector, Some("cta".to_string()));

        let icon = Element::new("svg").within(Element::new("button").with_id("Get Started!"));
        let event = extractor(&DomEvent::click(icon)).unwrap().resolve();

        assert_eq!(event.category, "cta");
        assert_eq!(event.action, "click");
        assert_eq!(event.label, "get_started_");
    }

    #[test]
    fn test_element_falls_back_to_tag() {
        let selector = Selector::parse("form").unwrap();
        let extractor = element(selector, None);

        let event = extractor(&DomEvent::new("submit", Element::new("FORM")))
            .unwrap()
            .resolve();
        assert_eq!(event.category, "category");
        assert_eq!(event.label, "form");
    }

    #[test]
    fn test_from_config() {
        let selector = Selector::parse("a").unwrap();
        let extractor = from_config(
            &ExtractorConfig::Fixed {
                category: None,
                action: Some("download".to_string()),
                label: None,
            },
            &selector,
        );
        let event = extractor(&DomEvent::click(Element::new("a")))
            .unwrap()
            .resolve();
        assert_eq!(event.action, "download");
        assert_eq!(event.label, "label");
    }
}
