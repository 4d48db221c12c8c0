//! DOM surface consumed by the tracker.
//!
//! This module provides the element and event model, selector matching, and
//! the delegated event source trackers register their watchers on.

pub mod element;
pub mod selector;
pub mod source;

pub use element::{DomEvent, Element};
pub use selector::Selector;
pub use source::{DocumentBody, EventSource, Handler, Listener};
