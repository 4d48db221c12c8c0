//! Delegated event sources.
//!
//! An [`EventSource`] keeps listeners registered against the document body
//! and fans dispatched events out to the ones whose event type and selector
//! match. Listeners accumulate for the life of the source.

use std::fmt;
use std::sync::{Arc, RwLock};

use tracing::trace;

use crate::dom::{DomEvent, Selector};

/// Callback invoked for a matching event.
pub type Handler = Arc<dyn Fn(&DomEvent) + Send + Sync>;

/// A delegated listener: fires for `event_type` events whose target, or one
/// of the target's ancestors, matches `selector`.
#[derive(Clone)]
pub struct Listener {
    event_type: String,
    namespace: String,
    selector: Selector,
    handler: Handler,
}

impl Listener {
    /// Create a listener.
    pub fn new(
        event_type: impl Into<String>,
        namespace: impl Into<String>,
        selector: Selector,
        handler: Handler,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            namespace: namespace.into(),
            selector,
            handler,
        }
    }

    /// Namespaced event name, e.g. `click.tracker`.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.event_type, self.namespace)
    }

    /// Check whether this listener should fire for `event`.
    pub fn matches(&self, event: &DomEvent) -> bool {
        self.event_type == event.event_type && self.selector.closest(&event.target).is_some()
    }

    /// Invoke the handler.
    pub fn fire(&self, event: &DomEvent) {
        (self.handler)(event)
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("event", &self.qualified_name())
            .field("selector", &self.selector.as_str())
            .finish_non_exhaustive()
    }
}

/// A source of delegated DOM events.
///
/// Implementations must be shareable: several trackers may register against
/// the same source.
pub trait EventSource: Send + Sync {
    /// Register a delegated listener.
    fn register(&self, listener: Listener);

    /// Dispatch an event to every matching listener, in registration order.
    ///
    /// Each listener fires at most once per event. Returns how many fired.
    fn dispatch(&self, event: &DomEvent) -> usize;

    /// Number of registered listeners.
    fn listener_count(&self) -> usize;
}

impl<T: EventSource + ?Sized> EventSource for Arc<T> {
    fn register(&self, listener: Listener) {
        (**self).register(listener)
    }

    fn dispatch(&self, event: &DomEvent) -> usize {
        (**self).dispatch(event)
    }

    fn listener_count(&self) -> usize {
        (**self).listener_count()
    }
}

/// The document body: the listener registry delegated events bubble up to.
#[derive(Debug, Default)]
pub struct DocumentBody {
    listeners: RwLock<Vec<Listener>>,
}

impl DocumentBody {
    /// Create a body with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a shared body.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Number of listeners registered under `namespace`.
    pub fn listeners_in(&self, namespace: &str) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|l| l.namespace == namespace)
            .count()
    }

    /// Namespaced names of every listener, in registration order.
    pub fn bindings(&self) -> Vec<String> {
        self.listeners
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|l| format!("{} {}", l.qualified_name(), l.selector))
            .collect()
    }
}

impl EventSource for DocumentBody {
    fn register(&self, listener: Listener) {
        trace!(
            event = %listener.qualified_name(),
            selector = listener.selector.as_str(),
            "registering delegated listener"
        );
        self.listeners
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(listener);
    }

    fn dispatch(&self, event: &DomEvent) -> usize {
        // Handlers run without the lock held so they may register listeners.
        let matching: Vec<Listener> = self
            .listeners
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|l| l.matches(event))
            .cloned()
            .collect();

        for listener in &matching {
            listener.fire(event);
        }

        trace!(
            event = %event.event_type,
            fired = matching.len(),
            "dispatched event"
        );
        matching.len()
    }

    fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}
