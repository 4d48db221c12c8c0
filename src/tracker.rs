//! The tracker: a façade over whichever analytics backend the page has.
//!
//! A tracker binds one reporter at construction and never re-detects it.
//! Watchers registered through [`Tracker::watch`] live on the shared event
//! source and hold their own handle on that reporter, so they keep working
//! for as long as the source does.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::backends::{detect_reporter, AbsentReporter, AnalyticsGlobals, Reporter};
use crate::config::{BackendsConfig, Config};
use crate::dom::{DomEvent, EventSource, Handler, Listener, Selector};
use crate::error::{FailOpen, Result};
use crate::event::{clean_value, EventPayload};
use crate::extract::{self, Extractor};

/// Namespace of every listener a tracker registers.
pub const NAMESPACE: &str = "tracker";

/// Selector of links tracked by [`Tracker::track_links`].
pub const TRACKED_LINK_SELECTOR: &str = ".js-track";

/// Page name used when none is configured.
pub const DEFAULT_PAGE_NAME: &str = "page";

/// Site name used when none is configured.
pub const DEFAULT_SITE_NAME: &str = "site";

/// A watch declaration: `(event type, selector, extractor)`.
#[derive(Clone)]
pub struct WatchDeclaration {
    pub event_type: String,
    pub selector: String,
    pub extractor: Extractor,
}

impl WatchDeclaration {
    /// Create a watch declaration.
    pub fn new(
        event_type: impl Into<String>,
        selector: impl Into<String>,
        extractor: Extractor,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            selector: selector.into(),
            extractor,
        }
    }
}

impl fmt::Debug for WatchDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchDeclaration")
            .field("event_type", &self.event_type)
            .field("selector", &self.selector)
            .finish_non_exhaustive()
    }
}

/// Construction options. Unset names fall back to `"page"` and `"site"`.
#[derive(Debug, Clone, Default)]
pub struct TrackerOptions {
    pub page_name: Option<String>,
    pub site_name: Option<String>,
    /// Registered at construction, last declaration first.
    pub watch: Vec<WatchDeclaration>,
    /// Backend probe order and overrides.
    pub backends: BackendsConfig,
}

impl TrackerOptions {
    /// Options with every default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page name.
    pub fn page_name(mut self, name: impl Into<String>) -> Self {
        self.page_name = Some(name.into());
        self
    }

    /// Set the site name.
    pub fn site_name(mut self, name: impl Into<String>) -> Self {
        self.site_name = Some(name.into());
        self
    }

    /// Add a watch declaration.
    pub fn watch(mut self, declaration: WatchDeclaration) -> Self {
        self.watch.push(declaration);
        self
    }

    /// Build options from loaded configuration.
    ///
    /// Fails if a configured selector does not parse.
    pub fn from_config(config: &Config) -> Result<Self> {
        let watch = config
            .watch
            .iter()
            .map(|w| {
                let selector = Selector::parse(&w.selector)?;
                let extractor = extract::from_config(&w.extractor, &selector);
                Ok(WatchDeclaration::new(&w.event, &w.selector, extractor))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            page_name: Some(config.tracker.page_name.clone()),
            site_name: Some(config.tracker.site_name.clone()),
            watch,
            backends: config.backends.clone(),
        })
    }
}

/// Analytics tracker bound to one backend.
pub struct Tracker {
    reporter: Arc<dyn Reporter>,
    source: Arc<dyn EventSource>,
    page_name: String,
    site_name: String,
}

impl Tracker {
    /// Detect the analytics backend in `globals` and build a tracker on it.
    ///
    /// With no backend present a warning is logged, the tracker binds the
    /// absent reporter, and declared watchers are not registered. Pushes on
    /// such a tracker are no-ops.
    pub fn new(
        options: TrackerOptions,
        globals: &AnalyticsGlobals,
        source: Arc<dyn EventSource>,
    ) -> Result<Self> {
        match detect_reporter(globals, &options.backends) {
            Some(reporter) => Self::with_reporter(options, reporter, source),
            None => {
                warn!("analytics backend not found, tracker could not initialize");
                if !options.watch.is_empty() {
                    debug!(
                        skipped = options.watch.len(),
                        "not registering declared watchers without a backend"
                    );
                }
                Ok(Self::unbound(options, source))
            }
        }
    }

    /// Build a tracker on an explicit reporter, registering declared watchers.
    pub fn with_reporter(
        options: TrackerOptions,
        reporter: Arc<dyn Reporter>,
        source: Arc<dyn EventSource>,
    ) -> Result<Self> {
        let TrackerOptions {
            page_name,
            site_name,
            watch,
            ..
        } = options;

        let tracker = Self {
            reporter,
            source,
            page_name: page_name.unwrap_or_else(|| DEFAULT_PAGE_NAME.to_string()),
            site_name: site_name.unwrap_or_else(|| DEFAULT_SITE_NAME.to_string()),
        };

        // Nothing is registered unless every declared selector parses.
        let listeners = watch
            .into_iter()
            .rev()
            .map(|declaration| {
                tracker.listener(
                    &declaration.event_type,
                    &declaration.selector,
                    declaration.extractor,
                )
            })
            .collect::<Result<Vec<_>>>()?;
        for listener in listeners {
            tracker.source.register(listener);
        }

        debug!(
            backend = tracker.reporter.name(),
            page = %tracker.page_name,
            site = %tracker.site_name,
            "tracker initialized"
        );
        Ok(tracker)
    }

    fn unbound(options: TrackerOptions, source: Arc<dyn EventSource>) -> Self {
        Self {
            reporter: Arc::new(AbsentReporter),
            source,
            page_name: options
                .page_name
                .unwrap_or_else(|| DEFAULT_PAGE_NAME.to_string()),
            site_name: options
                .site_name
                .unwrap_or_else(|| DEFAULT_SITE_NAME.to_string()),
        }
    }

    /// Watch `event_type` events on elements matching `selector`.
    ///
    /// Each matching event runs `extractor` and pushes what it returns.
    /// Fails if the selector does not parse.
    pub fn watch(&self, event_type: &str, selector: &str, extractor: Extractor) -> Result<&Self> {
        let listener = self.listener(event_type, selector, extractor)?;
        self.source.register(listener);
        Ok(self)
    }

    fn listener(&self, event_type: &str, selector: &str, extractor: Extractor) -> Result<Listener> {
        let selector = Selector::parse(selector)?;
        let reporter = Arc::clone(&self.reporter);

        let handler: Handler = Arc::new(move |event: &DomEvent| {
            if let Some(payload) = extractor(event) {
                Tracker::push_to(reporter.as_ref(), &payload)
                    .fail_open_default("reporting tracked event");
            }
        });

        Ok(Listener::new(event_type, NAMESPACE, selector, handler))
    }

    /// Track clicks on `.js-track` elements using their data attributes.
    pub fn track_links(&self) -> Result<&Self> {
        let bound = self.reporter.is_bound();
        let dataset = extract::dataset();
        let on_tracked_click: Extractor = Arc::new(move |event: &DomEvent| {
            if bound {
                dataset(event)
            } else {
                None
            }
        });

        self.watch("click", TRACKED_LINK_SELECTOR, on_tracked_click)
    }

    /// Report `payload` through this tracker's backend.
    ///
    /// Delivery failures are logged, never returned.
    pub fn push(&self, payload: &EventPayload) -> &Self {
        Self::push_to(self.reporter.as_ref(), payload).fail_open_default("reporting event");
        self
    }

    /// Resolve `payload` to `[category, action, label]` and hand it to `reporter`.
    pub fn push_to(reporter: &dyn Reporter, payload: &EventPayload) -> Result<()> {
        reporter.report(&payload.resolve())
    }

    /// Set the page name.
    pub fn set_page_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.page_name = name.into();
        self
    }

    /// The page name.
    pub fn page_name(&self) -> &str {
        &self.page_name
    }

    /// Set the site name.
    pub fn set_site_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.site_name = name.into();
        self
    }

    /// The site name.
    pub fn site_name(&self) -> &str {
        &self.site_name
    }

    /// Whether a backend was detected.
    pub fn is_bound(&self) -> bool {
        self.reporter.is_bound()
    }

    /// Name of the bound backend (`"none"` when absent).
    pub fn backend_name(&self) -> &'static str {
        self.reporter.name()
    }

    /// See [`clean_value`].
    pub fn clean_value(value: &str) -> String {
        clean_value(value)
    }
}

impl fmt::Debug for Tracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracker")
            .field("backend", &self.reporter.name())
            .field("page_name", &self.page_name)
            .field("site_name", &self.site_name)
            .finish_non_exhaustive()
    }
}
