#![deny(
    missing_docs,
    unsafe_code,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]

//! Sentry backend for snitch.
//!
//! [`SentryReporter`] forwards each [`ErrorContext`] to Sentry as a message
//! event. The context's message becomes the event message and every detail
//! becomes a tag, converted to a string with [`snitch::stringify`].
//!
//! Delivery and retries are handled by the Sentry client bound to
//! the hub; this crate only translates the shape of the event.
//!
//! # Quick Start
//!
//! ```no_run
//! use snitch::{ErrorContext, ErrorReporter, LogReporter, MultiplexingReporter};
//! use snitch_sentry::SentryReporter;
//!
//! let reporter = MultiplexingReporter::new();
//! reporter.add_reporter(LogReporter::default());
//! reporter.add_reporter(SentryReporter::from_current());
//!
//! reporter.notify(&ErrorContext::new("invoice export failed").detail("tenant", 381));
//! ```

use std::{collections::BTreeMap, fmt, sync::Arc};

use sentry_core::{Hub, Level};
use snitch::{ErrorContext, ErrorReporter};

/// Reporter that sends notifications to Sentry through a [`Hub`].
///
/// Tags are set on a temporary scope pushed for the duration of a single
/// capture, so they never leak into other events sent through the same hub.
#[derive(Clone)]
pub struct SentryReporter {
    hub: Arc<Hub>,
}

impl SentryReporter {
    /// Creates a reporter sending through `hub`.
    #[must_use]
    pub fn new(hub: Arc<Hub>) -> Self {
        Self { hub }
    }

    /// Creates a reporter bound to the hub that is current on this thread.
    ///
    /// The hub is captured once, at construction. Events are sent through it
    /// even when `notify` is called from another thread.
    #[must_use]
    pub fn from_current() -> Self {
        Self::new(Hub::current())
    }

    /// The hub events are sent through.
    #[must_use]
    pub fn hub(&self) -> &Arc<Hub> {
        &self.hub
    }
}

impl fmt::Debug for SentryReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SentryReporter")
            .field("client_bound", &self.hub.client().is_some())
            .finish()
    }
}

/// Converts the details of `ectx` into Sentry tags.
///
/// ```
/// use snitch::ErrorContext;
///
/// let ectx = ErrorContext::new("x").detail("attempt", 2).detail("fatal", true);
/// let tags = snitch_sentry::tags(&ectx);
///
/// assert_eq!(tags["attempt"], "2");
/// assert_eq!(tags["fatal"], "true");
/// ```
#[must_use]
pub fn tags(ectx: &ErrorContext) -> BTreeMap<String, String> {
    ectx.details().to_tags().collect()
}

impl ErrorReporter for SentryReporter {
    fn notify(&self, ectx: &ErrorContext) {
        let tags = tags(ectx);
        self.hub.with_scope(
            |scope| {
                for (key, value) in &tags {
                    scope.set_tag(key, value);
                }
            },
            || {
                self.hub.capture_message(ectx.error(), Level::Error);
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use sentry_core::test::with_captured_events;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_message_and_tags_are_sent() {
        let events = with_captured_events(|| {
            let reporter = SentryReporter::from_current();
            reporter.notify(
                &ErrorContext::new("payment declined")
                    .detail("amount", 42)
                    .detail("retry", true)
                    .detail("card", json!({"brand": "visa", "last4": "4242"}))
                    .detail("note", "manual review"),
            );
        });

        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.message.as_deref(), Some("payment declined"));
        assert_eq!(event.level, Level::Error);
        assert_eq!(event.tags["amount"], "42");
        assert_eq!(event.tags["retry"], "true");
        assert_eq!(event.tags["card"], r#"{"brand":"visa","last4":"4242"}"#);
        assert_eq!(event.tags["note"], "manual review");
    }

    #[test]
    fn test_tags_do_not_leak_between_events() {
        let events = with_captured_events(|| {
            let reporter = SentryReporter::from_current();
            reporter.notify(&ErrorContext::new("first").detail("request", "a1"));
            reporter.notify(&ErrorContext::new("second"));
        });

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].tags["request"], "a1");
        assert!(!events[1].tags.contains_key("request"));
        assert_eq!(events[1].message.as_deref(), Some("second"));
    }

    #[test]
    fn test_works_through_a_multiplexer() {
        let events = with_captured_events(|| {
            let mux = snitch::MultiplexingReporter::new();
            mux.add_reporter(SentryReporter::from_current());
            mux.add_reporter(SentryReporter::from_current());
            mux.notify(&ErrorContext::new("fan-out"));
        });

        assert_eq!(events.len(), 2);
        assert!(
            events
                .iter()
                .all(|event| event.message.as_deref() == Some("fan-out"))
        );
    }

    #[test]
    fn test_tags_helper() {
        let ectx = ErrorContext::new("x")
            .detail("n", json!(null))
            .detail("list", json!([1, "two"]));
        let tags = tags(&ectx);
        assert_eq!(tags["n"], "null");
        assert_eq!(tags["list"], r#"[1,"two"]"#);
    }
}
