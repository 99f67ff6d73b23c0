use core::{fmt, panic::Location};
use std::{
    panic::{self, AssertUnwindSafe},
    sync::{PoisonError, RwLock, RwLockReadGuard},
};

use crate::{ErrorContext, ErrorReporter, panic_message};

struct RegisteredReporter {
    reporter: Box<dyn ErrorReporter>,
    added_at: &'static Location<'static>,
}

impl fmt::Display for RegisteredReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "reporter registered at {}:{}",
            self.added_at.file(),
            self.added_at.line()
        )
    }
}

/// Reporter that forwards every notification to a list of reporters.
///
/// Reporters are notified in the order they were added. The list only grows:
/// there is no way to remove a reporter once added.
///
/// The list is guarded by a reader/writer lock. [`add_reporter`] takes it
/// exclusively, [`notify`] takes it shared, so notifications run in parallel
/// with each other and each one sees the list either entirely before or
/// entirely after any concurrent registration.
///
/// Reporters are isolated from each other: if one panics, the panic is logged
/// through `tracing` and the remaining reporters are still notified.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use snitch::{ErrorContext, ErrorReporter, LogReporter, MultiplexingReporter};
///
/// let backends = Arc::new(MultiplexingReporter::new());
/// backends.add_reporter(LogReporter::default());
///
/// // Multiplexers are reporters themselves and can be nested.
/// let root = MultiplexingReporter::new();
/// root.add_reporter(Arc::clone(&backends));
/// root.add_reporter(|ectx: &ErrorContext| eprintln!("audit: {ectx}"));
///
/// root.notify(&ErrorContext::new("replica lagging").detail("lag_ms", 1200));
/// ```
///
/// [`add_reporter`]: Self::add_reporter
/// [`notify`]: ErrorReporter::notify
#[derive(Default)]
pub struct MultiplexingReporter {
    reporters: RwLock<Vec<RegisteredReporter>>,
}

impl MultiplexingReporter {
    /// Creates a multiplexer with no reporters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a reporter to the end of the notification order.
    #[track_caller]
    pub fn add_reporter<R>(&self, reporter: R)
    where
        R: ErrorReporter + 'static,
    {
        let registered = RegisteredReporter {
            reporter: Box::new(reporter),
            added_at: Location::caller(),
        };
        // The list is append-only, so it stays consistent even if a previous
        // holder of the lock panicked.
        self.reporters
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(registered);
    }

    /// Number of registered reporters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns `true` if no reporter has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<RegisteredReporter>> {
        self.reporters.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ErrorReporter for MultiplexingReporter {
    fn notify(&self, ectx: &ErrorContext) {
        let reporters = self.read();

        for registered in reporters.iter() {
            let result =
                panic::catch_unwind(AssertUnwindSafe(|| registered.reporter.notify(ectx)));
            if let Err(payload) = result {
                tracing::warn!(
                    target: "snitch",
                    reporter = %registered,
                    panic = panic_message(&*payload),
                    error = ectx.error(),
                    "error reporter panicked during notification"
                );
            }
        }
    }
}

impl fmt::Debug for MultiplexingReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reporters = self.read();
        f.debug_struct("MultiplexingReporter")
            .field(
                "reporters",
                &reporters.iter().map(ToString::to_string).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    static_assertions::assert_impl_all!(MultiplexingReporter: Send, Sync);

    type Log = Arc<Mutex<Vec<String>>>;

    struct Broken;

    impl ErrorReporter for Broken {
        fn notify(&self, _ectx: &ErrorContext) {
            panic!("tracking backend down");
        }
    }

    fn recorder(log: &Log, name: &'static str) -> impl ErrorReporter + 'static {
        let log = Arc::clone(log);
        move |ectx: &ErrorContext| log.lock().unwrap().push(format!("{name}:{}", ectx.error()))
    }

    #[test]
    fn test_notify_without_reporters_is_noop() {
        let mux = MultiplexingReporter::new();
        assert!(mux.is_empty());
        mux.notify(&ErrorContext::new("nobody listens"));
    }

    #[test]
    fn test_registration_order_is_notification_order() {
        let log = Log::default();
        let mux = MultiplexingReporter::new();
        for name in ["first", "second", "third"] {
            mux.add_reporter(recorder(&log, name));
        }
        assert_eq!(mux.len(), 3);

        mux.notify(&ErrorContext::new("e1"));
        mux.notify(&ErrorContext::new("e2"));

        assert_eq!(
            *log.lock().unwrap(),
            [
                "first:e1", "second:e1", "third:e1", "first:e2", "second:e2", "third:e2"
            ]
        );
    }

    #[test]
    fn test_nested_multiplexers() {
        let log = Log::default();
        let inner = Arc::new(MultiplexingReporter::new());
        inner.add_reporter(recorder(&log, "inner-a"));

        let outer = MultiplexingReporter::new();
        outer.add_reporter(recorder(&log, "outer-a"));
        outer.add_reporter(Arc::clone(&inner));
        outer.add_reporter(recorder(&log, "outer-b"));

        // Registrations on the inner multiplexer are visible through the outer one.
        inner.add_reporter(recorder(&log, "inner-b"));
        outer.notify(&ErrorContext::new("x"));

        assert_eq!(
            *log.lock().unwrap(),
            ["outer-a:x", "inner-a:x", "inner-b:x", "outer-b:x"]
        );
    }

    #[test]
    fn test_panicking_reporter_is_isolated() {
        let log = Log::default();
        let mux = MultiplexingReporter::new();
        mux.add_reporter(recorder(&log, "before"));
        mux.add_reporter(Broken);
        mux.add_reporter(recorder(&log, "after"));

        mux.notify(&ErrorContext::new("e"));
        mux.notify(&ErrorContext::new("f"));

        assert_eq!(
            *log.lock().unwrap(),
            ["before:e", "after:e", "before:f", "after:f"]
        );
        // The lock is still usable afterwards.
        mux.add_reporter(recorder(&log, "late"));
        assert_eq!(mux.len(), 4);
    }

    #[test]
    fn test_debug_lists_registration_sites() {
        let mux = MultiplexingReporter::new();
        mux.add_reporter(|_: &ErrorContext| {});
        let debug = format!("{mux:?}");
        assert!(debug.contains("reporter registered at"), "{debug}");
        assert!(debug.contains(file!()), "{debug}");
    }
}
