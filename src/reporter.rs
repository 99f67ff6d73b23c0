use std::sync::Arc;

use crate::ErrorContext;

/// A backend that can accept error notifications.
///
/// This is the single extension point of the crate: an error-tracking
/// service is integrated by implementing `notify` around its native client.
/// Notification is fire-and-forget. Implementations handle their own
/// failures and must not assume anything about the caller.
///
/// Closures of the form `Fn(&ErrorContext)` are reporters too, which is
/// convenient for ad-hoc sinks and tests. So are `Arc<R>` and
/// `Box<dyn ErrorReporter>`, for reporters chosen at runtime.
///
/// # Examples
///
/// ```
/// use std::sync::Mutex;
///
/// use snitch::{ErrorContext, ErrorReporter};
///
/// #[derive(Default)]
/// struct Recorder(Mutex<Vec<String>>);
///
/// impl ErrorReporter for Recorder {
///     fn notify(&self, ectx: &ErrorContext) {
///         self.0.lock().unwrap().push(ectx.error().to_owned());
///     }
/// }
///
/// let recorder = Recorder::default();
/// recorder.notify(&ErrorContext::new("lost connection"));
/// assert_eq!(*recorder.0.lock().unwrap(), ["lost connection"]);
/// ```
pub trait ErrorReporter: Send + Sync {
    /// Reports one error event.
    fn notify(&self, ectx: &ErrorContext);
}

impl<F> ErrorReporter for F
where
    F: Fn(&ErrorContext) + Send + Sync,
{
    fn notify(&self, ectx: &ErrorContext) {
        self(ectx);
    }
}

impl<R: ErrorReporter + ?Sized> ErrorReporter for Arc<R> {
    fn notify(&self, ectx: &ErrorContext) {
        (**self).notify(ectx);
    }
}

impl ErrorReporter for Box<dyn ErrorReporter> {
    fn notify(&self, ectx: &ErrorContext) {
        (**self).notify(ectx);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    static_assertions::assert_obj_safe!(ErrorReporter);

    #[test]
    fn test_closure_and_shared_reporter() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let seen = Arc::clone(&seen);
            move |ectx: &ErrorContext| seen.lock().unwrap().push(ectx.error().to_owned())
        };

        let shared: Arc<dyn ErrorReporter> = Arc::new(sink);
        let again = Arc::clone(&shared);

        shared.notify(&ErrorContext::new("a"));
        again.notify(&ErrorContext::new("b"));
        ErrorReporter::notify(&again, &ErrorContext::new("c"));

        assert_eq!(*seen.lock().unwrap(), ["a", "b", "c"]);
    }

    #[test]
    fn test_boxed_reporter_in_multiplexer() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let backends: Vec<Box<dyn ErrorReporter>> = vec![
            Box::new(crate::LogReporter::new(0)),
            Box::new({
                let seen = Arc::clone(&seen);
                move |ectx: &ErrorContext| seen.lock().unwrap().push(ectx.error().to_owned())
            }),
        ];

        let mux = crate::MultiplexingReporter::new();
        for backend in backends {
            mux.add_reporter(backend);
        }
        assert_eq!(mux.len(), 2);

        mux.notify(&ErrorContext::new("boxed"));
        assert_eq!(*seen.lock().unwrap(), ["boxed"]);
    }
}
