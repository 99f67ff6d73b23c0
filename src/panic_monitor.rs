use core::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::{ErrorContext, ErrorReporter};

/// Runs `f`, reporting a panic raised inside it before letting it continue.
///
/// If `f` returns normally its value is returned unchanged. If `f` panics and
/// a reporter is given, the reporter is notified synchronously with
/// `"panic: <message>"` (see [`panic_message`]) and empty details. The panic
/// is then resumed with the original payload, so outer
/// [`catch_unwind`](std::panic::catch_unwind) points and the thread's exit
/// status observe it exactly as if `monitor` were not there. Passing `None`
/// skips the notification only.
///
/// Only panics unwinding through this call are observed. Panics on other
/// threads, and aborts, are not.
///
/// # Examples
///
/// ```
/// use std::{panic, sync::Mutex};
///
/// use snitch::{ErrorContext, monitor};
///
/// let seen = Mutex::new(Vec::new());
/// let reporter = |ectx: &ErrorContext| seen.lock().unwrap().push(ectx.error().to_owned());
///
/// fn handle_job() {
///     panic!("boom");
/// }
///
/// let outcome = panic::catch_unwind(|| monitor(Some(&reporter), handle_job));
///
/// assert!(outcome.is_err(), "the panic is still propagated");
/// assert_eq!(*seen.lock().unwrap(), ["panic: boom"]);
/// ```
pub fn monitor<F, R>(reporter: Option<&dyn ErrorReporter>, f: F) -> R
where
    F: FnOnce() -> R,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(payload) => {
            report_panic(reporter, &*payload);
            panic::resume_unwind(payload)
        }
    }
}

/// Notifies `reporter` about a caught panic.
///
/// This is the notification step of [`monitor`], for callers that catch
/// panics themselves (for example around a future). It does not resume the
/// panic; the caller is expected to do so.
pub fn report_panic(reporter: Option<&dyn ErrorReporter>, payload: &(dyn Any + Send)) {
    if let Some(reporter) = reporter {
        reporter.notify(&ErrorContext::new(format!(
            "panic: {}",
            panic_message(payload)
        )));
    }
}

/// Extracts the message of a panic payload.
///
/// Payloads created by `panic!` with a string literal or a format string are
/// returned as-is. Any other payload (such as one passed to
/// [`panic_any`](std::panic::panic_any)) is described as `Box<dyn Any>`, as
/// the default panic hook does.
#[must_use]
pub fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "Box<dyn Any>"
    }
}
