use core::fmt;

use serde_json::Value;

use crate::ErrorDetails;

/// Describes one error event for reporting to an [`ErrorReporter`].
///
/// The message is treated as opaque text: it is never parsed, and an empty
/// message is allowed. A context is immutable once built; the builder
/// methods consume and return it.
///
/// ```
/// use snitch::ErrorContext;
///
/// let ectx = ErrorContext::new("upload rejected")
///     .detail("bytes", 1_048_577)
///     .detail("retryable", false);
///
/// assert_eq!(ectx.error(), "upload rejected");
/// assert_eq!(ectx.details().len(), 2);
/// ```
///
/// [`ErrorReporter`]: crate::ErrorReporter
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ErrorContext {
    error: String,
    details: ErrorDetails,
}

impl ErrorContext {
    /// Creates a context with the given message and no details.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: ErrorDetails::new(),
        }
    }

    /// Creates a context with the given message and details.
    #[must_use]
    pub fn with_details(error: impl Into<String>, details: ErrorDetails) -> Self {
        Self {
            error: error.into(),
            details,
        }
    }

    /// Adds a detail entry, replacing any previous value for `key`.
    #[must_use]
    pub fn detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key, value);
        self
    }

    /// The human-readable error message.
    #[must_use]
    pub fn error(&self) -> &str {
        &self.error
    }

    /// Additional annotations for this error.
    #[must_use]
    pub fn details(&self) -> &ErrorDetails {
        &self.details
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.details.is_empty() {
            f.write_str(&self.error)
        } else {
            write!(f, "{} ({})", self.error, self.details)
        }
    }
}
