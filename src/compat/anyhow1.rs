//! Integration with the [`anyhow`] 1.x error handling library.
//!
//! Converting an [`anyhow::Error`] into an [`ErrorContext`] keeps the
//! top-level message as the context's error and records each underlying
//! cause as a detail named `cause.1`, `cause.2`, ... (outermost first).
//!
//! ```
//! use anyhow::Context;
//! use snitch::{ErrorContext, ErrorReporter, LogReporter};
//!
//! fn load() -> anyhow::Result<String> {
//!     std::fs::read_to_string("/definitely/missing").context("loading settings")
//! }
//!
//! if let Err(err) = load() {
//!     let ectx = ErrorContext::from(&err);
//!     assert_eq!(ectx.error(), "loading settings");
//!     assert!(ectx.details().get("cause.1").is_some());
//!     LogReporter::new(0).notify(&ectx);
//! }
//! ```

use crate::{ErrorContext, ErrorDetails};

impl From<&anyhow::Error> for ErrorContext {
    fn from(err: &anyhow::Error) -> Self {
        let details: ErrorDetails = err
            .chain()
            .skip(1)
            .enumerate()
            .map(|(i, cause)| (format!("cause.{}", i + 1), cause.to_string()))
            .collect();
        ErrorContext::with_details(err.to_string(), details)
    }
}

impl From<anyhow::Error> for ErrorContext {
    fn from(err: anyhow::Error) -> Self {
        Self::from(&err)
    }
}

#[cfg(test)]
mod tests {
    use anyhow::{Context, anyhow};
    use serde_json::json;

    use super::*;

    #[test]
    fn test_chain_becomes_details() {
        let err = Err::<(), _>(anyhow!("connection refused"))
            .context("querying replica")
            .context("rendering dashboard")
            .unwrap_err();

        let ectx = ErrorContext::from(err);
        assert_eq!(ectx.error(), "rendering dashboard");
        assert_eq!(ectx.details().get("cause.1"), Some(&json!("querying replica")));
        assert_eq!(ectx.details().get("cause.2"), Some(&json!("connection refused")));
        assert_eq!(ectx.details().len(), 2);
    }

    #[test]
    fn test_single_error_has_no_details() {
        let ectx = ErrorContext::from(&anyhow!("plain"));
        assert_eq!(ectx, ErrorContext::new("plain"));
    }
}
