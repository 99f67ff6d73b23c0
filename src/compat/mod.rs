//! Interoperability with other error handling libraries.
//!
//! # Available Integrations
//!
//! - [`anyhow1`] - Build an [`ErrorContext`](crate::ErrorContext) from an
//!   `anyhow` 1.x error (requires the `compat-anyhow1` feature flag)

#[cfg(feature = "compat-anyhow1")]
#[cfg_attr(docsrs, doc(cfg(feature = "compat-anyhow1")))]
pub mod anyhow1;
