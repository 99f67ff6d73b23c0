#![deny(
    missing_docs,
    unsafe_code,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
// Make docs.rs generate better docs
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Error and panic notification for Rust services.
//!
//! ## Overview
//!
//! This crate captures application errors and panics and forwards them to one
//! or more reporting backends. An error event is described by an
//! [`ErrorContext`]: a human-readable message plus free-form [`ErrorDetails`].
//! Anything that can accept such a context implements [`ErrorReporter`].
//!
//! ## Quick Example
//!
//! ```
//! use snitch::{ErrorContext, ErrorReporter, LogReporter, MultiplexingReporter};
//!
//! let reporter = MultiplexingReporter::new();
//! reporter.add_reporter(LogReporter::new(8));
//! reporter.add_reporter(|ectx: &ErrorContext| eprintln!("{}", ectx.error()));
//!
//! reporter.notify(
//!     &ErrorContext::new("failed to flush queue")
//!         .detail("queue", "billing")
//!         .detail("pending", 12),
//! );
//! ```
//!
//! ## Core Concepts
//!
//! - **[`ErrorReporter`]** is the only extension point. A backend is integrated
//!   by implementing its single `notify` method around the backend's native
//!   client.
//! - **[`LogReporter`]** writes the message and a captured stack trace through
//!   [`tracing`].
//! - **[`MultiplexingReporter`]** fans one notification out to every
//!   registered reporter, in registration order. It implements
//!   [`ErrorReporter`] itself, so multiplexers nest.
//! - **[`monitor`]** runs a closure and, if it panics, notifies a reporter
//!   with `"panic: <message>"` before resuming the unwind. Panics are observed,
//!   never swallowed.
//!
//! Reporters are plain values: construct them explicitly and pass them to
//! whatever needs them. This crate keeps no global state.
//!
//! ## Ecosystem
//!
//! - **[`snitch-sentry`]** - forwards notifications to Sentry.
//! - **[`snitch-tower`]** - tower middleware that reports panics raised while
//!   handling requests.
//!
//! [`snitch-sentry`]: https://docs.rs/snitch-sentry
//! [`snitch-tower`]: https://docs.rs/snitch-tower

pub mod compat;
pub mod config;
mod context;
mod details;
mod log_reporter;
mod multiplex;
mod panic_monitor;
mod reporter;

pub use self::{
    config::ConfigError,
    context::ErrorContext,
    details::{ErrorDetails, stringify},
    log_reporter::{LogReporter, StackFrame, stack_trace},
    multiplex::MultiplexingReporter,
    panic_monitor::{monitor, panic_message, report_panic},
    reporter::ErrorReporter,
};

/// Re-export of the value type stored in [`ErrorDetails`].
pub use serde_json::Value;
