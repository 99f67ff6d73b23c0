//! Reports an `anyhow` error chain.
//!
//! Run with `cargo run --example anyhow_interop --features compat-anyhow1`.

use anyhow::Context;
use snitch::{ErrorContext, ErrorReporter, LogReporter};

fn read_manifest() -> anyhow::Result<String> {
    std::fs::read_to_string("/nonexistent/manifest.toml").context("failed to read manifest")
}

fn main() {
    tracing_subscriber::fmt().init();

    let reporter = LogReporter::new(4);
    if let Err(err) = read_manifest() {
        let ectx = ErrorContext::from(&err);
        println!("{ectx}");
        reporter.notify(&ectx);
    }
}
