//! Fans an error and a panic out to a log reporter and an in-memory audit
//! trail.
//!
//! Run with `cargo run --example basic`. Set `SNITCH_STACK_TRACE_DEPTH` to
//! change how many stack frames are logged.

use std::{
    panic,
    sync::{Arc, Mutex},
};

use snitch::{ErrorContext, ErrorReporter, LogReporter, MultiplexingReporter, monitor};

fn main() {
    tracing_subscriber::fmt().with_target(false).init();

    let log = match LogReporter::from_env() {
        Ok(log) => log,
        Err(err) => {
            eprintln!("{err}, using the default depth");
            LogReporter::default()
        }
    };

    let audit = Arc::new(Mutex::new(Vec::new()));
    let reporter = MultiplexingReporter::new();
    reporter.add_reporter(log);
    reporter.add_reporter({
        let audit = Arc::clone(&audit);
        move |ectx: &ErrorContext| audit.lock().unwrap().push(ectx.to_string())
    });

    reporter.notify(
        &ErrorContext::new("failed to refresh exchange rates")
            .detail("provider", "ecb")
            .detail("attempt", 3),
    );

    // The monitored panic is reported, then caught here like a server would.
    let outcome = panic::catch_unwind(|| {
        monitor(Some(&reporter), || {
            let rates: Vec<f64> = Vec::new();
            rates[0]
        })
    });
    assert!(outcome.is_err());

    println!("audit trail:");
    for entry in audit.lock().unwrap().iter() {
        println!("  {entry}");
    }
}
