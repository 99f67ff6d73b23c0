#![deny(
    missing_docs,
    unsafe_code,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]

//! Tower middleware reporting request handler panics through snitch.
//!
//! [`PanicMonitorLayer`] wraps a service so that a panic raised while
//! handling a request (either in the service's `call` or while its response
//! future is polled) is reported once to an [`ErrorReporter`] as
//! `"panic: <message>"`. The panic is then resumed unchanged: this layer does
//! not turn panics into responses. Recovering from them is left to the
//! server, or to an outer layer such as `tower_http`'s `CatchPanicLayer`.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//!
//! use axum::{Router, routing::get};
//! use snitch::{LogReporter, MultiplexingReporter};
//! use snitch_tower::PanicMonitorLayer;
//! use tower_http::catch_panic::CatchPanicLayer;
//!
//! let reporter = Arc::new(MultiplexingReporter::new());
//! reporter.add_reporter(LogReporter::default());
//!
//! let app: Router = Router::new()
//!     .route("/", get(|| async { "hello" }))
//!     // Reports the panic, then lets it continue...
//!     .layer(PanicMonitorLayer::from_shared(reporter))
//!     // ...to the server-level recovery.
//!     .layer(CatchPanicLayer::new());
//! ```

use std::{
    fmt,
    future::Future,
    panic::{self, AssertUnwindSafe},
    pin::Pin,
    sync::Arc,
    task::{Context, Poll, ready},
};

use futures::{FutureExt, future::CatchUnwind};
use pin_project_lite::pin_project;
use snitch::{ErrorReporter, monitor, report_panic};
use tower::{Layer, Service};

/// Layer applying [`PanicMonitorService`] to a service.
#[derive(Clone, Default)]
pub struct PanicMonitorLayer {
    reporter: Option<Arc<dyn ErrorReporter>>,
}

impl PanicMonitorLayer {
    /// Creates a layer reporting panics to `reporter`.
    #[must_use]
    pub fn new<R>(reporter: R) -> Self
    where
        R: ErrorReporter + 'static,
    {
        Self::from_shared(Arc::new(reporter))
    }

    /// Creates a layer reporting panics to a reporter shared with the rest of
    /// the application.
    #[must_use]
    pub fn from_shared(reporter: Arc<dyn ErrorReporter>) -> Self {
        Self {
            reporter: Some(reporter),
        }
    }

    /// Creates a layer that reports nothing but still passes panics through.
    #[must_use]
    pub fn disabled() -> Self {
        Self { reporter: None }
    }
}

impl fmt::Debug for PanicMonitorLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanicMonitorLayer")
            .field("reporting", &self.reporter.is_some())
            .finish()
    }
}

impl<S> Layer<S> for PanicMonitorLayer {
    type Service = PanicMonitorService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        PanicMonitorService {
            inner,
            reporter: self.reporter.clone(),
        }
    }
}

/// Wraps `next` so that panics raised while it handles a request are
/// reported to `reporter` and then resumed.
///
/// Equivalent to `PanicMonitorLayer` applied to `next`; with `None`,
/// panics pass through unreported.
pub fn panic_monitor_handler<S>(
    reporter: Option<Arc<dyn ErrorReporter>>,
    next: S,
) -> PanicMonitorService<S> {
    PanicMonitorService {
        inner: next,
        reporter,
    }
}

/// Middleware reporting panics raised by the inner service.
///
/// Each request is guarded twice: the synchronous `call` into the inner
/// service, and every poll of the returned future. Whichever panics, the
/// reporter is notified once for that request before the panic resumes.
#[derive(Clone)]
pub struct PanicMonitorService<S> {
    inner: S,
    reporter: Option<Arc<dyn ErrorReporter>>,
}

impl<S> PanicMonitorService<S> {
    /// The wrapped service.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Unwraps the inner service.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: fmt::Debug> fmt::Debug for PanicMonitorService<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanicMonitorService")
            .field("inner", &self.inner)
            .field("reporting", &self.reporter.is_some())
            .finish()
    }
}

impl<S, Request> Service<Request> for PanicMonitorService<S>
where
    S: Service<Request>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = ResponseFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let inner = &mut self.inner;
        let future = monitor(self.reporter.as_deref(), || inner.call(request));

        ResponseFuture {
            future: AssertUnwindSafe(future).catch_unwind(),
            reporter: self.reporter.clone(),
        }
    }
}

pin_project! {
    /// Response future of [`PanicMonitorService`].
    pub struct ResponseFuture<F> {
        #[pin]
        future: CatchUnwind<AssertUnwindSafe<F>>,
        reporter: Option<Arc<dyn ErrorReporter>>,
    }
}

impl<F: Future> Future for ResponseFuture<F> {
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        match ready!(this.future.poll(cx)) {
            Ok(output) => Poll::Ready(output),
            Err(payload) => {
                tracing::debug!(
                    target: "snitch",
                    panic = snitch::panic_message(&*payload),
                    "request handler panicked"
                );
                report_panic(this.reporter.as_deref(), &*payload);
                panic::resume_unwind(payload)
            }
        }
    }
}
