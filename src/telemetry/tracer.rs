//! Tracer and span collaborator traits
//!
//! The transport does not talk to OpenTelemetry directly. It asks a
//! [`Tracer`] for a span and annotates it through [`TraceSpan`], which keeps
//! the instrumentation testable with [`RecordingTracer`](super::RecordingTracer)
//! and lets any OpenTelemetry tracer plug in through [`OtelTracer`].

use opentelemetry::global::{self, BoxedTracer};
use opentelemetry::trace::{Span as _, SpanKind, Status, Tracer as _};
use opentelemetry::{Context, KeyValue};

/// Tag carrying the HTTP method
pub const TAG_HTTP_METHOD: &str = "http.method";
/// Tag carrying the request path
pub const TAG_HTTP_PATH: &str = "http.path";
/// Tag carrying the response status code
pub const TAG_HTTP_STATUS_CODE: &str = "http.status_code";
/// Tag carrying error details
pub const TAG_ERROR: &str = "error";

/// Source of spans
pub trait Tracer: Send + Sync {
    /// Start a span as a child of `parent`
    ///
    /// Returns `None` when nothing would be recorded, e.g. when the trace is
    /// not sampled. Callers skip all instrumentation in that case.
    fn start_span(&self, parent: &Context, name: String, kind: SpanKind)
        -> Option<Box<dyn TraceSpan>>;
}

/// A started span
pub trait TraceSpan: Send {
    fn set_name(&mut self, name: String);

    fn tag(&mut self, key: &str, value: String);

    /// End the span. Called exactly once.
    fn finish(&mut self);
}

/// Owns a span and finishes it when dropped
///
/// Every exit path of a request, including early returns and a dropped
/// future, closes the span exactly once.
pub struct SpanGuard {
    span: Box<dyn TraceSpan>,
}

impl SpanGuard {
    pub fn new(span: Box<dyn TraceSpan>) -> Self {
        Self { span }
    }

    pub fn set_name(&mut self, name: String) {
        self.span.set_name(name);
    }

    pub fn tag(&mut self, key: &str, value: impl Into<String>) {
        self.span.tag(key, value.into());
    }
}

impl Drop for SpanGuard {
    fn drop(&mut self) {
        self.span.finish();
    }
}

impl std::fmt::Debug for SpanGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpanGuard").finish_non_exhaustive()
    }
}

/// [`Tracer`] backed by an OpenTelemetry tracer
///
/// Spans that are not recording (unsampled, or no provider installed) are
/// reported as `None`.
#[derive(Debug, Clone)]
pub struct OtelTracer<T = BoxedTracer> {
    inner: T,
}

impl OtelTracer<BoxedTracer> {
    /// Use a tracer from the globally installed provider
    pub fn global(name: &'static str) -> Self {
        Self {
            inner: global::tracer(name),
        }
    }
}

impl<T> OtelTracer<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

impl<T> Tracer for OtelTracer<T>
where
    T: opentelemetry::trace::Tracer + Send + Sync,
    T::Span: Send + 'static,
{
    fn start_span(
        &self,
        parent: &Context,
        name: String,
        kind: SpanKind,
    ) -> Option<Box<dyn TraceSpan>> {
        let span = self
            .inner
            .span_builder(name)
            .with_kind(kind)
            .start_with_context(&self.inner, parent);

        if !span.is_recording() {
            return None;
        }

        Some(Box::new(OtelSpan { inner: span }))
    }
}

struct OtelSpan<S> {
    inner: S,
}

impl<S> TraceSpan for OtelSpan<S>
where
    S: opentelemetry::trace::Span + Send,
{
    fn set_name(&mut self, name: String) {
        self.inner.update_name(name);
    }

    fn tag(&mut self, key: &str, value: String) {
        if key == TAG_ERROR {
            self.inner.set_status(Status::error(value.clone()));
        }
        self.inner.set_attribute(KeyValue::new(key.to_owned(), value));
    }

    fn finish(&mut self) {
        self.inner.end();
    }
}
