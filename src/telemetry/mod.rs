//! Tracing collaborators and telemetry setup
//!
//! - [`Tracer`] / [`TraceSpan`]: what the tracing transport needs from a tracer
//! - [`OtelTracer`]: adapter for any OpenTelemetry tracer
//! - [`RecordingTracer`]: in-memory tracer for tests and diagnostics, not
//!   for production use
//! - [`Logger`]: warning sink, [`TracingLogger`] by default
//! - [`init_tracing`] / [`init_subscriber`]: provider and subscriber setup

pub mod init;
pub mod logger;
pub mod recording;
pub mod subscriber;
pub mod tracer;

pub use init::{init_tracing, shutdown_tracing, TracingError, TracingGuard};
pub use logger::{Logger, TracingLogger};
pub use recording::{RecordedSpan, RecordingTracer};
pub use subscriber::init_subscriber;
pub use tracer::{OtelTracer, SpanGuard, TraceSpan, Tracer};
