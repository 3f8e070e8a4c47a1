//! Tracing transport options
//!
//! A [`TracingTransport`] is configured once, at construction, from an
//! ordered list of [`TraceOpt`] values. Options are applied in order and a
//! later option replaces whatever an earlier one set for the same field.

use super::traced::TracingTransport;
use super::{HyperTransport, Transport};
use crate::telemetry::{Logger, Tracer, TracingLogger};
use std::fmt;
use std::sync::Arc;

/// Prefix used for span names and tag keys unless overridden
pub const DEFAULT_BACKEND_PREFIX: &str = "es";

/// Frozen tagging configuration of a [`TracingTransport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceOptions {
    pub backend_prefix: String,
    pub whitelist_query_params: Vec<String>,
    pub tag_query: bool,
    pub tag_error_type: bool,
    pub tag_total_hits: bool,
    pub tag_total_shards: bool,
}

impl Default for TraceOptions {
    fn default() -> Self {
        Self {
            backend_prefix: DEFAULT_BACKEND_PREFIX.to_string(),
            whitelist_query_params: Vec::new(),
            tag_query: false,
            tag_error_type: false,
            tag_total_hits: false,
            tag_total_shards: false,
        }
    }
}

/// One option applied while building a [`TracingTransport`]
#[derive(Clone)]
pub enum TraceOpt {
    /// Transport the requests are delegated to
    ///
    /// Must not be a tracing transport itself, otherwise every request ends
    /// up with two spans.
    RoundTripper(Arc<dyn Transport>),
    /// Sink for warnings about failed body reads
    Logger(Arc<dyn Logger>),
    /// Query parameters copied into span tags, e.g. `routing`
    WhitelistQueryParams(Vec<String>),
    /// Tag the body of non-GET requests
    TagQuery,
    /// Tag the `type` of structured error responses
    TagErrorType,
    /// Tag the total hits of successful responses
    TagTotalHits,
    /// Tag the total shards of successful responses
    TagTotalShards,
    /// Prefix for span names and tag keys
    BackendPrefix(String),
}

impl fmt::Debug for TraceOpt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceOpt::RoundTripper(_) => f.write_str("RoundTripper(..)"),
            TraceOpt::Logger(_) => f.write_str("Logger(..)"),
            TraceOpt::WhitelistQueryParams(params) => f
                .debug_tuple("WhitelistQueryParams")
                .field(params)
                .finish(),
            TraceOpt::TagQuery => f.write_str("TagQuery"),
            TraceOpt::TagErrorType => f.write_str("TagErrorType"),
            TraceOpt::TagTotalHits => f.write_str("TagTotalHits"),
            TraceOpt::TagTotalShards => f.write_str("TagTotalShards"),
            TraceOpt::BackendPrefix(prefix) => {
                f.debug_tuple("BackendPrefix").field(prefix).finish()
            }
        }
    }
}

/// Builder for [`TracingTransport`]
///
/// # Example
///
/// ```
/// use estrace::telemetry::RecordingTracer;
/// use estrace::transport::TracingTransport;
///
/// let transport = TracingTransport::builder(RecordingTracer::new())
///     .whitelist_query_params(["routing", "preference"])
///     .tag_total_hits()
///     .tag_total_shards()
///     .build();
///
/// assert!(transport.options().tag_total_hits);
/// ```
pub struct TracingTransportBuilder {
    tracer: Arc<dyn Tracer>,
    inner: Option<Arc<dyn Transport>>,
    logger: Arc<dyn Logger>,
    options: TraceOptions,
}

impl TracingTransportBuilder {
    pub fn new<T>(tracer: T) -> Self
    where
        T: Tracer + 'static,
    {
        Self::with_shared_tracer(Arc::new(tracer))
    }

    pub fn with_shared_tracer(tracer: Arc<dyn Tracer>) -> Self {
        Self {
            tracer,
            inner: None,
            logger: Arc::new(TracingLogger),
            options: TraceOptions::default(),
        }
    }

    /// Apply a single option
    pub fn apply(mut self, opt: TraceOpt) -> Self {
        match opt {
            TraceOpt::RoundTripper(inner) => self.inner = Some(inner),
            TraceOpt::Logger(logger) => self.logger = logger,
            TraceOpt::WhitelistQueryParams(params) => {
                self.options.whitelist_query_params = params
            }
            TraceOpt::TagQuery => self.options.tag_query = true,
            TraceOpt::TagErrorType => self.options.tag_error_type = true,
            TraceOpt::TagTotalHits => self.options.tag_total_hits = true,
            TraceOpt::TagTotalShards => self.options.tag_total_shards = true,
            TraceOpt::BackendPrefix(prefix) => self.options.backend_prefix = prefix,
        }
        self
    }

    /// Apply options in order
    pub fn apply_all<I>(self, opts: I) -> Self
    where
        I: IntoIterator<Item = TraceOpt>,
    {
        opts.into_iter().fold(self, Self::apply)
    }

    pub fn round_tripper<T>(self, inner: T) -> Self
    where
        T: Transport + 'static,
    {
        self.apply(TraceOpt::RoundTripper(Arc::new(inner)))
    }

    pub fn logger<L>(self, logger: L) -> Self
    where
        L: Logger + 'static,
    {
        self.apply(TraceOpt::Logger(Arc::new(logger)))
    }

    pub fn whitelist_query_params<I, S>(self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.apply(TraceOpt::WhitelistQueryParams(
            params.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn tag_query(self) -> Self {
        self.apply(TraceOpt::TagQuery)
    }

    pub fn tag_error_type(self) -> Self {
        self.apply(TraceOpt::TagErrorType)
    }

    pub fn tag_total_hits(self) -> Self {
        self.apply(TraceOpt::TagTotalHits)
    }

    pub fn tag_total_shards(self) -> Self {
        self.apply(TraceOpt::TagTotalShards)
    }

    pub fn backend_prefix(self, prefix: impl Into<String>) -> Self {
        self.apply(TraceOpt::BackendPrefix(prefix.into()))
    }

    /// Freeze the options and build the transport
    pub fn build(self) -> TracingTransport {
        let inner = self
            .inner
            .unwrap_or_else(|| Arc::new(HyperTransport::new()));

        TracingTransport::from_parts(self.tracer, inner, self.logger, self.options)
    }
}
