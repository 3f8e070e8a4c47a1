//! OpenTelemetry tracer provider initialization and lifecycle management
//!
//! This module builds the SDK tracer provider with the configured sampler,
//! installs it globally and flushes it on shutdown.

use crate::config::{SamplingConfig, TracingConfig};
use opentelemetry::global;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_sdk::trace::{self as sdktrace, Sampler, Tracer, TracerProvider};
use opentelemetry_sdk::Resource;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during tracing initialization
#[derive(Error, Debug)]
pub enum TracingError {
    #[error("Invalid sampling configuration: {0}")]
    InvalidSampling(String),

    #[error("Failed to initialize tracer provider: {0}")]
    ProviderError(String),
}

/// RAII guard for tracing lifecycle management
///
/// Flushes and shuts down the tracer provider when dropped.
#[derive(Debug)]
pub struct TracingGuard {
    provider: Option<Arc<TracerProvider>>,
    active: bool,
}

impl TracingGuard {
    fn new(provider: TracerProvider) -> Self {
        Self {
            provider: Some(Arc::new(provider)),
            active: true,
        }
    }

    fn inactive() -> Self {
        Self {
            provider: None,
            active: false,
        }
    }

    /// Check if tracing is active
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// SDK tracer from the managed provider, if tracing is active
    pub fn tracer(&self, name: &'static str) -> Option<Tracer> {
        self.provider.as_ref().map(|provider| provider.tracer(name))
    }
}

impl Drop for TracingGuard {
    fn drop(&mut self) {
        if self.active {
            if let Some(provider) = &self.provider {
                let _ = provider.force_flush();
            }
            global::shutdown_tracer_provider();
        }
    }
}

/// Map the sampling configuration onto an SDK sampler
pub fn build_sampler(sampling: &SamplingConfig) -> Result<Sampler, TracingError> {
    if !(0.0..=1.0).contains(&sampling.ratio) {
        return Err(TracingError::InvalidSampling(format!(
            "ratio {} must be between 0.0 and 1.0",
            sampling.ratio
        )));
    }

    match sampling.strategy.as_str() {
        "always" => Ok(Sampler::AlwaysOn),
        "never" => Ok(Sampler::AlwaysOff),
        "ratio" => Ok(Sampler::TraceIdRatioBased(sampling.ratio)),
        "parent_based" => Ok(Sampler::ParentBased(Box::new(
            Sampler::TraceIdRatioBased(sampling.ratio),
        ))),
        other => Err(TracingError::InvalidSampling(format!(
            "unknown strategy '{}'",
            other
        ))),
    }
}

/// Initialize the OpenTelemetry tracer provider
///
/// With tracing disabled no provider is installed: the global tracer stays a
/// no-op, so [`OtelTracer`](super::OtelTracer) yields no spans and the
/// tracing transport passes requests straight through.
///
/// # Example
///
/// ```no_run
/// use estrace::config::TracingConfig;
/// use estrace::telemetry::init::init_tracing;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = TracingConfig {
///     enabled: true,
///     service_name: "search-api".to_string(),
///     ..Default::default()
/// };
///
/// let _guard = init_tracing(&config)?;
/// # Ok(())
/// # }
/// ```
pub fn init_tracing(config: &TracingConfig) -> Result<TracingGuard, TracingError> {
    if !config.enabled {
        return Ok(TracingGuard::inactive());
    }

    let sampler = build_sampler(&config.sampling)?;
    let resource = Resource::new(vec![KeyValue::new(
        "service.name",
        config.service_name.clone(),
    )]);

    let provider = TracerProvider::builder()
        .with_config(
            sdktrace::config()
                .with_sampler(sampler)
                .with_resource(resource),
        )
        .build();

    global::set_tracer_provider(provider.clone());

    Ok(TracingGuard::new(provider))
}

/// Explicitly shutdown tracing and flush all pending spans
pub fn shutdown_tracing(mut guard: TracingGuard) -> Result<(), TracingError> {
    if guard.active {
        if let Some(provider) = &guard.provider {
            for result in provider.force_flush() {
                result.map_err(|e| TracingError::ProviderError(e.to_string()))?;
            }
        }
        // Prevent a second shutdown in Drop
        guard.active = false;
        global::shutdown_tracer_provider();
    }
    Ok(())
}
