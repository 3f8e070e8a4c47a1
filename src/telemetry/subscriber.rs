//! Tracing subscriber setup with layered architecture
//!
//! When tracing is enabled:
//! ```text
//! Registry
//!   ├── OpenTelemetry Layer (bridges `tracing` spans to the SDK tracer)
//!   ├── EnvFilter (RUST_LOG)
//!   └── Fmt Layer (console output, text or JSON)
//! ```
//!
//! When tracing is disabled the OpenTelemetry layer is left out.

use crate::config::TracingConfig;
use crate::telemetry::init::{init_tracing, TracingError, TracingGuard};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Initialize the tracing provider and the global subscriber
///
/// `default_level` is used when `RUST_LOG` is not set.
///
/// # Example
///
/// ```no_run
/// use estrace::config::TracingConfig;
/// use estrace::telemetry::init_subscriber;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let _guard = init_subscriber(&TracingConfig::default(), "info")?;
/// # Ok(())
/// # }
/// ```
pub fn init_subscriber(
    config: &TracingConfig,
    default_level: &str,
) -> Result<TracingGuard, TracingError> {
    let guard = init_tracing(config)?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let fmt_layer = if config.json_logs {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_line_number(true)
            .boxed()
    };

    let telemetry_layer = guard
        .tracer("estrace")
        .map(|tracer| tracing_opentelemetry::layer().with_tracer(tracer));

    let subscriber = tracing_subscriber::registry()
        .with(telemetry_layer)
        .with(env_filter)
        .with(fmt_layer);

    tracing::subscriber::set_global_default(subscriber).map_err(|e| {
        TracingError::ProviderError(format!(
            "Failed to set global subscriber (may already be initialized): {}",
            e
        ))
    })?;

    Ok(guard)
}
