//! Configuration module for estrace
//!
//! Handles loading and parsing of YAML configuration files with support for
//! environment variable expansion and validation.
//!
//! # Example
//!
//! ```yaml
//! tracing:
//!   enabled: true
//!   service_name: "${SERVICE_NAME:-search-api}"
//!   sampling:
//!     strategy: "ratio"
//!     ratio: 0.1
//! transport:
//!   whitelist_query_params: ["routing", "preference"]
//!   tag_total_hits: true
//!   tag_total_shards: true
//! backend:
//!   url: "http://localhost:9200"
//! ```

use crate::transport::options::DEFAULT_BACKEND_PREFIX;
use crate::transport::TraceOpt;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

/// Validate that a URL starts with http:// or https://
fn is_valid_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tracing: TracingConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub backend: BackendConfig,
}

impl Config {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        ConfigLoader::load(path)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tracing.enabled {
            if self.tracing.service_name.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "Service name cannot be empty when tracing is enabled".into(),
                ));
            }

            match self.tracing.sampling.strategy.as_str() {
                "always" | "never" | "ratio" | "parent_based" => {}
                _ => {
                    return Err(ConfigError::ValidationError(format!(
                        "Invalid sampling strategy '{}': must be 'always', 'never', 'ratio', or 'parent_based'",
                        self.tracing.sampling.strategy
                    )))
                }
            }

            if !(0.0..=1.0).contains(&self.tracing.sampling.ratio) {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid sampling ratio {}: must be between 0.0 and 1.0",
                    self.tracing.sampling.ratio
                )));
            }
        }

        let prefix = &self.transport.backend_prefix;
        if prefix.is_empty() || prefix.contains('/') {
            return Err(ConfigError::ValidationError(format!(
                "Invalid backend prefix '{}': must be non-empty and contain no '/'",
                prefix
            )));
        }

        if self
            .transport
            .whitelist_query_params
            .iter()
            .any(|param| param.trim().is_empty())
        {
            return Err(ConfigError::ValidationError(
                "Whitelisted query parameter names cannot be empty".into(),
            ));
        }

        if !is_valid_http_url(&self.backend.url) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid backend url '{}': must start with http:// or https://",
                self.backend.url
            )));
        }

        Ok(())
    }
}

/// OpenTelemetry tracing configuration.
///
/// No exporter is configured here; spans go to whatever processors the
/// embedding application attaches to the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TracingConfig {
    /// Enable or disable tracing. Default: false
    #[serde(default)]
    pub enabled: bool,

    /// Service name for trace identification. Default: "estrace"
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Trace sampling configuration
    #[serde(default)]
    pub sampling: SamplingConfig,

    /// Emit log lines as JSON. Default: false
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            service_name: default_service_name(),
            sampling: SamplingConfig::default(),
            json_logs: false,
        }
    }
}

fn default_service_name() -> String {
    "estrace".to_string()
}

/// Trace sampling configuration.
///
/// # Sampling Strategies
/// - `always` - Sample all traces (default)
/// - `never` - Sample no traces
/// - `ratio` - Sample a share of traces given by `ratio`
/// - `parent_based` - Follow the parent's decision, `ratio` for root spans
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Sampling strategy. Default: "always"
    #[serde(default = "default_sampling_strategy")]
    pub strategy: String,

    /// Sampling ratio (0.0 to 1.0). Default: 1.0
    #[serde(default = "default_sampling_ratio")]
    pub ratio: f64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            strategy: default_sampling_strategy(),
            ratio: default_sampling_ratio(),
        }
    }
}

fn default_sampling_strategy() -> String {
    "always".to_string()
}

fn default_sampling_ratio() -> f64 {
    1.0
}

/// What the tracing transport tags
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Prefix of span names and tag keys. Default: "es"
    #[serde(default = "default_backend_prefix")]
    pub backend_prefix: String,

    /// Query parameters copied into span tags
    #[serde(default)]
    pub whitelist_query_params: Vec<String>,

    #[serde(default)]
    pub tag_query: bool,

    #[serde(default)]
    pub tag_error_type: bool,

    #[serde(default)]
    pub tag_total_hits: bool,

    #[serde(default)]
    pub tag_total_shards: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            backend_prefix: default_backend_prefix(),
            whitelist_query_params: Vec::new(),
            tag_query: false,
            tag_error_type: false,
            tag_total_hits: false,
            tag_total_shards: false,
        }
    }
}

impl TransportConfig {
    /// Options for building a [`TracingTransport`](crate::transport::TracingTransport)
    pub fn to_opts(&self) -> Vec<TraceOpt> {
        let mut opts = vec![TraceOpt::BackendPrefix(self.backend_prefix.clone())];

        if !self.whitelist_query_params.is_empty() {
            opts.push(TraceOpt::WhitelistQueryParams(
                self.whitelist_query_params.clone(),
            ));
        }

        let toggles = [
            (self.tag_query, TraceOpt::TagQuery),
            (self.tag_error_type, TraceOpt::TagErrorType),
            (self.tag_total_hits, TraceOpt::TagTotalHits),
            (self.tag_total_shards, TraceOpt::TagTotalShards),
        ];
        opts.extend(
            toggles
                .into_iter()
                .filter_map(|(enabled, opt)| enabled.then_some(opt)),
        );

        opts
    }
}

fn default_backend_prefix() -> String {
    DEFAULT_BACKEND_PREFIX.to_string()
}

/// Search backend the probe talks to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL. Default: "http://localhost:9200"
    #[serde(default = "default_backend_url")]
    pub url: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
        }
    }
}

fn default_backend_url() -> String {
    "http://localhost:9200".to_string()
}
