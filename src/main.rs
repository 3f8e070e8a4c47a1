//! estrace - traced Elasticsearch request probe
//!
//! Sends a single request through the tracing transport and prints the
//! response, logging the span the transport recorded.

use anyhow::{anyhow, Context as _};
use clap::Parser;
use estrace::config::Config;
use estrace::telemetry::{init_subscriber, OtelTracer};
use estrace::transport::{body, HyperTransport, TracingTransport, Transport};
use http_body_util::BodyExt;
use hyper::{Method, Request};
use std::path::PathBuf;
use tracing::{info, Instrument};

/// estrace - send a traced request to Elasticsearch
#[derive(Parser, Debug)]
#[command(name = "estrace")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// HTTP method
    #[arg(short = 'X', long, default_value = "GET")]
    method: String,

    /// Request body
    #[arg(short, long)]
    data: Option<String>,

    /// Absolute URL, or a path relative to the configured backend url
    url: String,
}

fn resolve_url(base: &str, target: &str) -> String {
    if target.starts_with("http://") || target.starts_with("https://") {
        target.to_string()
    } else {
        format!(
            "{}/{}",
            base.trim_end_matches('/'),
            target.trim_start_matches('/')
        )
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load configuration from {:?}", path))?,
        None => Config::default(),
    };

    let _guard = init_subscriber(&config.tracing, &args.log_level)?;
    info!("Starting estrace v{}", estrace::VERSION);

    let transport = TracingTransport::builder(OtelTracer::global("estrace"))
        .round_tripper(HyperTransport::new())
        .apply_all(config.transport.to_opts())
        .build();

    let method = Method::from_bytes(args.method.to_uppercase().as_bytes())?;
    let url = resolve_url(&config.backend.url, &args.url);
    let request = Request::builder()
        .method(method)
        .uri(&url)
        .header(hyper::header::CONTENT_TYPE, "application/json")
        .body(match args.data {
            Some(data) => body::full(data),
            None => body::empty(),
        })?;

    let response = transport
        .send(request)
        .instrument(tracing::info_span!("estrace.probe", url = %url))
        .await
        .context("request failed")?;

    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .map_err(|err| anyhow!("failed to read response body: {}", err))?
        .to_bytes();

    info!(status = status.as_u16(), bytes = bytes.len(), "Request completed");
    println!("{}", status);
    println!("{}", String::from_utf8_lossy(&bytes));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_url() {
        assert_eq!(
            resolve_url("http://localhost:9200/", "/logs/_search"),
            "http://localhost:9200/logs/_search"
        );
        assert_eq!(
            resolve_url("http://localhost:9200", "https://es.example.com/_cat/health"),
            "https://es.example.com/_cat/health"
        );
    }
}
