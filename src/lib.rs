//! estrace Library
//!
//! Distributed tracing for outbound Elasticsearch requests.
//!
//! # Features
//!
//! - **Transport Decorator**: wraps any [`transport::Transport`] and records
//!   one client span per request
//! - **Endpoint Span Names**: `es/_search`, `es/_count`, `es/_tasks`, ...
//! - **Opt-in Tags**: whitelisted query parameters, request body, error
//!   type, total hits and total shards
//! - **Unchanged Traffic**: inspected bodies are replayed byte for byte
//! - **OpenTelemetry**: spans go through any OpenTelemetry tracer
//!
//! # Example
//!
//! ```no_run
//! use estrace::telemetry::OtelTracer;
//! use estrace::transport::{body, Transport, TracingTransport};
//! use hyper::Request;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let transport = TracingTransport::builder(OtelTracer::global("search-api"))
//!         .whitelist_query_params(["routing"])
//!         .tag_total_hits()
//!         .build();
//!
//!     let request = Request::get("http://localhost:9200/logs/_search?routing=user1")
//!         .body(body::empty())?;
//!     let response = transport.send(request).await?;
//!     println!("{}", response.status());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod telemetry;
pub mod transport;

// Re-export commonly used types
pub use config::Config;
pub use transport::{TraceOpt, TracingTransport, Transport, TransportError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
