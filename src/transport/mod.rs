//! HTTP transport abstraction
//!
//! A [`Transport`] sends one request and yields one response. The crate ships
//! two implementations:
//!
//! - [`HyperTransport`]: plain HTTP client, the default inner transport
//! - [`TracingTransport`]: decorator that wraps another transport and
//!   records one client span per request
//!
//! # Example
//!
//! ```no_run
//! use estrace::telemetry::OtelTracer;
//! use estrace::transport::{body, TraceOpt, TracingTransport, Transport};
//! use hyper::Request;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = TracingTransport::new(
//!     OtelTracer::global("estrace"),
//!     [
//!         TraceOpt::WhitelistQueryParams(vec!["routing".into()]),
//!         TraceOpt::TagTotalHits,
//!     ],
//! );
//!
//! let request = Request::post("http://localhost:9200/logs/_search")
//!     .body(body::full(r#"{"query":{"match_all":{}}}"#))?;
//! let response = transport.send(request).await?;
//! println!("status: {}", response.status());
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use hyper::{Request, Response};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

pub mod body;
pub mod hyper_client;
pub mod options;
pub mod response;
pub mod traced;

pub use body::{Body, BoxError};
pub use hyper_client::HyperTransport;
pub use options::{TraceOpt, TraceOptions, TracingTransportBuilder};
pub use traced::TracingTransport;

/// Errors surfaced by a [`Transport`]
#[derive(Error, Debug)]
pub enum TransportError {
    /// The request could not be delivered or no response was received
    #[error("Request error: {0}")]
    Request(#[source] BoxError),

    /// A request or response body stream failed while being read
    #[error("Body read error: {0}")]
    Body(#[source] BoxError),

    /// A response body could not be decoded; the response is still available
    #[error(transparent)]
    Decode(Box<DecodeError>),
}

impl TransportError {
    /// Build a request error from any error type
    pub fn request<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Request(err.into())
    }

    /// Take back the response that came with the error, if any
    ///
    /// Only decode failures carry a response; its body replays the bytes
    /// that failed to decode.
    pub fn into_response(self) -> Option<Response<Body>> {
        match self {
            Self::Decode(err) => Some(err.into_response()),
            _ => None,
        }
    }
}

/// JSON decode failure on an inspected response body
pub struct DecodeError {
    what: &'static str,
    source: serde_json::Error,
    response: Response<Body>,
}

impl DecodeError {
    pub(crate) fn new(what: &'static str, source: serde_json::Error, response: Response<Body>) -> Self {
        Self {
            what,
            source,
            response,
        }
    }

    /// The underlying JSON error
    pub fn json_error(&self) -> &serde_json::Error {
        &self.source
    }

    /// The response whose body failed to decode
    pub fn response(&self) -> &Response<Body> {
        &self.response
    }

    /// Consume the error and return the response
    pub fn into_response(self) -> Response<Body> {
        self.response
    }
}

impl fmt::Debug for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodeError")
            .field("what", &self.what)
            .field("source", &self.source)
            .field("status", &self.response.status())
            .finish()
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to decode {} response: {}", self.what, self.source)
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

impl From<DecodeError> for TransportError {
    fn from(err: DecodeError) -> Self {
        Self::Decode(Box::new(err))
    }
}

/// A pluggable HTTP transport
///
/// Implementations must be safe to share between concurrent requests.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and wait for its response
    async fn send(&self, request: Request<Body>) -> Result<Response<Body>, TransportError>;
}

#[async_trait]
impl<T> Transport for Arc<T>
where
    T: Transport + ?Sized,
{
    async fn send(&self, request: Request<Body>) -> Result<Response<Body>, TransportError> {
        (**self).send(request).await
    }
}

#[async_trait]
impl<T> Transport for Box<T>
where
    T: Transport + ?Sized,
{
    async fn send(&self, request: Request<Body>) -> Result<Response<Body>, TransportError> {
        (**self).send(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::StatusCode;

    fn decode_error() -> DecodeError {
        let source = serde_json::from_slice::<serde_json::Value>(b"{oops").unwrap_err();
        let response = Response::builder()
            .status(StatusCode::OK)
            .body(body::full("{oops"))
            .unwrap();
        DecodeError::new("hits", source, response)
    }

    #[test]
    fn test_decode_error_keeps_response() {
        let err: TransportError = decode_error().into();
        assert!(err.to_string().starts_with("Failed to decode hits response"));

        let response = err.into_response().unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_transport_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + 'static>() {}
        assert_send_sync::<TransportError>();
        assert_send_sync::<Response<Body>>();
    }

    #[test]
    fn test_decode_error_converts_into_anyhow() {
        let err: TransportError = decode_error().into();
        let err = anyhow::Error::from(err);
        assert!(err.downcast_ref::<TransportError>().is_some());
        assert!(err.to_string().starts_with("Failed to decode hits response"));
    }

    #[test]
    fn test_transport_error_boxes_as_send_sync() {
        let err: BoxError = TransportError::request("connection refused").into();
        assert_eq!(err.to_string(), "Request error: connection refused");
    }

    #[test]
    fn test_request_error_has_no_response() {
        let err = TransportError::request("connection refused");
        assert_eq!(err.to_string(), "Request error: connection refused");
        assert!(err.into_response().is_none());
    }
}
