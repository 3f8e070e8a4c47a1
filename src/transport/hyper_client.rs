//! Default inner transport backed by the hyper client

use super::body::{self, Body};
use super::{Transport, TransportError};
use async_trait::async_trait;
use hyper::{Request, Response};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

/// Plain HTTP/1.1 and HTTP/2 transport with connection pooling
///
/// This is the transport a [`TracingTransport`](super::TracingTransport)
/// delegates to unless another one is injected.
#[derive(Clone)]
pub struct HyperTransport {
    client: Client<HttpConnector, Body>,
}

impl HyperTransport {
    /// Create a transport with a fresh connection pool
    pub fn new() -> Self {
        let client = Client::builder(TokioExecutor::new()).build_http();
        Self { client }
    }

    /// Wrap an already configured hyper client
    pub fn from_client(client: Client<HttpConnector, Body>) -> Self {
        Self { client }
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransport").finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for HyperTransport {
    async fn send(&self, request: Request<Body>) -> Result<Response<Body>, TransportError> {
        let response = self
            .client
            .request(request)
            .await
            .map_err(TransportError::request)?;

        Ok(response.map(body::boxed))
    }
}
