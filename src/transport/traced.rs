//! Tracing transport decorator
//!
//! Wraps another [`Transport`] and records one client span per request.
//!
//! # Span names
//!
//! Spans start as `<prefix>/<METHOD>`. GET and POST requests are renamed
//! after the endpoint when the path makes it obvious:
//!
//! | Path | Span name |
//! |------|-----------|
//! | `/logs/_search` | `es/_search` |
//! | `/logs/_doc/_count` | `es/_count` |
//! | `/_tasks/node:42` | `es/_tasks` |
//! | `/logs/_doc/42` | `es/GET` |
//!
//! # Tags
//!
//! | Tag | When |
//! |-----|------|
//! | `http.method`, `http.path` | always |
//! | `<prefix>.query_params.<name>` | whitelisted, non-empty query parameter |
//! | `<prefix>.query` | request body of non-GET requests, with `TagQuery` |
//! | `http.status_code` | a response was received |
//! | `error` | transport error text, error `type`, or the status code |
//! | `<prefix>.hits.total`, `<prefix>.shards.total` | positive counts, with `TagTotalHits` / `TagTotalShards` |

use super::body::{self, Body};
use super::options::{TraceOpt, TraceOptions, TracingTransportBuilder};
use super::response::{CountSelection, ErrorResponse};
use super::{DecodeError, Transport, TransportError};
use crate::telemetry::tracer::{TAG_ERROR, TAG_HTTP_METHOD, TAG_HTTP_PATH, TAG_HTTP_STATUS_CODE};
use crate::telemetry::{Logger, SpanGuard, Tracer};
use async_trait::async_trait;
use hyper::{Method, Request, Response};
use opentelemetry::trace::SpanKind;
use opentelemetry::Context;
use percent_encoding::percent_decode_str;
use std::sync::Arc;
use tracing::debug;
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// First path segment that names the task management API
const TASKS_SEGMENT: &str = "tasks";

/// Transport decorator recording one span per request
///
/// The request and response are forwarded unchanged. Bodies that have to be
/// inspected are buffered and handed on as a fresh body with the same bytes.
///
/// A non-2xx response is not an error: it is tagged and returned, and the
/// caller checks the status.
pub struct TracingTransport {
    tracer: Arc<dyn Tracer>,
    inner: Arc<dyn Transport>,
    logger: Arc<dyn Logger>,
    options: TraceOptions,
}

impl TracingTransport {
    /// Create a transport from a tracer and options applied in order
    pub fn new<T, I>(tracer: T, opts: I) -> Self
    where
        T: Tracer + 'static,
        I: IntoIterator<Item = TraceOpt>,
    {
        TracingTransportBuilder::new(tracer).apply_all(opts).build()
    }

    pub fn builder<T>(tracer: T) -> TracingTransportBuilder
    where
        T: Tracer + 'static,
    {
        TracingTransportBuilder::new(tracer)
    }

    pub(crate) fn from_parts(
        tracer: Arc<dyn Tracer>,
        inner: Arc<dyn Transport>,
        logger: Arc<dyn Logger>,
        options: TraceOptions,
    ) -> Self {
        Self {
            tracer,
            inner,
            logger,
            options,
        }
    }

    pub fn options(&self) -> &TraceOptions {
        &self.options
    }

    fn prefixed(&self, suffix: &str) -> String {
        format!("{}/{}", self.options.backend_prefix, suffix)
    }

    fn tag_key(&self, suffix: &str) -> String {
        format!("{}.{}", self.options.backend_prefix, suffix)
    }

    fn tag_query_params(&self, span: &mut SpanGuard, query: Option<&str>) {
        if self.options.whitelist_query_params.is_empty() {
            return;
        }
        let Some(query) = query else {
            return;
        };

        for name in &self.options.whitelist_query_params {
            if let Some(value) = query_param(query, name).filter(|v| !v.is_empty()) {
                span.tag(&self.tag_key(&format!("query_params.{}", name)), value);
            }
        }
    }

    /// Buffer the request body and tag it as the query
    async fn tag_request_body(
        &self,
        span: &mut SpanGuard,
        request: Request<Body>,
    ) -> Result<Request<Body>, TransportError> {
        let (parts, body) = request.into_parts();
        let (bytes, replay) = match body::buffer(body).await {
            Ok(buffered) => buffered,
            Err(err) => {
                self.logger.warn(format_args!(
                    "failed to read the request body to tag the query: {}",
                    err
                ));
                return Err(TransportError::Body(err));
            }
        };

        if !bytes.is_empty() {
            span.tag(
                &self.tag_key("query"),
                String::from_utf8_lossy(&bytes).into_owned(),
            );
        }

        Ok(Request::from_parts(parts, replay))
    }

    /// Tag a non-2xx response
    async fn tag_error_response(
        &self,
        span: &mut SpanGuard,
        response: Response<Body>,
    ) -> Result<Response<Body>, TransportError> {
        let status = response.status().as_u16().to_string();
        if !self.options.tag_error_type {
            span.tag(TAG_ERROR, status);
            return Ok(response);
        }

        let (parts, body) = response.into_parts();
        let (bytes, replay) = match body::buffer(body).await {
            Ok(buffered) => buffered,
            Err(err) => {
                self.logger.warn(format_args!(
                    "failed to read the response body to tag the error: {}",
                    err
                ));
                return Err(TransportError::Body(err));
            }
        };
        let response = Response::from_parts(parts, replay);

        let error = match serde_json::from_slice::<ErrorResponse>(&bytes) {
            Ok(error) => error,
            Err(err) => return Err(DecodeError::new("error", err, response).into()),
        };

        if error.error_type.is_empty() {
            span.tag(TAG_ERROR, status);
        } else {
            span.tag(TAG_ERROR, error.error_type);
        }

        Ok(response)
    }

    /// Tag hit and shard counts of a successful response
    async fn tag_result_counts(
        &self,
        span: &mut SpanGuard,
        selection: CountSelection,
        response: Response<Body>,
    ) -> Result<Response<Body>, TransportError> {
        let (parts, body) = response.into_parts();
        let (bytes, replay) = match body::buffer(body).await {
            Ok(buffered) => buffered,
            Err(err) => {
                self.logger.warn(format_args!(
                    "failed to read the response body to tag the response values: {}",
                    err
                ));
                return Err(TransportError::Body(err));
            }
        };
        let response = Response::from_parts(parts, replay);

        let counts = match selection.parse(&bytes) {
            Ok(counts) => counts,
            Err(err) => return Err(DecodeError::new("result", err, response).into()),
        };

        if let Some(shards) = counts.shards {
            span.tag(&self.tag_key("shards.total"), shards.to_string());
        }
        if let Some(hits) = counts.hits {
            span.tag(&self.tag_key("hits.total"), hits.to_string());
        }

        Ok(response)
    }
}

impl std::fmt::Debug for TracingTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TracingTransport")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for TracingTransport {
    async fn send(&self, request: Request<Body>) -> Result<Response<Body>, TransportError> {
        let parent = request
            .extensions()
            .get::<Context>()
            .cloned()
            .unwrap_or_else(|| tracing::Span::current().context());

        let method = request.method().clone();
        let Some(span) =
            self.tracer
                .start_span(&parent, self.prefixed(method.as_str()), SpanKind::Client)
        else {
            debug!(method = %method, "Span not sampled, passing request through");
            return self.inner.send(request).await;
        };
        let mut span = SpanGuard::new(span);

        let path = request.uri().path().to_owned();
        span.tag(TAG_HTTP_METHOD, method.as_str());
        span.tag(TAG_HTTP_PATH, path.as_str());
        self.tag_query_params(&mut span, request.uri().query());

        if method == Method::GET || method == Method::POST {
            if let Some(endpoint) = endpoint_name(&path) {
                debug!(path = %path, endpoint, "Naming span after endpoint");
                span.set_name(self.prefixed(endpoint));
            }
        }

        let mut request = request;
        if self.options.tag_query && method != Method::GET && !body::is_empty(request.body()) {
            debug!(method = %method, "Buffering request body to tag the query");
            request = self.tag_request_body(&mut span, request).await?;
        }

        let response = match self.inner.send(request).await {
            Ok(response) => response,
            Err(err) => {
                span.tag(TAG_ERROR, err.to_string());
                return Err(err);
            }
        };

        let status = response.status();
        span.tag(TAG_HTTP_STATUS_CODE, status.as_u16().to_string());

        if !status.is_success() {
            debug!(status = status.as_u16(), "Tagging error response");
            return self.tag_error_response(&mut span, response).await;
        }

        match CountSelection::from_toggles(self.options.tag_total_hits, self.options.tag_total_shards)
        {
            Some(selection) => {
                debug!(?selection, "Buffering response body to tag result counts");
                self.tag_result_counts(&mut span, selection, response).await
            }
            None => Ok(response),
        }
    }
}

/// Endpoint a GET or POST path addresses, if it names one
///
/// `tasks` (or `_tasks`) as the first segment maps to `_tasks`; otherwise a
/// last segment starting with `_`, such as `_search` or `_count`, is used.
fn endpoint_name(path: &str) -> Option<&str> {
    let mut segments = path.trim_matches('/').split('/');
    let first = segments.next().unwrap_or_default();
    if first == TASKS_SEGMENT || first.strip_prefix('_') == Some(TASKS_SEGMENT) {
        return Some("_tasks");
    }

    let last = segments.last().unwrap_or(first);
    if last.starts_with('_') {
        Some(last)
    } else {
        None
    }
}

/// First value of `name` in a query string, percent-decoded
fn query_param(query: &str, name: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        if decode_component(key) == name {
            Some(decode_component(value))
        } else {
            None
        }
    })
}

fn decode_component(component: &str) -> String {
    let component = component.replace('+', " ");
    percent_decode_str(&component)
        .decode_utf8_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_name_from_last_segment() {
        assert_eq!(endpoint_name("/logs/_search"), Some("_search"));
        assert_eq!(endpoint_name("/logs/_doc/_count/"), Some("_count"));
        assert_eq!(endpoint_name("_bulk"), Some("_bulk"));
        assert_eq!(endpoint_name("/logs/_doc/42"), None);
    }

    #[test]
    fn test_endpoint_name_for_tasks() {
        assert_eq!(endpoint_name("/tasks"), Some("_tasks"));
        assert_eq!(endpoint_name("/tasks/node:42"), Some("_tasks"));
        assert_eq!(endpoint_name("/_tasks/node:42/_cancel"), Some("_tasks"));
        assert_eq!(endpoint_name("/logs/tasks"), None);
    }

    #[test]
    fn test_endpoint_name_empty_segments() {
        assert_eq!(endpoint_name(""), None);
        assert_eq!(endpoint_name("/"), None);
        assert_eq!(endpoint_name("//"), None);
        assert_eq!(endpoint_name("/logs//"), None);
    }

    #[test]
    fn test_query_param_lookup() {
        let query = "routing=user%3A1&preference=_local&q=title+rust&empty=&flag";
        assert_eq!(query_param(query, "routing"), Some("user:1".to_string()));
        assert_eq!(query_param(query, "preference"), Some("_local".to_string()));
        assert_eq!(query_param(query, "q"), Some("title rust".to_string()));
        assert_eq!(query_param(query, "empty"), Some(String::new()));
        assert_eq!(query_param(query, "flag"), Some(String::new()));
        assert_eq!(query_param(query, "size"), None);
    }

    #[test]
    fn test_query_param_first_value_wins() {
        assert_eq!(
            query_param("routing=a&routing=b", "routing"),
            Some("a".to_string())
        );
    }
}
