//! Shared helpers for transport tests

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use estrace::transport::{body, Body, BoxError, Transport, TransportError};
use futures::stream;
use http_body_util::{BodyExt, StreamBody};
use hyper::body::Frame;
use hyper::{Method, Request, Response, StatusCode};
use parking_lot::Mutex;
use std::fmt;
use std::io;
use std::sync::Arc;

/// A request as seen by the stub transport
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: Method,
    pub uri: String,
    pub body: Bytes,
}

enum Reply {
    Response { status: StatusCode, body: Bytes },
    BrokenBody { status: StatusCode },
    Error(String),
    Hang,
}

/// Inner transport returning a canned reply and recording what it received
#[derive(Clone)]
pub struct StubTransport {
    reply: Arc<Reply>,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

impl StubTransport {
    pub fn respond(status: u16, body: &'static str) -> Self {
        Self::with_reply(Reply::Response {
            status: StatusCode::from_u16(status).unwrap(),
            body: Bytes::from_static(body.as_bytes()),
        })
    }

    /// Responds with a body stream that fails half way
    pub fn broken_body(status: u16) -> Self {
        Self::with_reply(Reply::BrokenBody {
            status: StatusCode::from_u16(status).unwrap(),
        })
    }

    pub fn fail(message: &str) -> Self {
        Self::with_reply(Reply::Error(message.to_string()))
    }

    /// Never answers
    pub fn hang() -> Self {
        Self::with_reply(Reply::Hang)
    }

    fn with_reply(reply: Reply) -> Self {
        Self {
            reply: Arc::new(reply),
            seen: Arc::default(),
        }
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.seen.lock().clone()
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn send(&self, request: Request<Body>) -> Result<Response<Body>, TransportError> {
        let (parts, body) = request.into_parts();
        let body = body.collect().await.map_err(TransportError::Body)?.to_bytes();
        self.seen.lock().push(SeenRequest {
            method: parts.method,
            uri: parts.uri.to_string(),
            body,
        });

        match &*self.reply {
            Reply::Response { status, body } => Ok(Response::builder()
                .status(*status)
                .header("content-type", "application/json")
                .body(body::full(body.clone()))
                .unwrap()),
            Reply::BrokenBody { status } => Ok(Response::builder()
                .status(*status)
                .body(broken_body())
                .unwrap()),
            Reply::Error(message) => Err(TransportError::request(message.clone())),
            Reply::Hang => futures::future::pending().await,
        }
    }
}

/// Body that yields one chunk and then fails
pub fn broken_body() -> Body {
    let frames: Vec<Result<Frame<Bytes>, BoxError>> = vec![
        Ok(Frame::data(Bytes::from_static(b"{\"hits\":"))),
        Err("connection reset by peer".into()),
    ];
    body::boxed(StreamBody::new(stream::iter(frames)))
}

/// Logger keeping every warning
#[derive(Clone, Default)]
pub struct CapturingLogger {
    lines: Arc<Mutex<Vec<String>>>,
}

impl CapturingLogger {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

impl estrace::telemetry::Logger for CapturingLogger {
    fn warn(&self, args: fmt::Arguments<'_>) {
        self.lines.lock().push(args.to_string());
    }
}

pub async fn read_body(response: Response<Body>) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

/// Log output captured from the `tracing` macros on the current thread
#[derive(Clone, Default)]
pub struct CapturedLogs {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.lock().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Route debug-level logs into a buffer until the guard is dropped
pub fn capture_logs() -> (tracing::subscriber::DefaultGuard, CapturedLogs) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    (tracing::subscriber::set_default(subscriber), logs)
}
