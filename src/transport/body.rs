//! One-shot body type and body replay
//!
//! Request and response bodies are streams that can be read once. Whenever a
//! body has to be inspected it is buffered with [`buffer`] and replaced by a
//! fresh body carrying the same bytes, so whoever reads it next sees it
//! unconsumed.

use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Empty, Full};
use hyper::body::Body as HttpBody;

/// Boxed error type used by body streams and transports
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Body type flowing through every [`Transport`](super::Transport)
///
/// `Sync`, so a [`TransportError`](super::TransportError) holding a response is too.
pub type Body = BoxBody<Bytes, BoxError>;

/// A body holding the given bytes
pub fn full(data: impl Into<Bytes>) -> Body {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

/// An empty body
pub fn empty() -> Body {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed()
}

/// Box any compatible body into a [`Body`]
pub fn boxed<B>(body: B) -> Body
where
    B: HttpBody<Data = Bytes> + Send + Sync + 'static,
    B::Error: Into<BoxError>,
{
    body.map_err(Into::into).boxed()
}

/// Read a body to the end
///
/// Returns the collected bytes and a replacement body that yields the same
/// bytes again. Trailers are not preserved.
pub async fn buffer(body: Body) -> Result<(Bytes, Body), BoxError> {
    let bytes = body.collect().await?.to_bytes();
    let replay = full(bytes.clone());
    Ok((bytes, replay))
}

/// Whether the body is known to carry no data
///
/// A body reports this when it is already at end of stream, e.g. [`empty`]
/// or [`full`] with no bytes.
pub fn is_empty(body: &Body) -> bool {
    body.is_end_stream()
}
