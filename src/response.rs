//! Outgoing HTTP response type and the [`IntoResponse`] conversion trait.
//!
//! A [`Response`] body is either bytes already in memory or a stream that is
//! forwarded to the client chunk by chunk. Handlers pick one; the server
//! never buffers a stream.

use bytes::Bytes;
use futures::TryStreamExt;
use http::header::{self, HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Full, StreamBody};
use hyper::body::Frame;

use crate::error::StoreError;
use crate::store::{ByteStream, Payload};

/// Body type handed to hyper.
///
/// Unsync because store streams are only `Send`.
pub type ResponseBody = UnsyncBoxBody<Bytes, StoreError>;

// ── ContentType ───────────────────────────────────────────────────────────────

/// Content types this service emits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentType {
    Json, // application/json
    Text, // text/plain; charset=utf-8
}

impl ContentType {
    fn header_value(self) -> HeaderValue {
        HeaderValue::from_static(match self {
            Self::Json => "application/json",
            Self::Text => "text/plain; charset=utf-8",
        })
    }
}

// ── Response ─────────────────────────────────────────────────────────────────

enum Body {
    Full(Bytes),
    Stream(ByteStream),
}

/// An outgoing HTTP response.
///
/// ```rust
/// use blockgame_assets::{ContentType, Response};
/// use http::{header, HeaderValue, StatusCode};
///
/// Response::json(br#"[]"#.to_vec());
/// Response::error(StatusCode::BAD_REQUEST, "bad input");
///
/// Response::builder()
///     .status(StatusCode::OK)
///     .header(header::CACHE_CONTROL, HeaderValue::from_static("no-store"))
///     .bytes(ContentType::Text, "hello");
/// ```
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Body,
}

impl Response {
    /// `200 OK`, `application/json`.
    pub fn json(body: impl Into<Bytes>) -> Self {
        Self::builder().json(body)
    }

    /// `200 OK`, `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        let body: String = body.into();
        Self::builder().bytes(ContentType::Text, body)
    }

    /// JSON error body of the form `{"error": "<message>"}`.
    pub fn error(status: StatusCode, message: &str) -> Self {
        let body = serde_json::json!({ "error": message }).to_string();
        Self::builder().status(status).json(body)
    }

    /// Response with no body.
    pub fn status(code: StatusCode) -> Self {
        Self { status: code, headers: HeaderMap::new(), body: Body::Full(Bytes::new()) }
    }

    /// Builder for responses that need a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: HeaderMap::new(), status: StatusCode::OK }
    }

    pub fn status_code(&self) -> StatusCode { self.status }
    pub fn headers(&self) -> &HeaderMap { &self.headers }

    /// Converts into the `http` response hyper writes to the wire.
    pub fn into_inner(self) -> http::Response<ResponseBody> {
        let body: ResponseBody = match self.body {
            Body::Full(bytes) => Full::new(bytes).map_err(|never| match never {}).boxed_unsync(),
            Body::Stream(stream) => StreamBody::new(stream.map_ok(Frame::data)).boxed_unsync(),
        };
        let mut res = http::Response::new(body);
        *res.status_mut() = self.status;
        *res.headers_mut() = self.headers;
        res
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Defaults to `200 OK`. Terminated by a
/// typed body method, which sets `content-type`.
pub struct ResponseBuilder {
    headers: HeaderMap,
    status: StatusCode,
}

impl ResponseBuilder {
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code;
        self
    }

    /// Appends a header. Repeated names are kept, not replaced.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Terminate with a JSON body (`application/json`).
    pub fn json(self, body: impl Into<Bytes>) -> Response {
        self.finish(ContentType::Json, Body::Full(body.into()))
    }

    /// Terminate with a typed in-memory body.
    pub fn bytes(self, content_type: ContentType, body: impl Into<Bytes>) -> Response {
        self.finish(content_type, Body::Full(body.into()))
    }

    /// Terminate with a streamed body. Chunks are forwarded as they arrive.
    pub fn stream(self, content_type: ContentType, body: ByteStream) -> Response {
        self.finish(content_type, Body::Stream(body))
    }

    /// Terminate with a store payload, streaming it when the store did.
    pub fn payload(self, content_type: ContentType, payload: Payload) -> Response {
        match payload {
            Payload::Buffered(bytes) => self.bytes(content_type, bytes),
            Payload::Streaming(stream) => self.stream(content_type, stream),
        }
    }

    fn finish(mut self, content_type: ContentType, body: Body) -> Response {
        self.headers.insert(header::CONTENT_TYPE, content_type.header_value());
        Response { status: self.status, headers: self.headers, body }
    }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into an HTTP [`Response`].
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response { self }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response { Response::text(self) }
}

impl IntoResponse for String {
    fn into_response(self) -> Response { Response::text(self) }
}

/// Return a bare status from a handler: `return StatusCode::NO_CONTENT`
impl IntoResponse for StatusCode {
    fn into_response(self) -> Response { Response::status(self) }
}
