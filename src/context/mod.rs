//! Per-request context.
//!
//! # Data Flow
//! ```text
//! transport builds Context (request facet frozen, response facet empty)
//!     → units read request(), write status/headers/body
//!     → is_responded() flips to true on first status or body write
//!     → transport sends the response facet
//! ```
//!
//! # Design Decisions
//! - Fields are private; the request facet is only reachable through `&Request`
//! - "Responded" is derived from the response facet and there is no setter
//!   that clears a status or body, so it can never revert
//! - One Context per request, never shared across tasks

pub mod body;
pub mod headers;

use std::time::{Duration, Instant};

use axum::body::{Body, Bytes, HttpBody};
use axum::http::header::{HeaderName, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE, HOST};
use axum::http::{Method, StatusCode, Uri};
use futures_util::stream::{self, StreamExt};

use crate::error::Result;

pub use body::{RequestBody, ResponseBody};
pub use headers::Headers;

/// Read-only view of the inbound request.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    query: Option<String>,
    hostname: Option<String>,
    headers: Headers,
}

impl Request {
    pub fn new(method: Method, uri: &Uri, headers: Headers) -> Self {
        let hostname = headers
            .get_str(HOST)
            .or_else(|| uri.authority().map(|a| a.as_str()))
            .and_then(parse_hostname);

        Self {
            method,
            path: uri.path().to_string(),
            query: uri.query().map(str::to_string),
            hostname,
            headers,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Lowercased host without port.
    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }
}

/// Strip the port from a `Host` value. IPv6 literals keep their brackets.
fn parse_hostname(host: &str) -> Option<String> {
    let host = host.trim();
    // authority may carry userinfo
    let host = host.rsplit('@').next().unwrap_or(host);

    let name = if host.starts_with('[') {
        let end = host.find(']')?;
        &host[..=end]
    } else {
        host.split(':').next().unwrap_or(host)
    };

    if name.is_empty() {
        None
    } else {
        Some(name.to_ascii_lowercase())
    }
}

/// Mutable record threaded through the pipeline for one request.
#[derive(Debug)]
pub struct Context {
    id: String,
    started_at: Instant,
    request: Request,
    request_body: RequestBody,
    status: Option<StatusCode>,
    response_headers: Headers,
    body: ResponseBody,
}

impl Context {
    pub fn new(request: Request, body: RequestBody) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            started_at: Instant::now(),
            request,
            request_body: body,
            status: None,
            response_headers: Headers::new(),
            body: ResponseBody::Unset,
        }
    }

    /// Build a context with an empty body and a `Host` header taken from the
    /// URI authority, if it has one.
    pub fn from_uri(method: Method, uri: Uri) -> Self {
        let mut headers = Headers::new();
        if let Some(value) = uri
            .authority()
            .and_then(|a| HeaderValue::from_str(a.as_str()).ok())
        {
            headers.append(HOST, value);
        }
        Self::new(Request::new(method, &uri, headers), RequestBody::empty())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Take the raw request body stream. Fails on the second call.
    pub fn take_request_body(&mut self) -> Result<Body> {
        self.request_body.take()
    }

    /// Buffer the request body, up to `limit` bytes. Fails on the second call.
    pub async fn read_request_body(&mut self, limit: usize) -> Result<Bytes> {
        self.request_body.read_to_bytes(limit).await
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    pub fn response_headers(&self) -> &Headers {
        &self.response_headers
    }

    pub fn response_headers_mut(&mut self) -> &mut Headers {
        &mut self.response_headers
    }

    /// Replace any value of a response header.
    pub fn set_response_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.response_headers.insert(name, value);
    }

    /// Essence of the response content type (`text/html` for
    /// `text/html; charset=utf-8`), lowercased.
    pub fn response_content_type(&self) -> Option<String> {
        self.response_headers.get_str(CONTENT_TYPE).map(|ct| {
            ct.split(';')
                .next()
                .unwrap_or(ct)
                .trim()
                .to_ascii_lowercase()
        })
    }

    pub fn body(&self) -> &ResponseBody {
        &self.body
    }

    pub fn set_body(&mut self, body: impl Into<ResponseBody>) {
        let body = body.into();
        // Unset would revert a responded context with no status
        if body.is_set() {
            self.body = body;
        }
    }

    /// Set status and body in one step.
    pub fn respond(&mut self, status: StatusCode, body: impl Into<ResponseBody>) {
        self.set_status(status);
        self.set_body(body);
    }

    /// Collect a streaming response body into memory and return it.
    ///
    /// Returns `None` when no body has been set, or when the body is larger
    /// than `limit`; an oversized stream is left in place, chunks already read
    /// included, so it can still be sent as-is. While the stream is read the
    /// body holds an empty buffer, so the context stays responded even if the
    /// read fails.
    pub async fn buffer_response_body(&mut self, limit: usize) -> Result<Option<&Bytes>> {
        let declared = self
            .response_headers
            .get_str(CONTENT_LENGTH)
            .and_then(|v| v.trim().parse::<u64>().ok());
        if let ResponseBody::Stream(stream) = &self.body {
            let hinted = stream.size_hint().lower();
            if hinted > limit as u64 || declared.is_some_and(|len| len > limit as u64) {
                return Ok(None);
            }
        }

        if matches!(self.body, ResponseBody::Stream(_)) {
            let placeholder = ResponseBody::Full(Bytes::new());
            if let ResponseBody::Stream(stream) = std::mem::replace(&mut self.body, placeholder) {
                let mut data = stream.into_data_stream();
                let mut chunks: Vec<Bytes> = Vec::new();
                let mut total = 0;
                while let Some(chunk) = data.next().await {
                    let chunk = chunk?;
                    total += chunk.len();
                    chunks.push(chunk);
                    if total > limit {
                        let head = stream::iter(chunks.into_iter().map(Ok::<_, axum::Error>));
                        self.body = ResponseBody::Stream(Body::from_stream(head.chain(data)));
                        return Ok(None);
                    }
                }

                let mut joined = Vec::with_capacity(total);
                for chunk in &chunks {
                    joined.extend_from_slice(chunk);
                }
                self.body = ResponseBody::Full(Bytes::from(joined));
            }
        }
        Ok(self.body.as_bytes())
    }

    /// True once a status or a body has been assigned.
    pub fn is_responded(&self) -> bool {
        self.status.is_some() || self.body.is_set()
    }

    /// Split into the parts the transport needs to send.
    pub fn into_response_parts(self) -> (Option<StatusCode>, Headers, ResponseBody) {
        (self.status, self.response_headers, self.body)
    }
}

#[cfg(test)]
pub(crate) fn test_context(method: Method, uri: &str) -> Context {
    Context::from_uri(method, uri.parse().unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hostname_parsing() {
        assert_eq!(parse_hostname("Foo.Localhost:8080").as_deref(), Some("foo.localhost"));
        assert_eq!(parse_hostname("example.com").as_deref(), Some("example.com"));
        assert_eq!(parse_hostname("[::1]:3000").as_deref(), Some("[::1]"));
        assert_eq!(parse_hostname("user@host.test:1").as_deref(), Some("host.test"));
        assert_eq!(parse_hostname(""), None);
        assert_eq!(parse_hostname(":80"), None);
    }

    #[test]
    fn test_request_facet() {
        let ctx = test_context(Method::GET, "http://foo.localhost:8080/products/42?x=1");
        assert_eq!(*ctx.request().method(), Method::GET);
        assert_eq!(ctx.request().path(), "/products/42");
        assert_eq!(ctx.request().query(), Some("x=1"));
        assert_eq!(ctx.request().hostname(), Some("foo.localhost"));
    }

    #[test]
    fn test_ids_are_unique() {
        let a = test_context(Method::GET, "/");
        let b = test_context(Method::GET, "/");
        assert_ne!(a.id(), b.id());
        assert_eq!(a.id().len(), 36);
    }

    #[test]
    fn test_responded_is_monotonic() {
        let mut ctx = test_context(Method::GET, "/");
        assert!(!ctx.is_responded());

        ctx.set_body("hi");
        assert!(ctx.is_responded());

        ctx.set_body(ResponseBody::Unset);
        assert!(ctx.is_responded());
        assert_eq!(ctx.body().as_bytes().unwrap(), "hi");

        let mut ctx = test_context(Method::GET, "/");
        ctx.set_status(StatusCode::NO_CONTENT);
        assert!(ctx.is_responded());
    }

    #[test]
    fn test_content_type_essence() {
        let mut ctx = test_context(Method::GET, "/");
        assert_eq!(ctx.response_content_type(), None);

        ctx.set_response_header(CONTENT_TYPE, HeaderValue::from_static("Text/HTML; charset=utf-8"));
        assert_eq!(ctx.response_content_type().as_deref(), Some("text/html"));
    }

    #[tokio::test]
    async fn test_buffer_streaming_body() {
        let mut ctx = test_context(Method::GET, "/");
        assert!(ctx.buffer_response_body(64).await.unwrap().is_none());

        ctx.set_body(Body::from("streamed"));
        let bytes = ctx.buffer_response_body(64).await.unwrap().cloned();
        assert_eq!(bytes.unwrap(), "streamed");
        assert!(matches!(ctx.body(), ResponseBody::Full(_)));
    }

    fn chunked(chunks: &[&'static str]) -> Body {
        let chunks: Vec<_> = chunks
            .iter()
            .map(|c| Ok::<_, std::io::Error>(Bytes::from_static(c.as_bytes())))
            .collect();
        Body::from_stream(stream::iter(chunks))
    }

    #[tokio::test]
    async fn test_oversized_stream_is_kept() {
        let mut ctx = test_context(Method::GET, "/");
        ctx.set_body(chunked(&["0123", "4567", "89ab", "cdef"]));

        assert!(ctx.buffer_response_body(6).await.unwrap().is_none());
        assert!(matches!(ctx.body(), ResponseBody::Stream(_)));

        let (_, _, body) = ctx.into_response_parts();
        let sent = axum::body::to_bytes(body.into_body(), usize::MAX).await.unwrap();
        assert_eq!(sent, "0123456789abcdef");
    }

    #[tokio::test]
    async fn test_declared_length_over_limit_skips_read() {
        let mut ctx = test_context(Method::GET, "/");
        ctx.set_response_header(CONTENT_LENGTH, HeaderValue::from_static("1048576"));
        ctx.set_body(chunked(&["small"]));

        assert!(ctx.buffer_response_body(1024).await.unwrap().is_none());
        assert!(matches!(ctx.body(), ResponseBody::Stream(_)));
    }

    #[tokio::test]
    async fn test_request_body_consumed_once() {
        let uri: Uri = "/upload".parse().unwrap();
        let request = Request::new(Method::POST, &uri, Headers::new());
        let mut ctx = Context::new(request, RequestBody::new(Body::from("payload")));

        assert_eq!(ctx.read_request_body(1024).await.unwrap(), "payload");
        assert!(ctx.take_request_body().is_err());
    }
}
