//! Inbound request conversion.
//!
//! # Responsibilities
//! - Turn an axum request into a fresh `Context`
//! - Reject bodies whose declared length exceeds the configured limit
//!
//! # Design Decisions
//! - The body stream is handed to the Context unread; units decide whether
//!   to buffer it
//! - Declared size is checked before any byte is read

use axum::body::Body;
use axum::http::header::CONTENT_LENGTH;
use axum::http::{Request as HttpRequest, StatusCode};

use crate::context::{Context, Headers, Request, RequestBody};

/// Build the Context for `request`.
///
/// Fails with `413 Payload Too Large` when `Content-Length` exceeds
/// `max_body_bytes`.
pub fn into_context(request: HttpRequest<Body>, max_body_bytes: usize) -> Result<Context, StatusCode> {
    let (parts, body) = request.into_parts();

    let declared = parts
        .headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if let Some(length) = declared {
        if length > max_body_bytes {
            tracing::warn!(
                path = %parts.uri.path(),
                length,
                limit = max_body_bytes,
                "Request body too large"
            );
            return Err(StatusCode::PAYLOAD_TOO_LARGE);
        }
    }

    let request = Request::new(parts.method, &parts.uri, Headers::from(&parts.headers));
    Ok(Context::new(request, RequestBody::new(body)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;

    #[tokio::test]
    async fn test_into_context() {
        let request = HttpRequest::builder()
            .method(Method::POST)
            .uri("/upload?x=1")
            .header("host", "Example.COM:8080")
            .body(Body::from("hello"))
            .unwrap();

        let mut ctx = into_context(request, 1024).unwrap();
        assert_eq!(*ctx.request().method(), Method::POST);
        assert_eq!(ctx.request().path(), "/upload");
        assert_eq!(ctx.request().query(), Some("x=1"));
        assert_eq!(ctx.request().hostname(), Some("example.com"));
        assert!(!ctx.is_responded());
        assert_eq!(ctx.read_request_body(1024).await.unwrap(), "hello");
    }

    #[test]
    fn test_declared_length_over_limit() {
        let request = HttpRequest::builder()
            .uri("/")
            .header("content-length", "2048")
            .body(Body::empty())
            .unwrap();
        assert_eq!(into_context(request, 1024).unwrap_err(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
