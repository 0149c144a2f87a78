//! Units that produce a response.

use axum::body::Bytes;
use axum::http::header::{HeaderValue, CONTENT_TYPE, LOCATION};
use axum::http::StatusCode;

use crate::error::ConfigError;
use crate::middleware::{from_fn, Unit};

pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
pub const TEXT_HTML: &str = "text/html; charset=utf-8";
pub const APPLICATION_JSON: &str = "application/json";

/// Respond with `status`, a fixed body and a content type.
pub fn send(status: StatusCode, content_type: &str, body: impl Into<Bytes>) -> Result<Unit, ConfigError> {
    let content_type = HeaderValue::from_str(content_type).map_err(|_| ConfigError::InvalidHeaderValue {
        name: CONTENT_TYPE.to_string(),
    })?;
    let body: Bytes = body.into();

    Ok(from_fn(move |ctx| {
        let content_type = content_type.clone();
        let body = body.clone();
        Box::pin(async move {
            ctx.set_response_header(CONTENT_TYPE, content_type);
            ctx.respond(status, body);
            Ok(())
        })
    }))
}

/// Respond with a plain-text body.
pub fn send_text(status: StatusCode, body: impl Into<String>) -> Unit {
    let body = Bytes::from(body.into());
    from_fn(move |ctx| {
        let body = body.clone();
        Box::pin(async move {
            ctx.set_response_header(CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN));
            ctx.respond(status, body);
            Ok(())
        })
    })
}

/// Respond with `value` serialized as JSON.
///
/// Serialization happens once, when the unit is built.
pub fn send_json(status: StatusCode, value: &serde_json::Value) -> Unit {
    let body = Bytes::from(value.to_string());
    from_fn(move |ctx| {
        let body = body.clone();
        Box::pin(async move {
            ctx.set_response_header(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
            ctx.respond(status, body);
            Ok(())
        })
    })
}

/// Terminal fallback: `404 Not Found`.
pub fn not_found() -> Unit {
    send_text(StatusCode::NOT_FOUND, "Not Found")
}

/// Redirect to `location` with a 3xx `status`.
pub fn redirect(status: StatusCode, location: &str) -> Result<Unit, ConfigError> {
    if !status.is_redirection() {
        return Err(ConfigError::InvalidStatus(status.as_u16()));
    }
    let location = HeaderValue::from_str(location).map_err(|_| ConfigError::InvalidHeaderValue {
        name: LOCATION.to_string(),
    })?;

    Ok(from_fn(move |ctx| {
        let location = location.clone();
        Box::pin(async move {
            ctx.set_response_header(LOCATION, location);
            ctx.set_status(status);
            Ok(())
        })
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_context;
    use crate::middleware::Middleware;
    use axum::http::Method;
    use serde_json::json;

    #[tokio::test]
    async fn test_send_json() {
        let unit = send_json(StatusCode::OK, &json!({ "msg": "hello" }));
        let mut ctx = test_context(Method::GET, "/");
        unit.call(&mut ctx).await.unwrap();

        assert_eq!(ctx.status(), Some(StatusCode::OK));
        assert_eq!(ctx.response_content_type().as_deref(), Some("application/json"));
        assert_eq!(ctx.body().as_bytes().unwrap(), r#"{"msg":"hello"}"#);
    }

    #[tokio::test]
    async fn test_not_found() {
        let mut ctx = test_context(Method::GET, "/missing");
        not_found().call(&mut ctx).await.unwrap();
        assert_eq!(ctx.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(ctx.body().as_bytes().unwrap(), "Not Found");
    }

    #[tokio::test]
    async fn test_redirect() {
        let unit = redirect(StatusCode::FOUND, "/").unwrap();
        let mut ctx = test_context(Method::GET, "/go-home");
        unit.call(&mut ctx).await.unwrap();

        assert_eq!(ctx.status(), Some(StatusCode::FOUND));
        assert_eq!(ctx.response_headers().get_str("location"), Some("/"));
        assert!(redirect(StatusCode::OK, "/").is_err());
    }

    #[tokio::test]
    async fn test_send_with_content_type() {
        let unit = send(StatusCode::OK, TEXT_HTML, "<h1>hi</h1>").unwrap();
        let mut ctx = test_context(Method::GET, "/");
        unit.call(&mut ctx).await.unwrap();
        assert_eq!(ctx.response_content_type().as_deref(), Some("text/html"));

        assert!(send(StatusCode::OK, "bad\nvalue", "").is_err());
    }
}
