//! Outbound response conversion.
//!
//! # Responsibilities
//! - Turn a processed `Context` into an axum response
//! - Map pipeline failures to a generic `500`
//!
//! # Design Decisions
//! - A body without a status is sent as `200 OK`
//! - An unresponded Context is a pipeline bug, answered with `500` and logged
//!   at error level
//! - Error details stay in the logs, never in the response body

use axum::body::Body;
use axum::http::header::{HeaderValue, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::Response;

use crate::context::Context;
use crate::error::PipelineError;
use crate::observability::metrics;

/// Send the response facet of `ctx`.
pub fn from_context(ctx: Context) -> Response {
    if !ctx.is_responded() {
        tracing::error!(
            request_id = %ctx.id(),
            path = %ctx.request().path(),
            "Pipeline produced no response"
        );
        metrics::record_pipeline_error("unresponded");
        return internal_error();
    }

    let (status, headers, body) = ctx.into_response_parts();
    let mut response = Response::new(body.into_body());
    *response.status_mut() = status.unwrap_or(StatusCode::OK);
    *response.headers_mut() = headers.to_header_map();
    response
}

/// Answer a failed pipeline run.
pub fn from_error(request_id: &str, error: &PipelineError) -> Response {
    tracing::error!(request_id = %request_id, error = %error, "Pipeline failed");
    metrics::record_pipeline_error(error.kind());
    internal_error()
}

/// Fixed response with `status` and its canonical reason as body.
pub fn plain_status(status: StatusCode) -> Response {
    let reason = status.canonical_reason().unwrap_or("Error");
    let mut response = Response::new(Body::from(reason));
    *response.status_mut() = status;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

pub fn internal_error() -> Response {
    plain_status(StatusCode::INTERNAL_SERVER_ERROR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_context;
    use axum::http::Method;

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_body_without_status_is_ok() {
        let mut ctx = test_context(Method::GET, "/");
        ctx.set_response_header(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        ctx.set_body("hi");

        let response = from_context(ctx);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain");
        assert_eq!(body_string(response).await, "hi");
    }

    #[tokio::test]
    async fn test_status_without_body() {
        let mut ctx = test_context(Method::GET, "/");
        ctx.set_status(StatusCode::NO_CONTENT);
        let response = from_context(ctx);
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(body_string(response).await, "");
    }

    #[test]
    fn test_unresponded_is_500() {
        let response = from_context(test_context(Method::GET, "/"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_error_hides_details() {
        let response = from_error("abc", &PipelineError::InvalidUtf8);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_string(response).await, "Internal Server Error");
    }
}
