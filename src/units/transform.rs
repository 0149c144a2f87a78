//! Response body rewriting.

use std::sync::Arc;

use axum::body::Bytes;
use axum::http::header::CONTENT_LENGTH;

use crate::error::PipelineError;
use crate::middleware::{from_fn, Unit};

/// Largest body `transform_string` will buffer.
pub const DEFAULT_TRANSFORM_LIMIT: usize = 8 * 1024 * 1024;

/// Rewrite a UTF-8 response body with `f`.
///
/// Streaming bodies are buffered first. Does nothing when no body is set.
pub fn transform_string<F>(f: F) -> Unit
where
    F: Fn(String) -> String + Send + Sync + 'static,
{
    transform_string_with_limit(DEFAULT_TRANSFORM_LIMIT, f)
}

/// Like [`transform_string`], but bodies over `limit` bytes are sent unchanged.
pub fn transform_string_with_limit<F>(limit: usize, f: F) -> Unit
where
    F: Fn(String) -> String + Send + Sync + 'static,
{
    let f = Arc::new(f);
    from_fn(move |ctx| {
        let f = f.clone();
        Box::pin(async move {
            let Some(bytes) = ctx.buffer_response_body(limit).await? else {
                return Ok(());
            };
            let text = String::from_utf8(bytes.to_vec()).map_err(|_| PipelineError::InvalidUtf8)?;
            let transformed = (*f)(text);

            ctx.response_headers_mut().remove(&CONTENT_LENGTH);
            ctx.set_body(Bytes::from(transformed));
            Ok(())
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_context;
    use crate::middleware::Middleware;
    use axum::body::Body;
    use axum::http::Method;

    #[tokio::test]
    async fn test_prepends_banner() {
        let unit = transform_string(|body| format!("// banner\n{body}"));

        let mut ctx = test_context(Method::GET, "/app.js");
        ctx.set_body(Body::from("let x = 1;"));
        unit.call(&mut ctx).await.unwrap();

        assert_eq!(ctx.body().as_bytes().unwrap(), "// banner\nlet x = 1;");
    }

    #[tokio::test]
    async fn test_no_body_is_untouched() {
        let unit = transform_string(|body| body.to_uppercase());
        let mut ctx = test_context(Method::GET, "/");
        unit.call(&mut ctx).await.unwrap();
        assert!(!ctx.is_responded());
    }

    #[tokio::test]
    async fn test_binary_body_fails() {
        let unit = transform_string(|body| body);
        let mut ctx = test_context(Method::GET, "/");
        ctx.set_body(vec![0xff, 0xfe]);
        assert!(matches!(unit.call(&mut ctx).await, Err(PipelineError::InvalidUtf8)));
    }

    #[tokio::test]
    async fn test_stream_over_limit_is_untouched() {
        let chunks: Vec<_> = ["let a = 1;\n", "let b = 2;\n", "let c = 3;\n"]
            .into_iter()
            .map(|c| Ok::<_, std::io::Error>(Bytes::from_static(c.as_bytes())))
            .collect();
        let unit = transform_string_with_limit(16, |body| body.to_uppercase());

        let mut ctx = test_context(Method::GET, "/app.js");
        ctx.set_body(Body::from_stream(futures_util::stream::iter(chunks)));
        unit.call(&mut ctx).await.unwrap();

        let (_, _, body) = ctx.into_response_parts();
        let sent = axum::body::to_bytes(body.into_body(), usize::MAX).await.unwrap();
        assert_eq!(sent, "let a = 1;\nlet b = 2;\nlet c = 3;\n");
    }
}
