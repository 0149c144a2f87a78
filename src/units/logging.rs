//! Request logging unit.

use crate::middleware::{from_fn, Unit};
use crate::observability::metrics;

/// Emit one structured `info` event per request and record request metrics.
///
/// Place it last in a `chain_all` stage so it sees the final status.
pub fn log_request() -> Unit {
    from_fn(|ctx| {
        Box::pin(async move {
            let status = ctx.status().map(|s| s.as_u16()).unwrap_or(0);
            let elapsed = ctx.elapsed();
            let request = ctx.request();

            tracing::info!(
                request_id = %ctx.id(),
                method = %request.method(),
                path = %request.path(),
                host = request.hostname().unwrap_or("-"),
                status,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                "Request handled"
            );
            metrics::record_request(request.method().as_str(), status, elapsed);
            Ok(())
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_context;
    use crate::middleware::Middleware;
    use axum::http::{Method, StatusCode};

    #[tokio::test]
    async fn test_log_request_leaves_context_alone() {
        let mut ctx = test_context(Method::GET, "/");
        ctx.set_status(StatusCode::OK);
        log_request().call(&mut ctx).await.unwrap();

        assert_eq!(ctx.status(), Some(StatusCode::OK));
        assert!(ctx.response_headers().is_empty());
    }
}
