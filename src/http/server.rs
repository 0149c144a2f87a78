//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with a single fallback handler
//! - Wire up middleware (timeout, tracing)
//! - Bind server to listener and serve until shutdown
//! - Run the pipeline once per request

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::http::{request, response};
use crate::middleware::{Middleware, Unit};
use crate::pipeline;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Unit,
    pub max_body_bytes: usize,
}

/// HTTP server driving a pipeline.
pub struct HttpServer {
    router: Router,
    config: Arc<AppConfig>,
}

impl HttpServer {
    /// Create a new HTTP server that answers every request with `pipeline`.
    pub fn new(config: AppConfig, pipeline: Unit) -> Self {
        let state = AppState {
            pipeline,
            max_body_bytes: config.limits.max_body_bytes,
        };
        let router = Self::build_router(&config, state);
        Self {
            router,
            config: Arc::new(config),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, state: AppState) -> Router {
        Router::new()
            .fallback(pipeline_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http())
    }

    /// The configured router, for serving it elsewhere or driving it in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until a
    /// shutdown signal arrives.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

/// Single entry point: build a Context, run the pipeline, send the result.
///
/// If the client goes away the future is dropped, and the Context with it.
async fn pipeline_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let ctx = match request::into_context(request, state.max_body_bytes) {
        Ok(ctx) => ctx,
        Err(status) => return response::plain_status(status),
    };
    let request_id = ctx.id().to_string();

    tracing::debug!(
        request_id = %request_id,
        method = %ctx.request().method(),
        path = %ctx.request().path(),
        "Running pipeline"
    );

    let pipeline: &dyn Middleware = state.pipeline.as_ref();
    match pipeline::run(pipeline, ctx).await {
        Ok(ctx) => response::from_context(ctx),
        Err(e) => response::from_error(&request_id, &e),
    }
}
