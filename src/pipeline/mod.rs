//! Pipeline entry point.
//!
//! # Data Flow
//! ```text
//! transport: Context::new(request)
//!     → run(pipeline, context)
//!     → Ok(context)  → transport sends the response facet
//!     → Err(error)   → transport sends a generic 500
//! ```
//!
//! # Design Decisions
//! - `run` never invents a response; a context that comes back unresponded
//!   means the pipeline lacks a terminal fallback
//! - The context is moved in and handed back, so nothing outlives the request

pub mod builder;

use crate::context::Context;
use crate::error::Result;
use crate::middleware::Middleware;

pub use builder::build_pipeline;

/// Run `pipeline` over `ctx` and return the processed context.
pub async fn run(pipeline: &dyn Middleware, mut ctx: Context) -> Result<Context> {
    pipeline.call(&mut ctx).await?;
    if !ctx.is_responded() {
        tracing::debug!(
            request_id = %ctx.id(),
            path = %ctx.request().path(),
            "Pipeline finished without a response"
        );
    }
    Ok(ctx)
}
