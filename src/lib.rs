//! Composable request pipelines over a per-request context.

// Core
pub mod context;
pub mod error;
pub mod middleware;
pub mod pipeline;
pub mod routing;
pub mod units;

// Host
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::AppConfig;
pub use context::Context;
pub use error::{ConfigError, PipelineError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use middleware::{Middleware, Unit};
pub use pipeline::{build_pipeline, run};
