//! Structured logging.
//!
//! # Responsibilities
//! - Install the global `tracing` subscriber
//! - Pick the output format (pretty or JSON) from configuration
//!
//! # Design Decisions
//! - `RUST_LOG` wins over `observability.log_level` when set
//! - JSON format for production, pretty format for development
//! - Installing twice is not an error; the second call is ignored

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::schema::{LogFormat, ObservabilityConfig};

/// Filter used when neither `RUST_LOG` nor the config level parses.
const FALLBACK_FILTER: &str = "chainware=info,tower_http=info";

pub fn env_filter(config: &ObservabilityConfig) -> EnvFilter {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    filter_from(env.as_deref(), &config.log_level)
}

/// First of `env`, `level` and the fallback that parses.
fn filter_from(env: Option<&str>, level: &str) -> EnvFilter {
    env.and_then(|env| EnvFilter::try_new(env).ok())
        .or_else(|| EnvFilter::try_new(level).ok())
        .unwrap_or_else(|| EnvFilter::new(FALLBACK_FILTER))
}

/// Install the global subscriber described by `config`.
pub fn init(config: &ObservabilityConfig) {
    let registry = tracing_subscriber::registry().with(env_filter(config));
    let result = match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .try_init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    };

    if result.is_err() {
        tracing::debug!("Global subscriber already installed");
    }
}
