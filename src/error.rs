//! Error types.
//!
//! # Design Decisions
//! - Two families: `ConfigError` is raised while building a pipeline and is
//!   fatal; `PipelineError` is raised while running one and propagates to
//!   the transport untouched.
//! - Non-matches (route, host, credentials) are never errors.

use std::path::PathBuf;

use crate::config::validation::ValidationError;

/// Failures raised by a unit while processing a single request.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The request body stream was already taken by an earlier unit.
    #[error("request body already consumed")]
    BodyAlreadyConsumed,

    /// Reading a request or response body stream failed.
    #[error("body stream error: {0}")]
    Body(#[from] axum::Error),

    /// Local I/O failure (compression, file access).
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The response body is not valid UTF-8 where text was required.
    #[error("response body is not valid UTF-8")]
    InvalidUtf8,

    /// A unit produced a header value that cannot be sent.
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] axum::http::header::InvalidHeaderValue),

    /// Serializing a JSON response failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BodyAlreadyConsumed => "body_consumed",
            Self::Body(_) => "body",
            Self::Io(_) => "io",
            Self::InvalidUtf8 => "invalid_utf8",
            Self::InvalidHeader(_) => "invalid_header",
            Self::Json(_) => "json",
        }
    }
}

/// Failures detected before any request is processed.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid route template {template:?}: {reason}")]
    InvalidTemplate { template: String, reason: String },

    #[error("invalid http method {0:?}")]
    InvalidMethod(String),

    #[error("invalid header name {0:?}")]
    InvalidHeaderName(String),

    #[error("invalid header value for {name:?}")]
    InvalidHeaderValue { name: String },

    #[error("invalid basic auth credentials: {0}")]
    InvalidCredentials(String),

    #[error("invalid cookie: {0}")]
    InvalidCookie(String),

    #[error("invalid status code {0}")]
    InvalidStatus(u16),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
