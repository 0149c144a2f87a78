//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::units::{BodyTransform, SameSite};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Units assembled into the request pipeline.
    pub pipeline: PipelineConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// Grace period for in-flight requests on shutdown, in seconds.
    pub shutdown_grace_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            shutdown_grace_secs: 10,
        }
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Pipeline layout.
///
/// Built into:
/// `chain_all[request_id, response_headers, cookies, chain_until_response[hosts,
/// routes, not_found], html_cache, keep_alive, compression, not_modified,
/// log_request]`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Echo the request id as `x-request-id`.
    pub request_id: bool,

    /// Headers added to every response.
    pub response_headers: Vec<HeaderConfig>,

    /// Cookies set on every response.
    pub cookies: Vec<CookieConfig>,

    /// Virtual hosts answered with a fixed response. Checked before routes.
    pub hosts: Vec<HostConfig>,

    /// Method + path routes. Checked in order; the first match wins.
    pub routes: Vec<RouteConfig>,

    /// `Cache-Control: max-age` applied to HTML responses.
    pub html_cache_max_age: Option<u64>,

    pub keep_alive: KeepAliveConfig,

    pub compression: CompressionConfig,

    /// Answer `If-None-Match` with `304` and tag responses with an `ETag`.
    pub not_modified: bool,

    /// Emit one log event per request.
    pub log_requests: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            request_id: true,
            response_headers: Vec::new(),
            cookies: Vec::new(),
            hosts: Vec::new(),
            routes: Vec::new(),
            html_cache_max_age: None,
            keep_alive: KeepAliveConfig::default(),
            compression: CompressionConfig::default(),
            not_modified: true,
            log_requests: true,
        }
    }
}

/// A single header name/value pair.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct HeaderConfig {
    pub name: String,
    pub value: String,
}

/// A cookie and its attributes.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct CookieConfig {
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub max_age_secs: Option<u64>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub same_site: Option<SameSite>,
}

/// Fixed response for a hostname.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HostConfig {
    /// Hostname to match (exact, case-insensitive, port ignored).
    pub hostname: String,

    #[serde(default = "default_status")]
    pub status: u16,

    #[serde(default)]
    pub body: String,

    #[serde(default = "default_content_type")]
    pub content_type: String,
}

/// Route answered with a fixed response, a redirect or the request body.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    #[serde(default = "default_method")]
    pub method: String,

    /// Path template, e.g. `/products/:id`.
    pub path: String,

    #[serde(default = "default_status")]
    pub status: u16,

    /// Response body. `{name}` is replaced by the `:name` capture.
    #[serde(default)]
    pub body: String,

    #[serde(default = "default_content_type")]
    pub content_type: String,

    /// Redirect target; `status` must then be 3xx.
    #[serde(default)]
    pub redirect: Option<String>,

    /// Answer with the request body instead of `body`.
    #[serde(default)]
    pub request_body: Option<BodyTransform>,

    /// Protect the route with HTTP Basic auth.
    #[serde(default)]
    pub basic_auth: Option<BasicAuthConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BasicAuthConfig {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub realm: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct KeepAliveConfig {
    pub enabled: bool,
    pub timeout_secs: u64,
    pub max_requests: u32,
}

impl Default for KeepAliveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: 30,
            max_requests: 100,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CompressionConfig {
    pub enabled: bool,
    /// 0 (none) to 9 (best).
    pub level: u32,
    /// Bodies shorter than this are sent uncompressed.
    pub min_length: usize,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: 6,
            min_length: 256,
        }
    }
}

fn default_status() -> u16 {
    200
}

fn default_method() -> String {
    "GET".to_string()
}

fn default_content_type() -> String {
    "text/plain; charset=utf-8".to_string()
}
