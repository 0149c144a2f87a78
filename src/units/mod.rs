//! Ready-made units.
//!
//! # Responsibilities
//! - Terminal responders (`send_text`, `send_json`, `not_found`, `redirect`,
//!   `respond_with_request_body`)
//! - Header decoration (`set_header`, `set_cookie`, `request_id`,
//!   `cache_control`, `keep_alive`)
//! - Response post-processing (`transform_string`, `compress_with_gzip`,
//!   `not_modified`)
//! - Request logging (`log_request`)
//!
//! # Design Decisions
//! - Every unit is independent and only talks to the Context
//! - Configuration is validated when the unit is built (`ConfigError`)

pub mod compression;
pub mod cookie;
pub mod headers;
pub mod logging;
pub mod not_modified;
pub mod request_body;
pub mod respond;
pub mod transform;

pub use compression::{compress_with_gzip, GzipOptions};
pub use cookie::{set_cookie, CookieOptions, SameSite};
pub use headers::{append_header, cache_control, keep_alive, request_id, set_header, CacheControl};
pub use logging::log_request;
pub use not_modified::{not_modified, not_modified_with_limit};
pub use request_body::{respond_with_request_body, BodyTransform, DEFAULT_REQUEST_BODY_LIMIT};
pub use respond::{not_found, redirect, send, send_json, send_text};
pub use transform::{transform_string, transform_string_with_limit};
