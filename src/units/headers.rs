//! Header-setting units.
//!
//! # Design Decisions
//! - Names and values are validated when the unit is built, so a typo fails
//!   startup rather than a request
//! - These units never respond; they only decorate whatever response exists
//!   or will exist

use axum::http::header::{HeaderName, HeaderValue, CACHE_CONTROL, CONNECTION};

use crate::error::ConfigError;
use crate::middleware::{from_fn, Unit};

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");
pub const KEEP_ALIVE: HeaderName = HeaderName::from_static("keep-alive");

fn header_name(name: &str) -> Result<HeaderName, ConfigError> {
    HeaderName::from_bytes(name.as_bytes()).map_err(|_| ConfigError::InvalidHeaderName(name.to_string()))
}

fn header_value(name: &HeaderName, value: &str) -> Result<HeaderValue, ConfigError> {
    HeaderValue::from_str(value).map_err(|_| ConfigError::InvalidHeaderValue {
        name: name.to_string(),
    })
}

/// Set (replace) a response header.
pub fn set_header(name: &str, value: &str) -> Result<Unit, ConfigError> {
    let name = header_name(name)?;
    let value = header_value(&name, value)?;
    Ok(from_fn(move |ctx| {
        let (name, value) = (name.clone(), value.clone());
        Box::pin(async move {
            ctx.set_response_header(name, value);
            Ok(())
        })
    }))
}

/// Append a response header, keeping existing values.
pub fn append_header(name: &str, value: &str) -> Result<Unit, ConfigError> {
    let name = header_name(name)?;
    let value = header_value(&name, value)?;
    Ok(from_fn(move |ctx| {
        let (name, value) = (name.clone(), value.clone());
        Box::pin(async move {
            ctx.response_headers_mut().append(name, value);
            Ok(())
        })
    }))
}

/// Expose the context id as `x-request-id`.
pub fn request_id() -> Unit {
    from_fn(|ctx| {
        Box::pin(async move {
            let value = HeaderValue::from_str(ctx.id())?;
            ctx.set_response_header(X_REQUEST_ID, value);
            Ok(())
        })
    })
}

/// `Cache-Control` directives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheControl {
    pub max_age: Option<u64>,
    pub s_maxage: Option<u64>,
    pub public: bool,
    pub private: bool,
    pub no_cache: bool,
    pub no_store: bool,
    pub must_revalidate: bool,
    pub immutable: bool,
}

impl CacheControl {
    pub fn max_age(seconds: u64) -> Self {
        Self {
            max_age: Some(seconds),
            ..Self::default()
        }
    }

    /// Render as a header value, e.g. `public, max-age=60`.
    pub fn render(&self) -> String {
        let mut parts = Vec::new();
        if self.public {
            parts.push("public".to_string());
        }
        if self.private {
            parts.push("private".to_string());
        }
        if self.no_cache {
            parts.push("no-cache".to_string());
        }
        if self.no_store {
            parts.push("no-store".to_string());
        }
        if self.must_revalidate {
            parts.push("must-revalidate".to_string());
        }
        if let Some(max_age) = self.max_age {
            parts.push(format!("max-age={max_age}"));
        }
        if let Some(s_maxage) = self.s_maxage {
            parts.push(format!("s-maxage={s_maxage}"));
        }
        if self.immutable {
            parts.push("immutable".to_string());
        }
        parts.join(", ")
    }
}

/// Set `Cache-Control`, replacing any earlier value.
pub fn cache_control(directives: &CacheControl) -> Result<Unit, ConfigError> {
    let value = header_value(&CACHE_CONTROL, &directives.render())?;
    Ok(from_fn(move |ctx| {
        let value = value.clone();
        Box::pin(async move {
            ctx.set_response_header(CACHE_CONTROL, value);
            Ok(())
        })
    }))
}

/// Advertise (or refuse) persistent connections.
///
/// Enabled: `Connection: keep-alive` and `Keep-Alive: timeout=T, max=N`.
/// Disabled: `Connection: close`.
pub fn keep_alive(enabled: bool, timeout_secs: u64, max_requests: u32) -> Unit {
    let (connection, keep_alive) = if enabled {
        let params = format!("timeout={timeout_secs}, max={max_requests}");
        (
            HeaderValue::from_static("keep-alive"),
            // digits, commas and ascii letters only
            HeaderValue::from_str(&params).ok(),
        )
    } else {
        (HeaderValue::from_static("close"), None)
    };

    from_fn(move |ctx| {
        let connection = connection.clone();
        let keep_alive = keep_alive.clone();
        Box::pin(async move {
            ctx.set_response_header(CONNECTION, connection);
            match keep_alive {
                Some(value) => ctx.set_response_header(KEEP_ALIVE, value),
                None => {
                    ctx.response_headers_mut().remove(&KEEP_ALIVE);
                }
            }
            Ok(())
        })
    })
}
