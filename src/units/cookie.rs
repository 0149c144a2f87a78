//! `Set-Cookie` unit.
//!
//! # Design Decisions
//! - Name and value are checked against the cookie grammar when the unit is
//!   built; values are never quoted or encoded on the fly
//! - Each unit appends its own `Set-Cookie` line, so several cookies stack

use axum::http::header::{HeaderValue, SET_COOKIE};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::middleware::{from_fn, Unit};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    fn as_str(self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// Cookie attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieOptions {
    pub max_age: Option<u64>,
    pub path: Option<String>,
    pub domain: Option<String>,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: Option<SameSite>,
}

fn is_token(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| {
            b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?={}".contains(&b)
        })
}

fn is_cookie_value(value: &str) -> bool {
    value
        .bytes()
        .all(|b| matches!(b, 0x21 | 0x23..=0x2B | 0x2D..=0x3A | 0x3C..=0x5B | 0x5D..=0x7E))
}

fn is_attribute_value(value: &str) -> bool {
    value.bytes().all(|b| b.is_ascii_graphic() && b != b';')
}

/// Render the `Set-Cookie` header value.
pub fn render_cookie(name: &str, value: &str, options: &CookieOptions) -> Result<String, ConfigError> {
    if !is_token(name) {
        return Err(ConfigError::InvalidCookie(format!("bad name {name:?}")));
    }
    if !is_cookie_value(value) {
        return Err(ConfigError::InvalidCookie(format!("bad value for {name:?}")));
    }

    let mut cookie = format!("{name}={value}");
    if let Some(max_age) = options.max_age {
        cookie.push_str(&format!("; Max-Age={max_age}"));
    }
    for (attribute, value) in [("Path", &options.path), ("Domain", &options.domain)] {
        if let Some(value) = value {
            if !is_attribute_value(value) {
                return Err(ConfigError::InvalidCookie(format!("bad {attribute} for {name:?}")));
            }
            cookie.push_str(&format!("; {attribute}={value}"));
        }
    }
    if options.secure || options.same_site == Some(SameSite::None) {
        cookie.push_str("; Secure");
    }
    if options.http_only {
        cookie.push_str("; HttpOnly");
    }
    if let Some(same_site) = options.same_site {
        cookie.push_str("; SameSite=");
        cookie.push_str(same_site.as_str());
    }
    Ok(cookie)
}

/// Append a `Set-Cookie` header to every response.
pub fn set_cookie(name: &str, value: &str, options: &CookieOptions) -> Result<Unit, ConfigError> {
    let cookie = render_cookie(name, value, options)?;
    let cookie = HeaderValue::from_str(&cookie).map_err(|_| ConfigError::InvalidHeaderValue {
        name: SET_COOKIE.to_string(),
    })?;

    Ok(from_fn(move |ctx| {
        let cookie = cookie.clone();
        Box::pin(async move {
            ctx.response_headers_mut().append(SET_COOKIE, cookie);
            Ok(())
        })
    }))
}
