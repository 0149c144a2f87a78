//! HTTP Basic authentication gate.
//!
//! # Responsibilities
//! - Decode `Authorization: Basic <base64(user:pass)>`
//! - Compare against the configured credentials
//! - On mismatch or absence respond `401` with a `WWW-Authenticate` challenge
//!
//! # Design Decisions
//! - A failed check responds, so a surrounding `chain_until_response` stops
//!   there instead of falling through to other handlers
//! - Comparison does not short-circuit on the first differing byte

use std::sync::Arc;

use axum::http::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE, WWW_AUTHENTICATE};
use axum::http::StatusCode;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use futures_util::future::BoxFuture;

use crate::context::Context;
use crate::error::{ConfigError, Result};
use crate::middleware::{Middleware, Unit};

pub const DEFAULT_REALM: &str = "Restricted";

/// Delegates to `inner` only when the request carries the right credentials.
pub struct IfBasicAuth {
    username: String,
    password: String,
    challenge: HeaderValue,
    inner: Unit,
}

impl IfBasicAuth {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        inner: Unit,
    ) -> std::result::Result<Self, ConfigError> {
        Self::with_realm(username, password, DEFAULT_REALM, inner)
    }

    pub fn with_realm(
        username: impl Into<String>,
        password: impl Into<String>,
        realm: &str,
        inner: Unit,
    ) -> std::result::Result<Self, ConfigError> {
        let username = username.into();
        if username.contains(':') {
            return Err(ConfigError::InvalidCredentials(
                "username must not contain ':'".to_string(),
            ));
        }

        let realm = realm.replace('\\', "\\\\").replace('"', "\\\"");
        let challenge = HeaderValue::from_str(&format!("Basic realm=\"{realm}\", charset=\"UTF-8\""))
            .map_err(|_| ConfigError::InvalidHeaderValue {
                name: WWW_AUTHENTICATE.to_string(),
            })?;

        Ok(Self {
            username,
            password: password.into(),
            challenge,
            inner,
        })
    }

    /// True when the request's credentials equal the configured ones.
    pub fn is_authorized(&self, ctx: &Context) -> bool {
        match decode_credentials(ctx) {
            Some((user, pass)) => {
                // evaluate both so timing doesn't reveal which one differs
                let user_ok = constant_time_eq(user.as_bytes(), self.username.as_bytes());
                let pass_ok = constant_time_eq(pass.as_bytes(), self.password.as_bytes());
                user_ok & pass_ok
            }
            None => false,
        }
    }

    fn challenge(&self, ctx: &mut Context) {
        ctx.set_response_header(WWW_AUTHENTICATE, self.challenge.clone());
        ctx.set_response_header(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
        ctx.respond(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
}

impl Middleware for IfBasicAuth {
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            if self.is_authorized(ctx) {
                self.inner.call(ctx).await
            } else {
                tracing::debug!(
                    request_id = %ctx.id(),
                    path = %ctx.request().path(),
                    "Basic auth rejected"
                );
                self.challenge(ctx);
                Ok(())
            }
        })
    }
}

/// Extract `(username, password)` from the request, if well formed.
fn decode_credentials(ctx: &Context) -> Option<(String, String)> {
    let header = ctx.request().headers().get_str(AUTHORIZATION)?;
    let (scheme, encoded) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

pub fn if_basic_auth(
    username: impl Into<String>,
    password: impl Into<String>,
    inner: Unit,
) -> std::result::Result<Unit, ConfigError> {
    Ok(Arc::new(IfBasicAuth::new(username, password, inner)?))
}
