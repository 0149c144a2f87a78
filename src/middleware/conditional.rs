//! Predicate-gated combinators.
//!
//! # Responsibilities
//! - `IfHostname`: delegate when the request host equals the configured one
//! - `IfContentType`: delegate when the response content type is in a set
//!
//! # Design Decisions
//! - Host comparison is exact after lowercasing both sides (the request side
//!   is lowercased when the Context is built)
//! - Content type matching compares the essence only, so parameters such as
//!   `charset` are ignored
//! - `IfContentType` reads the response, so it belongs after whatever sets it,
//!   usually in a `chain_all` stage

use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::context::Context;
use crate::error::Result;
use crate::middleware::{Middleware, Unit};

pub const HTML: &[&str] = &["text/html"];
pub const JAVASCRIPT: &[&str] = &["application/javascript", "text/javascript"];
pub const JSON: &[&str] = &["application/json"];
pub const CSS: &[&str] = &["text/css"];

/// Delegates to `inner` only for requests addressed to `hostname`.
pub struct IfHostname {
    hostname: String,
    inner: Unit,
}

impl IfHostname {
    pub fn new(hostname: impl Into<String>, inner: Unit) -> Self {
        Self {
            hostname: hostname.into().to_ascii_lowercase(),
            inner,
        }
    }

    pub fn matches(&self, ctx: &Context) -> bool {
        ctx.request().hostname() == Some(self.hostname.as_str())
    }
}

impl Middleware for IfHostname {
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            if self.matches(ctx) {
                self.inner.call(ctx).await
            } else {
                Ok(())
            }
        })
    }
}

/// Delegates to `inner` only when the response content type is one of `types`.
pub struct IfContentType {
    types: Vec<String>,
    inner: Unit,
}

impl IfContentType {
    pub fn new<S: AsRef<str>>(types: &[S], inner: Unit) -> Self {
        Self {
            types: types
                .iter()
                .map(|t| t.as_ref().trim().to_ascii_lowercase())
                .collect(),
            inner,
        }
    }

    pub fn matches(&self, ctx: &Context) -> bool {
        ctx.response_content_type()
            .is_some_and(|ct| self.types.iter().any(|t| *t == ct))
    }
}

impl Middleware for IfContentType {
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            if self.matches(ctx) {
                self.inner.call(ctx).await
            } else {
                Ok(())
            }
        })
    }

    fn inspects_response(&self) -> bool {
        true
    }
}

pub fn if_hostname(hostname: impl Into<String>, inner: Unit) -> Unit {
    Arc::new(IfHostname::new(hostname, inner))
}

pub fn if_content_type<S: AsRef<str>>(types: &[S], inner: Unit) -> Unit {
    Arc::new(IfContentType::new(types, inner))
}
