//! Middleware contract and combinators.
//!
//! # Data Flow
//! ```text
//! Context
//!     → ChainAll (every unit, in order)
//!         → ChainUntilResponse (stop at first responder)
//!             → IfHostname / Route / IfBasicAuth → inner unit
//!         → IfContentType (post-processing on the response)
//!     → Context (responded or not)
//! ```
//!
//! # Design Decisions
//! - A unit borrows the Context mutably for the duration of its future, so two
//!   units can never touch the same Context at once
//! - "Not applicable" is expressed by returning `Ok(())` without responding
//! - Errors are never swallowed by combinators

pub mod basic_auth;
pub mod chain;
pub mod conditional;

use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::context::Context;
use crate::error::Result;

pub use basic_auth::{if_basic_auth, IfBasicAuth};
pub use chain::{chain_all, chain_until_response, ChainAll, ChainUntilResponse};
pub use conditional::{if_content_type, if_hostname, IfContentType, IfHostname};

/// A unit of behavior over a request Context.
pub trait Middleware: Send + Sync {
    /// Run against `ctx`, reading the request and optionally writing the response.
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Result<()>>;

    /// Whether this unit only makes sense once a response exists.
    fn inspects_response(&self) -> bool {
        false
    }
}

/// Shared handle to a unit, the building block of every pipeline.
pub type Unit = Arc<dyn Middleware>;

/// A unit backed by a closure.
pub struct FnMiddleware<F> {
    f: F,
}

impl<F> Middleware for FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, Result<()>> + Send + Sync,
{
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Result<()>> {
        (self.f)(ctx)
    }
}

/// Wrap a closure as a unit.
///
/// ```ignore
/// let teapot = from_fn(|ctx| Box::pin(async move {
///     ctx.set_status(StatusCode::IM_A_TEAPOT);
///     Ok(())
/// }));
/// ```
pub fn from_fn<F>(f: F) -> Unit
where
    F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, Result<()>> + Send + Sync + 'static,
{
    Arc::new(FnMiddleware { f })
}
