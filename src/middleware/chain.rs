//! Sequential combinators.
//!
//! # Responsibilities
//! - `ChainAll`: run every unit, in order, whatever the responded state
//! - `ChainUntilResponse`: run units in order until one responds
//!
//! # Design Decisions
//! - Each unit is awaited to completion before the next one starts
//! - The first error aborts the chain; mutations made so far stay on the Context
//! - Earlier entries win ties in `ChainUntilResponse`

use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::context::Context;
use crate::error::Result;
use crate::middleware::{Middleware, Unit};

/// Runs every unit in order.
pub struct ChainAll {
    units: Vec<Unit>,
}

impl ChainAll {
    pub fn new(units: Vec<Unit>) -> Self {
        if let Some(first) = units.first() {
            if first.inspects_response() {
                tracing::warn!(
                    "first unit of chain_all inspects the response but nothing before it can set one; \
                     place it after the unit that responds"
                );
            }
        }
        Self { units }
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl Middleware for ChainAll {
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            for (index, unit) in self.units.iter().enumerate() {
                tracing::trace!(request_id = %ctx.id(), unit_index = index, "chain_all: running unit");
                unit.call(ctx).await?;
            }
            Ok(())
        })
    }

    fn inspects_response(&self) -> bool {
        self.units.first().is_some_and(|u| u.inspects_response())
    }
}

/// Runs units in order and stops after the first one that responds.
pub struct ChainUntilResponse {
    units: Vec<Unit>,
}

impl ChainUntilResponse {
    pub fn new(units: Vec<Unit>) -> Self {
        Self { units }
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl Middleware for ChainUntilResponse {
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            for (index, unit) in self.units.iter().enumerate() {
                unit.call(ctx).await?;
                if ctx.is_responded() {
                    tracing::trace!(
                        request_id = %ctx.id(),
                        unit_index = index,
                        "chain_until_response: unit responded"
                    );
                    return Ok(());
                }
            }
            tracing::trace!(request_id = %ctx.id(), "chain_until_response: no unit responded");
            Ok(())
        })
    }
}

pub fn chain_all(units: Vec<Unit>) -> Unit {
    Arc::new(ChainAll::new(units))
}

pub fn chain_until_response(units: Vec<Unit>) -> Unit {
    Arc::new(ChainUntilResponse::new(units))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_context;
    use crate::error::PipelineError;
    use crate::middleware::from_fn;
    use axum::http::{Method, StatusCode};
    use std::sync::Mutex;

    type Log = Arc<Mutex<Vec<usize>>>;

    /// Records its index; responds when `responds` is set.
    fn recorder(log: &Log, index: usize, responds: bool) -> Unit {
        let log = log.clone();
        from_fn(move |ctx| {
            let log = log.clone();
            Box::pin(async move {
                log.lock().unwrap().push(index);
                if responds {
                    ctx.set_status(StatusCode::OK);
                }
                Ok(())
            })
        })
    }

    fn failing() -> Unit {
        from_fn(|_ctx| Box::pin(async { Err(PipelineError::InvalidUtf8) }))
    }

    #[tokio::test]
    async fn test_chain_until_response_stops_at_first_responder() {
        for k in 0..4 {
            let log = Log::default();
            let units = (0..4).map(|i| recorder(&log, i, i == k)).collect();
            let chain = ChainUntilResponse::new(units);
            let mut ctx = test_context(Method::GET, "/");

            chain.call(&mut ctx).await.unwrap();

            assert_eq!(*log.lock().unwrap(), (0..=k).collect::<Vec<_>>());
            assert!(ctx.is_responded());
        }
    }

    #[tokio::test]
    async fn test_chain_until_response_exhausted_leaves_unresponded() {
        let log = Log::default();
        let chain = ChainUntilResponse::new(vec![recorder(&log, 0, false), recorder(&log, 1, false)]);
        let mut ctx = test_context(Method::GET, "/");

        chain.call(&mut ctx).await.unwrap();

        assert_eq!(*log.lock().unwrap(), vec![0, 1]);
        assert!(!ctx.is_responded());
    }

    #[tokio::test]
    async fn test_chain_until_response_already_responded_runs_first_only() {
        let log = Log::default();
        let chain = ChainUntilResponse::new(vec![recorder(&log, 0, false), recorder(&log, 1, false)]);
        let mut ctx = test_context(Method::GET, "/");
        ctx.set_status(StatusCode::ACCEPTED);

        chain.call(&mut ctx).await.unwrap();

        assert_eq!(*log.lock().unwrap(), vec![0]);
    }

    #[tokio::test]
    async fn test_chain_all_runs_everything() {
        let log = Log::default();
        let units = vec![recorder(&log, 0, false), recorder(&log, 1, true), recorder(&log, 2, true), recorder(&log, 3, false)];
        let chain = ChainAll::new(units);
        let mut ctx = test_context(Method::GET, "/");

        chain.call(&mut ctx).await.unwrap();

        assert_eq!(*log.lock().unwrap(), vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_errors_propagate_and_keep_mutations() {
        let log = Log::default();
        let chain = ChainAll::new(vec![recorder(&log, 0, true), failing(), recorder(&log, 2, false)]);
        let mut ctx = test_context(Method::GET, "/");

        let err = chain.call(&mut ctx).await.unwrap_err();

        assert!(matches!(err, PipelineError::InvalidUtf8));
        assert_eq!(*log.lock().unwrap(), vec![0]);
        assert_eq!(ctx.status(), Some(StatusCode::OK));

        let chain = ChainUntilResponse::new(vec![failing(), recorder(&log, 9, true)]);
        let mut ctx = test_context(Method::GET, "/");
        assert!(chain.call(&mut ctx).await.is_err());
        assert!(!ctx.is_responded());
    }

    #[tokio::test]
    async fn test_empty_chains() {
        let mut ctx = test_context(Method::GET, "/");
        chain_all(vec![]).call(&mut ctx).await.unwrap();
        chain_until_response(vec![]).call(&mut ctx).await.unwrap();
        assert!(!ctx.is_responded());
    }
}
