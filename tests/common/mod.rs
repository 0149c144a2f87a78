//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::http::{Method, StatusCode};
use chainware::middleware::from_fn;
use chainware::{Context, Unit};

/// Fresh context for `uri`, with a `Host` header when the URI has an authority.
pub fn context(method: Method, uri: &str) -> Context {
    Context::from_uri(method, uri.parse().unwrap())
}

/// Records the order in which recorder units ran.
#[derive(Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<usize>>>,
}

impl CallLog {
    pub fn calls(&self) -> Vec<usize> {
        self.calls.lock().unwrap().clone()
    }

    /// A unit that logs `index` and, when `responds` is set, answers 200.
    pub fn recorder(&self, index: usize, responds: bool) -> Unit {
        let calls = self.calls.clone();
        from_fn(move |ctx| {
            let calls = calls.clone();
            Box::pin(async move {
                calls.lock().unwrap().push(index);
                if responds {
                    ctx.respond(StatusCode::OK, format!("unit {index}"));
                }
                Ok(())
            })
        })
    }
}

/// A unit that counts its invocations.
pub fn counter() -> (Unit, Arc<AtomicUsize>) {
    let count = Arc::new(AtomicUsize::new(0));
    let shared = count.clone();
    let unit = from_fn(move |_ctx| {
        let shared = shared.clone();
        Box::pin(async move {
            shared.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    });
    (unit, count)
}

pub fn body_text(ctx: &Context) -> String {
    ctx.body()
        .as_bytes()
        .map(|b| String::from_utf8(b.to_vec()).unwrap())
        .unwrap_or_default()
}
