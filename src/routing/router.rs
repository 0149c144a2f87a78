//! Method + path dispatch.
//!
//! # Responsibilities
//! - Gate an inner unit on an exact method and a template match
//! - Hand the extracted parameters to a factory that builds the unit to run
//!
//! # Design Decisions
//! - The template is parsed when the route is built; a bad template fails
//!   pipeline construction instead of a request
//! - The factory runs per matching request, so units may capture parameters
//!   by value without any shared state

use std::fmt;
use std::sync::Arc;

use axum::http::Method;
use futures_util::future::BoxFuture;

use crate::context::Context;
use crate::error::{ConfigError, Result};
use crate::middleware::{Middleware, Unit};
use crate::routing::matcher::{Params, RouteTemplate};

/// Builds the concrete unit for a matched request.
pub type UnitFactory = Arc<dyn Fn(&Params) -> Unit + Send + Sync>;

/// Runs the unit produced by `factory` when method and path both match.
pub struct Route {
    method: Method,
    template: RouteTemplate,
    factory: UnitFactory,
}

impl Route {
    pub fn new<F>(method: Method, template: &str, factory: F) -> std::result::Result<Self, ConfigError>
    where
        F: Fn(&Params) -> Unit + Send + Sync + 'static,
    {
        Ok(Self {
            method,
            template: RouteTemplate::parse(template)?,
            factory: Arc::new(factory),
        })
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn template(&self) -> &RouteTemplate {
        &self.template
    }

    /// Parameters for `ctx`, or `None` when the route does not apply.
    pub fn match_context(&self, ctx: &Context) -> Option<Params> {
        if *ctx.request().method() != self.method {
            return None;
        }
        self.template.match_path(ctx.request().path())
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("template", &self.template.as_str())
            .finish()
    }
}

impl Middleware for Route {
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let Some(params) = self.match_context(ctx) else {
                return Ok(());
            };

            tracing::debug!(
                request_id = %ctx.id(),
                method = %self.method,
                template = %self.template.as_str(),
                ?params,
                "Route matched"
            );

            let unit = (*self.factory)(&params);
            unit.call(ctx).await
        })
    }
}

/// Build a route from a method name such as `"GET"`.
pub fn route<F>(method: &str, template: &str, factory: F) -> std::result::Result<Unit, ConfigError>
where
    F: Fn(&Params) -> Unit + Send + Sync + 'static,
{
    let method = Method::from_bytes(method.as_bytes())
        .map_err(|_| ConfigError::InvalidMethod(method.to_string()))?;
    Ok(Arc::new(Route::new(method, template, factory)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_context;
    use crate::middleware::from_fn;
    use axum::http::header::{HeaderName, HeaderValue};
    use axum::http::StatusCode;

    fn echo_id(params: &Params) -> Unit {
        let id = params.get("id").cloned().unwrap_or_default();
        from_fn(move |ctx| {
            let id = id.clone();
            Box::pin(async move {
                ctx.set_status(StatusCode::NO_CONTENT);
                ctx.set_response_header(
                    HeaderName::from_static("x-id"),
                    HeaderValue::from_str(&id)?,
                );
                Ok(())
            })
        })
    }

    #[tokio::test]
    async fn test_route_passes_params_to_factory() {
        let route = route("GET", "/products/:id", echo_id).unwrap();

        let mut ctx = test_context(Method::GET, "/products/42");
        route.call(&mut ctx).await.unwrap();

        assert_eq!(ctx.status(), Some(StatusCode::NO_CONTENT));
        assert_eq!(ctx.response_headers().get_str("x-id"), Some("42"));
    }

    #[tokio::test]
    async fn test_route_requires_exact_method_and_path() {
        let route = Route::new(Method::GET, "/products/:id", echo_id).unwrap();

        for (method, path) in [
            (Method::POST, "/products/42"),
            (Method::HEAD, "/products/42"),
            (Method::GET, "/products"),
            (Method::GET, "/products/42/extra"),
        ] {
            let mut ctx = test_context(method.clone(), path);
            route.call(&mut ctx).await.unwrap();
            assert!(!ctx.is_responded(), "{method} {path} should not match");
        }
    }

    #[test]
    fn test_route_construction_errors() {
        assert!(matches!(
            route("GET", "no-slash", echo_id),
            Err(ConfigError::InvalidTemplate { .. })
        ));
        assert!(matches!(
            route("GE T", "/x", echo_id),
            Err(ConfigError::InvalidMethod(_))
        ));
    }
}
