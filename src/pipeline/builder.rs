//! Assemble a pipeline from configuration.
//!
//! # Responsibilities
//! - Turn `PipelineConfig` into a tree of combinators and units
//! - Fail with `ConfigError` on anything that cannot be built
//!
//! # Layout
//! ```text
//! chain_all[
//!     request_id?, response_headers..., set_cookie...,
//!     chain_until_response[hosts..., routes..., not_found],
//!     if_content_type(HTML, cache_control)?, keep_alive,
//!     compress_with_gzip?, not_modified?, log_request?,
//! ]
//! ```

use axum::http::{Method, StatusCode};

use crate::config::schema::{CookieConfig, HostConfig, PipelineConfig, RouteConfig};
use crate::config::validation::is_placeholder_name;
use crate::error::ConfigError;
use crate::middleware::basic_auth::{IfBasicAuth, DEFAULT_REALM};
use crate::middleware::conditional::HTML;
use crate::middleware::{chain_all, chain_until_response, if_content_type, if_hostname, Unit};
use crate::routing::{Params, Route};
use crate::units::{self, CacheControl, CookieOptions, GzipOptions, DEFAULT_REQUEST_BODY_LIMIT};

use std::sync::Arc;

/// Build the request pipeline described by `config`.
pub fn build_pipeline(config: &PipelineConfig) -> Result<Unit, ConfigError> {
    let mut stage = Vec::new();

    if config.request_id {
        stage.push(units::request_id());
    }
    for header in &config.response_headers {
        stage.push(units::set_header(&header.name, &header.value)?);
    }
    for cookie in &config.cookies {
        stage.push(build_cookie(cookie)?);
    }

    let mut dispatch = Vec::with_capacity(config.hosts.len() + config.routes.len() + 1);
    for host in &config.hosts {
        dispatch.push(build_host(host)?);
    }
    for route in &config.routes {
        dispatch.push(build_route(route)?);
    }
    dispatch.push(units::not_found());
    stage.push(chain_until_response(dispatch));

    if let Some(max_age) = config.html_cache_max_age {
        stage.push(if_content_type(HTML, units::cache_control(&CacheControl::max_age(max_age))?));
    }
    stage.push(units::keep_alive(
        config.keep_alive.enabled,
        config.keep_alive.timeout_secs,
        config.keep_alive.max_requests,
    ));
    if config.compression.enabled {
        stage.push(units::compress_with_gzip(GzipOptions {
            level: config.compression.level,
            min_length: config.compression.min_length,
            ..GzipOptions::default()
        }));
    }
    if config.not_modified {
        stage.push(units::not_modified());
    }
    if config.log_requests {
        stage.push(units::log_request());
    }

    tracing::debug!(
        units = stage.len(),
        hosts = config.hosts.len(),
        routes = config.routes.len(),
        "Pipeline built"
    );
    Ok(chain_all(stage))
}

fn status(code: u16) -> Result<StatusCode, ConfigError> {
    StatusCode::from_u16(code).map_err(|_| ConfigError::InvalidStatus(code))
}

fn build_cookie(cookie: &CookieConfig) -> Result<Unit, ConfigError> {
    let options = CookieOptions {
        max_age: cookie.max_age_secs,
        path: cookie.path.clone(),
        domain: cookie.domain.clone(),
        http_only: cookie.http_only,
        secure: cookie.secure,
        same_site: cookie.same_site,
    };
    units::set_cookie(&cookie.name, &cookie.value, &options)
}

fn build_host(host: &HostConfig) -> Result<Unit, ConfigError> {
    let respond = units::send(status(host.status)?, &host.content_type, host.body.clone())?;
    Ok(if_hostname(&host.hostname, respond))
}

fn build_route(config: &RouteConfig) -> Result<Unit, ConfigError> {
    let method = Method::from_bytes(config.method.to_ascii_uppercase().as_bytes())
        .map_err(|_| ConfigError::InvalidMethod(config.method.clone()))?;
    let status = status(config.status)?;

    // validate everything the factory will need before any request arrives
    let fixed = match (&config.redirect, config.request_body) {
        (Some(location), _) => Some(units::redirect(status, location)?),
        (None, Some(transform)) => Some(units::respond_with_request_body(
            status,
            &config.content_type,
            transform,
            DEFAULT_REQUEST_BODY_LIMIT,
        )?),
        (None, None) => None,
    };
    units::send(status, &config.content_type, "")?;
    let auth = config.basic_auth.clone();
    if let Some(auth) = &auth {
        IfBasicAuth::new(auth.username.clone(), auth.password.clone(), units::not_found())?;
    }

    let content_type = config.content_type.clone();
    let escape = Escape::for_content_type(&content_type);
    let body = config.body.clone();
    let route = Route::new(method, &config.path, move |params: &Params| {
        let respond = match &fixed {
            Some(fixed) => fixed.clone(),
            None => units::send(status, &content_type, render_body(&body, params, escape))
                .unwrap_or_else(|_| units::not_found()),
        };
        match &auth {
            Some(auth) => IfBasicAuth::with_realm(
                auth.username.clone(),
                auth.password.clone(),
                auth.realm.as_deref().unwrap_or(DEFAULT_REALM),
                respond.clone(),
            )
            .map(|gate| Arc::new(gate) as Unit)
            .unwrap_or(respond),
            None => respond,
        }
    })?;
    Ok(Arc::new(route))
}

/// How captured values are written into a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Escape {
    Plain,
    Json,
    Html,
}

impl Escape {
    fn for_content_type(content_type: &str) -> Self {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or(content_type)
            .trim()
            .to_ascii_lowercase();
        if essence == "application/json" || essence.ends_with("+json") {
            Escape::Json
        } else if essence == "text/html" || essence == "application/xhtml+xml" {
            Escape::Html
        } else {
            Escape::Plain
        }
    }

    fn write(self, out: &mut String, value: &str) {
        match self {
            Escape::Plain => out.push_str(value),
            Escape::Json => {
                // a JSON string literal minus its quotes
                let quoted = serde_json::Value::from(value).to_string();
                out.push_str(&quoted[1..quoted.len() - 1]);
            }
            Escape::Html => {
                for c in value.chars() {
                    match c {
                        '&' => out.push_str("&amp;"),
                        '<' => out.push_str("&lt;"),
                        '>' => out.push_str("&gt;"),
                        '"' => out.push_str("&quot;"),
                        '\'' => out.push_str("&#x27;"),
                        c => out.push(c),
                    }
                }
            }
        }
    }
}

/// Replace each `{name}` in `template` with the matching parameter.
///
/// One left-to-right pass: substituted values are never scanned again, and
/// `{...}` that names no parameter is copied as written.
fn render_body(template: &str, params: &Params, escape: Escape) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let value = after.find('}').and_then(|end| {
            let name = &after[..end];
            is_placeholder_name(name)
                .then(|| params.get(name))
                .flatten()
                .map(|value| (value, end))
        });
        match value {
            Some((value, end)) => {
                escape.write(&mut out, value);
                rest = &after[end + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
