//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (status codes, compression level)
//! - Check that body placeholders refer to real captures
//! - Detect routes shadowed by an identical earlier route
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use crate::config::schema::{AppConfig, RouteConfig};
use crate::routing::RouteTemplate;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field}: {value:?} is not a socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field}: {status} is not a valid status code")]
    InvalidStatus { field: String, status: u16 },

    #[error("{field}: {reason}")]
    InvalidRoute { field: String, reason: String },

    #[error("{field}: placeholder {{{name}}} has no matching capture")]
    UnknownPlaceholder { field: String, name: String },

    #[error("{field}: same method and path as routes[{earlier}], never reached")]
    ShadowedRoute { field: String, earlier: usize },

    #[error("{field}: must not be empty")]
    Empty { field: String },

    #[error("pipeline.compression.level: {0} is out of range 0-9")]
    CompressionLevel(u32),
}

/// Check `config` and return every problem found.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    let pipeline = &config.pipeline;
    for (i, header) in pipeline.response_headers.iter().enumerate() {
        if header.name.trim().is_empty() {
            errors.push(ValidationError::Empty {
                field: format!("pipeline.response_headers[{i}].name"),
            });
        }
    }

    for (i, cookie) in pipeline.cookies.iter().enumerate() {
        if cookie.name.trim().is_empty() {
            errors.push(ValidationError::Empty {
                field: format!("pipeline.cookies[{i}].name"),
            });
        }
    }

    for (i, host) in pipeline.hosts.iter().enumerate() {
        if host.hostname.trim().is_empty() {
            errors.push(ValidationError::Empty {
                field: format!("pipeline.hosts[{i}].hostname"),
            });
        }
        check_status(&mut errors, format!("pipeline.hosts[{i}].status"), host.status);
    }

    let mut seen = Vec::new();
    for (i, route) in pipeline.routes.iter().enumerate() {
        let field = format!("pipeline.routes[{i}]");
        check_route(&mut errors, &field, route);

        let key = (route.method.to_ascii_uppercase(), route.path.clone());
        if let Some(earlier) = seen.iter().position(|k| *k == key) {
            errors.push(ValidationError::ShadowedRoute { field, earlier });
        }
        seen.push(key);
    }

    if pipeline.compression.level > 9 {
        errors.push(ValidationError::CompressionLevel(pipeline.compression.level));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

fn check_status(errors: &mut Vec<ValidationError>, field: String, status: u16) {
    if !(100..=999).contains(&status) {
        errors.push(ValidationError::InvalidStatus { field, status });
    }
}

fn check_route(errors: &mut Vec<ValidationError>, field: &str, route: &RouteConfig) {
    check_status(errors, format!("{field}.status"), route.status);

    if route.redirect.is_some() && !(300..400).contains(&route.status) {
        errors.push(ValidationError::InvalidRoute {
            field: format!("{field}.status"),
            reason: "redirect routes need a 3xx status".to_string(),
        });
    }

    if route.redirect.is_some() && route.request_body.is_some() {
        errors.push(ValidationError::InvalidRoute {
            field: format!("{field}.request_body"),
            reason: "a redirect route cannot answer with the request body".to_string(),
        });
    }

    if let Some(auth) = &route.basic_auth {
        if auth.username.contains(':') {
            errors.push(ValidationError::InvalidRoute {
                field: format!("{field}.basic_auth.username"),
                reason: "must not contain ':'".to_string(),
            });
        }
    }

    let template = match RouteTemplate::parse(&route.path) {
        Ok(template) => template,
        Err(e) => {
            errors.push(ValidationError::InvalidRoute {
                field: format!("{field}.path"),
                reason: e.to_string(),
            });
            return;
        }
    };

    let captures: HashSet<&str> = template.capture_names().collect();
    for name in placeholders(&route.body) {
        if !captures.contains(name) {
            errors.push(ValidationError::UnknownPlaceholder {
                field: format!("{field}.body"),
                name: name.to_string(),
            });
        }
    }
}

/// Names inside `{...}` in `text`.
pub(crate) fn placeholders(text: &str) -> impl Iterator<Item = &str> {
    text.split('{').skip(1).filter_map(|rest| {
        let (name, _) = rest.split_once('}')?;
        is_placeholder_name(name).then_some(name)
    })
}

pub(crate) fn is_placeholder_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
