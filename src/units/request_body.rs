//! Responders that answer with the request body.

use axum::body::Bytes;
use axum::http::header::{HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::StatusCode;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::error::{ConfigError, Result};
use crate::middleware::{from_fn, Unit};
use crate::units::respond::TEXT_PLAIN;

/// Largest request body the responders will read.
pub const DEFAULT_REQUEST_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// What happens to the request body before it is sent back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyTransform {
    #[default]
    Echo,
    Uppercase,
    Lowercase,
}

impl BodyTransform {
    fn apply(self, text: &str) -> String {
        match self {
            BodyTransform::Echo => text.to_string(),
            BodyTransform::Uppercase => text.to_uppercase(),
            BodyTransform::Lowercase => text.to_lowercase(),
        }
    }
}

/// Read the request body, or `None` once it grows past `limit`.
async fn read_limited(ctx: &mut Context, limit: usize) -> Result<Option<Bytes>> {
    let declared = ctx
        .request()
        .headers()
        .get_str(CONTENT_LENGTH)
        .and_then(|v| v.trim().parse::<u64>().ok());
    if declared.is_some_and(|len| len > limit as u64) {
        return Ok(None);
    }

    let mut data = ctx.take_request_body()?.into_data_stream();
    let mut buf = Vec::new();
    while let Some(chunk) = data.next().await {
        let chunk = chunk?;
        if buf.len() + chunk.len() > limit {
            return Ok(None);
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(Some(Bytes::from(buf)))
}

/// Respond with the request body, passed through `transform`.
///
/// Bodies over `limit` get `413`; bodies that are not UTF-8 get `400`.
pub fn respond_with_request_body(
    status: StatusCode,
    content_type: &str,
    transform: BodyTransform,
    limit: usize,
) -> Result<Unit, ConfigError> {
    let content_type = HeaderValue::from_str(content_type).map_err(|_| ConfigError::InvalidHeaderValue {
        name: CONTENT_TYPE.to_string(),
    })?;

    Ok(from_fn(move |ctx| {
        let content_type = content_type.clone();
        Box::pin(async move {
            let Some(bytes) = read_limited(ctx, limit).await? else {
                ctx.set_response_header(CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN));
                ctx.respond(StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large");
                return Ok(());
            };
            let Ok(text) = std::str::from_utf8(&bytes) else {
                ctx.set_response_header(CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN));
                ctx.respond(StatusCode::BAD_REQUEST, "Bad Request");
                return Ok(());
            };

            let body = transform.apply(text);
            ctx.set_response_header(CONTENT_TYPE, content_type);
            ctx.respond(status, body);
            Ok(())
        })
    }))
}
