//! Conditional GET: `ETag` and `If-None-Match`.
//!
//! # Responsibilities
//! - Tag successful GET/HEAD responses with an `ETag`, derived from the body
//!   when the response has none
//! - Answer `304 Not Modified` with an empty body when the client's
//!   `If-None-Match` matches
//!
//! # Design Decisions
//! - Runs after the compressors, so the tag describes the bytes on the wire
//! - Comparison is weak (`W/"x"` matches `"x"`), as required for
//!   `If-None-Match`
//! - Bodies over the buffer limit stream through untagged

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use axum::body::Bytes;
use axum::http::header::{HeaderValue, CONTENT_LENGTH, ETAG, IF_NONE_MATCH};
use axum::http::{Method, StatusCode};

use crate::context::Context;
use crate::middleware::{from_fn, Unit};
use crate::units::compression::DEFAULT_COMPRESSION_LIMIT;

/// Strong entity tag for `body`.
pub fn etag_for(body: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    body.hash(&mut hasher);
    format!("\"{:016x}\"", hasher.finish())
}

fn opaque(tag: &str) -> &str {
    tag.trim().strip_prefix("W/").unwrap_or(tag.trim())
}

/// Whether an `If-None-Match` header value matches `etag`.
pub fn if_none_match(header: &str, etag: &str) -> bool {
    header
        .split(',')
        .map(str::trim)
        .any(|candidate| candidate == "*" || (!candidate.is_empty() && opaque(candidate) == opaque(etag)))
}

fn is_candidate(ctx: &Context) -> bool {
    let method = ctx.request().method();
    (*method == Method::GET || *method == Method::HEAD)
        && ctx.body().is_set()
        && matches!(ctx.status(), None | Some(StatusCode::OK))
}

/// Conditional GET with the default buffer limit.
pub fn not_modified() -> Unit {
    not_modified_with_limit(DEFAULT_COMPRESSION_LIMIT)
}

/// Conditional GET, buffering bodies up to `limit` bytes to tag them.
pub fn not_modified_with_limit(limit: usize) -> Unit {
    from_fn(move |ctx| {
        Box::pin(async move {
            if !is_candidate(ctx) {
                return Ok(());
            }

            let etag = match ctx.response_headers().get_str(ETAG) {
                Some(existing) => existing.to_string(),
                None => {
                    let Some(bytes) = ctx.buffer_response_body(limit).await? else {
                        return Ok(());
                    };
                    let etag = etag_for(bytes);
                    ctx.set_response_header(ETAG, HeaderValue::from_str(&etag)?);
                    etag
                }
            };

            let matched = ctx
                .request()
                .headers()
                .get_all(IF_NONE_MATCH)
                .filter_map(|v| v.to_str().ok())
                .any(|v| if_none_match(v, &etag));
            if matched {
                tracing::debug!(request_id = %ctx.id(), %etag, "Not modified");
                ctx.response_headers_mut().remove(CONTENT_LENGTH);
                ctx.respond(StatusCode::NOT_MODIFIED, Bytes::new());
            }
            Ok(())
        })
    })
}
