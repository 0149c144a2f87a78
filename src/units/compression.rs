//! Gzip response compression.
//!
//! # Responsibilities
//! - Negotiate gzip through `Accept-Encoding`
//! - Compress buffered or streaming bodies of compressible content types
//!
//! # Design Decisions
//! - Skips responses that already carry `Content-Encoding`, so several
//!   encoders can be stacked and only the first applicable one runs
//! - Skips bodies below `min_length`; tiny bodies grow when gzipped
//! - Always adds `Vary: Accept-Encoding` when the response could have been
//!   compressed, so caches keep variants apart
//! - Bodies over `max_buffer` are sent uncompressed, untouched
//! - Large bodies are compressed on the blocking pool

use std::io::Write;

use axum::body::Bytes;
use axum::http::header::{HeaderValue, ACCEPT_ENCODING, CONTENT_ENCODING, CONTENT_LENGTH, VARY};
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::context::Context;
use crate::error::Result;
use crate::middleware::{from_fn, Unit};

/// Largest body the compressor will buffer.
pub const DEFAULT_COMPRESSION_LIMIT: usize = 16 * 1024 * 1024;

/// Bodies at least this large are compressed off the async workers.
const BLOCKING_THRESHOLD: usize = 64 * 1024;

/// Compression settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GzipOptions {
    /// 0 (none) to 9 (best).
    pub level: u32,
    /// Bodies shorter than this are sent as-is.
    pub min_length: usize,
    /// Bodies longer than this are sent as-is.
    pub max_buffer: usize,
}

impl Default for GzipOptions {
    fn default() -> Self {
        Self {
            level: 6,
            min_length: 256,
            max_buffer: DEFAULT_COMPRESSION_LIMIT,
        }
    }
}

/// Whether responses of this content type benefit from compression.
pub fn is_compressible(content_type: &str) -> bool {
    content_type.starts_with("text/")
        || content_type.ends_with("+json")
        || content_type.ends_with("+xml")
        || matches!(
            content_type,
            "application/json"
                | "application/javascript"
                | "application/xml"
                | "application/wasm"
                | "image/svg+xml"
        )
}

/// True when `accept` allows gzip.
///
/// An explicit `gzip` entry decides; otherwise `*` does.
fn accepts_gzip(accept: &str) -> bool {
    let mut wildcard = None;
    for item in accept.split(',') {
        let mut parts = item.split(';');
        let coding = parts.next().unwrap_or("").trim();
        let quality = parts
            .filter_map(|p| p.trim().strip_prefix("q="))
            .find_map(|q| q.trim().parse::<f32>().ok())
            .unwrap_or(1.0);

        if coding.eq_ignore_ascii_case("gzip") {
            return quality > 0.0;
        }
        if coding == "*" {
            wildcard = Some(quality > 0.0);
        }
    }
    wildcard.unwrap_or(false)
}

fn gzip(data: &[u8], level: u32) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2), Compression::new(level.min(9)));
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

fn wants_compression(ctx: &Context) -> bool {
    if !ctx.body().is_set() || ctx.response_headers().contains(CONTENT_ENCODING) {
        return false;
    }
    ctx.response_content_type()
        .is_some_and(|ct| is_compressible(&ct))
}

fn add_vary(ctx: &mut Context) {
    let already = ctx
        .response_headers()
        .get_all(VARY)
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|v| v.trim().eq_ignore_ascii_case("accept-encoding") || v.trim() == "*");
    if !already {
        ctx.response_headers_mut()
            .append(VARY, HeaderValue::from_static("accept-encoding"));
    }
}

/// Gzip the response body when the client accepts it.
pub fn compress_with_gzip(options: GzipOptions) -> Unit {
    from_fn(move |ctx| {
        Box::pin(async move {
            if !wants_compression(ctx) {
                return Ok(());
            }
            add_vary(ctx);

            let accept = ctx
                .request()
                .headers()
                .get_all(ACCEPT_ENCODING)
                .filter_map(|v| v.to_str().ok())
                .collect::<Vec<_>>()
                .join(",");
            if !accepts_gzip(&accept) {
                return Ok(());
            }

            let Some(bytes) = ctx.buffer_response_body(options.max_buffer).await? else {
                return Ok(());
            };
            if bytes.len() < options.min_length || bytes.len() > options.max_buffer {
                return Ok(());
            }

            let original = bytes.len();
            let compressed = if original >= BLOCKING_THRESHOLD {
                let bytes = bytes.clone();
                tokio::task::spawn_blocking(move || gzip(&bytes, options.level))
                    .await
                    .map_err(std::io::Error::other)??
            } else {
                gzip(bytes, options.level)?
            };
            tracing::trace!(
                request_id = %ctx.id(),
                original,
                compressed = compressed.len(),
                "Response gzipped"
            );

            ctx.response_headers_mut().remove(CONTENT_LENGTH);
            ctx.set_response_header(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
            ctx.set_body(Bytes::from(compressed));
            Ok(())
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Headers, Request, RequestBody};
    use crate::middleware::Middleware;
    use axum::body::Body;
    use axum::http::header::CONTENT_TYPE;
    use axum::http::{Method, StatusCode, Uri};
    use flate2::read::GzDecoder;
    use std::io::Read;

    fn context(accept_encoding: Option<&'static str>) -> Context {
        let uri: Uri = "/page".parse().unwrap();
        let mut headers = Headers::new();
        if let Some(value) = accept_encoding {
            headers.append(ACCEPT_ENCODING, HeaderValue::from_static(value));
        }
        Context::new(Request::new(Method::GET, &uri, headers), RequestBody::empty())
    }

    fn respond_html(ctx: &mut Context, body: String) {
        ctx.set_response_header(CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8"));
        ctx.respond(StatusCode::OK, body);
    }

    #[test]
    fn test_accepts_gzip() {
        assert!(accepts_gzip("gzip"));
        assert!(accepts_gzip("br, GZIP;q=0.5"));
        assert!(accepts_gzip("*"));
        assert!(!accepts_gzip("br, deflate"));
        assert!(!accepts_gzip("gzip;q=0"));
        assert!(!accepts_gzip("gzip;q=0, *"));
        assert!(!accepts_gzip("*, gzip;q=0"));
        assert!(accepts_gzip("br;q=0, *;q=0.1"));
        assert!(!accepts_gzip("*;q=0"));
    }

    #[test]
    fn test_is_compressible() {
        assert!(is_compressible("text/html"));
        assert!(is_compressible("application/json"));
        assert!(is_compressible("application/ld+json"));
        assert!(!is_compressible("image/png"));
    }

    #[tokio::test]
    async fn test_gzips_large_html() {
        let html = "<p>hello</p>".repeat(100);
        let mut ctx = context(Some("gzip, br"));
        respond_html(&mut ctx, html.clone());

        compress_with_gzip(GzipOptions::default()).call(&mut ctx).await.unwrap();

        assert_eq!(ctx.response_headers().get_str("content-encoding"), Some("gzip"));
        assert_eq!(ctx.response_headers().get_str("vary"), Some("accept-encoding"));

        let mut decoded = String::new();
        GzDecoder::new(&ctx.body().as_bytes().unwrap()[..])
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, html);
    }

    #[tokio::test]
    async fn test_skips_when_not_accepted_or_small() {
        let mut ctx = context(None);
        respond_html(&mut ctx, "<p>x</p>".repeat(100));
        compress_with_gzip(GzipOptions::default()).call(&mut ctx).await.unwrap();
        assert!(!ctx.response_headers().contains("content-encoding"));
        assert!(ctx.response_headers().contains("vary"));

        let mut ctx = context(Some("gzip"));
        respond_html(&mut ctx, "tiny".to_string());
        compress_with_gzip(GzipOptions::default()).call(&mut ctx).await.unwrap();
        assert!(!ctx.response_headers().contains("content-encoding"));
    }

    #[tokio::test]
    async fn test_skips_already_encoded_and_unset() {
        let mut ctx = context(Some("gzip"));
        respond_html(&mut ctx, "<p>x</p>".repeat(100));
        ctx.set_response_header(CONTENT_ENCODING, HeaderValue::from_static("br"));
        compress_with_gzip(GzipOptions::default()).call(&mut ctx).await.unwrap();
        assert_eq!(ctx.response_headers().get_str("content-encoding"), Some("br"));

        let mut ctx = context(Some("gzip"));
        compress_with_gzip(GzipOptions::default()).call(&mut ctx).await.unwrap();
        assert!(!ctx.is_responded());
    }

    #[tokio::test]
    async fn test_large_body_uses_blocking_pool() {
        let html = "<li>item</li>".repeat(10_000);
        let mut ctx = context(Some("gzip"));
        respond_html(&mut ctx, html.clone());

        compress_with_gzip(GzipOptions::default()).call(&mut ctx).await.unwrap();

        let mut decoded = String::new();
        GzDecoder::new(&ctx.body().as_bytes().unwrap()[..])
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, html);
    }

    #[tokio::test]
    async fn test_stream_over_buffer_limit_passes_through() {
        let chunks: Vec<_> = (0..8)
            .map(|_| Ok::<_, std::io::Error>(Bytes::from("<p>chunk</p>".repeat(20))))
            .collect();
        let mut ctx = context(Some("gzip"));
        ctx.set_response_header(CONTENT_TYPE, HeaderValue::from_static("text/html"));
        ctx.respond(StatusCode::OK, Body::from_stream(futures_util::stream::iter(chunks)));

        let options = GzipOptions {
            max_buffer: 1024,
            ..GzipOptions::default()
        };
        compress_with_gzip(options).call(&mut ctx).await.unwrap();

        assert!(!ctx.response_headers().contains("content-encoding"));
        let (status, _, body) = ctx.into_response_parts();
        assert_eq!(status, Some(StatusCode::OK));
        let sent = axum::body::to_bytes(body.into_body(), usize::MAX).await.unwrap();
        assert_eq!(sent, "<p>chunk</p>".repeat(160));
    }
}
