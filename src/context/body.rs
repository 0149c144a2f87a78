//! Request and response bodies.

use axum::body::{Body, Bytes};

use crate::error::{PipelineError, Result};

/// Request body stream that can be taken exactly once.
#[derive(Debug)]
pub struct RequestBody {
    inner: Option<Body>,
}

impl RequestBody {
    pub fn new(body: Body) -> Self {
        Self { inner: Some(body) }
    }

    pub fn empty() -> Self {
        Self::new(Body::empty())
    }

    /// Take the raw stream. Fails if it was already taken.
    pub fn take(&mut self) -> Result<Body> {
        self.inner.take().ok_or(PipelineError::BodyAlreadyConsumed)
    }

    /// Collect the whole stream, failing once more than `limit` bytes arrive.
    pub async fn read_to_bytes(&mut self, limit: usize) -> Result<Bytes> {
        let body = self.take()?;
        Ok(axum::body::to_bytes(body, limit).await?)
    }

    pub fn is_consumed(&self) -> bool {
        self.inner.is_none()
    }
}

/// The response payload, if any.
#[derive(Debug, Default)]
pub enum ResponseBody {
    #[default]
    Unset,
    Full(Bytes),
    Stream(Body),
}

impl ResponseBody {
    pub fn is_set(&self) -> bool {
        !matches!(self, ResponseBody::Unset)
    }

    /// In-memory bytes, when the body is already buffered.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            ResponseBody::Full(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn into_body(self) -> Body {
        match self {
            ResponseBody::Unset => Body::empty(),
            ResponseBody::Full(bytes) => Body::from(bytes),
            ResponseBody::Stream(body) => body,
        }
    }
}

impl From<Bytes> for ResponseBody {
    fn from(bytes: Bytes) -> Self {
        ResponseBody::Full(bytes)
    }
}

impl From<String> for ResponseBody {
    fn from(s: String) -> Self {
        ResponseBody::Full(Bytes::from(s))
    }
}

impl From<&'static str> for ResponseBody {
    fn from(s: &'static str) -> Self {
        ResponseBody::Full(Bytes::from_static(s.as_bytes()))
    }
}

impl From<Vec<u8>> for ResponseBody {
    fn from(v: Vec<u8>) -> Self {
        ResponseBody::Full(Bytes::from(v))
    }
}

impl From<Body> for ResponseBody {
    fn from(body: Body) -> Self {
        ResponseBody::Stream(body)
    }
}
