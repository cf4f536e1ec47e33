//! Canonical description of one outgoing HTTP call.
//!
//! The tag order is part of the signed identifier: `method`, then `u`, then
//! `payload` when a body is present. Reordering them is a protocol break.

use std::{
    fmt,
    time::{SystemTime, UNIX_EPOCH},
};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::digest::payload_digest;

#[derive(Debug, thiserror::Error)]
pub enum CanonicalizationError {
    #[error("request path is empty")]
    EmptyPath,
    #[error("request path must start with '/': {0}")]
    RelativePath(String),
    #[error("invalid request url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("{0} requests cannot carry a body")]
    BodyNotAllowed(HttpMethod),
    #[error("failed to serialize request body: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// HTTP verbs that get signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for http::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => http::Method::GET,
            HttpMethod::Post => http::Method::POST,
        }
    }
}

/// A single tag: a name followed by its values, serialized as a JSON array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(Vec<String>);

impl Tag {
    pub fn new(name: &str, value: impl Into<String>) -> Self {
        Self(vec![name.to_string(), value.into()])
    }

    pub fn name(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn value(&self) -> Option<&str> {
        self.0.get(1).map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

/// Tags and timestamp for one request, ready to be signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalPayload {
    created_at: u64,
    tags: Vec<Tag>,
}

impl CanonicalPayload {
    /// Builds the payload stamped with the current wall-clock second.
    pub fn new(
        method: HttpMethod,
        url: &str,
        body: Option<&[u8]>,
    ) -> Result<Self, CanonicalizationError> {
        Self::with_created_at(method, url, body, unix_now())
    }

    /// `url` must be an absolute http(s) URL and a GET must not carry a body.
    pub fn with_created_at(
        method: HttpMethod,
        url: &str,
        body: Option<&[u8]>,
        created_at: u64,
    ) -> Result<Self, CanonicalizationError> {
        validate_url(url)?;
        if method == HttpMethod::Get && body.is_some() {
            return Err(CanonicalizationError::BodyNotAllowed(method));
        }

        let mut tags = vec![Tag::new("method", method.as_str()), Tag::new("u", url)];
        if let Some(body) = body {
            tags.push(Tag::new("payload", payload_digest(body)));
        }
        Ok(Self { created_at, tags })
    }

    /// Serializes `body` to compact JSON and builds the payload over exactly
    /// those bytes. The returned bytes are what must go on the wire.
    pub fn for_json<B: Serialize + ?Sized>(
        method: HttpMethod,
        url: &str,
        body: Option<&B>,
    ) -> Result<(Self, Option<Vec<u8>>), CanonicalizationError> {
        let bytes = body.map(serde_json::to_vec).transpose()?;
        Ok((Self::new(method, url, bytes.as_deref())?, bytes))
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub(crate) fn into_parts(self) -> (u64, Vec<Tag>) {
        (self.created_at, self.tags)
    }
}

/// Concatenates `base` and `path` into the absolute URL a token authorizes.
///
/// The joined string is returned verbatim; the `url` crate is only used to
/// check it is an absolute http(s) URL with a host.
pub fn join_url(base: &str, path: &str) -> Result<String, CanonicalizationError> {
    if path.is_empty() {
        return Err(CanonicalizationError::EmptyPath);
    }
    if !path.starts_with('/') {
        return Err(CanonicalizationError::RelativePath(path.to_string()));
    }

    let joined = format!("{}{}", base.trim_end_matches('/'), path);
    validate_url(&joined)?;
    Ok(joined)
}

fn validate_url(url: &str) -> Result<(), CanonicalizationError> {
    let parsed = Url::parse(url).map_err(|e| CanonicalizationError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(CanonicalizationError::InvalidUrl {
            url: url.to_string(),
            reason: "expected an absolute http(s) url".to_string(),
        });
    }
    Ok(())
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
