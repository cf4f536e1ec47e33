//! Credential token encoding: base64 of the JSON-serialized assertion.

use base64::engine::{Engine, general_purpose};
use http::HeaderValue;

use crate::signing::SignedAssertion;

/// Authorization scheme name.
pub const SCHEME: &str = "Nostr";

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("authorization value is not a Nostr credential")]
    WrongScheme,
    #[error("token is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("token is not a valid assertion: {0}")]
    Json(#[from] serde_json::Error),
    #[error("token is not a valid header value")]
    InvalidHeader(#[from] http::header::InvalidHeaderValue),
}

pub fn encode(assertion: &SignedAssertion) -> Result<String, TokenError> {
    let json = serde_json::to_vec(assertion)?;
    Ok(general_purpose::STANDARD.encode(json))
}

pub fn decode(token: &str) -> Result<SignedAssertion, TokenError> {
    let buf = general_purpose::STANDARD.decode(token.trim())?;
    Ok(serde_json::from_slice(&buf)?)
}

/// Full `Authorization` header value, `Nostr <token>`.
pub fn authorization_value(assertion: &SignedAssertion) -> Result<String, TokenError> {
    Ok(format!("{SCHEME} {}", encode(assertion)?))
}

/// [`authorization_value`] as a typed header value.
pub fn authorization_header(assertion: &SignedAssertion) -> Result<HeaderValue, TokenError> {
    Ok(HeaderValue::from_str(&authorization_value(assertion)?)?)
}

/// Parses an `Authorization` header value. The scheme name is matched
/// case-insensitively and must be followed by whitespace.
pub fn parse_authorization(value: &str) -> Result<SignedAssertion, TokenError> {
    let (scheme, token) = value
        .trim()
        .split_once(|c: char| c.is_ascii_whitespace())
        .ok_or(TokenError::WrongScheme)?;
    if !scheme.eq_ignore_ascii_case(SCHEME) {
        return Err(TokenError::WrongScheme);
    }
    decode(token)
}
