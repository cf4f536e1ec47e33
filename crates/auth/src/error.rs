use serde_json::Value;

use crate::{
    canonical::CanonicalizationError, key::KeyError, signing::SigningError, token::TokenError,
    transport::TransportError,
};

/// Every failure an authenticated call can report to its caller.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("credential key error: {0}")]
    Key(#[from] KeyError),
    #[error("failed to canonicalize request: {0}")]
    Canonicalization(#[from] CanonicalizationError),
    #[error("failed to sign request: {0}")]
    Signing(#[from] SigningError),
    #[error("failed to encode credential: {0}")]
    Token(#[from] TokenError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Server(#[from] ServerError),
}

/// Structured error reported by the far end in a response body.
///
/// `message` is kept verbatim, including embedded newlines.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ServerError {
    pub kind: String,
    pub message: String,
    pub code: Option<i64>,
    pub status_code: Option<u16>,
}

impl ServerError {
    /// Parses a response body. Returns `None` unless the body is a JSON
    /// object whose `error` field is present and truthy.
    ///
    /// A non-string `error` (e.g. `true`) is reported with kind `"error"`.
    /// The remaining fields are read leniently: a field of the wrong type
    /// is dropped rather than discarding the whole error.
    pub fn from_body(body: &[u8]) -> Option<Self> {
        let value: Value = serde_json::from_slice(body).ok()?;
        let object = value.as_object()?;

        let kind = match object.get("error")? {
            Value::Null | Value::Bool(false) => return None,
            Value::Number(number) if number.as_f64() == Some(0.0) => return None,
            Value::String(kind) if kind.is_empty() => return None,
            Value::String(kind) => kind.clone(),
            _ => "error".to_string(),
        };

        let message = match object.get("message") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(message)) => message.clone(),
            Some(other) => other.to_string(),
        };

        Some(Self {
            kind,
            message,
            code: object.get("code").and_then(integer),
            status_code: object
                .get("status_code")
                .and_then(integer)
                .and_then(|status| u16::try_from(status).ok()),
        })
    }
}

fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}
