mod assertion;
mod schnorr;
mod signer;

pub use assertion::{HTTP_AUTH_KIND, SignedAssertion, sign_payload};
pub use schnorr::SchnorrSigner;
pub use signer::AssertionSigner;

#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    #[error("schnorr signing failed: {0}")]
    Sign(k256::schnorr::signature::Error),
    #[error("failed to serialize assertion: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("assertion id does not match its contents")]
    IdMismatch,
    #[error("invalid signature encoding")]
    MalformedSignature,
    #[error("signature does not verify against pubkey")]
    BadSignature,
    #[error(transparent)]
    Key(#[from] crate::key::KeyError),
}
