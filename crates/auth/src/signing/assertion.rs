use k256::schnorr::{Signature, signature::hazmat::PrehashVerifier};
use serde::{Deserialize, Serialize};

use crate::{
    canonical::{CanonicalPayload, Tag},
    digest::sha256,
    key::PublicKey,
};

use super::{SigningError, signer::AssertionSigner};

/// Kind discriminator for an HTTP authorization assertion.
pub const HTTP_AUTH_KIND: u16 = 27235;

/// A signed HTTP authorization assertion.
///
/// Field order matches the token wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedAssertion {
    pub kind: u16,
    pub created_at: u64,
    pub tags: Vec<Tag>,
    pub content: String,
    pub pubkey: PublicKey,
    /// Lowercase hex SHA-256 of the canonical serialization.
    pub id: String,
    /// Lowercase hex BIP-340 signature of `id`.
    pub sig: String,
}

impl SignedAssertion {
    /// Recomputes the id from `[0, pubkey, created_at, kind, tags, content]`.
    pub fn compute_id(&self) -> Result<[u8; 32], SigningError> {
        assertion_id(
            &self.pubkey,
            self.created_at,
            self.kind,
            &self.tags,
            &self.content,
        )
    }

    /// Checks that `id` matches the contents and `sig` verifies against
    /// `pubkey`.
    pub fn verify(&self) -> Result<(), SigningError> {
        let id = self.compute_id()?;
        if hex::encode(id) != self.id {
            return Err(SigningError::IdMismatch);
        }

        let mut sig_bytes = [0u8; 64];
        hex::decode_to_slice(&self.sig, &mut sig_bytes)
            .map_err(|_| SigningError::MalformedSignature)?;
        let signature = Signature::try_from(sig_bytes.as_slice())
            .map_err(|_| SigningError::MalformedSignature)?;

        self.pubkey
            .verifying_key()?
            .verify_prehash(&id, &signature)
            .map_err(|_| SigningError::BadSignature)
    }

    pub fn method(&self) -> Option<&str> {
        self.tag_value("method")
    }

    pub fn url(&self) -> Option<&str> {
        self.tag_value("u")
    }

    pub fn payload_hash(&self) -> Option<&str> {
        self.tag_value("payload")
    }

    fn tag_value(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|tag| tag.name() == Some(name))
            .and_then(Tag::value)
    }
}

/// Signs a canonical payload, producing a complete assertion or nothing.
pub fn sign_payload(
    signer: &dyn AssertionSigner,
    payload: CanonicalPayload,
) -> Result<SignedAssertion, SigningError> {
    let pubkey = signer.public_key();
    let (created_at, tags) = payload.into_parts();
    let content = String::new();

    let id = assertion_id(&pubkey, created_at, HTTP_AUTH_KIND, &tags, &content)?;
    let sig = signer.sign_digest(&id)?;

    tracing::debug!(
        pubkey = %pubkey,
        created_at,
        id = %hex::encode(id),
        algorithm = signer.algorithm(),
        "signed http auth assertion"
    );

    Ok(SignedAssertion {
        kind: HTTP_AUTH_KIND,
        created_at,
        tags,
        content,
        pubkey,
        id: hex::encode(id),
        sig: hex::encode(sig),
    })
}

fn assertion_id(
    pubkey: &PublicKey,
    created_at: u64,
    kind: u16,
    tags: &[Tag],
    content: &str,
) -> Result<[u8; 32], SigningError> {
    let serialized = serde_json::to_string(&(0u8, pubkey, created_at, kind, tags, content))?;
    Ok(sha256(serialized.as_bytes()))
}
