use crate::key::PublicKey;

use super::SigningError;

/// Trait for signing assertion identifiers.
///
/// Implementations are sync; signing is CPU-bound.
pub trait AssertionSigner: Send + Sync {
    /// Sign a 32-byte assertion id. Returns the raw 64-byte signature.
    fn sign_digest(&self, digest: &[u8; 32]) -> Result<[u8; 64], SigningError>;

    /// x-only public key the signature verifies against.
    fn public_key(&self) -> PublicKey;

    /// Algorithm identifier string.
    fn algorithm(&self) -> &str;
}
