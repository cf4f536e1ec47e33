use k256::schnorr::signature::hazmat::PrehashSigner;

use crate::key::{PublicKey, SecretKey};

use super::{SigningError, signer::AssertionSigner};

/// BIP-340 Schnorr signer over secp256k1.
///
/// Borrows the caller's secret key for the duration of one signing
/// operation. Signing uses all-zero auxiliary randomness, so the same id
/// always yields the same signature.
pub struct SchnorrSigner<'a> {
    secret_key: &'a SecretKey,
}

impl<'a> SchnorrSigner<'a> {
    pub fn new(secret_key: &'a SecretKey) -> Self {
        Self { secret_key }
    }
}

impl AssertionSigner for SchnorrSigner<'_> {
    fn sign_digest(&self, digest: &[u8; 32]) -> Result<[u8; 64], SigningError> {
        let signature: k256::schnorr::Signature = self
            .secret_key
            .signing_key()
            .sign_prehash(digest)
            .map_err(SigningError::Sign)?;
        Ok(signature.to_bytes())
    }

    fn public_key(&self) -> PublicKey {
        self.secret_key.public_key()
    }

    fn algorithm(&self) -> &str {
        "schnorr-secp256k1"
    }
}
