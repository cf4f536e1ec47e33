use std::{fmt, str::FromStr};

use bech32::{Bech32, Hrp};
use k256::schnorr::{SigningKey, VerifyingKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

const NSEC_HRP: Hrp = Hrp::parse_unchecked("nsec");
const NPUB_HRP: Hrp = Hrp::parse_unchecked("npub");

#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("no secret key configured")]
    Missing,
    #[error("invalid key length: expected 64 hex characters, got {0}")]
    InvalidLength(usize),
    #[error("invalid hex in key: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    #[error("invalid bech32 key: {0}")]
    Bech32(#[from] bech32::DecodeError),
    #[error("failed to bech32-encode key: {0}")]
    Encode(#[from] bech32::EncodeError),
    #[error("expected a {expected} key, got '{found}'")]
    WrongKeyType { expected: &'static str, found: String },
    #[error("key is not a valid secp256k1 scalar")]
    InvalidScalar,
    #[error("key is not a valid secp256k1 x-only point")]
    InvalidPoint,
}

/// 32-byte secp256k1 secret, validated as a non-zero scalar below the
/// curve order.
///
/// Accepts either 64 hex characters or a bech32 `nsec1…` string. A bech32
/// string of any other type (for example an `npub`) is rejected.
#[derive(Clone)]
pub struct SecretKey {
    inner: SigningKey,
}

impl SecretKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() != 32 {
            return Err(KeyError::InvalidLength(bytes.len() * 2));
        }
        let inner = SigningKey::from_bytes(bytes).map_err(|_| KeyError::InvalidScalar)?;
        Ok(Self { inner })
    }

    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        Self::from_bytes(&decode_hex_32(s)?)
    }

    pub fn from_bech32(s: &str) -> Result<Self, KeyError> {
        let data = decode_bech32(s, NSEC_HRP, "secret")?;
        Self::from_bytes(&data)
    }

    /// Derives the BIP-340 x-only public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.inner.verifying_key().to_bytes().into())
    }

    pub fn to_bech32(&self) -> Result<String, KeyError> {
        encode_bech32(NSEC_HRP, &self.inner.to_bytes())
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.inner
    }
}

impl FromStr for SecretKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if looks_like_bech32(s) {
            Self::from_bech32(s)
        } else {
            Self::from_hex(s)
        }
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

impl<'de> Deserialize<'de> for SecretKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// BIP-340 x-only public key. Serialized as lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; 32]);

impl PublicKey {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn to_bech32(&self) -> Result<String, KeyError> {
        encode_bech32(NPUB_HRP, &self.0)
    }

    pub(crate) fn verifying_key(&self) -> Result<VerifyingKey, KeyError> {
        VerifyingKey::from_bytes(&self.0).map_err(|_| KeyError::InvalidPoint)
    }
}

impl FromStr for PublicKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if looks_like_bech32(s) {
            let data = decode_bech32(s, NPUB_HRP, "public")?;
            let mut bytes = [0u8; 32];
            bytes.copy_from_slice(&data);
            Ok(Self(bytes))
        } else {
            Ok(Self(decode_hex_32(s)?))
        }
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl Serialize for PublicKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

fn looks_like_bech32(s: &str) -> bool {
    let lower = s.to_ascii_lowercase();
    lower.starts_with("nsec1") || lower.starts_with("npub1")
}

fn decode_hex_32(s: &str) -> Result<[u8; 32], KeyError> {
    if s.len() != 64 {
        return Err(KeyError::InvalidLength(s.len()));
    }
    let mut bytes = [0u8; 32];
    hex::decode_to_slice(s, &mut bytes)?;
    Ok(bytes)
}

fn decode_bech32(s: &str, expected: Hrp, kind: &'static str) -> Result<Vec<u8>, KeyError> {
    let (hrp, data) = bech32::decode(s)?;
    if hrp.to_lowercase() != expected.to_lowercase() {
        return Err(KeyError::WrongKeyType {
            expected: kind,
            found: hrp.to_lowercase(),
        });
    }
    if data.len() != 32 {
        return Err(KeyError::InvalidLength(data.len() * 2));
    }
    Ok(data)
}

fn encode_bech32(hrp: Hrp, data: &[u8]) -> Result<String, KeyError> {
    Ok(bech32::encode::<Bech32>(hrp, data)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NSEC: &str = "nsec1cfnu2t9xpdxk25ufrtfqrm4a5whjrtwuakmzha3ye9pyzwsva4rqr0d73w";
    const SECRET_HEX: &str = "c267c52ca60b4d6553891ad201eebda3af21addcedb62bf624c942413a0ced46";
    const NPUB: &str = "npub1fuvh5hz9tvyesqnrsrjlfy45j9dwj0zrzuzs4jy53kff850ge5sq6te9w6";
    const PUBKEY_HEX: &str = "4f197a5c455b0998026380e5f492b4915ae93c4317050ac8948d9293d1e8cd20";

    #[test]
    fn hex_and_nsec_decode_to_same_key() {
        let from_hex: SecretKey = SECRET_HEX.parse().unwrap();
        let from_nsec: SecretKey = NSEC.parse().unwrap();
        assert_eq!(
            from_hex.signing_key().to_bytes(),
            from_nsec.signing_key().to_bytes()
        );
    }

    #[test]
    fn derives_expected_public_key() {
        let key: SecretKey = SECRET_HEX.parse().unwrap();
        assert_eq!(key.public_key().to_hex(), PUBKEY_HEX);
        assert_eq!(key.public_key().to_bech32().unwrap(), NPUB);
    }

    #[test]
    fn secret_key_bech32_roundtrip() {
        let key: SecretKey = SECRET_HEX.parse().unwrap();
        assert_eq!(key.to_bech32().unwrap(), NSEC);
    }

    #[test]
    fn oversized_bech32_payload_is_an_error() {
        let err = encode_bech32(NPUB_HRP, &[0u8; 128]).unwrap_err();
        assert!(matches!(err, KeyError::Encode(_)));
    }

    #[test]
    fn npub_rejected_as_secret_key() {
        let err = NPUB.parse::<SecretKey>().unwrap_err();
        assert!(matches!(err, KeyError::WrongKeyType { expected: "secret", .. }));
    }

    #[test]
    fn wrong_length_rejected() {
        let err = "abcd".parse::<SecretKey>().unwrap_err();
        assert!(matches!(err, KeyError::InvalidLength(4)));
    }

    #[test]
    fn non_hex_rejected() {
        let input = "z".repeat(64);
        let err = input.parse::<SecretKey>().unwrap_err();
        assert!(matches!(err, KeyError::InvalidHex(_)));
    }

    #[test]
    fn zero_scalar_rejected() {
        let input = "0".repeat(64);
        let err = input.parse::<SecretKey>().unwrap_err();
        assert!(matches!(err, KeyError::InvalidScalar));
    }

    #[test]
    fn scalar_above_order_rejected() {
        let input = "f".repeat(64);
        let err = input.parse::<SecretKey>().unwrap_err();
        assert!(matches!(err, KeyError::InvalidScalar));
    }

    #[test]
    fn corrupted_nsec_rejected() {
        let mut corrupted = NSEC.to_string();
        corrupted.pop();
        corrupted.push('q');
        let err = corrupted.parse::<SecretKey>().unwrap_err();
        assert!(matches!(err, KeyError::Bech32(_)));
    }

    #[test]
    fn deserialize_secret_key_from_json_string() {
        let key: SecretKey = serde_json::from_str(&format!("\"{NSEC}\"")).unwrap();
        assert_eq!(key.public_key().to_hex(), PUBKEY_HEX);

        let key: SecretKey = serde_json::from_str(&format!("\"{SECRET_HEX}\"")).unwrap();
        assert_eq!(key.public_key().to_hex(), PUBKEY_HEX);
    }

    #[test]
    fn public_key_parses_hex_and_npub() {
        let from_npub: PublicKey = NPUB.parse().unwrap();
        let from_hex: PublicKey = PUBKEY_HEX.parse().unwrap();
        assert_eq!(from_npub, from_hex);
    }

    #[test]
    fn nsec_rejected_as_public_key() {
        let err = NSEC.parse::<PublicKey>().unwrap_err();
        assert!(matches!(err, KeyError::WrongKeyType { expected: "public", .. }));
    }

    #[test]
    fn debug_output_hides_secret() {
        let key: SecretKey = SECRET_HEX.parse().unwrap();
        let debug = format!("{key:?}");
        assert!(!debug.contains(SECRET_HEX));
        assert!(debug.contains(PUBKEY_HEX));
    }
}
