use sha2::{Digest, Sha256};

/// SHA-256 of `data`.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Lowercase hex SHA-256 of a serialized request body, as carried in the
/// `payload` tag.
pub fn payload_digest(body: &[u8]) -> String {
    hex::encode(sha256(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_matches_known_digest() {
        assert_eq!(
            payload_digest(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn digest_is_64_lowercase_hex_chars() {
        let digest = payload_digest(br#"{"amount":1}"#);
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn deterministic() {
        assert_eq!(payload_digest(b"hello"), payload_digest(b"hello"));
        assert_ne!(payload_digest(b"hello"), payload_digest(b"hellp"));
    }

    #[test]
    fn matches_sha2_directly() {
        let expected = hex::encode(Sha256::digest(b"abc"));
        assert_eq!(payload_digest(b"abc"), expected);
        assert_eq!(
            expected,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
