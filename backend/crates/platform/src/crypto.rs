//! Digest and Text Encoding
//!
//! Content hashes are SHA-256 in lowercase hex. Binary payloads travel as
//! standard base64 with padding; decoding is strict, so each byte string
//! has exactly one accepted text form.

use base64::{Engine, engine::general_purpose::STANDARD};
use sha2::{Digest, Sha256};

/// SHA-256 of `data` as 64 lowercase hex characters
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

pub fn to_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Rejects missing padding, URL-safe characters and trailing garbage.
pub fn from_base64(text: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_digest_of_empty_payload() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_png_header_encoding() {
        assert_eq!(to_base64(b"\x89PNG\r\n\x1a\n"), "iVBORw0KGgo=");
    }

    #[test]
    fn test_strict_decoding() {
        assert!(from_base64("aGk").is_err());
        assert!(from_base64("a-_b").is_err());
        assert!(from_base64("aGk=!").is_err());
        assert_eq!(from_base64("").unwrap(), Vec::<u8>::new());
    }

    proptest! {
        #[test]
        fn prop_base64_is_symmetric(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
            let text = to_base64(&bytes);
            prop_assert_eq!(from_base64(&text).unwrap(), bytes);
        }
    }
}
