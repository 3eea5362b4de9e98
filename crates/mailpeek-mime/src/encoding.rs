//! Base64url decoding for Gmail body data.
//!
//! Gmail encodes `body.data` with the URL-safe alphabet (`-` and `_` in place
//! of `+` and `/`) and frequently drops the trailing `=` padding.

use base64::Engine;
use base64::alphabet;
use base64::engine::general_purpose::URL_SAFE;
use base64::engine::{GeneralPurpose, GeneralPurposeConfig};

/// Standard alphabet, accepting non-zero bits after the last whole byte.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// Encodes bytes with the URL-safe alphabet, padded.
#[must_use]
pub fn encode_base64url(data: &[u8]) -> String {
    URL_SAFE.encode(data)
}

/// Decodes base64url data into raw bytes.
///
/// The URL-safe characters are mapped back onto the standard alphabet, ASCII
/// whitespace is dropped and missing padding is restored before decoding.
/// Stray bits in the final character are ignored.
///
/// # Errors
///
/// Returns an error if the input is not valid base64 after normalization.
pub fn decode_base64url_bytes(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let mut normalized: String = data
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();

    let rem = normalized.len() % 4;
    if rem != 0 {
        normalized.extend(std::iter::repeat_n('=', 4 - rem));
    }

    LENIENT.decode(normalized)
}

/// Decodes base64url data into text.
///
/// Invalid UTF-8 sequences are replaced with U+FFFD. Input that is not base64
/// at all decodes to an empty string; this function never fails.
#[must_use]
pub fn decode_base64url(data: &str) -> String {
    match decode_base64url_bytes(data) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            tracing::debug!("Discarding undecodable body data ({} bytes): {}", data.len(), e);
            String::new()
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_decode_padded() {
        assert_eq!(decode_base64url("aGVsbG8="), "hello");
        assert_eq!(decode_base64url("d29ybGQ="), "world");
    }

    #[test]
    fn test_decode_unpadded() {
        assert_eq!(decode_base64url("aGVsbG8"), "hello");
        assert_eq!(decode_base64url("SGk"), "Hi");
    }

    #[test]
    fn test_decode_url_safe_alphabet() {
        // "<b>" encodes to "PGI+" in the standard alphabet
        assert_eq!(decode_base64url("PGI-"), "<b>");
        // 0xFF 0xFF encodes to "//8=" in the standard alphabet
        assert_eq!(decode_base64url_bytes("__8=").unwrap(), vec![0xFF, 0xFF]);
    }

    #[test]
    fn test_decode_ignores_trailing_bits() {
        assert_eq!(decode_base64url("aGVsbG9="), "hello");
        assert_eq!(decode_base64url("SGl"), "Hi");
    }

    #[test]
    fn test_decode_ignores_line_breaks() {
        assert_eq!(decode_base64url("aGVs\r\nbG8="), "hello");
    }

    #[test]
    fn test_decode_invalid_utf8_is_lossy() {
        // 0x68 0x69 0xFF -> "hi" followed by an invalid byte
        let encoded = encode_base64url(&[0x68, 0x69, 0xFF]);
        assert_eq!(decode_base64url(&encoded), "hi\u{FFFD}");
    }

    #[test]
    fn test_decode_garbage_is_empty() {
        assert_eq!(decode_base64url("!!!!"), "");
        assert_eq!(decode_base64url("a"), "");
    }

    #[test]
    fn test_decode_empty() {
        assert_eq!(decode_base64url(""), "");
    }

    proptest! {
        #[test]
        fn prop_round_trip(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
            let encoded = encode_base64url(&bytes);
            prop_assert_eq!(decode_base64url_bytes(&encoded).unwrap(), bytes.clone());
            let unpadded = encoded.trim_end_matches('=');
            prop_assert_eq!(decode_base64url_bytes(unpadded).unwrap(), bytes);
        }

        #[test]
        fn prop_text_round_trip(text in "\\PC{0,200}") {
            prop_assert_eq!(decode_base64url(&encode_base64url(text.as_bytes())), text);
        }
    }
}
