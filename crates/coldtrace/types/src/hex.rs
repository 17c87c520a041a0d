//! Fixed-width hex text shared by addresses and digests.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HexError {
    #[error("expected {expected} hex digits, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("invalid hex digit")]
    InvalidDigit,
}

pub(crate) fn encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Decode exactly `N` bytes. A leading `0x` is accepted.
pub(crate) fn decode<const N: usize>(text: &str) -> Result<[u8; N], HexError> {
    let digits = text.strip_prefix("0x").unwrap_or(text).as_bytes();
    if digits.len() != N * 2 {
        return Err(HexError::InvalidLength {
            expected: N * 2,
            actual: digits.len(),
        });
    }
    let mut out = [0u8; N];
    for (byte, pair) in out.iter_mut().zip(digits.chunks_exact(2)) {
        *byte = (nibble(pair[0])? << 4) | nibble(pair[1])?;
    }
    Ok(out)
}

fn nibble(digit: u8) -> Result<u8, HexError> {
    match digit {
        b'0'..=b'9' => Ok(digit - b'0'),
        b'a'..=b'f' => Ok(digit - b'a' + 10),
        b'A'..=b'F' => Ok(digit - b'A' + 10),
        _ => Err(HexError::InvalidDigit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_either_case_and_prefix() {
        assert_eq!(decode::<2>("0xBEef"), Ok([0xbe, 0xef]));
        assert_eq!(decode::<2>("beef"), Ok([0xbe, 0xef]));
        assert_eq!(encode(&[0xbe, 0xef]), "beef");
    }

    #[test]
    fn rejects_wrong_width_and_non_hex() {
        assert_eq!(
            decode::<2>("bee"),
            Err(HexError::InvalidLength {
                expected: 4,
                actual: 3
            })
        );
        assert_eq!(decode::<2>("be+f"), Err(HexError::InvalidDigit));
        // Multi-byte characters are rejected without slicing inside them.
        assert_eq!(decode::<1>("é"), Err(HexError::InvalidDigit));
    }
}
