use thiserror::Error;

use crate::Address;

/// Length of a 20-byte address rendered as hex, without prefix.
pub const ADDRESS_HEX_LEN: usize = 40;

/// Strips the '0x' prefix off of hex string so it can be deserialized.
///
/// # Arguments
///
/// * `s` - The hex str
pub fn strip_0x_prefix(s: &str) -> &str {
    if s.len() < 2 || &s[..2] != "0x" {
        s
    } else {
        &s[2..]
    }
}

/// Render bytes as a `0x` prefixed hex string.
pub fn bytes_to_hex(bytes: impl AsRef<[u8]>) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Render an address as 40 lowercase hex characters, without prefix.
pub fn address_to_hex(address: &Address) -> String {
    hex::encode(address.as_bytes())
}

/// A Hex String of length `N` representing bytes of length `N / 2`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexString<const N: usize>(String);

/// An hex string parsing error
#[derive(Error, Debug, PartialEq, Eq)]
pub enum HexStringError {
    /// String was expected to be of a different length
    #[error("Expected string of length {expected}, got {actual}")]
    InvalidStringLength {
        /// expected string length
        expected: usize,
        /// actual string length
        actual: usize,
    },
    /// String was expected to start with `0x`
    #[error("Expected a 0x prefix: {0:?}")]
    MissingPrefix(String),
    /// Provided string was not hex
    #[error("The provided string is not hex: {0:?}")]
    NotHex(String),
}

impl<const N: usize> AsRef<str> for HexString<N> {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<const N: usize> HexString<N> {
    /// Instantiate a new HexString from any `AsRef<str>`. Tolerates 0x
    /// prefixing. A succesful instantiation will create an owned copy of the
    /// string.
    pub fn from_string<S: AsRef<str>>(candidate: S) -> Result<Self, HexStringError> {
        let s = strip_0x_prefix(candidate.as_ref());

        if s.len() != N {
            return Err(HexStringError::InvalidStringLength {
                actual: s.len(),
                expected: N,
            });
        }

        if !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(HexStringError::NotHex(s.to_owned()));
        }
        Ok(Self(s.to_owned()))
    }

    /// Like [`HexString::from_string`], but the `0x` prefix is mandatory.
    pub fn from_prefixed<S: AsRef<str>>(candidate: S) -> Result<Self, HexStringError> {
        let candidate = candidate.as_ref();
        if !candidate.starts_with("0x") {
            return Err(HexStringError::MissingPrefix(candidate.to_owned()));
        }
        Self::from_string(candidate)
    }

    /// Decode into raw bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        // validated as hex of even length on construction
        hex::decode(&self.0).unwrap_or_default()
    }
}

/// Parse a `0x` prefixed, 40 hex character address.
pub fn parse_address(candidate: &str) -> Result<Address, HexStringError> {
    let hex = HexString::<ADDRESS_HEX_LEN>::from_prefixed(candidate)?;
    Ok(Address::from_slice(&hex.to_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_address() {
        let addr = parse_address("0xabc51b5cee8be8b97d2e9631c5919e4488411126").unwrap();
        assert_eq!(
            address_to_hex(&addr),
            "abc51b5cee8be8b97d2e9631c5919e4488411126"
        );
    }

    #[test]
    fn accepts_mixed_case() {
        assert!(parse_address("0xABC51b5cee8be8b97d2e9631c5919e4488411126").is_ok());
    }

    #[test]
    fn rejects_short_address() {
        assert_eq!(
            parse_address("0xShort"),
            Err(HexStringError::InvalidStringLength {
                expected: 40,
                actual: 5
            })
        );
    }

    #[test]
    fn rejects_missing_prefix_and_non_hex() {
        assert!(matches!(
            parse_address("abc51b5cee8be8b97d2e9631c5919e4488411126"),
            Err(HexStringError::MissingPrefix(_))
        ));
        assert!(matches!(
            parse_address("0xzzc51b5cee8be8b97d2e9631c5919e4488411126"),
            Err(HexStringError::NotHex(_))
        ));
    }
}
