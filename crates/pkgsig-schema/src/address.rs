//! Normalized account addresses derived from secp256k1 public keys.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Errors that can occur when parsing an account address.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// The hex portion is not exactly 40 characters (20 bytes).
    #[error("invalid address length: expected 40 hex chars, got {0}")]
    Length(usize),

    /// The hex portion contains non-hex characters.
    #[error("address contains non-hex characters: '{0}'")]
    NonHex(String),
}

/// A normalized secp256k1 account address: `0x` followed by 40 lowercase hex
/// characters.
///
/// Normalization (lowercasing, `0x`-prefixing) happens in the constructor, so
/// every `Address` in the system compares and formats identically no matter
/// how it was written on the wire. Signature file names are derived from this
/// form, which is what makes the same signer always map to the same file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Parse and normalize an address string, with or without a `0x` prefix.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError`] if the hex portion is not exactly 40 ASCII
    /// hex characters.
    pub fn parse(s: &str) -> Result<Self, AddressError> {
        let hex_part = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);

        if hex_part.len() != 40 {
            return Err(AddressError::Length(hex_part.len()));
        }
        if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AddressError::NonHex(s.to_string()));
        }

        Ok(Self(format!("0x{}", hex_part.to_lowercase())))
    }

    /// Build an address from raw 20-byte account form.
    pub fn from_account_bytes(bytes: [u8; 20]) -> Self {
        Self(format!("0x{}", hex::encode(bytes)))
    }

    /// Return the normalized `0x`-prefixed form as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "f863ac227b0a0bca88cb2ff45d91632626ce32e7";

    #[test]
    fn parse_adds_prefix_and_lowercases() {
        let upper = ADDR.to_uppercase();
        let addr = Address::parse(&upper).unwrap();
        assert_eq!(addr.as_str(), format!("0x{ADDR}"));
    }

    #[test]
    fn parse_keeps_existing_prefix() {
        let addr = Address::parse(&format!("0x{ADDR}")).unwrap();
        assert_eq!(addr.as_str(), format!("0x{ADDR}"));
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(matches!(
            Address::parse("0xabcd"),
            Err(AddressError::Length(4))
        ));
    }

    #[test]
    fn rejects_non_hex() {
        let bad = "zz".repeat(20);
        assert!(matches!(Address::parse(&bad), Err(AddressError::NonHex(_))));
    }

    #[test]
    fn deserialize_normalizes() {
        let json = format!("\"0X{}\"", ADDR.to_uppercase());
        let addr: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(addr.as_str(), format!("0x{ADDR}"));
    }

    #[test]
    fn deserialize_rejects_malformed() {
        let result: Result<Address, _> = serde_json::from_str("\"0x1234\"");
        assert!(result.is_err());
    }
}
