use crate::hash::keccak256;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Errors that can occur when parsing or deriving an address.
#[derive(Debug, thiserror::Error)]
pub enum AddressError {
    #[error("address must start with '0x'")]
    InvalidPrefix,
    #[error("address must be {expected} characters, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("address payload is not valid hexadecimal")]
    InvalidHex(#[from] hex::FromHexError),
    #[error("public key must be {expected} uncompressed SEC1 bytes, got {actual}")]
    InvalidPublicKey { expected: usize, actual: usize },
}

/// Number of raw bytes contained in an address.
pub const ADDRESS_BYTES: usize = 20;
/// Expected string length of an encoded address (`0x` + 40 hex chars).
pub const ADDRESS_STRING_LENGTH: usize = 2 + ADDRESS_BYTES * 2;
/// Length of an uncompressed SEC1 secp256k1 public key (`0x04 || X || Y`).
pub const UNCOMPRESSED_PUBLIC_KEY_BYTES: usize = 65;

/// Encode a 20-byte address as `0x`-prefixed lowercase hex.
pub fn encode_address(bytes: &[u8; ADDRESS_BYTES]) -> String {
    let mut encoded = String::with_capacity(ADDRESS_STRING_LENGTH);
    encoded.push_str("0x");
    encoded.push_str(&hex::encode(bytes));
    encoded
}

/// Decode a `0x`-prefixed hex address string into raw bytes.
pub fn decode_address(address: &str) -> Result<[u8; ADDRESS_BYTES], AddressError> {
    let Some(payload) = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
    else {
        return Err(AddressError::InvalidPrefix);
    };

    if address.len() != ADDRESS_STRING_LENGTH {
        return Err(AddressError::InvalidLength {
            expected: ADDRESS_STRING_LENGTH,
            actual: address.len(),
        });
    }

    let mut bytes = [0u8; ADDRESS_BYTES];
    hex::decode_to_slice(payload, &mut bytes)?;
    Ok(bytes)
}

/// Key-derived identity bound to user records.
///
/// The address is the last 20 bytes of the Keccak-256 digest of an
/// uncompressed secp256k1 public key (without its `0x04` tag byte).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(pub [u8; ADDRESS_BYTES]);

impl Address {
    /// The all-zero address.
    pub const ZERO: Address = Address([0u8; ADDRESS_BYTES]);

    pub fn new(bytes: [u8; ADDRESS_BYTES]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_BYTES] {
        &self.0
    }

    /// Derive the address controlled by an uncompressed SEC1 public key.
    pub fn from_public_key(public_key: &[u8]) -> Result<Self, AddressError> {
        if public_key.len() != UNCOMPRESSED_PUBLIC_KEY_BYTES || public_key[0] != 0x04 {
            return Err(AddressError::InvalidPublicKey {
                expected: UNCOMPRESSED_PUBLIC_KEY_BYTES,
                actual: public_key.len(),
            });
        }

        let digest = keccak256(&public_key[1..]);
        let mut bytes = [0u8; ADDRESS_BYTES];
        bytes.copy_from_slice(&digest[12..]);
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode_address(&self.0))
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_address(s).map(Address)
    }
}

impl From<[u8; ADDRESS_BYTES]> for Address {
    fn from(value: [u8; ADDRESS_BYTES]) -> Self {
        Address(value)
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        encode_address(&value.0)
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        decode_address(&value).map(Address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_parse_agree() {
        let address = Address([0xABu8; ADDRESS_BYTES]);
        let encoded = address.to_string();
        assert!(encoded.starts_with("0x"));
        assert_eq!(encoded.len(), ADDRESS_STRING_LENGTH);
        assert_eq!(encoded.parse::<Address>().unwrap(), address);
    }

    #[test]
    fn invalid_prefix_rejected() {
        let bad = "1x".to_string() + &"00".repeat(ADDRESS_BYTES);
        let err = decode_address(&bad).unwrap_err();
        assert!(matches!(err, AddressError::InvalidPrefix));
    }

    #[test]
    fn invalid_length_rejected() {
        let bad = "0x".to_string() + &"00".repeat(ADDRESS_BYTES - 1);
        let err = decode_address(&bad).unwrap_err();
        assert!(matches!(err, AddressError::InvalidLength { .. }));
    }

    #[test]
    fn invalid_hex_rejected() {
        let bad = format!("0x{}", "gg".repeat(ADDRESS_BYTES));
        let err = decode_address(&bad).unwrap_err();
        assert!(matches!(err, AddressError::InvalidHex(_)));
    }

    #[test]
    fn serde_uses_hex_string() {
        let address = Address([0x11u8; ADDRESS_BYTES]);
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "11".repeat(ADDRESS_BYTES)));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, address);
    }

    #[test]
    fn compressed_public_key_rejected() {
        let err = Address::from_public_key(&[0x02u8; 33]).unwrap_err();
        assert!(matches!(err, AddressError::InvalidPublicKey { actual: 33, .. }));
    }

    #[test]
    fn derivation_uses_last_twenty_digest_bytes() {
        let mut key = [0x07u8; UNCOMPRESSED_PUBLIC_KEY_BYTES];
        key[0] = 0x04;
        let address = Address::from_public_key(&key).unwrap();
        let digest = keccak256(&key[1..]);
        assert_eq!(&address.as_bytes()[..], &digest[12..]);
    }
}
