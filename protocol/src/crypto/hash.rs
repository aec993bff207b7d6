//! # Hashing Utilities
//!
//! Every hash in the sidechain protocol is Keccak-256, the same function the
//! anchor contract uses. Payment hashes, stage hashes, Merkle nodes, light
//! transaction hashes and the signed-message envelope all go through here.
//!
//! ## Hex at the boundary
//!
//! Internally a hash is always `[u8; 32]`. It only becomes text where it
//! leaves the process:
//!
//! - **`0x`-prefixed** lower-case hex when it crosses into a contract call.
//! - **Unprefixed** lower-case hex when it is persisted or sent over the
//!   booster's JSON gateway.
//!
//! Parsing accepts both forms so callers don't have to care which side
//! produced the string.

use sha3::{Digest, Keccak256};
use thiserror::Error;

use crate::config::HASH_LENGTH;

/// A 32-byte Keccak-256 digest.
pub type H256 = [u8; HASH_LENGTH];

/// Errors raised when decoding hex text into fixed-size values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HexError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid length: expected {expected} bytes, got {got}")]
    InvalidLength {
        /// Required byte length.
        expected: usize,
        /// Decoded byte length.
        got: usize,
    },
}

/// Compute the Keccak-256 hash of the input data.
///
/// # Example
///
/// ```
/// use ifc_protocol::crypto::keccak256;
///
/// let hash = keccak256(b"");
/// assert_eq!(
///     hex::encode(hash),
///     "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
/// );
/// ```
pub fn keccak256(data: &[u8]) -> H256 {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let mut output = [0u8; HASH_LENGTH];
    output.copy_from_slice(&hasher.finalize());
    output
}

/// Hash multiple byte slices as if they were concatenated, without building
/// the concatenation.
pub fn keccak256_multi(parts: &[&[u8]]) -> H256 {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    let mut output = [0u8; HASH_LENGTH];
    output.copy_from_slice(&hasher.finalize());
    output
}

/// Parent of two Merkle nodes: `keccak256(left || right)`.
pub fn merkle_parent(left: &H256, right: &H256) -> H256 {
    keccak256_multi(&[left.as_slice(), right.as_slice()])
}

/// Lower-case hex without a prefix. The JSON-gateway form.
pub fn to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Lower-case hex with a `0x` prefix. The contract-call form.
pub fn to_prefixed_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Strip an optional `0x`/`0X` prefix.
pub fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// Decode hex text of any length, with or without a `0x` prefix.
pub fn decode_hex(s: &str) -> Result<Vec<u8>, HexError> {
    hex::decode(strip_hex_prefix(s)).map_err(|e| HexError::InvalidHex(e.to_string()))
}

/// Decode hex text into a fixed-size array, checking the length.
pub fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], HexError> {
    let bytes = decode_hex(s)?;
    let got = bytes.len();
    bytes
        .try_into()
        .map_err(|_| HexError::InvalidLength { expected: N, got })
}

/// Decode a 32-byte hash from hex text.
pub fn parse_h256(s: &str) -> Result<H256, HexError> {
    decode_fixed::<HASH_LENGTH>(s)
}

/// Serde adapter for `H256` fields carried as unprefixed hex on the JSON
/// gateway. Deserialization tolerates a `0x` prefix.
pub mod serde_h256 {
    use super::{parse_h256, to_hex, H256};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &H256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&to_hex(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<H256, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_h256(&s).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for `H256` fields carried as `0x`-prefixed hex, the form
/// signature components take at the contract boundary.
pub mod serde_prefixed_h256 {
    use super::{parse_h256, to_prefixed_hex, H256};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &H256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&to_prefixed_hex(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<H256, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_h256(&s).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for `Vec<H256>` carried as an array of unprefixed hex strings.
pub mod serde_h256_vec {
    use super::{parse_h256, to_hex, H256};
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(values: &[H256], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(values.len()))?;
        for value in values {
            seq.serialize_element(&to_hex(value))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<H256>, D::Error> {
        let raw = Vec::<String>::deserialize(deserializer)?;
        raw.iter()
            .map(|s| parse_h256(s).map_err(serde::de::Error::custom))
            .collect()
    }
}

/// Serde adapter for opaque byte strings (ciphertexts) carried as
/// unprefixed hex.
pub mod serde_bytes_hex {
    use super::{decode_hex, to_hex};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&to_hex(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        decode_hex(&s).map_err(serde::de::Error::custom)
    }
}
