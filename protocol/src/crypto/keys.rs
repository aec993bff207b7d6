//! # Key Management
//!
//! secp256k1 keypairs and account addresses for sidechain participants.
//!
//! The anchor contract identifies every party by a 20-byte address: the last
//! 20 bytes of the Keccak-256 hash of the uncompressed public key (without
//! its `0x04` tag byte). Operators sign payment commitments with these keys,
//! clients sign light transactions with them, and the contract recovers the
//! address from the signature to decide who said what.
//!
//! ## Credentials, not globals
//!
//! A [`Credential`] bundles a keypair with the address the rest of the
//! system expects it to sign as. Components receive one at construction and
//! never look a "current key" up anywhere else. Running two simulated
//! operators side by side is just two credentials.
//!
//! Key bytes are never logged. `Debug` on keypairs prints the address only.

use k256::ecdsa::{SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use rand::rngs::OsRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::hash::{decode_fixed, keccak256, to_prefixed_hex};
use crate::config::{ADDRESS_LENGTH, HASH_LENGTH, SECRET_KEY_LENGTH};

/// Errors that can occur during key operations.
///
/// Deliberately vague about *why* a secret key was rejected.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid secret key bytes: wrong length or not a valid scalar")]
    InvalidSecretKey,

    #[error("invalid public key bytes: not a valid secp256k1 point")]
    InvalidPublicKey,

    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A 20-byte account address.
///
/// Displays and serializes as lower-case `0x`-prefixed hex, which is the
/// form both the contract and the booster expect for addresses.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    /// Wrap raw address bytes.
    pub fn from_bytes(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Derive the address of a secp256k1 public key.
    pub fn from_public_key(key: &VerifyingKey) -> Self {
        let encoded = key.to_encoded_point(false);
        // Skip the 0x04 uncompressed-point tag.
        let hash = keccak256(&encoded.as_bytes()[1..]);
        let mut bytes = [0u8; ADDRESS_LENGTH];
        bytes.copy_from_slice(&hash[HASH_LENGTH - ADDRESS_LENGTH..]);
        Self(bytes)
    }

    /// Raw address bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// `0x`-prefixed lower-case hex.
    pub fn to_hex(&self) -> String {
        to_prefixed_hex(&self.0)
    }

    /// The address left-padded with zeros to a 32-byte word.
    ///
    /// This is the "normalized" form mixed into withdrawal log ids and the
    /// form an address takes inside ABI-encoded calldata.
    pub fn normalized(&self) -> [u8; HASH_LENGTH] {
        let mut word = [0u8; HASH_LENGTH];
        word[HASH_LENGTH - ADDRESS_LENGTH..].copy_from_slice(&self.0);
        word
    }
}

impl FromStr for Address {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_fixed::<ADDRESS_LENGTH>(s)
            .map(Self)
            .map_err(|e| KeyError::InvalidAddress(e.to_string()))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Keypair
// ---------------------------------------------------------------------------

/// A secp256k1 signing keypair.
///
/// Does not implement `Serialize`. Exporting a secret key should be an
/// explicit call to [`IfcKeypair::secret_key_bytes`], not a side effect of
/// dropping a struct into a JSON response.
pub struct IfcKeypair {
    signing_key: SigningKey,
}

impl IfcKeypair {
    /// Generate a fresh keypair from the OS RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::random(&mut OsRng),
        }
    }

    /// Reconstruct a keypair from a 32-byte secret scalar.
    ///
    /// Fails for zero or for values not below the curve order.
    pub fn from_bytes(secret: &[u8; SECRET_KEY_LENGTH]) -> Result<Self, KeyError> {
        let signing_key =
            SigningKey::from_slice(secret).map_err(|_| KeyError::InvalidSecretKey)?;
        Ok(Self { signing_key })
    }

    /// Reconstruct a keypair from hex text, with or without `0x`.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let bytes = decode_fixed::<SECRET_KEY_LENGTH>(hex_str.trim())
            .map_err(|_| KeyError::InvalidSecretKey)?;
        Self::from_bytes(&bytes)
    }

    /// The verifying (public) key.
    pub fn public_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key().clone()
    }

    /// The address derived from the public key.
    pub fn address(&self) -> Address {
        Address::from_public_key(self.signing_key.verifying_key())
    }

    /// Exports the raw 32-byte secret key. Handle with care.
    pub fn secret_key_bytes(&self) -> [u8; SECRET_KEY_LENGTH] {
        let mut out = [0u8; SECRET_KEY_LENGTH];
        out.copy_from_slice(&self.signing_key.to_bytes());
        out
    }

    /// The underlying `k256` signing key, for the signature module.
    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }
}

impl Clone for IfcKeypair {
    fn clone(&self) -> Self {
        Self {
            signing_key: self.signing_key.clone(),
        }
    }
}

impl fmt::Debug for IfcKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IfcKeypair")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Credential
// ---------------------------------------------------------------------------

/// An immutable signing identity: a keypair plus the address it is expected
/// to sign as.
///
/// The expected address normally comes from configuration (the address the
/// contract knows the operator by). When none is configured the derived
/// address is used, which makes the post-signing self-check trivially
/// consistent.
#[derive(Clone, Debug)]
pub struct Credential {
    keypair: IfcKeypair,
    signer_address: Address,
}

impl Credential {
    /// Use the keypair's own address as the expected signer address.
    pub fn new(keypair: IfcKeypair) -> Self {
        let signer_address = keypair.address();
        Self {
            keypair,
            signer_address,
        }
    }

    /// Pin the expected signer address explicitly.
    pub fn with_signer_address(keypair: IfcKeypair, signer_address: Address) -> Self {
        Self {
            keypair,
            signer_address,
        }
    }

    /// The signing keypair.
    pub fn keypair(&self) -> &IfcKeypair {
        &self.keypair
    }

    /// The address signatures are expected to recover to.
    pub fn signer_address(&self) -> Address {
        self.signer_address
    }

    /// The address actually derived from the keypair.
    pub fn derived_address(&self) -> Address {
        self.keypair.address()
    }

    /// `true` when the configured address matches the key.
    pub fn is_consistent(&self) -> bool {
        self.signer_address == self.derived_address()
    }
}

/// The operator's signing identity for payment commitments.
pub type OperatorCredential = Credential;

/// A client's signing identity for light transactions.
pub type ClientCredential = Credential;
