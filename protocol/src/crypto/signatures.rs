//! # Recoverable Signatures
//!
//! secp256k1 ECDSA with public-key recovery, in the personal-message form
//! the anchor contract checks.
//!
//! Nothing in this protocol signs raw data directly. Callers hand in a
//! 32-byte Keccak digest, we wrap it in the signed-message envelope
//!
//! ```text
//! keccak256("\x19Ethereum Signed Message:\n" || "32" || digest)
//! ```
//!
//! and sign that. The contract runs `ecrecover` over the same envelope and
//! compares the recovered address with the one it expects. So verification
//! here is also recovery: there is no separate "public key" input, only an
//! expected address.
//!
//! ## Signature layout
//!
//! `v` is `27 + recovery_id` and `r`/`s` are 32-byte big-endian scalars.
//! `s` is always in the lower half of the curve order; `k256` normalizes it
//! before we ever see it.

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::hash::{keccak256_multi, serde_prefixed_h256, H256};
use super::keys::{Address, IfcKeypair};
use crate::config::{HASH_LENGTH, SIGNATURE_V_OFFSET, SIGNED_MESSAGE_PREFIX};

/// Errors during signing or recovery.
///
/// Intentionally vague. A caller learns that recovery failed, not which
/// scalar was out of range.
#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("signing failed")]
    SigningFailed,

    #[error("invalid signature encoding")]
    InvalidSignature,

    #[error("invalid recovery id: v = {0}")]
    InvalidRecoveryId(u8),

    #[error("public key recovery failed")]
    RecoveryFailed,
}

/// A secp256k1 signature with its recovery id, in `(v, r, s)` form.
///
/// On the wire `v` is a plain integer and `r`/`s` are `0x`-prefixed hex,
/// ready to be passed into a contract call as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoverableSignature {
    pub v: u8,
    #[serde(with = "serde_prefixed_h256")]
    pub r: H256,
    #[serde(with = "serde_prefixed_h256")]
    pub s: H256,
}

impl RecoverableSignature {
    /// The 65-byte `r || s || v` form.
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[..HASH_LENGTH].copy_from_slice(&self.r);
        out[HASH_LENGTH..2 * HASH_LENGTH].copy_from_slice(&self.s);
        out[64] = self.v;
        out
    }

    /// Parse the 65-byte `r || s || v` form. Checks `v` but not the scalars;
    /// those are checked at recovery time.
    pub fn from_bytes(bytes: &[u8; 65]) -> Result<Self, SignatureError> {
        let mut r = [0u8; HASH_LENGTH];
        let mut s = [0u8; HASH_LENGTH];
        r.copy_from_slice(&bytes[..HASH_LENGTH]);
        s.copy_from_slice(&bytes[HASH_LENGTH..2 * HASH_LENGTH]);
        let sig = Self { v: bytes[64], r, s };
        sig.recovery_id()?;
        Ok(sig)
    }

    fn recovery_id(&self) -> Result<RecoveryId, SignatureError> {
        self.v
            .checked_sub(SIGNATURE_V_OFFSET)
            .and_then(RecoveryId::from_byte)
            .ok_or(SignatureError::InvalidRecoveryId(self.v))
    }

    fn signature(&self) -> Result<Signature, SignatureError> {
        let mut rs = [0u8; 2 * HASH_LENGTH];
        rs[..HASH_LENGTH].copy_from_slice(&self.r);
        rs[HASH_LENGTH..].copy_from_slice(&self.s);
        Signature::from_slice(&rs).map_err(|_| SignatureError::InvalidSignature)
    }
}

/// Wrap a 32-byte digest in the signed-message envelope.
pub fn personal_message_hash(digest: &H256) -> H256 {
    keccak256_multi(&[SIGNED_MESSAGE_PREFIX, b"32", digest.as_slice()])
}

/// Sign the envelope of `digest`.
///
/// Deterministic (RFC 6979): the same key and digest always give the same
/// signature.
///
/// # Example
///
/// ```
/// use ifc_protocol::crypto::{keccak256, recover_address, sign_digest, IfcKeypair};
///
/// let keypair = IfcKeypair::generate();
/// let digest = keccak256(b"stage 5 root");
/// let signature = sign_digest(&keypair, &digest).unwrap();
///
/// assert_eq!(recover_address(&digest, &signature).unwrap(), keypair.address());
/// ```
pub fn sign_digest(keypair: &IfcKeypair, digest: &H256) -> Result<RecoverableSignature, SignatureError> {
    let envelope = personal_message_hash(digest);
    let (signature, recovery_id) = keypair
        .signing_key()
        .sign_prehash_recoverable(&envelope)
        .map_err(|_| SignatureError::SigningFailed)?;

    let bytes = signature.to_bytes();
    let mut r = [0u8; HASH_LENGTH];
    let mut s = [0u8; HASH_LENGTH];
    r.copy_from_slice(&bytes[..HASH_LENGTH]);
    s.copy_from_slice(&bytes[HASH_LENGTH..]);

    Ok(RecoverableSignature {
        v: SIGNATURE_V_OFFSET + recovery_id.to_byte(),
        r,
        s,
    })
}

/// Recover the address that signed the envelope of `digest`.
pub fn recover_address(
    digest: &H256,
    signature: &RecoverableSignature,
) -> Result<Address, SignatureError> {
    let envelope = personal_message_hash(digest);
    let recovery_id = signature.recovery_id()?;
    let sig = signature.signature()?;
    let key = VerifyingKey::recover_from_prehash(&envelope, &sig, recovery_id)
        .map_err(|_| SignatureError::RecoveryFailed)?;
    Ok(Address::from_public_key(&key))
}

/// `true` when `signature` over `digest` recovers to `expected`.
///
/// A malformed signature is simply "not signed by `expected`".
pub fn verify_signer(digest: &H256, signature: &RecoverableSignature, expected: &Address) -> bool {
    matches!(recover_address(digest, signature), Ok(addr) if addr == *expected)
}
