//! # Payment Sealing
//!
//! Public-key encryption of payment payloads to a counterparty's X25519 key.
//!
//! Every payment is sealed twice, once to the client and once to the
//! stakeholder, and the payment hash is taken over both ciphertexts. That
//! puts one hard requirement on this module: **sealing must be a pure
//! function** of `(recipient, plaintext)`. If it weren't, two honest
//! re-encodings of the same payment would hash differently and a slice
//! built by the booster could never be reproduced by anyone else.
//!
//! ## Construction
//!
//! ```text
//! eph_secret = BLAKE3-derive-key("... ephemeral", pk || plaintext)
//! eph_pub    = X25519(eph_secret, G)
//! shared     = X25519(eph_secret, pk)
//! key        = BLAKE3-derive-key("... key",   shared || eph_pub || pk)
//! nonce      = BLAKE3-derive-key("... nonce", eph_pub || pk)[..12]
//! sealed     = eph_pub || nonce || AES-256-GCM(key, nonce, plaintext)
//! ```
//!
//! Deriving the ephemeral secret from the plaintext means a given plaintext
//! always meets the same key and nonce, so GCM never sees a reused nonce with
//! different data. The recipient recomputes `shared` from its static secret
//! and `eph_pub`, then derives the same key.
//!
//! The raw DH output is never used as a key; it always goes through the KDF.

use rand::rngs::OsRng;
use x25519_dalek::{PublicKey, StaticSecret};

use super::encryption::{self, EncryptionError};
use super::hash::decode_fixed;
use crate::config::{
    AES_KEY_LENGTH, AES_NONCE_LENGTH, ENCRYPTION_KEY_LENGTH, SEAL_EPHEMERAL_CONTEXT,
    SEAL_KEY_CONTEXT, SEAL_NONCE_CONTEXT,
};

/// A counterparty's X25519 key for opening sealed payments.
#[derive(Clone)]
pub struct SealingKeypair {
    secret: StaticSecret,
    public: PublicKey,
}

impl SealingKeypair {
    /// Generate a fresh keypair from the OS RNG.
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(OsRng);
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    /// Rebuild a keypair from its 32 secret bytes.
    pub fn from_secret_bytes(bytes: [u8; ENCRYPTION_KEY_LENGTH]) -> Self {
        let secret = StaticSecret::from(bytes);
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    /// Rebuild a keypair from hex text, with or without `0x`.
    pub fn from_hex(hex_str: &str) -> Result<Self, EncryptionError> {
        let bytes = decode_fixed::<ENCRYPTION_KEY_LENGTH>(hex_str.trim())
            .map_err(|_| EncryptionError::InvalidKeyLength(hex_str.len() / 2))?;
        Ok(Self::from_secret_bytes(bytes))
    }

    /// The public key, which goes into `pkClient` / `pkStakeholder`.
    pub fn public_key_bytes(&self) -> [u8; ENCRYPTION_KEY_LENGTH] {
        self.public.to_bytes()
    }

    /// Exports the secret bytes. Handle with care.
    pub fn secret_bytes(&self) -> [u8; ENCRYPTION_KEY_LENGTH] {
        self.secret.to_bytes()
    }
}

impl std::fmt::Debug for SealingKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SealingKeypair")
            .field("public", &hex::encode(self.public.as_bytes()))
            .finish_non_exhaustive()
    }
}

/// Seal `plaintext` to `recipient`. Deterministic.
///
/// # Example
///
/// ```
/// use ifc_protocol::crypto::sealing::{open, seal, SealingKeypair};
///
/// let stakeholder = SealingKeypair::generate();
/// let sealed = seal(&stakeholder.public_key_bytes(), b"pay bob 10").unwrap();
///
/// assert_eq!(sealed, seal(&stakeholder.public_key_bytes(), b"pay bob 10").unwrap());
/// assert_eq!(open(&stakeholder, &sealed).unwrap(), b"pay bob 10");
/// ```
pub fn seal(
    recipient: &[u8; ENCRYPTION_KEY_LENGTH],
    plaintext: &[u8],
) -> Result<Vec<u8>, EncryptionError> {
    let eph_seed = derive(
        SEAL_EPHEMERAL_CONTEXT,
        &[recipient.as_slice(), plaintext],
    );
    let eph_secret = StaticSecret::from(eph_seed);
    let eph_public = PublicKey::from(&eph_secret);
    let shared = eph_secret.diffie_hellman(&PublicKey::from(*recipient));

    let (key, nonce) = session_material(shared.as_bytes(), eph_public.as_bytes(), recipient);
    let body = encryption::encrypt_with_nonce(&key, &nonce, plaintext)?;

    let mut out = Vec::with_capacity(ENCRYPTION_KEY_LENGTH + body.len());
    out.extend_from_slice(eph_public.as_bytes());
    out.extend_from_slice(&body);
    Ok(out)
}

/// Open a sealed payload with the recipient's keypair.
pub fn open(recipient: &SealingKeypair, sealed: &[u8]) -> Result<Vec<u8>, EncryptionError> {
    if sealed.len() < ENCRYPTION_KEY_LENGTH + AES_NONCE_LENGTH {
        return Err(EncryptionError::CiphertextTooShort(
            ENCRYPTION_KEY_LENGTH + AES_NONCE_LENGTH,
        ));
    }

    let (eph_bytes, body) = sealed.split_at(ENCRYPTION_KEY_LENGTH);
    let mut eph_public = [0u8; ENCRYPTION_KEY_LENGTH];
    eph_public.copy_from_slice(eph_bytes);

    let shared = recipient.secret.diffie_hellman(&PublicKey::from(eph_public));
    let (key, nonce) = session_material(
        shared.as_bytes(),
        &eph_public,
        &recipient.public_key_bytes(),
    );

    // The nonce travels in the clear; a mismatch means the envelope was
    // built for someone else or tampered with.
    if body[..AES_NONCE_LENGTH] != nonce {
        return Err(EncryptionError::DecryptFailed);
    }
    encryption::decrypt(&key, body)
}

fn session_material(
    shared: &[u8; 32],
    eph_public: &[u8; 32],
    recipient: &[u8; 32],
) -> ([u8; AES_KEY_LENGTH], [u8; AES_NONCE_LENGTH]) {
    let key = derive(
        SEAL_KEY_CONTEXT,
        &[shared.as_slice(), eph_public.as_slice(), recipient.as_slice()],
    );
    let nonce_seed = derive(
        SEAL_NONCE_CONTEXT,
        &[eph_public.as_slice(), recipient.as_slice()],
    );
    let mut nonce = [0u8; AES_NONCE_LENGTH];
    nonce.copy_from_slice(&nonce_seed[..AES_NONCE_LENGTH]);
    (key, nonce)
}

fn derive(context: &str, parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(context);
    for part in parts {
        hasher.update(part);
    }
    let mut out = [0u8; 32];
    hasher.finalize_xof().fill(&mut out);
    out
}
