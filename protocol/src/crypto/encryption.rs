//! # AES-256-GCM Encryption
//!
//! Authenticated symmetric encryption. The payment sealing construction in
//! [`super::sealing`] sits on top of this; nothing else in the crate should
//! call AES-GCM directly.
//!
//! ## Nonce management
//!
//! GCM is unforgiving about nonce reuse: two different plaintexts under one
//! key and one nonce leak their XOR and let an attacker forge tags.
//! [`encrypt_with_nonce`] takes the nonce from the caller. Sealing derives
//! both key and nonce from the plaintext and recipient, so a repeated nonce
//! only ever appears with a repeated plaintext under the same key.
//!
//! ## Wire format
//!
//! `nonce || ciphertext || tag` as one `Vec<u8>`. [`decrypt`] expects the
//! same layout.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use thiserror::Error;

use crate::config::{AES_KEY_LENGTH, AES_NONCE_LENGTH, AES_TAG_LENGTH};

/// Errors that can occur during encryption/decryption.
///
/// "Wrong key" and "corrupted ciphertext" are the same error on purpose.
#[derive(Debug, Error)]
pub enum EncryptionError {
    #[error("encryption failed")]
    EncryptFailed,

    #[error("decryption failed -- wrong key or corrupted ciphertext")]
    DecryptFailed,

    #[error("invalid public key length: expected 32 bytes, got {0}")]
    InvalidKeyLength(usize),

    #[error("ciphertext too short: must be at least {0} bytes")]
    CiphertextTooShort(usize),
}

/// Encrypt plaintext with AES-256-GCM under a caller-supplied nonce.
///
/// Never call this twice with the same key and nonce for different
/// plaintexts.
///
/// # Example
///
/// ```
/// use ifc_protocol::crypto::encryption::{decrypt, encrypt_with_nonce};
///
/// let key = [0x42u8; 32];
/// let sealed = encrypt_with_nonce(&key, &[7u8; 12], b"secret payment details").unwrap();
/// assert_eq!(decrypt(&key, &sealed).unwrap(), b"secret payment details");
/// ```
pub fn encrypt_with_nonce(
    key: &[u8; AES_KEY_LENGTH],
    nonce: &[u8; AES_NONCE_LENGTH],
    plaintext: &[u8],
) -> Result<Vec<u8>, EncryptionError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| EncryptionError::EncryptFailed)?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|_| EncryptionError::EncryptFailed)?;

    let mut out = Vec::with_capacity(AES_NONCE_LENGTH + ciphertext.len());
    out.extend_from_slice(nonce);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Decrypt `nonce || ciphertext || tag`.
pub fn decrypt(key: &[u8; AES_KEY_LENGTH], data: &[u8]) -> Result<Vec<u8>, EncryptionError> {
    if data.len() < AES_NONCE_LENGTH + AES_TAG_LENGTH {
        return Err(EncryptionError::CiphertextTooShort(
            AES_NONCE_LENGTH + AES_TAG_LENGTH,
        ));
    }

    let (nonce, ciphertext) = data.split_at(AES_NONCE_LENGTH);
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| EncryptionError::DecryptFailed)?;

    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| EncryptionError::DecryptFailed)
}
