//! # Cryptographic Primitives for IFC
//!
//! Every hash, signature and ciphertext in the protocol goes through here.
//! The choices are fixed by the anchor contract, not by taste:
//!
//! - **Keccak-256** for every hash, because that is what the contract
//!   recomputes when it checks a slice or a signature.
//! - **secp256k1 ECDSA** with public-key recovery, because the contract
//!   identifies signers with `ecrecover`.
//! - **X25519 + AES-256-GCM** for sealing payment payloads to the two
//!   counterparties, with a BLAKE3 KDF in between.
//!
//! Everything here is a thin, typed wrapper around audited implementations
//! (`sha3`, `k256`, `x25519-dalek`, `aes-gcm`, `blake3`).

pub mod encryption;
pub mod hash;
pub mod keys;
pub mod sealing;
pub mod signatures;

pub use encryption::EncryptionError;
pub use hash::{keccak256, keccak256_multi, merkle_parent, HexError, H256};
pub use keys::{Address, ClientCredential, Credential, IfcKeypair, KeyError, OperatorCredential};
pub use sealing::SealingKeypair;
pub use signatures::{
    personal_message_hash, recover_address, sign_digest, verify_signer, RecoverableSignature,
    SignatureError,
};
