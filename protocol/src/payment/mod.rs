//! # Payments
//!
//! Encoding and signing of off-chain payments before they are batched into a
//! stage.
//!
//! ```text
//! types.rs  — RawPayment, its validated form, encoding and signing outputs
//! codec.rs  — validation, canonical bytes, dual sealing, payment hash
//! signer.rs — operator signature over (stageHash, paymentHash)
//! ```
//!
//! ## Flow
//!
//! 1. **Validate** — every field present, both counterparty keys decode.
//! 2. **Encode** — seal the canonical JSON to client and stakeholder.
//! 3. **Hash** — `paymentHash = keccak256(cipherClient || cipherStakeholder)`.
//! 4. **Sign** — the operator signs `keccak256(stageHash || paymentHash)`.
//! 5. **Forward** — the commitment goes to the booster, which builds the
//!    stage tree out of payment hashes.

pub mod codec;
pub mod signer;
pub mod types;

pub use codec::{encode_and_hash, open_cipher, verify_payment_hash};
pub use signer::{commitment_digest, verify_commitment, PaymentSigner};
pub use types::{
    PaymentHashAndCiphers, PaymentKeys, RawPayment, SignedPaymentCommitment, ValidatedPayment,
};
