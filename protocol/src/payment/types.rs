//! Payment value types: the raw payment as it arrives, its validated form,
//! and the artifacts produced by encoding and signing it.

use serde::{Deserialize, Serialize};

use crate::config::ENCRYPTION_KEY_LENGTH;
use crate::crypto::hash::{serde_bytes_hex, serde_h256, to_hex, H256};
use crate::crypto::RecoverableSignature;

// ---------------------------------------------------------------------------
// RawPayment
// ---------------------------------------------------------------------------

/// Counterparty encryption keys carried inside a raw payment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentKeys {
    /// Client's X25519 public key, hex.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pk_client: Option<String>,
    /// Stakeholder's X25519 public key, hex.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pk_stakeholder: Option<String>,
}

/// A proposed off-chain transfer, before it is included in a stage.
///
/// Every field is optional on the wire so that an incomplete payment
/// deserializes and can be rejected with the name of the missing field,
/// instead of failing somewhere inside serde.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPayment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_sequence_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage_height: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<PaymentKeys>,
}

impl RawPayment {
    /// A fully populated payment. Mostly for tests and the CLI.
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        value: u64,
        local_sequence_number: u64,
        stage_height: u64,
        pk_client: &[u8; ENCRYPTION_KEY_LENGTH],
        pk_stakeholder: &[u8; ENCRYPTION_KEY_LENGTH],
    ) -> Self {
        Self {
            from: Some(from.into()),
            to: Some(to.into()),
            value: Some(value),
            local_sequence_number: Some(local_sequence_number),
            stage_height: Some(stage_height),
            data: Some(PaymentKeys {
                pk_client: Some(to_hex(pk_client)),
                pk_stakeholder: Some(to_hex(pk_stakeholder)),
            }),
        }
    }
}

/// A raw payment that passed validation. All fields present, keys decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPayment {
    pub from: String,
    pub to: String,
    pub value: u64,
    pub local_sequence_number: u64,
    pub stage_height: u64,
    pub pk_client: [u8; ENCRYPTION_KEY_LENGTH],
    pub pk_stakeholder: [u8; ENCRYPTION_KEY_LENGTH],
}

// ---------------------------------------------------------------------------
// Encoding artifacts
// ---------------------------------------------------------------------------

/// The output of encoding a payment: both ciphertexts and the hash over them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentHashAndCiphers {
    #[serde(with = "serde_h256")]
    pub payment_hash: H256,
    #[serde(with = "serde_bytes_hex")]
    pub cipher_client: Vec<u8>,
    #[serde(with = "serde_bytes_hex")]
    pub cipher_stakeholder: Vec<u8>,
}

/// An operator-signed payment commitment, ready to be forwarded to the
/// booster and, if it ever comes to that, to a dispute.
///
/// JSON form:
///
/// ```text
/// { stageHeight, stageHash, paymentHash, cipherClient, cipherStakeholder, v, r, s }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedPaymentCommitment {
    pub stage_height: u64,
    #[serde(with = "serde_h256")]
    pub stage_hash: H256,
    #[serde(with = "serde_h256")]
    pub payment_hash: H256,
    #[serde(with = "serde_bytes_hex")]
    pub cipher_client: Vec<u8>,
    #[serde(with = "serde_bytes_hex")]
    pub cipher_stakeholder: Vec<u8>,
    #[serde(flatten)]
    pub signature: RecoverableSignature,
}
