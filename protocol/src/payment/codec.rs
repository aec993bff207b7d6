//! Payment encoding: validation, canonical serialization, dual sealing and
//! the payment hash.
//!
//! ```text
//! plaintext    = canonical JSON of the payment
//! cipherClient = seal(pkClient, plaintext)
//! cipherStake  = seal(pkStakeholder, plaintext)
//! paymentHash  = keccak256(cipherClient || cipherStake)
//! ```
//!
//! Both ciphertexts always encrypt byte-identical plaintext, and sealing is
//! deterministic, so re-encoding a payment reproduces its hash exactly.

use serde::Serialize;
use tracing::debug;

use super::types::{PaymentHashAndCiphers, RawPayment, ValidatedPayment};
use crate::config::ENCRYPTION_KEY_LENGTH;
use crate::crypto::hash::{decode_fixed, keccak256_multi, to_hex, H256};
use crate::crypto::sealing::{self, SealingKeypair};
use crate::error::{ProtocolError, Result};

/// Check that every required field is present, in a fixed order, and return
/// the validated form. The error names the first missing field.
pub fn validate(raw: &RawPayment) -> Result<ValidatedPayment> {
    fn require<T: Clone>(value: &Option<T>, field: &str) -> Result<T> {
        value
            .clone()
            .ok_or_else(|| ProtocolError::MalformedPayment(field.to_string()))
    }

    let from = require(&raw.from, "from")?;
    let to = require(&raw.to, "to")?;
    let value = require(&raw.value, "value")?;
    let local_sequence_number = require(&raw.local_sequence_number, "localSequenceNumber")?;
    let stage_height = require(&raw.stage_height, "stageHeight")?;
    let data = raw
        .data
        .as_ref()
        .ok_or_else(|| ProtocolError::MalformedPayment("data".to_string()))?;
    let pk_client = decode_key(&data.pk_client, "data.pkClient")?;
    let pk_stakeholder = decode_key(&data.pk_stakeholder, "data.pkStakeholder")?;

    Ok(ValidatedPayment {
        from,
        to,
        value,
        local_sequence_number,
        stage_height,
        pk_client,
        pk_stakeholder,
    })
}

fn decode_key(value: &Option<String>, field: &str) -> Result<[u8; ENCRYPTION_KEY_LENGTH]> {
    let text = value
        .as_deref()
        .ok_or_else(|| ProtocolError::MalformedPayment(field.to_string()))?;
    decode_fixed::<ENCRYPTION_KEY_LENGTH>(text)
        .map_err(|e| ProtocolError::MalformedPayment(format!("{field} ({e})")))
}

/// Field order of the canonical form. Serde emits struct fields in
/// declaration order, which is what makes this canonical.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CanonicalPayment<'a> {
    from: &'a str,
    to: &'a str,
    value: u64,
    local_sequence_number: u64,
    stage_height: u64,
    data: CanonicalKeys,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CanonicalKeys {
    pk_client: String,
    pk_stakeholder: String,
}

/// Compact JSON with a fixed field order and keys as lower-case unprefixed
/// hex, so `0xAB..` and `ab..` spellings of the same key encode identically.
pub fn canonical_bytes(payment: &ValidatedPayment) -> Result<Vec<u8>> {
    let canonical = CanonicalPayment {
        from: &payment.from,
        to: &payment.to,
        value: payment.value,
        local_sequence_number: payment.local_sequence_number,
        stage_height: payment.stage_height,
        data: CanonicalKeys {
            pk_client: to_hex(&payment.pk_client),
            pk_stakeholder: to_hex(&payment.pk_stakeholder),
        },
    };
    Ok(serde_json::to_vec(&canonical)?)
}

/// `keccak256(cipher_client || cipher_stakeholder)`.
pub fn payment_hash(cipher_client: &[u8], cipher_stakeholder: &[u8]) -> H256 {
    keccak256_multi(&[cipher_client, cipher_stakeholder])
}

/// Validate, serialize, seal to both counterparties and hash. Pure.
pub fn encode_and_hash(raw: &RawPayment) -> Result<PaymentHashAndCiphers> {
    let payment = validate(raw)?;
    let plaintext = canonical_bytes(&payment)?;

    let cipher_client = sealing::seal(&payment.pk_client, &plaintext)?;
    let cipher_stakeholder = sealing::seal(&payment.pk_stakeholder, &plaintext)?;
    let payment_hash = payment_hash(&cipher_client, &cipher_stakeholder);

    debug!(
        stage_height = payment.stage_height,
        payment_hash = %to_hex(&payment_hash),
        "encoded payment"
    );

    Ok(PaymentHashAndCiphers {
        payment_hash,
        cipher_client,
        cipher_stakeholder,
    })
}

/// Open one of the two ciphers with the counterparty's key and parse the
/// payment back out.
pub fn open_cipher(cipher: &[u8], recipient: &SealingKeypair) -> Result<RawPayment> {
    let plaintext = sealing::open(recipient, cipher)?;
    Ok(serde_json::from_slice(&plaintext)?)
}

/// `true` when `payment_hash` is the hash of the two ciphers.
pub fn verify_payment_hash(
    cipher_client: &[u8],
    cipher_stakeholder: &[u8],
    expected: &H256,
) -> bool {
    payment_hash(cipher_client, cipher_stakeholder) == *expected
}
