//! Operator signatures over payment commitments.
//!
//! The operator signs `keccak256(stageHash || paymentHash)` inside the
//! signed-message envelope. Anyone holding a [`SignedPaymentCommitment`] can
//! later prove to the contract that the operator promised to include that
//! payment in that stage.

use std::sync::Arc;

use tracing::{debug, error, warn};

use super::codec;
use super::types::{RawPayment, SignedPaymentCommitment};
use crate::crypto::hash::{keccak256_multi, to_hex, H256};
use crate::crypto::{recover_address, sign_digest, Address, OperatorCredential};
use crate::error::{ProtocolError, Result};
use crate::stage::stage_hash;

/// The digest the operator signs for a payment in a stage.
pub fn commitment_digest(stage_hash: &H256, payment_hash: &H256) -> H256 {
    keccak256_multi(&[stage_hash.as_slice(), payment_hash.as_slice()])
}

/// Signs payment commitments with the operator's credential.
///
/// Cheap to clone; the credential is shared.
#[derive(Clone, Debug)]
pub struct PaymentSigner {
    credential: Arc<OperatorCredential>,
}

impl PaymentSigner {
    pub fn new(credential: OperatorCredential) -> Self {
        Self {
            credential: Arc::new(credential),
        }
    }

    /// The address commitments are expected to recover to.
    pub fn signer_address(&self) -> Address {
        self.credential.signer_address()
    }

    /// Encode `raw`, sign it for `stage_height`, and check that the
    /// signature recovers to the configured signer address.
    ///
    /// A failed self-check is fatal for this call: nothing is returned that
    /// the contract would attribute to someone else.
    pub fn sign_commitment(
        &self,
        raw: &RawPayment,
        stage_height: u64,
    ) -> Result<SignedPaymentCommitment> {
        let encoded = codec::encode_and_hash(raw)?;

        if let Some(declared) = raw.stage_height {
            if declared != stage_height {
                warn!(
                    declared,
                    stage_height, "payment declares a different stage height than requested"
                );
            }
        }

        let stage_hash = stage_hash(stage_height);
        let digest = commitment_digest(&stage_hash, &encoded.payment_hash);
        let signature = sign_digest(self.credential.keypair(), &digest)?;

        let recovered = recover_address(&digest, &signature)?;
        let expected = self.credential.signer_address();
        if recovered != expected {
            error!(
                expected = %expected,
                recovered = %recovered,
                "operator signature does not recover to configured signer"
            );
            return Err(ProtocolError::SignatureMismatch {
                expected: expected.to_hex(),
                recovered: recovered.to_hex(),
            });
        }

        debug!(
            stage_height,
            payment_hash = %to_hex(&encoded.payment_hash),
            "signed payment commitment"
        );

        Ok(SignedPaymentCommitment {
            stage_height,
            stage_hash,
            payment_hash: encoded.payment_hash,
            cipher_client: encoded.cipher_client,
            cipher_stakeholder: encoded.cipher_stakeholder,
            signature,
        })
    }
}

/// Check a commitment received from someone else.
///
/// Re-derives the stage hash from the height, checks the payment hash
/// against the ciphers, then recovers the signer.
pub fn verify_commitment(commitment: &SignedPaymentCommitment, expected: &Address) -> Result<()> {
    if stage_hash(commitment.stage_height) != commitment.stage_hash {
        return Err(ProtocolError::MalformedPayment("stageHash".to_string()));
    }
    if !codec::verify_payment_hash(
        &commitment.cipher_client,
        &commitment.cipher_stakeholder,
        &commitment.payment_hash,
    ) {
        return Err(ProtocolError::MalformedPayment("paymentHash".to_string()));
    }

    let digest = commitment_digest(&commitment.stage_hash, &commitment.payment_hash);
    let recovered = recover_address(&digest, &commitment.signature)?;
    if recovered != *expected {
        return Err(ProtocolError::SignatureMismatch {
            expected: expected.to_hex(),
            recovered: recovered.to_hex(),
        });
    }
    Ok(())
}
