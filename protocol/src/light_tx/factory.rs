//! Building and signing light transactions for one client account.
//!
//! | type              | from    | to      | nonce    | logID                           |
//! |-------------------|---------|---------|----------|---------------------------------|
//! | deposit           | `"0"`   | client  | supplied | supplied                        |
//! | withdrawal        | client  | `"0"`   | fresh    | `keccak256(hex(padded addr) ‖ hex(nonce))` |
//! | instantWithdrawal | client  | `"0"`   | supplied | supplied                        |
//! | remittance        | supplied| supplied| fresh    | `"0"`                           |

use std::sync::Arc;

use rand::rngs::OsRng;
use rand::RngCore;
use tokio::sync::oneshot;
use tracing::debug;

use super::types::{DepositLog, LightTxData, LightTxInput, LightTxType, Party, SignedLightTransaction};
use crate::config::{DEFAULT_ASSET_ID, DEFAULT_LIGHT_TX_FEE, HASH_LENGTH};
use crate::crypto::hash::{keccak256, to_hex, H256};
use crate::crypto::{sign_digest, Address, ClientCredential};
use crate::error::{ProtocolError, Result};

/// A fresh, unpredictable nonce: the hash of 32 bytes from the OS RNG.
pub fn fresh_nonce() -> H256 {
    let mut seed = [0u8; HASH_LENGTH];
    OsRng.fill_bytes(&mut seed);
    keccak256(&seed)
}

/// Withdrawal log id. The preimage is text: the padded address and the
/// nonce as 64 unprefixed hex characters each, hashed as ASCII. The contract
/// recomputes it the same way.
pub fn withdrawal_log_id(client: &Address, nonce: &H256) -> H256 {
    let preimage = format!("{}{}", to_hex(&client.normalized()), to_hex(nonce));
    keccak256(preimage.as_bytes())
}

/// Builds light transactions on behalf of a single client credential.
#[derive(Clone, Debug)]
pub struct LightTransactionFactory {
    credential: Arc<ClientCredential>,
    proposal_fee: u64,
}

impl LightTransactionFactory {
    pub fn new(credential: ClientCredential) -> Self {
        Self {
            credential: Arc::new(credential),
            proposal_fee: DEFAULT_LIGHT_TX_FEE,
        }
    }

    /// Fee attached by [`propose_withdrawal`](Self::propose_withdrawal) and
    /// [`propose_deposit`](Self::propose_deposit).
    pub fn with_proposal_fee(mut self, fee: u64) -> Self {
        self.proposal_fee = fee;
        self
    }

    pub fn proposal_fee(&self) -> u64 {
        self.proposal_fee
    }

    /// The client address this factory signs as.
    pub fn client_address(&self) -> Address {
        self.credential.signer_address()
    }

    /// Derive the full transaction body for `tx_type` from caller input.
    pub fn prepare(&self, tx_type: LightTxType, input: LightTxInput) -> Result<LightTxData> {
        let client = self.client_address();
        let asset_id = input.asset_id.unwrap_or(DEFAULT_ASSET_ID);

        let (from, to, nonce, log_id) = match tx_type {
            LightTxType::Deposit => (
                Party::Null,
                Party::Account(client),
                require(input.nonce, "nonce")?,
                require(input.log_id, "logID")?,
            ),
            LightTxType::Withdrawal => {
                let nonce = fresh_nonce();
                let log_id = withdrawal_log_id(&client, &nonce);
                (Party::Account(client), Party::Null, nonce, log_id)
            }
            LightTxType::InstantWithdrawal => (
                Party::Account(client),
                Party::Null,
                require(input.nonce, "nonce")?,
                require(input.log_id, "logID")?,
            ),
            LightTxType::Remittance => (
                require(input.from, "from")?,
                require(input.to, "to")?,
                fresh_nonce(),
                [0u8; HASH_LENGTH],
            ),
        };

        Ok(LightTxData {
            from,
            to,
            asset_id,
            value: input.value,
            fee: input.fee,
            nonce,
            log_id,
        })
    }

    /// Prepare and sign once with the client key.
    pub fn finalize(
        &self,
        tx_type: LightTxType,
        input: LightTxInput,
        metadata: Option<serde_json::Value>,
    ) -> Result<SignedLightTransaction> {
        let data = self.prepare(tx_type, input)?;
        let light_tx_hash = data.hash();
        let client_signature = sign_digest(self.credential.keypair(), &light_tx_hash)?;

        debug!(
            tx_type = %tx_type,
            light_tx_hash = %to_hex(&light_tx_hash),
            "signed light transaction"
        );

        Ok(SignedLightTransaction {
            tx_type,
            light_tx_data: data,
            metadata,
            light_tx_hash,
            client_signature,
        })
    }

    /// String-typed entry point for callers holding a type name.
    pub fn finalize_named(
        &self,
        tx_type: &str,
        input: LightTxInput,
        metadata: Option<serde_json::Value>,
    ) -> Result<SignedLightTransaction> {
        self.finalize(tx_type.parse()?, input, metadata)
    }

    /// A signed withdrawal of `value` of `asset_id` (default asset when
    /// `None`).
    pub fn propose_withdrawal(
        &self,
        asset_id: Option<u64>,
        value: u64,
    ) -> Result<SignedLightTransaction> {
        let input = LightTxInput {
            asset_id,
            value,
            fee: self.proposal_fee,
            ..Default::default()
        };
        self.finalize(LightTxType::Withdrawal, input, None)
    }

    /// Wait for a deposit event and build the matching signed deposit.
    ///
    /// The deposit's value and log id come from the event; the nonce is
    /// fresh. A dropped sender yields [`ProtocolError::DepositCancelled`].
    pub async fn propose_deposit(
        &self,
        asset_id: Option<u64>,
        deposit_log: oneshot::Receiver<DepositLog>,
    ) -> Result<SignedLightTransaction> {
        let log = deposit_log
            .await
            .map_err(|_| ProtocolError::DepositCancelled)?;

        let asset_id = asset_id.unwrap_or(DEFAULT_ASSET_ID);
        if log.asset_id != asset_id {
            return Err(ProtocolError::MalformedLightTx(format!(
                "assetID (event carries {}, requested {})",
                log.asset_id, asset_id
            )));
        }

        let input = LightTxInput {
            asset_id: Some(asset_id),
            value: log.value,
            fee: self.proposal_fee,
            nonce: Some(fresh_nonce()),
            log_id: Some(log.log_id),
            ..Default::default()
        };
        self.finalize(LightTxType::Deposit, input, None)
    }
}

fn require<T>(value: Option<T>, field: &str) -> Result<T> {
    value.ok_or_else(|| ProtocolError::MalformedLightTx(field.to_string()))
}
