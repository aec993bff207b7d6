//! # Booster Gateway
//!
//! The operator's view of the booster node: the service that collects
//! payments, builds stage trees and serves slices. Everything goes through
//! the [`BoosterGateway`] trait so the stage logic can be driven by an
//! in-memory booster in tests.
//!
//! The gateway has at-least-once semantics and the core does not retry.
//! Every failure carries the endpoint and, when there was one, the HTTP
//! status.

pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::crypto::hash::{parse_h256, H256};
use crate::crypto::Address;
use crate::error::{ProtocolError, Result};
use crate::light_tx::SignedLightTransaction;
use crate::payment::SignedPaymentCommitment;

pub use http::HttpGateway;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// `GET /roothash` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootHashResponse {
    pub ok: bool,
    #[serde(default)]
    pub root_hash: Option<String>,
    #[serde(default)]
    pub stage_height: Option<u64>,
    #[serde(default)]
    pub message: Option<String>,
}

/// A pending root the booster wants committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRoot {
    pub stage_height: u64,
    pub root_hash: H256,
}

impl RootHashResponse {
    /// Interpret the response as a pending root. `ok: false` or a missing
    /// field means there is nothing to commit.
    pub fn into_pending(self) -> Result<PendingRoot> {
        if !self.ok {
            return Err(ProtocolError::NoPendingRoot(
                self.message.unwrap_or_else(|| "booster reported no pending root".into()),
            ));
        }
        let root_hash = self
            .root_hash
            .ok_or_else(|| ProtocolError::NoPendingRoot("response without rootHash".into()))?;
        let stage_height = self
            .stage_height
            .ok_or_else(|| ProtocolError::NoPendingRoot("response without stageHeight".into()))?;
        let root_hash = parse_h256(&root_hash)
            .map_err(|e| ProtocolError::gateway("/roothash", None, e.to_string()))?;
        Ok(PendingRoot {
            stage_height,
            root_hash,
        })
    }
}

/// One sibling in a slice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SliceNode {
    pub tree_node_hash: String,
}

/// `GET /slice` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SliceResponse {
    pub slice: Vec<SliceNode>,
    pub payment_hash_array: Vec<String>,
    pub tree_node_index: u64,
}

/// A decoded slice: the sibling path and the payment hashes sharing the leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slice {
    pub tree_node_index: u64,
    pub siblings: Vec<H256>,
    pub colliding_payment_hashes: Vec<H256>,
}

impl SliceResponse {
    pub fn decode(self) -> Result<Slice> {
        let bad = |e: crate::crypto::HexError| ProtocolError::gateway("/slice", None, e.to_string());
        let siblings = self
            .slice
            .iter()
            .map(|node| parse_h256(&node.tree_node_hash).map_err(bad))
            .collect::<Result<Vec<_>>>()?;
        let colliding_payment_hashes = self
            .payment_hash_array
            .iter()
            .map(|h| parse_h256(h).map_err(bad))
            .collect::<Result<Vec<_>>>()?;
        Ok(Slice {
            tree_node_index: self.tree_node_index,
            siblings,
            colliding_payment_hashes,
        })
    }
}

/// `POST /send/light_tx` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LightTxResponse {
    pub ok: bool,
    #[serde(default)]
    pub receipt: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Operations the operator needs from the booster.
///
/// The first block of methods drives the stage lifecycle and must be
/// implemented. The query plumbing at the end defaults to an "unsupported"
/// gateway error so narrow implementations stay narrow.
#[async_trait]
pub trait BoosterGateway: Send + Sync {
    /// Pending root for `stage_height`, or the booster's next one when
    /// `None`. No pending root is [`ProtocolError::NoPendingRoot`].
    async fn pending_root(&self, stage_height: Option<u64>) -> Result<PendingRoot>;

    /// Committed root for a stage, `None` if the booster has none.
    async fn committed_root(&self, stage_height: u64) -> Result<Option<H256>>;

    /// The slice proving `payment_hash` in stage `stage_height`.
    async fn slice(&self, stage_height: u64, payment_hash: &H256) -> Result<Slice>;

    /// Forward signed payment commitments.
    async fn send_payments(&self, payments: &[SignedPaymentCommitment]) -> Result<serde_json::Value>;

    /// Forward a signed light transaction; returns the booster's receipt.
    async fn send_light_tx(&self, tx: &SignedLightTransaction) -> Result<serde_json::Value>;

    /// Address of the anchor contract.
    async fn contract_address(&self) -> Result<Address>;

    /// Lowest stage height the booster will accept payments for.
    async fn viable_stage_height(&self) -> Result<u64>;

    async fn pending_root_hashes(&self) -> Result<serde_json::Value> {
        Err(unsupported("/pending/roothashes"))
    }

    async fn trees(&self, _stage_height: u64) -> Result<serde_json::Value> {
        Err(unsupported("/trees"))
    }

    async fn booster_address(&self) -> Result<Address> {
        Err(unsupported("/booster/address"))
    }

    async fn server_address(&self) -> Result<Address> {
        Err(unsupported("/server/address"))
    }

    async fn receipts(&self, _stage_height: u64) -> Result<serde_json::Value> {
        Err(unsupported("/receipts"))
    }

    async fn accounts(&self, _stage_height: u64) -> Result<serde_json::Value> {
        Err(unsupported("/accounts"))
    }

    async fn asset_list(&self) -> Result<serde_json::Value> {
        Err(unsupported("/assetlist"))
    }
}

fn unsupported(endpoint: &str) -> ProtocolError {
    ProtocolError::gateway(endpoint, None, "not supported by this gateway")
}
