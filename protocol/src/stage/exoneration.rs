//! Merkle-slice verification for exoneration.
//!
//! A slice is the sibling path from a payment's leaf to the stage root. To
//! check it, start from the payment hash at `treeNodeIndex` and fold the
//! siblings in:
//!
//! ```text
//! node = paymentHash
//! for sibling in slice:
//!     node  = if index is even { H(node || sibling) } else { H(sibling || node) }
//!     index = index / 2
//! node == committed root
//! ```
//!
//! Only a slice that reconstructs the committed root becomes a contract
//! call. Anything else is rejected before it gets near the chain.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::stage_hash;
use crate::chain::ContractCall;
use crate::crypto::hash::{merkle_parent, serde_h256, serde_h256_vec, to_hex, H256};
use crate::error::{ProtocolError, Result};

/// Evidence that a payment is included in a committed stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExonerationProof {
    pub stage_height: u64,
    #[serde(with = "serde_h256")]
    pub payment_hash: H256,
    pub tree_node_index: u64,
    #[serde(with = "serde_h256_vec")]
    pub slice: Vec<H256>,
    #[serde(with = "serde_h256_vec")]
    pub colliding_payment_hashes: Vec<H256>,
}

/// Fold `slice` into the leaf at `index`, returning the implied root.
pub fn compute_root(leaf: &H256, mut index: u64, slice: &[H256]) -> H256 {
    let mut node = *leaf;
    for sibling in slice {
        node = if index % 2 == 0 {
            merkle_parent(&node, sibling)
        } else {
            merkle_parent(sibling, &node)
        };
        index /= 2;
    }
    node
}

/// Checks exoneration proofs against committed roots.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExonerationVerifier;

impl ExonerationVerifier {
    pub fn new() -> Self {
        Self
    }

    /// Check `proof` for the disputed `(stage_height, payment_hash)` against
    /// `committed_root`. On success returns the `exonerate` call to submit,
    /// with the colliding hashes passed through untouched.
    pub fn verify(
        &self,
        stage_height: u64,
        payment_hash: &H256,
        proof: &ExonerationProof,
        committed_root: &H256,
    ) -> Result<ContractCall> {
        if proof.stage_height != stage_height {
            return Err(self.reject(
                stage_height,
                format!(
                    "proof is for stage {}, dispute is for stage {}",
                    proof.stage_height, stage_height
                ),
            ));
        }
        if proof.payment_hash != *payment_hash {
            return Err(self.reject(
                stage_height,
                format!(
                    "proof is for payment {}, dispute is for payment {}",
                    to_hex(&proof.payment_hash),
                    to_hex(payment_hash)
                ),
            ));
        }

        let root = compute_root(&proof.payment_hash, proof.tree_node_index, &proof.slice);
        if root != *committed_root {
            return Err(self.reject(
                stage_height,
                format!(
                    "slice reconstructs {}, committed root is {}",
                    to_hex(&root),
                    to_hex(committed_root)
                ),
            ));
        }

        Ok(ContractCall::Exonerate {
            stage_hash: stage_hash(stage_height),
            payment_hash: proof.payment_hash,
            tree_node_index: proof.tree_node_index,
            slice: proof.slice.clone(),
            colliding_payment_hashes: proof.colliding_payment_hashes.clone(),
        })
    }

    fn reject(&self, stage_height: u64, reason: String) -> ProtocolError {
        warn!(stage_height, %reason, "rejected exoneration slice");
        ProtocolError::SliceMismatch(reason)
    }
}
