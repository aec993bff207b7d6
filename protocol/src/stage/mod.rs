//! # Stages
//!
//! A stage is a batch of payments the booster folds into one Merkle tree.
//! The operator commits the tree's root on the anchor contract, and after
//! the objection window it finalizes the stage. In between, any client whose
//! payment is in the tree can exonerate the operator by showing a slice, and
//! anyone can ask for a penalty.
//!
//! ```text
//! exoneration.rs — slice verification, proof -> exonerate call
//! lifecycle.rs   — commit / finalize / exonerate / payPenalty submissions
//! types.rs       — the operator's local view of stage state
//! ```

pub mod exoneration;
pub mod lifecycle;
pub mod types;

use crate::crypto::hash::{keccak256, H256};

pub use crate::chain::TxHandle;
pub use exoneration::{compute_root, ExonerationProof, ExonerationVerifier};
pub use lifecycle::{CommitOptions, StageLifecycle};
pub use types::{StageRecord, StageState, Transition};

/// The on-chain identifier of a stage: Keccak-256 of the height written as
/// decimal ASCII.
pub fn stage_hash(stage_height: u64) -> H256 {
    keccak256(stage_height.to_string().as_bytes())
}
