//! The operator's local, advisory view of stages it has acted on.
//!
//! The contract is the only authority on stage state. This view records what
//! *this* operator submitted so it can report on it; it never gates a
//! request, and a failed submission never touches it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::chain::TxHandle;
use crate::crypto::hash::{serde_h256_vec, to_hex, H256};

/// Where a stage is in its lifecycle, as far as this operator knows.
///
/// `Committed` covers the objection window: timing is enforced on-chain, so
/// locally there is no separate "window open" state to observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StageState {
    Proposed,
    Committed,
    Finalized,
    Exonerated,
    Penalized,
}

impl StageState {
    /// `Finalized` and `Penalized` accept nothing further. `Exonerated`
    /// only means some payment in the stage was cleared; the stage itself
    /// still goes on to finalize or be penalized.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finalized | Self::Penalized)
    }
}

impl fmt::Display for StageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Proposed => "proposed",
            Self::Committed => "committed",
            Self::Finalized => "finalized",
            Self::Exonerated => "exonerated",
            Self::Penalized => "penalized",
        };
        f.write_str(s)
    }
}

/// A state change submitted for a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Commit { root_hash: H256 },
    Finalize,
    Exonerate { payment_hash: H256 },
    Penalize,
}

impl Transition {
    /// Label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Commit { .. } => "commit",
            Self::Finalize => "finalize",
            Self::Exonerate { .. } => "exonerate",
            Self::Penalize => "penalize",
        }
    }

    fn target(&self) -> StageState {
        match self {
            Self::Commit { .. } => StageState::Committed,
            Self::Finalize => StageState::Finalized,
            Self::Exonerate { .. } => StageState::Exonerated,
            Self::Penalize => StageState::Penalized,
        }
    }
}

/// What this operator last submitted for one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageRecord {
    pub stage_height: u64,
    pub state: StageState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_tx: Option<TxHandle>,
    #[serde(default, with = "serde_h256_vec")]
    pub exonerated_payments: Vec<H256>,
    pub updated_at: DateTime<Utc>,
}

impl StageRecord {
    pub fn new(stage_height: u64) -> Self {
        Self {
            stage_height,
            state: StageState::Proposed,
            root_hash: None,
            last_tx: None,
            exonerated_payments: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// Whether `transition` is allowed from the current state.
    ///
    /// ```text
    /// Proposed   -> Committed | Finalized | Exonerated | Penalized
    /// Committed  -> Finalized | Exonerated | Penalized
    /// Exonerated -> Exonerated (another payment) | Finalized | Penalized
    /// Finalized, Penalized -> nothing
    /// ```
    ///
    /// A stage this operator never saw committed starts out `Proposed`,
    /// which is why `Proposed` may jump straight to an outcome.
    pub fn can_apply(&self, transition: &Transition) -> bool {
        match (self.state, transition) {
            (StageState::Proposed, _) => true,
            (StageState::Committed, Transition::Commit { .. }) => false,
            (StageState::Committed, _) => true,
            (StageState::Exonerated, Transition::Exonerate { payment_hash }) => {
                !self.exonerated_payments.contains(payment_hash)
            }
            (StageState::Exonerated, Transition::Finalize | Transition::Penalize) => true,
            _ => false,
        }
    }

    /// Apply a submitted transition. Returns the rejected current state when
    /// the transition is not allowed; the record is then left unchanged.
    pub fn apply(&mut self, transition: &Transition, tx: TxHandle) -> Result<(), StageState> {
        if !self.can_apply(transition) {
            return Err(self.state);
        }
        match transition {
            Transition::Commit { root_hash } => self.root_hash = Some(to_hex(root_hash)),
            Transition::Exonerate { payment_hash } => self.exonerated_payments.push(*payment_hash),
            Transition::Finalize | Transition::Penalize => {}
        }
        self.state = transition.target();
        self.last_tx = Some(tx);
        self.updated_at = Utc::now();
        Ok(())
    }
}
