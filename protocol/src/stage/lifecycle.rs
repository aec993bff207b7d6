//! Driving stages through commit, finalize, exonerate and penalty.
//!
//! Each operation is one request/response round: look up what it needs on
//! the booster, build the contract call, submit it, return the handle. None
//! of them wait for confirmation, and none of them retry.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use super::exoneration::{ExonerationProof, ExonerationVerifier};
use super::stage_hash;
use super::types::{StageRecord, Transition};
use crate::chain::{ChainClient, ContractCall, TxHandle};
use crate::config::{CommitAbi, StageTimings};
use crate::crypto::hash::{to_hex, H256};
use crate::crypto::Address;
use crate::error::{ProtocolError, Result};
use crate::gateway::BoosterGateway;
use crate::payment::SignedPaymentCommitment;

/// Per-call overrides for [`StageLifecycle::commit_with`].
#[derive(Debug, Clone, Default)]
pub struct CommitOptions {
    /// Timings to attach instead of the configured ones. Only sent under
    /// [`CommitAbi::WithTimings`].
    pub timings: Option<StageTimings>,
    /// Opaque data attached to the stage. Only sent under
    /// [`CommitAbi::WithTimings`].
    pub data: Vec<u8>,
    /// Account nonce override for the submission.
    pub nonce: Option<u64>,
}

/// Stage operations for one operator.
pub struct StageLifecycle {
    gateway: Arc<dyn BoosterGateway>,
    chain: Arc<dyn ChainClient>,
    timings: StageTimings,
    commit_abi: CommitAbi,
    verifier: ExonerationVerifier,
    contract: OnceCell<Address>,
    stages: DashMap<u64, StageRecord>,
}

impl StageLifecycle {
    pub fn new(
        gateway: Arc<dyn BoosterGateway>,
        chain: Arc<dyn ChainClient>,
        timings: StageTimings,
    ) -> Self {
        if !timings.is_consistent() {
            warn!(
                objection_time = timings.objection_time,
                finalize_time = timings.finalize_time,
                "finalize time precedes end of objection window; the contract will refuse commits"
            );
        }
        Self {
            gateway,
            chain,
            timings,
            commit_abi: CommitAbi::default(),
            verifier: ExonerationVerifier::new(),
            contract: OnceCell::new(),
            stages: DashMap::new(),
        }
    }

    /// Preset the contract address instead of asking the booster for it.
    pub fn with_contract_address(self, address: Address) -> Self {
        // A fresh cell always accepts its first value.
        let _ = self.contract.set(address);
        self
    }

    /// Select the `addNewStage` argument list of the deployed contract.
    pub fn with_commit_abi(mut self, commit_abi: CommitAbi) -> Self {
        self.commit_abi = commit_abi;
        self
    }

    pub fn timings(&self) -> StageTimings {
        self.timings
    }

    pub fn commit_abi(&self) -> CommitAbi {
        self.commit_abi
    }

    /// The anchor contract address, fetched from the booster at most once.
    pub async fn contract_address(&self) -> Result<Address> {
        self.contract
            .get_or_try_init(|| async {
                let address = self.gateway.contract_address().await?;
                debug!(contract = %address, "resolved contract address");
                Ok::<_, ProtocolError>(address)
            })
            .await
            .copied()
    }

    /// Commit the booster's pending root for `stage_height` with the
    /// configured timings.
    pub async fn commit(&self, stage_height: u64) -> Result<TxHandle> {
        self.commit_with(stage_height, CommitOptions::default()).await
    }

    /// Commit with per-call overrides.
    pub async fn commit_with(&self, stage_height: u64, options: CommitOptions) -> Result<TxHandle> {
        let pending = self.gateway.pending_root(Some(stage_height)).await?;
        if pending.stage_height != stage_height {
            return Err(ProtocolError::NoPendingRoot(format!(
                "booster offered stage {} instead of {}",
                pending.stage_height, stage_height
            )));
        }

        let call = match self.commit_abi {
            CommitAbi::RootOnly => {
                if options.timings.is_some() || !options.data.is_empty() {
                    debug!(stage_height, "contract takes no timings or data; not sent");
                }
                ContractCall::AddNewStage {
                    stage_hash: stage_hash(stage_height),
                    root_hash: pending.root_hash,
                }
            }
            CommitAbi::WithTimings => {
                let timings = options.timings.unwrap_or(self.timings);
                ContractCall::AddNewStageWithTimings {
                    stage_hash: stage_hash(stage_height),
                    root_hash: pending.root_hash,
                    objection_time: timings.objection_time,
                    finalize_time: timings.finalize_time,
                    data: options.data,
                }
            }
        };
        self.submit(
            stage_height,
            call,
            options.nonce,
            Transition::Commit {
                root_hash: pending.root_hash,
            },
        )
        .await
    }

    /// Ask the contract to finalize. Timing is the contract's business.
    pub async fn finalize(&self, stage_height: u64) -> Result<TxHandle> {
        let call = ContractCall::Finalize {
            stage_hash: stage_hash(stage_height),
        };
        self.submit(stage_height, call, None, Transition::Finalize).await
    }

    /// Dispute on behalf of `payment_hash`: fetch its slice and the
    /// committed root from the booster, verify, then submit.
    pub async fn exonerate(&self, stage_height: u64, payment_hash: &H256) -> Result<TxHandle> {
        let slice = self.gateway.slice(stage_height, payment_hash).await?;
        let proof = ExonerationProof {
            stage_height,
            payment_hash: *payment_hash,
            tree_node_index: slice.tree_node_index,
            slice: slice.siblings,
            colliding_payment_hashes: slice.colliding_payment_hashes,
        };
        self.exonerate_with_proof(stage_height, payment_hash, &proof)
            .await
    }

    /// Verify a caller-supplied proof against the committed root and submit.
    /// Nothing is submitted unless the slice reconstructs the root.
    pub async fn exonerate_with_proof(
        &self,
        stage_height: u64,
        payment_hash: &H256,
        proof: &ExonerationProof,
    ) -> Result<TxHandle> {
        let committed_root = self
            .gateway
            .committed_root(stage_height)
            .await?
            .ok_or(ProtocolError::NoCommittedRoot(stage_height))?;

        let call = self
            .verifier
            .verify(stage_height, payment_hash, proof, &committed_root)?;
        self.submit(
            stage_height,
            call,
            None,
            Transition::Exonerate {
                payment_hash: *payment_hash,
            },
        )
        .await
    }

    /// Submit a penalty for `payment_hashes` in a stage.
    pub async fn pay_penalty(&self, stage_height: u64, payment_hashes: Vec<H256>) -> Result<TxHandle> {
        let call = ContractCall::PayPenalty {
            stage_hash: stage_hash(stage_height),
            payment_hashes,
        };
        self.submit(stage_height, call, None, Transition::Penalize).await
    }

    /// Forward signed commitments to the booster.
    pub async fn send_payments(
        &self,
        commitments: &[SignedPaymentCommitment],
    ) -> Result<serde_json::Value> {
        let resp = self.gateway.send_payments(commitments).await?;
        debug!(count = commitments.len(), "forwarded payment commitments");
        Ok(resp)
    }

    /// What this operator last submitted for a stage.
    pub fn stage_record(&self, stage_height: u64) -> Option<StageRecord> {
        self.stages.get(&stage_height).map(|r| r.value().clone())
    }

    /// All locally known stages, lowest height first.
    pub fn stage_records(&self) -> Vec<StageRecord> {
        let mut records: Vec<StageRecord> = self.stages.iter().map(|r| r.value().clone()).collect();
        records.sort_by_key(|r| r.stage_height);
        records
    }

    async fn submit(
        &self,
        stage_height: u64,
        call: ContractCall,
        nonce: Option<u64>,
        transition: Transition,
    ) -> Result<TxHandle> {
        let contract = self.contract_address().await?;
        let handle = self.chain.submit(&contract, &call, nonce).await?;

        info!(
            stage_height,
            method = call.method(),
            tx_hash = %handle,
            "submitted stage transition"
        );

        let mut record = self
            .stages
            .entry(stage_height)
            .or_insert_with(|| StageRecord::new(stage_height));
        if let Err(current) = record.apply(&transition, handle.clone()) {
            warn!(
                stage_height,
                state = %current,
                transition = transition.kind(),
                "local stage view does not expect this transition; left unchanged"
            );
        }

        if let Transition::Exonerate { payment_hash } = &transition {
            debug!(stage_height, payment_hash = %to_hex(payment_hash), "exoneration recorded");
        }
        Ok(handle)
    }
}
