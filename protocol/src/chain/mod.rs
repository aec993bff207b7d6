//! # Anchor Chain Interface
//!
//! The four contract methods the operator calls, as a typed enum, and the
//! [`ChainClient`] seam that submits them.
//!
//! ```text
//! abi.rs — selector and calldata encoding
//! rpc.rs — JsonRpcChainClient (eth_sendTransaction)
//! ```
//!
//! Submission is fire-and-forget: a [`TxHandle`] means the node accepted the
//! transaction, not that it was mined or that the contract agreed.

pub mod abi;
pub mod rpc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::crypto::hash::{serde_prefixed_h256, to_prefixed_hex, H256};
use crate::crypto::Address;
use crate::error::Result;
use abi::Token;

pub use rpc::JsonRpcChainClient;

/// A call to the anchor contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractCall {
    AddNewStage {
        stage_hash: H256,
        root_hash: H256,
    },
    /// `addNewStage` for contract builds that take the stage's timings and
    /// data alongside the root. See [`CommitAbi`](crate::config::CommitAbi).
    AddNewStageWithTimings {
        stage_hash: H256,
        root_hash: H256,
        objection_time: u64,
        finalize_time: u64,
        data: Vec<u8>,
    },
    Finalize {
        stage_hash: H256,
    },
    PayPenalty {
        stage_hash: H256,
        payment_hashes: Vec<H256>,
    },
    Exonerate {
        stage_hash: H256,
        payment_hash: H256,
        tree_node_index: u64,
        slice: Vec<H256>,
        colliding_payment_hashes: Vec<H256>,
    },
}

impl ContractCall {
    /// Contract method name.
    pub fn method(&self) -> &'static str {
        match self {
            Self::AddNewStage { .. } | Self::AddNewStageWithTimings { .. } => "addNewStage",
            Self::Finalize { .. } => "finalize",
            Self::PayPenalty { .. } => "payPenalty",
            Self::Exonerate { .. } => "exonerate",
        }
    }

    /// Solidity signature the selector is taken from.
    pub fn signature(&self) -> &'static str {
        match self {
            Self::AddNewStage { .. } => "addNewStage(bytes32,bytes32)",
            Self::AddNewStageWithTimings { .. } => {
                "addNewStage(bytes32,bytes32,uint256,uint256,bytes)"
            }
            Self::Finalize { .. } => "finalize(bytes32)",
            Self::PayPenalty { .. } => "payPenalty(bytes32,bytes32[])",
            Self::Exonerate { .. } => "exonerate(bytes32,bytes32,uint256,bytes32[],bytes32[])",
        }
    }

    /// The stage this call is about.
    pub fn stage_hash(&self) -> &H256 {
        match self {
            Self::AddNewStage { stage_hash, .. }
            | Self::AddNewStageWithTimings { stage_hash, .. }
            | Self::Finalize { stage_hash }
            | Self::PayPenalty { stage_hash, .. }
            | Self::Exonerate { stage_hash, .. } => stage_hash,
        }
    }

    fn tokens(&self) -> Vec<Token> {
        match self {
            Self::AddNewStage {
                stage_hash,
                root_hash,
            } => vec![Token::Word(*stage_hash), Token::Word(*root_hash)],
            Self::AddNewStageWithTimings {
                stage_hash,
                root_hash,
                objection_time,
                finalize_time,
                data,
            } => vec![
                Token::Word(*stage_hash),
                Token::Word(*root_hash),
                Token::Uint(*objection_time),
                Token::Uint(*finalize_time),
                Token::Bytes(data.clone()),
            ],
            Self::Finalize { stage_hash } => vec![Token::Word(*stage_hash)],
            Self::PayPenalty {
                stage_hash,
                payment_hashes,
            } => vec![
                Token::Word(*stage_hash),
                Token::WordArray(payment_hashes.clone()),
            ],
            Self::Exonerate {
                stage_hash,
                payment_hash,
                tree_node_index,
                slice,
                colliding_payment_hashes,
            } => vec![
                Token::Word(*stage_hash),
                Token::Word(*payment_hash),
                Token::Uint(*tree_node_index),
                Token::WordArray(slice.clone()),
                Token::WordArray(colliding_payment_hashes.clone()),
            ],
        }
    }

    /// ABI calldata: selector plus arguments.
    pub fn encode(&self) -> Vec<u8> {
        abi::encode_with_selector(self.signature(), &self.tokens())
    }

    /// Arguments as they cross into the contract call: hashes `0x`-prefixed,
    /// integers as numbers. For logs and API responses.
    pub fn args(&self) -> serde_json::Value {
        fn hashes(list: &[H256]) -> Vec<String> {
            list.iter().map(|h| to_prefixed_hex(h)).collect()
        }
        match self {
            Self::AddNewStage {
                stage_hash,
                root_hash,
            } => serde_json::json!([to_prefixed_hex(stage_hash), to_prefixed_hex(root_hash)]),
            Self::AddNewStageWithTimings {
                stage_hash,
                root_hash,
                objection_time,
                finalize_time,
                data,
            } => serde_json::json!([
                to_prefixed_hex(stage_hash),
                to_prefixed_hex(root_hash),
                objection_time,
                finalize_time,
                to_prefixed_hex(data),
            ]),
            Self::Finalize { stage_hash } => serde_json::json!([to_prefixed_hex(stage_hash)]),
            Self::PayPenalty {
                stage_hash,
                payment_hashes,
            } => serde_json::json!([to_prefixed_hex(stage_hash), hashes(payment_hashes)]),
            Self::Exonerate {
                stage_hash,
                payment_hash,
                tree_node_index,
                slice,
                colliding_payment_hashes,
            } => serde_json::json!([
                to_prefixed_hex(stage_hash),
                to_prefixed_hex(payment_hash),
                tree_node_index,
                hashes(slice),
                hashes(colliding_payment_hashes),
            ]),
        }
    }
}

/// A submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxHandle {
    pub method: String,
    #[serde(with = "serde_prefixed_h256")]
    pub tx_hash: H256,
}

impl fmt::Display for TxHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_prefixed_hex(&self.tx_hash))
    }
}

/// Submits contract calls to the anchor chain.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Submit `call` to the contract at `contract`. `nonce` overrides the
    /// sender's account nonce when set.
    async fn submit(
        &self,
        contract: &Address,
        call: &ContractCall,
        nonce: Option<u64>,
    ) -> Result<TxHandle>;
}
