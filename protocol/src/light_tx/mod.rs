//! # Light Transactions
//!
//! Client-originated sidechain transactions: deposits, withdrawals, instant
//! withdrawals and remittances. The factory derives the fields a type fixes
//! (parties, nonce, log id), hashes the seven-word body and signs it with
//! the client key. Storage and syncing of the result happen elsewhere.

pub mod factory;
pub mod types;

pub use factory::{fresh_nonce, withdrawal_log_id, LightTransactionFactory};
pub use types::{
    DepositLog, LightTxData, LightTxInput, LightTxType, Party, SignedLightTransaction,
};
