// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # IFC Protocol: Operator Core
//!
//! The operator side of an optimistic sidechain. Payments are sealed to both
//! counterparties, hashed, signed against a stage and handed to a booster
//! node, which batches them into Merkle trees. The operator commits each
//! tree's root on an anchor contract; clients who can show their payment in
//! a committed tree can exonerate the operator, and anyone may ask for a
//! penalty when a stage misbehaves.
//!
//! ## Architecture
//!
//! - **crypto** — Keccak-256, secp256k1 keys and recoverable signatures,
//!   payment sealing.
//! - **payment** — Payment validation, dual encryption, payment hash and
//!   the operator's commitment signature.
//! - **light_tx** — Client light transactions: deposit, withdrawal, instant
//!   withdrawal, remittance.
//! - **stage** — Stage hashes, slice verification and the
//!   commit/finalize/exonerate/penalty lifecycle.
//! - **gateway** — The booster node, behind a trait.
//! - **chain** — Contract call encoding and submission, behind a trait.
//! - **config** — Protocol constants and stage timings.
//!
//! ## Design Philosophy
//!
//! 1. The contract is the authority. Local state is a view, never a gate.
//! 2. Nothing is submitted on-chain that the operator has not verified.
//! 3. No retries in the core. Callers decide what a failure means.

pub mod chain;
pub mod config;
pub mod crypto;
pub mod error;
pub mod gateway;
pub mod light_tx;
pub mod payment;
pub mod stage;

#[cfg(test)]
mod test_support;

pub use error::{ProtocolError, Result};
