//! # Protocol Configuration & Constants
//!
//! Every magic number in the IFC sidechain lives here. If you're hardcoding a
//! constant somewhere else, move it here.
//!
//! Several of these values are fixed by the on-chain contract and the signing
//! convention of the anchor chain. Changing them does not make the operator
//! "configurable", it makes it incompatible.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// The protocol version string reported by the operator node.
pub const PROTOCOL_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// Keccak-256 output length. Payment hashes, stage hashes, root hashes and
/// slice nodes are all this size.
pub const HASH_LENGTH: usize = 32;

/// Account addresses are the last 20 bytes of the Keccak-256 hash of the
/// uncompressed secp256k1 public key.
pub const ADDRESS_LENGTH: usize = 20;

/// secp256k1 secret key length in bytes.
pub const SECRET_KEY_LENGTH: usize = 32;

/// X25519 public key length. Counterparty encryption keys (`pkClient`,
/// `pkStakeholder`) must decode to exactly this many bytes.
pub const ENCRYPTION_KEY_LENGTH: usize = 32;

/// AES-256-GCM key length in bytes.
pub const AES_KEY_LENGTH: usize = 32;

/// AES-256-GCM nonce length in bytes. 96 bits, the only length you should use.
pub const AES_NONCE_LENGTH: usize = 12;

/// AES-256-GCM authentication tag length in bytes.
pub const AES_TAG_LENGTH: usize = 16;

/// Domain-separation prefix of the personal-message signing envelope:
/// `hash(prefix || len(msg) || msg)`. Fixed by the anchor chain's wallets.
pub const SIGNED_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n";

/// Recovery id offset used in the `v` component of a signature.
pub const SIGNATURE_V_OFFSET: u8 = 27;

/// KDF context strings for payment sealing. Versioned so a future change of
/// construction can never produce colliding keys.
pub const SEAL_EPHEMERAL_CONTEXT: &str = "ifc-protocol v1 payment seal ephemeral";
pub const SEAL_KEY_CONTEXT: &str = "ifc-protocol v1 payment seal key";
pub const SEAL_NONCE_CONTEXT: &str = "ifc-protocol v1 payment seal nonce";

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// The null account. Deposits come *from* it and withdrawals go *to* it. It
/// is also the placeholder `logID` of a remittance.
pub const NULL_ACCOUNT: &str = "0";

/// Asset id used when the caller does not name one.
pub const DEFAULT_ASSET_ID: u64 = 0;

/// Fee attached to proposed deposits and withdrawals: 0.01 of an 18-decimal
/// asset. Light transaction amounts are in base units.
pub const DEFAULT_LIGHT_TX_FEE: u64 = 10_000_000_000_000_000;

// ---------------------------------------------------------------------------
// Chain Submission
// ---------------------------------------------------------------------------

/// Gas limit attached to every contract call the operator submits.
pub const DEFAULT_GAS_LIMIT: u64 = 4_700_000;

/// Default objection window, in seconds, attached to a stage commit.
pub const DEFAULT_OBJECTION_TIME_SECS: u64 = 24 * 60 * 60;

/// Default delay, in seconds, after which a stage may be finalized.
pub const DEFAULT_FINALIZE_TIME_SECS: u64 = 2 * 24 * 60 * 60;

// ---------------------------------------------------------------------------
// Network Defaults
// ---------------------------------------------------------------------------

/// Default booster node URL.
pub const DEFAULT_BOOSTER_URL: &str = "http://127.0.0.1:3000";

/// Default anchor-chain JSON-RPC URL.
pub const DEFAULT_CHAIN_RPC_URL: &str = "http://127.0.0.1:8545";

/// Default operator API port.
pub const DEFAULT_API_PORT: u16 = 9841;

/// Default metrics (Prometheus) port.
pub const DEFAULT_METRICS_PORT: u16 = 9842;

// ---------------------------------------------------------------------------
// Stage Timings
// ---------------------------------------------------------------------------

/// Durations attached to a stage when it is committed on-chain.
///
/// The contract is the timing authority. These values are forwarded, never
/// enforced locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTimings {
    /// Seconds after the commit during which objections are accepted.
    pub objection_time: u64,
    /// Seconds after the commit after which `finalize` is accepted.
    pub finalize_time: u64,
}

impl Default for StageTimings {
    fn default() -> Self {
        Self {
            objection_time: DEFAULT_OBJECTION_TIME_SECS,
            finalize_time: DEFAULT_FINALIZE_TIME_SECS,
        }
    }
}

impl StageTimings {
    /// Returns `true` when the finalize deadline does not precede the end of
    /// the objection window. The contract rejects anything else.
    pub fn is_consistent(&self) -> bool {
        self.finalize_time >= self.objection_time
    }
}

/// Argument list the deployed anchor contract's `addNewStage` takes.
///
/// The reference contract takes `(stageHash, rootHash)` and keeps timing in
/// its own constants. Later builds also accept the objection window,
/// finalize delay and opaque data; with `RootOnly` those are not sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommitAbi {
    /// `addNewStage(bytes32,bytes32)`
    #[default]
    RootOnly,
    /// `addNewStage(bytes32,bytes32,uint256,uint256,bytes)`
    WithTimings,
}
