//! Error types for the IFC sidechain protocol.
//!
//! Every protocol operation that can fail returns a [`ProtocolError`].
//! Failures never leave partial state behind: a rejected payment is not
//! hashed, a mismatched slice is not submitted, a failed submission does
//! not touch the local stage view.

use thiserror::Error;

use crate::crypto::{EncryptionError, KeyError, SignatureError};

/// Errors that can occur anywhere in the payment and stage flow.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// A raw payment is missing a required field, or a field is unusable.
    #[error("malformed payment: missing or invalid field `{0}`")]
    MalformedPayment(String),

    /// The operator's own signature did not recover to the configured
    /// signer address. Points at a key/config mismatch, not at bad input.
    #[error("signature mismatch: expected signer {expected}, recovered {recovered}")]
    SignatureMismatch {
        /// The configured signer address.
        expected: String,
        /// The address actually recovered from the signature.
        recovered: String,
    },

    /// The booster has no pending root hash to commit.
    #[error("no pending root hash: {0}")]
    NoPendingRoot(String),

    /// The booster has no committed root hash for a stage.
    #[error("no committed root hash for stage {0}")]
    NoCommittedRoot(u64),

    /// A Merkle slice did not reconstruct the committed root.
    #[error("slice mismatch: {0}")]
    SliceMismatch(String),

    /// An unknown light transaction type string.
    #[error("invalid light transaction type: {0}")]
    InvalidType(String),

    /// A light transaction input is missing a field its type requires.
    #[error("malformed light transaction: missing or invalid field `{0}`")]
    MalformedLightTx(String),

    /// The deposit event sender was dropped before delivering a log.
    #[error("deposit event channel closed before a log was delivered")]
    DepositCancelled,

    /// The booster gateway returned an error or could not be reached.
    #[error("gateway error at {endpoint} (status {status:?}): {message}")]
    Gateway {
        /// The endpoint path that failed.
        endpoint: String,
        /// HTTP status, if a response was received at all.
        status: Option<u16>,
        /// Error detail from the gateway or the transport.
        message: String,
    },

    /// The chain node rejected or failed to accept a contract call.
    #[error("chain submission of {method} failed: {reason}")]
    ChainSubmission {
        /// Contract method name.
        method: String,
        /// Revert reason or transport error, verbatim.
        reason: String,
    },

    /// A cryptographic operation failed.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Crypto failures surfaced through [`ProtocolError::Crypto`].
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error(transparent)]
    Encryption(#[from] EncryptionError),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Signature(#[from] SignatureError),
}

impl From<EncryptionError> for ProtocolError {
    fn from(e: EncryptionError) -> Self {
        Self::Crypto(e.into())
    }
}

impl From<KeyError> for ProtocolError {
    fn from(e: KeyError) -> Self {
        Self::Crypto(e.into())
    }
}

impl From<SignatureError> for ProtocolError {
    fn from(e: SignatureError) -> Self {
        Self::Crypto(e.into())
    }
}

impl From<serde_json::Error> for ProtocolError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl ProtocolError {
    /// Whether retrying the same call later could succeed.
    ///
    /// The core never retries by itself; this is a hint for callers.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Gateway { .. } | Self::NoPendingRoot(_) | Self::ChainSubmission { .. }
        )
    }

    /// Shorthand for building a gateway error.
    pub fn gateway(endpoint: impl Into<String>, status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Gateway {
            endpoint: endpoint.into(),
            status,
            message: message.into(),
        }
    }

    /// Shorthand for building a chain submission error.
    pub fn chain(method: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ChainSubmission {
            method: method.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ProtocolError>;
