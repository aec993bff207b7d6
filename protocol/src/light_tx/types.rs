//! Light transaction value types.
//!
//! A light transaction is a client-originated off-chain instruction: move
//! value into the sidechain (deposit), out of it (withdrawal, instant
//! withdrawal), or within it (remittance). Once signed it is never mutated.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::config::{DEFAULT_ASSET_ID, HASH_LENGTH, NULL_ACCOUNT};
use crate::crypto::hash::{decode_hex, keccak256_multi, to_hex, H256};
use crate::crypto::{recover_address, Address, RecoverableSignature};
use crate::error::{ProtocolError, Result};

// ---------------------------------------------------------------------------
// LightTxType
// ---------------------------------------------------------------------------

/// The four kinds of light transaction. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LightTxType {
    Deposit,
    Withdrawal,
    #[serde(alias = "instantWithdraw")]
    InstantWithdrawal,
    Remittance,
}

impl LightTxType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
            Self::InstantWithdrawal => "instantWithdrawal",
            Self::Remittance => "remittance",
        }
    }
}

impl FromStr for LightTxType {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "deposit" => Ok(Self::Deposit),
            "withdrawal" => Ok(Self::Withdrawal),
            "instantWithdrawal" | "instantWithdraw" => Ok(Self::InstantWithdrawal),
            "remittance" => Ok(Self::Remittance),
            other => Err(ProtocolError::InvalidType(other.to_string())),
        }
    }
}

impl fmt::Display for LightTxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Party
// ---------------------------------------------------------------------------

/// One side of a light transaction: a real account, or the null account
/// `"0"` that deposits come from and withdrawals go to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Party {
    Null,
    Account(Address),
}

impl Party {
    /// The party as a 32-byte word: zero for the null account, the
    /// left-padded address otherwise.
    pub fn to_word(&self) -> H256 {
        match self {
            Self::Null => [0u8; HASH_LENGTH],
            Self::Account(addr) => addr.normalized(),
        }
    }
}

impl From<Address> for Party {
    fn from(addr: Address) -> Self {
        Self::Account(addr)
    }
}

impl FromStr for Party {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        if s == NULL_ACCOUNT {
            return Ok(Self::Null);
        }
        s.parse::<Address>()
            .map(Self::Account)
            .map_err(|e| ProtocolError::MalformedLightTx(e.to_string()))
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str(NULL_ACCOUNT),
            Self::Account(addr) => write!(f, "{addr}"),
        }
    }
}

impl Serialize for Party {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Party {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Words
// ---------------------------------------------------------------------------

/// Parse a 32-byte word. `"0"` is the zero word; shorter hex values are
/// left-padded, so an on-chain sequence number like `"2a"` is accepted.
pub fn parse_word(s: &str) -> Result<H256> {
    if s == NULL_ACCOUNT {
        return Ok([0u8; HASH_LENGTH]);
    }
    let bytes = decode_hex(s).map_err(|e| ProtocolError::MalformedLightTx(e.to_string()))?;
    if bytes.len() > HASH_LENGTH {
        return Err(ProtocolError::MalformedLightTx(format!(
            "word longer than {HASH_LENGTH} bytes"
        )));
    }
    let mut word = [0u8; HASH_LENGTH];
    word[HASH_LENGTH - bytes.len()..].copy_from_slice(&bytes);
    Ok(word)
}

/// Render a word: `"0"` for zero, unprefixed hex otherwise.
pub fn format_word(word: &H256) -> String {
    if word.iter().all(|b| *b == 0) {
        NULL_ACCOUNT.to_string()
    } else {
        to_hex(word)
    }
}

/// A `u64` as a big-endian 32-byte word.
pub fn u64_word(value: u64) -> H256 {
    let mut word = [0u8; HASH_LENGTH];
    word[HASH_LENGTH - 8..].copy_from_slice(&value.to_be_bytes());
    word
}

mod serde_word {
    use super::{format_word, parse_word, H256};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &H256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_word(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<H256, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_word(&s).map_err(serde::de::Error::custom)
    }
}

mod serde_opt_word {
    use super::{format_word, parse_word, H256};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<H256>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(word) => serializer.serialize_some(&format_word(word)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<H256>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|s| parse_word(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

// ---------------------------------------------------------------------------
// Input and data
// ---------------------------------------------------------------------------

/// Caller-supplied fields for a light transaction. Which of the optional
/// fields are required depends on the type; the factory fills in the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightTxInput {
    #[serde(rename = "assetID", default, skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<u64>,
    #[serde(default)]
    pub value: u64,
    #[serde(default)]
    pub fee: u64,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "serde_opt_word")]
    pub nonce: Option<H256>,
    #[serde(
        rename = "logID",
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_opt_word"
    )]
    pub log_id: Option<H256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Party>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Party>,
}

/// The fully derived body of a light transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightTxData {
    pub from: Party,
    pub to: Party,
    #[serde(rename = "assetID")]
    pub asset_id: u64,
    pub value: u64,
    pub fee: u64,
    #[serde(with = "serde_word")]
    pub nonce: H256,
    #[serde(rename = "logID", with = "serde_word")]
    pub log_id: H256,
}

impl LightTxData {
    /// The seven fields as 32-byte words in hash order:
    /// `from, to, assetID, value, fee, nonce, logID`.
    pub fn words(&self) -> [H256; 7] {
        [
            self.from.to_word(),
            self.to.to_word(),
            u64_word(self.asset_id),
            u64_word(self.value),
            u64_word(self.fee),
            self.nonce,
            self.log_id,
        ]
    }

    /// `keccak256` over the concatenated words.
    pub fn hash(&self) -> H256 {
        let words = self.words();
        let parts: Vec<&[u8]> = words.iter().map(|w| w.as_slice()).collect();
        keccak256_multi(&parts)
    }
}

/// A light transaction signed by its client. Immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedLightTransaction {
    #[serde(rename = "type")]
    pub tx_type: LightTxType,
    pub light_tx_data: LightTxData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(with = "crate::crypto::hash::serde_h256")]
    pub light_tx_hash: H256,
    pub client_signature: RecoverableSignature,
}

impl SignedLightTransaction {
    /// Recompute the hash and recover the signing client.
    pub fn verify(&self) -> Result<Address> {
        if self.light_tx_data.hash() != self.light_tx_hash {
            return Err(ProtocolError::MalformedLightTx("lightTxHash".to_string()));
        }
        Ok(recover_address(&self.light_tx_hash, &self.client_signature)?)
    }
}

/// An on-chain deposit event, as delivered to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositLog {
    #[serde(rename = "logID", with = "serde_word")]
    pub log_id: H256,
    pub value: u64,
    #[serde(rename = "assetID", default)]
    pub asset_id: u64,
}

impl DepositLog {
    pub fn new(log_id: H256, value: u64) -> Self {
        Self {
            log_id,
            value,
            asset_id: DEFAULT_ASSET_ID,
        }
    }
}
