//! Solidity ABI calldata encoding for the handful of types the anchor
//! contract's methods take: `bytes32`, `uint256`, `bytes32[]` and `bytes`.
//!
//! ```text
//! calldata = selector(4) || head_1 .. head_n || tail_1 .. tail_m
//! ```
//!
//! Static arguments sit in their head slot. Dynamic arguments put the byte
//! offset of their tail (relative to the start of the heads) in the head
//! slot, and the tail is `length || elements`, padded to 32 bytes.

use crate::config::HASH_LENGTH;
use crate::crypto::hash::{keccak256, H256};

const WORD: usize = HASH_LENGTH;

/// One ABI-encodable argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// `bytes32`
    Word(H256),
    /// `uint256` (values here never exceed 64 bits)
    Uint(u64),
    /// `bytes32[]`
    WordArray(Vec<H256>),
    /// `bytes`
    Bytes(Vec<u8>),
}

impl Token {
    fn is_dynamic(&self) -> bool {
        matches!(self, Token::WordArray(_) | Token::Bytes(_))
    }

    fn tail(&self) -> Vec<u8> {
        match self {
            Token::WordArray(words) => {
                let mut out = Vec::with_capacity(WORD * (words.len() + 1));
                out.extend_from_slice(&uint_word(words.len() as u64));
                for word in words {
                    out.extend_from_slice(word);
                }
                out
            }
            Token::Bytes(bytes) => {
                let padded = bytes.len().div_ceil(WORD) * WORD;
                let mut out = Vec::with_capacity(WORD + padded);
                out.extend_from_slice(&uint_word(bytes.len() as u64));
                out.extend_from_slice(bytes);
                out.resize(WORD + padded, 0);
                out
            }
            Token::Word(_) | Token::Uint(_) => Vec::new(),
        }
    }
}

fn uint_word(value: u64) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 8..].copy_from_slice(&value.to_be_bytes());
    word
}

/// First four bytes of `keccak256(signature)`.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Encode arguments without a selector.
pub fn encode(tokens: &[Token]) -> Vec<u8> {
    let head_len = tokens.len() * WORD;
    let mut heads = Vec::with_capacity(head_len);
    let mut tails = Vec::new();

    for token in tokens {
        match token {
            Token::Word(word) => heads.extend_from_slice(word),
            Token::Uint(value) => heads.extend_from_slice(&uint_word(*value)),
            dynamic => {
                debug_assert!(dynamic.is_dynamic());
                heads.extend_from_slice(&uint_word((head_len + tails.len()) as u64));
                tails.extend_from_slice(&dynamic.tail());
            }
        }
    }

    heads.extend_from_slice(&tails);
    heads
}

/// Selector followed by the encoded arguments.
pub fn encode_with_selector(signature: &str, tokens: &[Token]) -> Vec<u8> {
    let mut out = selector(signature).to_vec();
    out.extend_from_slice(&encode(tokens));
    out
}
