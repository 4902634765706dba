//! Minimal call encoding for the registry's two read functions.
//!
//! Both take a single `bytes32` and return static types, so calldata is
//! `selector ++ id` and return data is a run of inline 32-byte words.

use crate::codec::{PackedCountryBlock, WORD_COUNT};
use crate::hashing::ConfigId;
use crate::policy::SanctionsTiers;

pub const WORD: usize = 32;

/// keccak256("verificationConfigV2Exists(bytes32)")[..4]
pub const EXISTS_SELECTOR: [u8; 4] = [0x2e, 0x9c, 0x36, 0x5e];
pub const EXISTS_SIGNATURE: &str = "verificationConfigV2Exists(bytes32)";

/// keccak256("getVerificationConfigV2(bytes32)")[..4]
pub const GET_CONFIG_SELECTOR: [u8; 4] = [0xa1, 0x19, 0x2e, 0x98];
pub const GET_CONFIG_SIGNATURE: &str = "getVerificationConfigV2(bytes32)";

/// bool, uint256, bool, uint256[4], bool[3]
pub const CONFIG_WORDS: usize = 1 + 1 + 1 + WORD_COUNT + 3;

/// Encode a call taking one `bytes32` argument.
pub fn encode_call(selector: [u8; 4], id: &ConfigId) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + WORD);
    out.extend_from_slice(&selector);
    out.extend_from_slice(id.as_bytes());
    out
}

/// The registry's stored struct, with field order and widths as on-chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnChainConfig {
    pub older_than_enabled: bool,
    pub older_than: u64,
    pub forbidden_countries_enabled: bool,
    pub forbidden_countries_packed: PackedCountryBlock,
    pub ofac_enabled: SanctionsTiers,
}

impl OnChainConfig {
    /// ABI return encoding of this struct, ten inline words.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(CONFIG_WORDS * WORD);
        out.extend_from_slice(&bool_word(self.older_than_enabled));
        let mut age = [0u8; WORD];
        age[24..].copy_from_slice(&self.older_than.to_be_bytes());
        out.extend_from_slice(&age);
        out.extend_from_slice(&bool_word(self.forbidden_countries_enabled));
        for i in 0..WORD_COUNT {
            out.extend_from_slice(&self.forbidden_countries_packed.word_be(i));
        }
        for flag in self.ofac_enabled.as_array() {
            out.extend_from_slice(&bool_word(flag));
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AbiError {
    #[error("expected at least {expected} bytes, got {actual}")]
    Short { expected: usize, actual: usize },

    #[error("word {index} is not a valid bool")]
    InvalidBool { index: usize },

    #[error("word {index} does not fit in 64 bits")]
    Overflow { index: usize },
}

pub fn bool_word(value: bool) -> [u8; WORD] {
    let mut out = [0u8; WORD];
    out[WORD - 1] = value as u8;
    out
}

fn word_at(data: &[u8], index: usize) -> [u8; WORD] {
    let mut out = [0u8; WORD];
    out.copy_from_slice(&data[index * WORD..(index + 1) * WORD]);
    out
}

fn ensure_len(data: &[u8], words: usize) -> Result<(), AbiError> {
    if data.len() < words * WORD {
        return Err(AbiError::Short {
            expected: words * WORD,
            actual: data.len(),
        });
    }
    Ok(())
}

fn decode_bool_at(data: &[u8], index: usize) -> Result<bool, AbiError> {
    let word = word_at(data, index);
    if word[..WORD - 1].iter().any(|b| *b != 0) || word[WORD - 1] > 1 {
        return Err(AbiError::InvalidBool { index });
    }
    Ok(word[WORD - 1] == 1)
}

fn decode_u64_at(data: &[u8], index: usize) -> Result<u64, AbiError> {
    let word = word_at(data, index);
    if word[..WORD - 8].iter().any(|b| *b != 0) {
        return Err(AbiError::Overflow { index });
    }
    let mut low = [0u8; 8];
    low.copy_from_slice(&word[WORD - 8..]);
    Ok(u64::from_be_bytes(low))
}

/// Decode a single `bool` return value.
pub fn decode_bool(data: &[u8]) -> Result<bool, AbiError> {
    ensure_len(data, 1)?;
    decode_bool_at(data, 0)
}

/// Decode the `getVerificationConfigV2` return value.
pub fn decode_config(data: &[u8]) -> Result<OnChainConfig, AbiError> {
    ensure_len(data, CONFIG_WORDS)?;

    let older_than_enabled = decode_bool_at(data, 0)?;
    let older_than = decode_u64_at(data, 1)?;
    let forbidden_countries_enabled = decode_bool_at(data, 2)?;

    let mut words_be = [[0u8; WORD]; WORD_COUNT];
    for (i, word) in words_be.iter_mut().enumerate() {
        *word = word_at(data, 3 + i);
    }

    let base = 3 + WORD_COUNT;
    let ofac_enabled = SanctionsTiers::new(
        decode_bool_at(data, base)?,
        decode_bool_at(data, base + 1)?,
        decode_bool_at(data, base + 2)?,
    );

    Ok(OnChainConfig {
        older_than_enabled,
        older_than,
        forbidden_countries_enabled,
        forbidden_countries_packed: PackedCountryBlock::from_be_words(words_be),
        ofac_enabled,
    })
}
