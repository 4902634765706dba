//! Hashing System - keccak-256 digests
//!
//! Scope hashes and config ids are both plain keccak-256 over bytes the
//! caller has already laid out. Nothing here frames or salts the input.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};

use crate::error::MalformedDigest;

/// Compute keccak-256 of bytes
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute keccak-256 of bytes, return 0x-prefixed hex string
pub fn keccak256_hex(data: &[u8]) -> String {
    format!("0x{}", hex::encode(keccak256(data)))
}

/// A 32-byte digest. Used for both scope hashes and configuration ids.
///
/// Renders and parses as `0x` followed by 64 hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest32(pub [u8; 32]);

pub type ScopeHash = Digest32;
pub type ConfigId = Digest32;

impl Digest32 {
    pub fn of(data: &[u8]) -> Self {
        Self(keccak256(data))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Digest32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Digest32 {
    type Err = MalformedDigest;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s
            .strip_prefix("0x")
            .filter(|b| b.len() == 64)
            .ok_or_else(|| MalformedDigest(s.to_string()))?;
        let mut out = [0u8; 32];
        hex::decode_to_slice(body, &mut out).map_err(|_| MalformedDigest(s.to_string()))?;
        Ok(Self(out))
    }
}

impl Serialize for Digest32 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest32 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Check a `0x` address: 40 hex digits, and when mixed-case, a valid
/// EIP-55 checksum.
pub fn is_address(addr: &str) -> bool {
    let Some(body) = addr.strip_prefix("0x") else {
        return false;
    };
    if body.len() != 40 || !body.chars().all(|c| c.is_ascii_hexdigit()) {
        return false;
    }
    let has_lower = body.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = body.chars().any(|c| c.is_ascii_uppercase());
    if !(has_lower && has_upper) {
        return true;
    }
    to_checksum_address(body) == body
}

/// EIP-55 casing of 40 hex digits (no prefix in, no prefix out).
fn to_checksum_address(body: &str) -> String {
    let lower = body.to_ascii_lowercase();
    let hash = keccak256(lower.as_bytes());
    lower
        .chars()
        .enumerate()
        .map(|(i, c)| {
            let nibble = (hash[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
            if c.is_ascii_alphabetic() && nibble >= 8 {
                c.to_ascii_uppercase()
            } else {
                c
            }
        })
        .collect()
}
