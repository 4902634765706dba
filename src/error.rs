//! Error types for policy validation, hashing and on-chain reads.
//!
//! "Configuration not found" is deliberately absent here: it is a normal
//! outcome of [`crate::reader::ChainConfigReader::read`], not a failure.

use serde::Serialize;
use thiserror::Error;

/// Policy validation and country packing failures.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PolicyError {
    #[error("Minimum age must be between 0 and 150, got {age}")]
    AgeOutOfRange { age: i64 },

    #[error("Maximum 40 countries allowed, got {count}")]
    TooManyCountries { count: usize },

    #[error("Invalid country code: {code:?}. Must be 3 uppercase letters")]
    InvalidCode { code: String },

    #[error("Sanctions tiers must be exactly 3 flags (basic, enhanced, comprehensive), got {count}")]
    InvalidSanctionsTiers { count: usize },

    #[error("Stored age check flag is {enabled} but minimum age is {age}")]
    AgeFlagMismatch { enabled: bool, age: u64 },

    #[error("Stored country check flag is {enabled} but the country list is {}", list_state(.empty))]
    CountryFlagMismatch { enabled: bool, empty: bool },
}

fn list_state(empty: &bool) -> &'static str {
    if *empty {
        "empty"
    } else {
        "not empty"
    }
}

/// Scope hash input failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScopeError {
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Invalid scope seed: {0}")]
    InvalidSeed(String),
}

/// Packed country words that do not decode to well-formed codes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("word {word} has non-zero padding bytes")]
    DirtyPadding { word: usize },

    #[error("word {word} slot {slot} holds a truncated code")]
    UnterminatedSlot { word: usize, slot: usize },
}

/// A string that is not `0x` followed by 64 hex characters.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("not a 0x-prefixed 32-byte hex digest: {0:?}")]
pub struct MalformedDigest(pub String);

/// Transport-level failures talking to a ledger node.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("HTTP error calling {endpoint}: {source}")]
    Transport {
        endpoint: String,
        source: reqwest::Error,
    },

    #[error("request to {endpoint} timed out")]
    Timeout { endpoint: String },

    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },

    #[error("JSON-RPC error from {endpoint}: {message}")]
    JsonRpc { endpoint: String, message: String },

    #[error("malformed response from {endpoint}: {reason}")]
    MalformedResponse { endpoint: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// Failures reading a configuration back from the registry.
#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("Invalid config ID format {0:?}. Must be 0x followed by 64 hex characters")]
    MalformedId(String),

    #[error("remote call failed: {0}")]
    Remote(#[from] RpcError),

    #[error("malformed registry response: {0}")]
    MalformedResponse(String),

    #[error("on-chain country list is corrupt: {0}")]
    DataIntegrity(#[from] DecodeError),
}

impl ReaderError {
    /// Stable machine-readable kind for structured responses.
    pub fn kind(&self) -> &'static str {
        match self {
            ReaderError::MalformedId(_) => "malformed_id",
            ReaderError::Remote(_) => "remote",
            ReaderError::MalformedResponse(_) => "malformed_response",
            ReaderError::DataIntegrity(_) => "data_integrity",
        }
    }
}
