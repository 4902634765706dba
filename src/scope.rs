//! Scope hash generation.
//!
//! `scope_hash = keccak256(lowercase(endpoint) ++ seed)`, raw UTF-8 with no
//! separator or length prefix. The external verifier recomputes exactly
//! this, so the byte order here is fixed.

use serde::{Deserialize, Serialize};

use crate::error::ScopeError;
use crate::hashing::{is_address, Digest32, ScopeHash};

pub const MAX_SEED_LEN: usize = 20;
const HTTPS_PREFIX: &str = "https://";
const SEED_SYMBOLS: &str = " -_.,!?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointKind {
    Address,
    Url,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeHashOutput {
    pub scope_hash: ScopeHash,
    pub endpoint_kind: EndpointKind,
}

/// Classify an endpoint as a contract address or an HTTPS URL.
pub fn classify_endpoint(endpoint: &str) -> Result<EndpointKind, ScopeError> {
    if endpoint.starts_with("0x") {
        if is_address(endpoint) {
            Ok(EndpointKind::Address)
        } else {
            Err(ScopeError::InvalidEndpoint(
                "Invalid Ethereum address format".to_string(),
            ))
        }
    } else if endpoint.starts_with(HTTPS_PREFIX) {
        if endpoint.len() > HTTPS_PREFIX.len() {
            Ok(EndpointKind::Url)
        } else {
            Err(ScopeError::InvalidEndpoint("Invalid HTTPS URL".to_string()))
        }
    } else {
        Err(ScopeError::InvalidEndpoint(
            "Input must be an Ethereum address (0x...) or HTTPS URL".to_string(),
        ))
    }
}

pub fn validate_seed(seed: &str) -> Result<(), ScopeError> {
    if seed.is_empty() {
        return Err(ScopeError::InvalidSeed("Scope seed cannot be empty".to_string()));
    }
    if seed.chars().count() > MAX_SEED_LEN {
        return Err(ScopeError::InvalidSeed(format!(
            "Scope seed must be {MAX_SEED_LEN} characters or less"
        )));
    }
    let allowed =
        |c: char| c.is_ascii_lowercase() || c.is_ascii_digit() || SEED_SYMBOLS.contains(c);
    if let Some(bad) = seed.chars().find(|c| !allowed(*c)) {
        return Err(ScopeError::InvalidSeed(format!(
            "Scope seed may only contain lowercase ASCII letters, digits and \"{SEED_SYMBOLS}\", found {bad:?}"
        )));
    }
    Ok(())
}

/// Validate both inputs, then hash. Endpoint errors are reported first.
pub fn generate(endpoint: &str, seed: &str) -> Result<ScopeHashOutput, ScopeError> {
    let endpoint_kind = classify_endpoint(endpoint)?;
    validate_seed(seed)?;

    let combined = format!("{}{}", endpoint.to_lowercase(), seed);
    let scope_hash = Digest32::of(combined.as_bytes());
    tracing::debug!(?endpoint_kind, %scope_hash, "generated scope hash");

    Ok(ScopeHashOutput {
        scope_hash,
        endpoint_kind,
    })
}
