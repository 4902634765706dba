//! selfconfig-core - Self verification config tooling
//!
//! Turns a verification policy (minimum age, excluded countries, sanctions
//! tiers) into the identifiers the on-chain registry computes, and decodes
//! the registry's stored configs back into readable form.
//!
//! # Compatibility rules
//! 1. Country words are packed low byte first, hashed big-endian
//! 2. Config ids hash a tight 165-byte layout, no padding
//! 3. Scope hashes hash `lowercase(endpoint) ++ seed`, no framing
//! 4. "Not found" is an outcome, not an error

pub mod abi;
pub mod codec;
pub mod config_id;
pub mod countries;
pub mod error;
pub mod hashing;
pub mod network;
pub mod policy;
pub mod reader;
pub mod rpc;
pub mod scope;
pub mod service;
pub mod validation;

pub use codec::{pack, unpack, PackedCountryBlock};
pub use error::{DecodeError, MalformedDigest, PolicyError, ReaderError, RpcError, ScopeError};
pub use hashing::{keccak256, ConfigId, Digest32, ScopeHash};
pub use network::{NetworkDescriptor, NetworkRegistry};
pub use policy::{PolicyInput, SanctionsTiers, VerificationPolicy};
pub use reader::{ChainConfigReader, ConfigReport, ReadOutcome};
pub use rpc::{JsonRpcClient, LedgerClient, ReaderConfig};
pub use scope::EndpointKind;
pub use service::{ConfigIdRequest, ConfigService, ReadConfigRequest, ScopeHashRequest};
pub use validation::{ValidationResult, ValidationRule, ValidationViolation, ViolationSeverity};
