//! Config Service - Single Entry Point
//!
//! The structured request/response surface a host invokes. Every operation
//! returns a response value; failures are carried in `error`/`error_kind`
//! fields, never raised.

use serde::{Deserialize, Serialize};
use tracing::Instrument;
use uuid::Uuid;

use crate::config_id;
use crate::countries::{self, CountryEntry};
use crate::error::ReaderError;
use crate::hashing::{ConfigId, ScopeHash};
use crate::network::{NetworkDescriptor, NetworkRegistry};
use crate::policy::{PolicyInput, VerificationPolicy};
use crate::reader::{ChainConfigReader, ConfigReport, ReadOutcome, ReportConfiguration};
use crate::rpc::LedgerClient;
use crate::scope::{self, EndpointKind};
use crate::validation::ValidationViolation;

pub const SCOPE_TOOLS_URL: &str = "https://tools.self.xyz/#scope-generator";
pub const DEFAULT_NETWORK: &str = "mainnet";

fn default_network() -> String {
    DEFAULT_NETWORK.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeHashRequest {
    pub endpoint: String,
    pub seed: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    Valid,
    Invalid,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScopeHashResponse {
    pub scope_hash: Option<ScopeHash>,
    pub validation: ValidationStatus,
    pub endpoint_kind: Option<EndpointKind>,
    pub endpoint: String,
    pub seed: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigIdRequest {
    #[serde(flatten)]
    pub policy: PolicyInput,
    #[serde(default = "default_network")]
    pub network: String,
}

/// Human-facing echo of the requested policy.
#[derive(Debug, Clone, Serialize)]
pub struct PolicySummary {
    /// Age, or "Disabled".
    pub minimum_age: serde_json::Value,
    /// Codes, or "None".
    pub excluded_countries: serde_json::Value,
    pub ofac_settings: crate::policy::SanctionsTiers,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigIdResponse {
    pub config_id: Option<ConfigId>,
    /// `None` when the existence check could not be completed.
    pub exists_on_chain: Option<bool>,
    pub network: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration: Option<PolicySummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deploy_url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<ValidationViolation>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

impl ConfigIdResponse {
    fn failed(network: &str, kind: &str, error: String, violations: Vec<ValidationViolation>) -> Self {
        Self {
            config_id: None,
            exists_on_chain: None,
            network: network.to_string(),
            configuration: None,
            deploy_url: None,
            violations,
            message: error.clone(),
            error: Some(error),
            error_kind: Some(kind.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadConfigRequest {
    pub config_id: String,
    #[serde(default = "default_network")]
    pub network: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReadConfigResponse {
    pub config_id: String,
    pub network: String,
    /// `None` when existence could not be determined.
    pub exists: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration: Option<ReportConfiguration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hub_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explorer_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

impl ReadConfigResponse {
    fn empty(config_id: &str, network: &str) -> Self {
        Self {
            config_id: config_id.to_string(),
            network: network.to_string(),
            exists: None,
            configuration: None,
            hub_address: None,
            explorer_url: None,
            read_at: None,
            error: None,
            error_kind: None,
        }
    }

    fn from_report(report: ConfigReport) -> Self {
        Self {
            config_id: report.config_id.to_hex(),
            network: report.network,
            exists: Some(true),
            configuration: Some(report.configuration),
            hub_address: Some(report.hub_address),
            explorer_url: Some(report.explorer_url),
            read_at: Some(report.read_at),
            error: None,
            error_kind: None,
        }
    }
}

/// The service - single entry point for all host operations
pub struct ConfigService<C> {
    networks: NetworkRegistry,
    reader: ChainConfigReader<C>,
}

impl<C: LedgerClient> ConfigService<C> {
    pub fn new(networks: NetworkRegistry, client: C) -> Self {
        Self {
            networks,
            reader: ChainConfigReader::new(client),
        }
    }

    pub fn networks(&self) -> &NetworkRegistry {
        &self.networks
    }

    pub fn reader(&self) -> &ChainConfigReader<C> {
        &self.reader
    }

    fn network(&self, name: &str) -> Result<&NetworkDescriptor, String> {
        self.networks.get(name).ok_or_else(|| {
            let known: Vec<_> = self.networks.list().iter().map(|n| n.name.as_str()).collect();
            format!("Unknown network {name:?}, expected one of: {}", known.join(", "))
        })
    }

    pub fn generate_scope_hash(&self, request: &ScopeHashRequest) -> ScopeHashResponse {
        let _span = tracing::info_span!("generate_scope_hash", request_id = %Uuid::new_v4()).entered();

        let mut response = ScopeHashResponse {
            scope_hash: None,
            validation: ValidationStatus::Invalid,
            endpoint_kind: scope::classify_endpoint(&request.endpoint).ok(),
            endpoint: request.endpoint.clone(),
            seed: request.seed.clone(),
            tools_url: None,
            error: None,
        };

        match scope::generate(&request.endpoint, &request.seed) {
            Ok(out) => {
                response.scope_hash = Some(out.scope_hash);
                response.endpoint_kind = Some(out.endpoint_kind);
                response.validation = ValidationStatus::Valid;
                response.tools_url = Some(SCOPE_TOOLS_URL.to_string());
            }
            Err(e) => {
                tracing::debug!(error = %e, "scope hash rejected");
                response.error = Some(e.to_string());
            }
        }
        response
    }

    /// Validate, hash, then check the registry. The id is returned even when
    /// the existence check fails.
    pub async fn generate_config_id(&self, request: &ConfigIdRequest) -> ConfigIdResponse {
        let span = tracing::info_span!("generate_config_id", request_id = %Uuid::new_v4());
        self.generate_config_id_inner(request).instrument(span).await
    }

    async fn generate_config_id_inner(&self, request: &ConfigIdRequest) -> ConfigIdResponse {
        let (built, report) = VerificationPolicy::validate(request.policy.clone());
        let warnings: Vec<_> = report.warnings().cloned().collect();
        let (policy, id) = match built.and_then(|p| config_id::generate(&p).map(|id| (p, id))) {
            Ok(pair) => pair,
            Err(e) => {
                return ConfigIdResponse::failed(
                    &request.network,
                    "validation",
                    e.to_string(),
                    report.violations,
                )
            }
        };

        let network = match self.network(&request.network) {
            Ok(n) => n,
            Err(e) => return ConfigIdResponse::failed(&request.network, "unknown_network", e, warnings),
        };

        let (exists_on_chain, check_error) = match self.reader.exists(&id, network).await {
            Ok(exists) => (Some(exists), None),
            Err(e) => {
                tracing::warn!(config_id = %id, error = %e, "existence check failed");
                (None, Some(e))
            }
        };

        let message = match (exists_on_chain, &check_error) {
            (Some(true), _) => "Config already exists on-chain".to_string(),
            (Some(false), _) => "Config does not exist yet, use deploy_url to create it".to_string(),
            (None, Some(e)) => format!("Could not determine whether config exists: {e}"),
            (None, None) => "Could not determine whether config exists".to_string(),
        };

        ConfigIdResponse {
            config_id: Some(id),
            exists_on_chain,
            network: network.name.clone(),
            configuration: Some(summarize(&policy)),
            deploy_url: (exists_on_chain != Some(true)).then(|| config_id::deploy_url(&policy)),
            violations: warnings,
            message,
            error: check_error.as_ref().map(|e| e.to_string()),
            error_kind: check_error.as_ref().map(|e| e.kind().to_string()),
        }
    }

    pub async fn read_config(&self, request: &ReadConfigRequest) -> ReadConfigResponse {
        let span = tracing::info_span!("read_config", request_id = %Uuid::new_v4());
        self.read_config_inner(request).instrument(span).await
    }

    async fn read_config_inner(&self, request: &ReadConfigRequest) -> ReadConfigResponse {
        let mut response = ReadConfigResponse::empty(&request.config_id, &request.network);

        let network = match self.network(&request.network) {
            Ok(n) => n,
            Err(e) => {
                response.error = Some(e);
                response.error_kind = Some("unknown_network".to_string());
                return response;
            }
        };

        match self.reader.read_hex(&request.config_id, network).await {
            Ok(ReadOutcome::Found(report)) => ReadConfigResponse::from_report(*report),
            Ok(ReadOutcome::NotFound) => {
                response.exists = Some(false);
                response.error = Some(format!(
                    "Configuration {} does not exist on {}",
                    request.config_id, network.name
                ));
                response.error_kind = Some("not_found".to_string());
                response
            }
            Err(e) => {
                if !matches!(e, ReaderError::MalformedId(_)) {
                    tracing::warn!(error = %e, "read failed");
                }
                response.error = Some(e.to_string());
                response.error_kind = Some(e.kind().to_string());
                response
            }
        }
    }

    pub fn list_country_codes(&self, search: Option<&str>) -> Vec<CountryEntry> {
        countries::list_country_codes(search)
    }
}

fn summarize(policy: &VerificationPolicy) -> PolicySummary {
    PolicySummary {
        minimum_age: if policy.age_check_enabled() {
            policy.minimum_age().into()
        } else {
            "Disabled".into()
        },
        excluded_countries: if policy.countries_enabled() {
            policy.excluded_countries().into()
        } else {
            "None".into()
        },
        ofac_settings: policy.sanctions(),
    }
}
