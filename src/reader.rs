//! Chain config reader - existence check, then struct fetch, then decode.
//!
//! The two remote calls are strictly sequential. A config the registry does
//! not know is [`ReadOutcome::NotFound`], never an error, and no struct fetch
//! is issued for it.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::abi::{self, OnChainConfig, EXISTS_SELECTOR, GET_CONFIG_SELECTOR};
use crate::codec;
use crate::countries::{display_name, CountryEntry};
use crate::error::{PolicyError, ReaderError};
use crate::hashing::ConfigId;
use crate::network::NetworkDescriptor;
use crate::policy::{SanctionsTiers, VerificationPolicy};
use crate::rpc::LedgerClient;

#[derive(Debug, Clone, Serialize)]
pub struct AgeSummary {
    pub enabled: bool,
    pub value: Option<u64>,
    pub display: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CountrySummary {
    pub enabled: bool,
    pub codes: Vec<String>,
    pub readable: Vec<CountryEntry>,
    pub count: usize,
    pub display: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanctionsSummary {
    pub basic: bool,
    pub enhanced: bool,
    pub comprehensive: bool,
    pub any_enabled: bool,
    pub display: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportConfiguration {
    pub minimum_age: AgeSummary,
    pub excluded_countries: CountrySummary,
    pub ofac_settings: SanctionsSummary,
}

/// Decoded on-chain configuration, rendered for people.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigReport {
    pub config_id: ConfigId,
    pub network: String,
    pub configuration: ReportConfiguration,
    pub hub_address: String,
    pub explorer_url: String,
    pub read_at: DateTime<Utc>,
    #[serde(skip)]
    pub raw: OnChainConfig,
    #[serde(skip)]
    pub countries: Vec<String>,
}

impl ConfigReport {
    fn render(
        config_id: ConfigId,
        network: &NetworkDescriptor,
        raw: OnChainConfig,
        countries: Vec<String>,
    ) -> Self {
        let minimum_age = AgeSummary {
            enabled: raw.older_than_enabled,
            value: raw.older_than_enabled.then_some(raw.older_than),
            display: if raw.older_than_enabled {
                format!("{} years", raw.older_than)
            } else {
                "Disabled".to_string()
            },
        };

        let shown = countries.clone();
        let excluded_countries = CountrySummary {
            enabled: raw.forbidden_countries_enabled,
            readable: shown
                .iter()
                .map(|code| CountryEntry {
                    code: code.clone(),
                    name: display_name(code),
                })
                .collect(),
            count: shown.len(),
            display: if raw.forbidden_countries_enabled {
                format!("{} countries excluded", shown.len())
            } else {
                "No restrictions".to_string()
            },
            codes: shown,
        };

        let ofac = raw.ofac_enabled;
        let ofac_settings = SanctionsSummary {
            basic: ofac.basic,
            enhanced: ofac.enhanced,
            comprehensive: ofac.comprehensive,
            any_enabled: ofac.any(),
            display: if ofac.any() { "Enabled" } else { "Disabled" }.to_string(),
        };

        Self {
            config_id,
            network: network.name.clone(),
            configuration: ReportConfiguration {
                minimum_age,
                excluded_countries,
                ofac_settings,
            },
            hub_address: network.hub_address.clone(),
            explorer_url: network.hub_explorer_url(),
            read_at: Utc::now(),
            raw,
            countries,
        }
    }

    /// The policy this config enforces, for re-deriving its id.
    ///
    /// Fails when the stored values are outside what a policy may hold,
    /// such as an age above 150, or when an enabled flag disagrees with its
    /// value. Either way no policy hashes back to this config's id.
    pub fn policy(&self) -> Result<VerificationPolicy, PolicyError> {
        let raw = &self.raw;
        if raw.older_than_enabled != (raw.older_than > 0) {
            return Err(PolicyError::AgeFlagMismatch {
                enabled: raw.older_than_enabled,
                age: raw.older_than,
            });
        }
        let empty = raw.forbidden_countries_packed.is_empty();
        if raw.forbidden_countries_enabled == empty {
            return Err(PolicyError::CountryFlagMismatch {
                enabled: raw.forbidden_countries_enabled,
                empty,
            });
        }

        let age = i64::try_from(raw.older_than).unwrap_or(i64::MAX);
        VerificationPolicy::new(age, self.countries.clone(), self.sanctions())
    }

    pub fn sanctions(&self) -> SanctionsTiers {
        self.raw.ofac_enabled
    }
}

#[derive(Debug, Clone)]
pub enum ReadOutcome {
    Found(Box<ConfigReport>),
    NotFound,
}

/// Reads configs back from a network's registry.
pub struct ChainConfigReader<C> {
    client: C,
}

impl<C: LedgerClient> ChainConfigReader<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Whether the registry holds `id`. Transport failures are returned as
    /// errors, never folded into `false`.
    pub async fn exists(&self, id: &ConfigId, network: &NetworkDescriptor) -> Result<bool, ReaderError> {
        let data = self
            .client
            .call(network, &abi::encode_call(EXISTS_SELECTOR, id))
            .await?;
        let exists = abi::decode_bool(&data)
            .map_err(|e| ReaderError::MalformedResponse(format!("existence check: {e}")))?;
        tracing::debug!(config_id = %id, network = %network.name, exists, "existence check");
        Ok(exists)
    }

    /// Parse a `0x` id string and read it.
    pub async fn read_hex(&self, id: &str, network: &NetworkDescriptor) -> Result<ReadOutcome, ReaderError> {
        let id: ConfigId = id
            .parse()
            .map_err(|_| ReaderError::MalformedId(id.to_string()))?;
        self.read(&id, network).await
    }

    pub async fn read(&self, id: &ConfigId, network: &NetworkDescriptor) -> Result<ReadOutcome, ReaderError> {
        if !self.exists(id, network).await? {
            tracing::info!(config_id = %id, network = %network.name, "config not found");
            return Ok(ReadOutcome::NotFound);
        }

        let data = self
            .client
            .call(network, &abi::encode_call(GET_CONFIG_SELECTOR, id))
            .await?;
        let raw = abi::decode_config(&data)
            .map_err(|e| ReaderError::MalformedResponse(format!("config struct: {e}")))?;

        let countries = if raw.forbidden_countries_enabled {
            codec::unpack(&raw.forbidden_countries_packed)?
        } else {
            vec![]
        };

        tracing::info!(
            config_id = %id,
            network = %network.name,
            countries = countries.len(),
            "read config"
        );
        Ok(ReadOutcome::Found(Box::new(ConfigReport::render(
            *id, network, raw, countries,
        ))))
    }
}
