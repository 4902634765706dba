//! Network registry - deployment targets hosting the config registry

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub type NetworkName = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkDescriptor {
    /// Lookup key, e.g. "mainnet".
    pub name: NetworkName,
    #[serde(default)]
    pub display_name: String,
    pub rpc_url: String,
    pub chain_id: u64,
    pub explorer_url: String,
    /// Contract hosting the verification config registry.
    pub hub_address: String,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String { "CELO".to_string() }

impl NetworkDescriptor {
    pub fn hub_explorer_url(&self) -> String {
        format!("{}/address/{}", self.explorer_url.trim_end_matches('/'), self.hub_address)
    }
}

/// Network registry - built-in targets plus optional overrides
#[derive(Debug, Clone)]
pub struct NetworkRegistry {
    networks: HashMap<NetworkName, NetworkDescriptor>,
}

impl NetworkRegistry {
    pub fn new() -> Self {
        Self { networks: HashMap::new() }
    }

    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(NetworkDescriptor {
            name: "mainnet".to_string(),
            display_name: "Celo Mainnet".to_string(),
            rpc_url: "https://forno.celo.org".to_string(),
            chain_id: 42220,
            explorer_url: "https://celoscan.io".to_string(),
            hub_address: "0x77117D60eaB7C044e785D68edB6C7E0e134970Ea".to_string(),
            currency: default_currency(),
        });
        registry.register(NetworkDescriptor {
            name: "testnet".to_string(),
            display_name: "Celo Alfajores Testnet".to_string(),
            rpc_url: "https://alfajores-forno.celo-testnet.org".to_string(),
            chain_id: 44787,
            explorer_url: "https://alfajores.celoscan.io".to_string(),
            hub_address: "0x68c931C9a534D37aa78094877F46fE46a49F1A51".to_string(),
            currency: default_currency(),
        });
        registry
    }

    /// Built-ins overlaid with every `*.json` descriptor in `dir`.
    /// Unreadable or malformed files are skipped.
    pub fn load_from_dir(dir: &Path) -> Result<Self, std::io::Error> {
        let mut registry = Self::builtin();
        if dir.exists() {
            for entry in fs::read_dir(dir)? {
                let path = entry?.path();
                if path.extension().map_or(false, |e| e == "json") {
                    match fs::read_to_string(&path)
                        .map_err(|e| e.to_string())
                        .and_then(|s| {
                            serde_json::from_str::<NetworkDescriptor>(&s).map_err(|e| e.to_string())
                        }) {
                        Ok(network) => {
                            tracing::info!(network = %network.name, path = %path.display(), "loaded network descriptor");
                            registry.register(network);
                        }
                        Err(e) => {
                            tracing::warn!(path = %path.display(), error = %e, "skipping network descriptor");
                        }
                    }
                }
            }
        }
        Ok(registry)
    }

    pub fn get(&self, name: &str) -> Option<&NetworkDescriptor> {
        self.networks.get(name)
    }

    /// Networks sorted by name.
    pub fn list(&self) -> Vec<&NetworkDescriptor> {
        let mut all: Vec<_> = self.networks.values().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    pub fn register(&mut self, network: NetworkDescriptor) {
        self.networks.insert(network.name.clone(), network);
    }
}

impl Default for NetworkRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
