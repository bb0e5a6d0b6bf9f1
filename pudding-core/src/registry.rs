use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{BindingError, BindingResult, DeploymentRecord};

/// Network keys tried, in order, when the canonical public network is
/// detected.
pub const MAINNET_ALIASES: [&str; 3] = ["1", "live", "default"];

/// Network id of the canonical public network.
pub const MAINNET_ID: &str = "1";

/// On-disk form of a generated binding's deployment data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    /// Name of the contract the artifact describes
    #[serde(alias = "contract_name")]
    pub contract_name: String,
    /// Deployment records keyed by network
    #[serde(default, alias = "all_networks")]
    pub networks: BTreeMap<String, DeploymentRecord>,
    /// Version of the tool that produced the artifact
    #[serde(default, alias = "generated_with", skip_serializing_if = "Option::is_none")]
    pub generated_with: Option<String>,
}

/// Per-network deployment records of one contract. Loaded once and never
/// mutated; bindings select a record from it instead.
#[derive(Debug, Clone, Default)]
pub struct DeploymentRegistry {
    contract_name: String,
    generated_with: Option<String>,
    networks: BTreeMap<String, Arc<DeploymentRecord>>,
}

impl DeploymentRegistry {
    /// Build a registry from records keyed by network.
    pub fn new(
        contract_name: impl Into<String>,
        networks: impl IntoIterator<Item = (String, DeploymentRecord)>,
    ) -> Self {
        Self {
            contract_name: contract_name.into(),
            generated_with: None,
            networks: networks
                .into_iter()
                .map(|(key, record)| (key, Arc::new(record.with_derived_topics())))
                .collect(),
        }
    }

    /// Build a registry from a parsed artifact.
    pub fn from_artifact(artifact: Artifact) -> Self {
        Self {
            generated_with: artifact.generated_with,
            ..Self::new(artifact.contract_name, artifact.networks)
        }
    }

    /// Parse an artifact from JSON.
    pub fn from_json(json: &str) -> BindingResult<Self> {
        Ok(Self::from_artifact(serde_json::from_str(json)?))
    }

    /// Read and parse an artifact file.
    pub fn from_path(path: impl AsRef<Path>) -> BindingResult<Self> {
        let path = path.as_ref();
        let registry = Self::from_json(&fs::read_to_string(path)?)?;
        debug!(
            contract = %registry.contract_name,
            path = %path.display(),
            networks = registry.networks.len(),
            "Loaded deployment artifact"
        );
        Ok(registry)
    }

    /// Name of the contract
    pub fn contract_name(&self) -> &str {
        &self.contract_name
    }

    /// Version of the tool that generated the artifact, if recorded
    pub fn generated_with(&self) -> Option<&str> {
        self.generated_with.as_deref()
    }

    /// Every network key, sorted.
    pub fn networks(&self) -> Vec<String> {
        self.networks.keys().cloned().collect()
    }

    /// The record stored under exactly this key.
    pub fn get(&self, key: &str) -> Option<Arc<DeploymentRecord>> {
        self.networks.get(key).cloned()
    }

    /// The key a network id resolves to. The canonical public network may be
    /// stored under any of [`MAINNET_ALIASES`]; the first present wins.
    pub fn resolve_network_key(&self, network_id: &str) -> Option<&str> {
        if network_id == MAINNET_ID {
            MAINNET_ALIASES
                .iter()
                .copied()
                .find(|alias| self.networks.contains_key(*alias))
        } else {
            self.networks
                .get_key_value(network_id)
                .map(|(key, _)| key.as_str())
        }
    }

    /// Resolve a network id to its key and record.
    pub fn lookup(&self, network_id: &str) -> BindingResult<(String, Arc<DeploymentRecord>)> {
        self.resolve_network_key(network_id)
            .and_then(|key| Some((key.to_owned(), self.get(key)?)))
            .ok_or_else(|| BindingError::NetworkNotFound {
                contract: self.contract_name.clone(),
                network_id: network_id.to_owned(),
            })
    }
}
