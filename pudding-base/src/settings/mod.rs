//! Settings for applications driving contract bindings.
//!
//! Settings are read from the JSON files listed in the `CONFIG_FILES`
//! environment variable, in order, then from environment variables prefixed
//! with `PUDDING_`. Later sources take precedence.
//!
//! Environment variable names follow the object hierarchy of the JSON
//! config, joined by `_`, e.g. `PUDDING_CONNECTION_URL=http://localhost:8545`
//! overrides `connection.url`. Keys are matched without regard to case, so
//! `PUDDING_NEXTGEN=true` sets `nextGen`.
//!
//! ```json
//! {
//!   "connection": { "type": "http", "url": "http://localhost:8545" },
//!   "tracing": { "fmt": "json", "level": "debug" },
//!   "artifacts": ["./build/contracts/EtherBank.json"],
//!   "network": "1337",
//!   "defaults": { "from": "0x…", "gas": "0x2dc6c0" },
//!   "synchronizationTimeoutMs": 240000,
//!   "pollIntervalMs": 1000,
//!   "nextGen": true
//! }
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use eyre::{Context, Result};
use serde::Deserialize;

use pudding_core::{ContractTransport, DeploymentRegistry, TxParams};
use pudding_ethereum::{build_transport, ConnectionConf};

pub use self::trace::{Level, Style, TracingConfig};
use crate::{ClientConfig, ContractBinding, SyncConfig};

mod loader;
mod trace;

/// Prefix of the environment variables settings are read from.
pub const ENV_PREFIX: &str = "PUDDING";

fn default_synchronization_timeout_ms() -> u64 {
    crate::DEFAULT_SYNCHRONIZATION_TIMEOUT.as_millis() as u64
}

fn default_poll_interval_ms() -> u64 {
    crate::DEFAULT_POLL_INTERVAL.as_millis() as u64
}

/// Settings shared by every binding an application creates.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Node connection
    #[serde(default)]
    pub connection: ConnectionConf,
    /// Log output
    #[serde(default)]
    pub tracing: TracingConfig,
    /// Deployment artifact files to load registries from
    #[serde(default)]
    pub artifacts: Vec<PathBuf>,
    /// Network id to pin instead of asking the node
    #[serde(default)]
    pub network: Option<String>,
    /// Transaction defaults for every call
    #[serde(default)]
    pub defaults: TxParams,
    /// How long to wait for a receipt, zero waits forever
    #[serde(
        default = "default_synchronization_timeout_ms",
        alias = "synchronizationtimeoutms"
    )]
    pub synchronization_timeout_ms: u64,
    /// Time between receipt requests
    #[serde(default = "default_poll_interval_ms", alias = "pollintervalms")]
    pub poll_interval_ms: u64,
    /// Resolve mutating calls with receipts and decoded events
    #[serde(default, alias = "nextgen")]
    pub next_gen: bool,
}

impl Settings {
    /// Load settings from `CONFIG_FILES` and the `PUDDING_` environment.
    pub fn new() -> Result<Self> {
        loader::load_settings_object(ENV_PREFIX)
    }

    /// Confirmation timing
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            timeout: Duration::from_millis(self.synchronization_timeout_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }

    /// Binding configuration derived from these settings
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::default()
            .with_defaults(self.defaults.clone())
            .with_sync(self.sync_config())
            .with_next_gen(self.next_gen)
    }

    /// Build the transport for the configured connection.
    pub fn build_transport(&self) -> Result<Arc<dyn ContractTransport>> {
        let transport = build_transport(&self.connection)
            .with_context(|| format!("Failed to build transport for {:?}", self.connection))?;
        Ok(Arc::new(transport))
    }

    /// Load every configured artifact.
    pub fn load_registries(&self) -> Result<Vec<DeploymentRegistry>> {
        self.artifacts
            .iter()
            .map(|path| {
                DeploymentRegistry::from_path(path)
                    .with_context(|| format!("Failed to load artifact {}", path.display()))
            })
            .collect()
    }

    /// A binding for `registry` using these settings, talking through
    /// `transport`.
    pub fn binding(
        &self,
        registry: impl Into<Arc<DeploymentRegistry>>,
        transport: Arc<dyn ContractTransport>,
    ) -> Result<ContractBinding> {
        let mut binding = ContractBinding::with_config(registry, self.client_config());
        binding.set_shared_provider(transport);
        if let Some(network) = &self.network {
            binding
                .set_network(network)
                .with_context(|| format!("Failed to select network {network}"))?;
        }
        Ok(binding)
    }
}
