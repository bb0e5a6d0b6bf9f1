use std::sync::Arc;
use std::time::Duration;

use ethers_core::abi::Error as AbiError;
use ethers_core::types::TransactionRequest;
use tracing::{debug, info, instrument, warn};

use pudding_core::linker;
use pudding_core::utils::parse_address;
use pudding_core::{
    Address, BindingError, BindingResult, Bytes, ContractTransport, DeploymentRecord,
    DeploymentRegistry, EventTopicIndex, LinkTable, Token, TxParams,
};

use crate::{ContractInstance, Deployer, InstanceContext, SyncConfig};

/// Key of the record a binding activates before any network is known.
pub const DEFAULT_NETWORK_KEY: &str = "default";

/// Per-binding configuration: which deployment record is active, the pinned
/// network, user linked libraries and the options every call starts from.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    network_key: Option<String>,
    network_id: Option<String>,
    record: Option<Arc<DeploymentRecord>>,
    links: LinkTable,
    library_events: EventTopicIndex,
    defaults: TxParams,
    sync: SyncConfig,
    next_gen: bool,
}

impl ClientConfig {
    /// Use these transaction defaults
    pub fn with_defaults(mut self, defaults: TxParams) -> Self {
        self.defaults = defaults;
        self
    }

    /// Use this confirmation timing
    pub fn with_sync(mut self, sync: SyncConfig) -> Self {
        self.sync = sync;
        self
    }

    /// Resolve mutating calls with the receipt and decoded events instead
    /// of the bare transaction hash.
    pub fn with_next_gen(mut self, next_gen: bool) -> Self {
        self.next_gen = next_gen;
        self
    }

    /// Registry key of the active record
    pub fn network_key(&self) -> Option<&str> {
        self.network_key.as_deref()
    }

    /// The pinned network id; `None` until detected or set
    pub fn network_id(&self) -> Option<&str> {
        self.network_id.as_deref()
    }

    /// The active deployment record
    pub fn record(&self) -> Option<&Arc<DeploymentRecord>> {
        self.record.as_ref()
    }

    /// Transaction defaults
    pub fn defaults(&self) -> &TxParams {
        &self.defaults
    }

    /// Confirmation timing
    pub fn sync(&self) -> SyncConfig {
        self.sync
    }

    /// Whether mutating calls resolve with full results
    pub fn next_gen(&self) -> bool {
        self.next_gen
    }

    fn activate(&mut self, key: String, record: Arc<DeploymentRecord>) {
        self.network_key = Some(key);
        self.record = Some(record);
    }
}

/// Something a binding can be linked against.
#[derive(Debug, Clone)]
pub enum LibraryLink {
    /// A single library. `events` are merged into the linking contract's
    /// topic index so it can decode what the library emits.
    Library {
        /// Library name as it appears in placeholders
        name: String,
        /// Deployed address, if known
        address: Option<Address>,
        /// Events the library emits
        events: EventTopicIndex,
    },
    /// Several libraries by name
    Table(LinkTable),
}

impl<S: Into<String>> From<(S, Address)> for LibraryLink {
    fn from((name, address): (S, Address)) -> Self {
        Self::Library {
            name: name.into(),
            address: Some(address),
            events: Default::default(),
        }
    }
}

impl From<LinkTable> for LibraryLink {
    fn from(table: LinkTable) -> Self {
        Self::Table(table)
    }
}

impl From<&ContractBinding> for LibraryLink {
    fn from(binding: &ContractBinding) -> Self {
        Self::Library {
            name: binding.contract_name().to_owned(),
            address: binding.address(),
            events: binding.events(),
        }
    }
}

impl From<&ContractInstance> for LibraryLink {
    fn from(instance: &ContractInstance) -> Self {
        Self::Library {
            name: instance.contract_name().to_owned(),
            address: Some(instance.address()),
            events: instance.topic_index().clone(),
        }
    }
}

/// A contract binding: the deployment registry of one contract composed
/// with the configuration calls are made with.
///
/// Configuration methods take `&mut self`. Instances capture the
/// configuration when they are created and are unaffected by later changes.
#[derive(Debug, Clone)]
pub struct ContractBinding {
    registry: Arc<DeploymentRegistry>,
    config: ClientConfig,
    transport: Option<Arc<dyn ContractTransport>>,
}

impl ContractBinding {
    /// Bind to a registry. The `default` record, when present, is activated
    /// so its data is available right away; no network is pinned, so the
    /// first [`ContractBinding::ensure_network`] still detects one.
    pub fn new(registry: impl Into<Arc<DeploymentRegistry>>) -> Self {
        Self::with_config(registry, ClientConfig::default())
    }

    /// Bind to a registry with an initial configuration.
    pub fn with_config(registry: impl Into<Arc<DeploymentRegistry>>, mut config: ClientConfig) -> Self {
        let registry = registry.into();
        if config.record.is_none() {
            if let Some(record) = registry.get(DEFAULT_NETWORK_KEY) {
                config.activate(DEFAULT_NETWORK_KEY.to_owned(), record);
            }
        }
        Self {
            registry,
            config,
            transport: None,
        }
    }

    /// Name of the contract
    pub fn contract_name(&self) -> &str {
        self.registry.contract_name()
    }

    /// The registry this binding selects records from
    pub fn registry(&self) -> &DeploymentRegistry {
        &self.registry
    }

    /// The current configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Route all requests through `transport`.
    pub fn set_provider(&mut self, transport: impl ContractTransport + 'static) {
        self.transport = Some(Arc::new(transport));
    }

    /// Route all requests through a shared transport.
    pub fn set_shared_provider(&mut self, transport: Arc<dyn ContractTransport>) {
        self.transport = Some(transport);
    }

    /// Merge `defaults` over the current transaction defaults and return
    /// the result.
    pub fn set_defaults(&mut self, defaults: &TxParams) -> &TxParams {
        self.config.defaults.extend(defaults);
        &self.config.defaults
    }

    /// Resolve mutating calls with the receipt and decoded events.
    pub fn set_next_gen(&mut self, next_gen: bool) {
        self.config.next_gen = next_gen;
    }

    /// How long to wait for receipts. Zero waits forever.
    pub fn set_synchronization_timeout(&mut self, timeout: Duration) {
        self.config.sync.timeout = timeout;
    }

    /// Time between receipt requests.
    pub fn set_poll_interval(&mut self, poll_interval: Duration) {
        self.config.sync.poll_interval = poll_interval;
    }

    /// Every network key the registry holds a record for.
    pub fn networks(&self) -> Vec<String> {
        self.registry.networks()
    }

    /// Pin `network_id` and activate its record, without asking the node.
    pub fn set_network(&mut self, network_id: &str) -> BindingResult<()> {
        let (key, record) = self.registry.lookup(network_id)?;
        info!(contract = %self.contract_name(), network_id, %key, "Selected network");
        self.config.activate(key, record);
        self.config.network_id = Some(network_id.to_owned());
        Ok(())
    }

    /// The pinned network id
    pub fn network_id(&self) -> Option<&str> {
        self.config.network_id()
    }

    /// Make sure the active record matches the network the transport is
    /// connected to. Returns immediately once a network is pinned. On
    /// failure nothing changes, so the next call detects again.
    #[instrument(skip(self), fields(contract = %self.contract_name()))]
    pub async fn ensure_network(&mut self) -> BindingResult<()> {
        if let Some(network_id) = &self.config.network_id {
            debug!(%network_id, "Network already pinned");
            return Ok(());
        }
        let detected = self.transport()?.get_network_id().await?;
        let (key, record) = self.registry.lookup(&detected).map_err(|error| {
            warn!(network_id = %detected, networks = ?self.registry.networks(), "No deployment record for network");
            error
        })?;
        info!(network_id = %detected, %key, "Detected network");
        self.config.activate(key, record);
        self.config.network_id = Some(detected);
        Ok(())
    }

    /// Link a library into this binding's bytecode. Later links of the same
    /// name replace earlier ones.
    pub fn link_library(&mut self, link: impl Into<LibraryLink>) -> BindingResult<()> {
        match link.into() {
            LibraryLink::Library {
                name,
                address,
                events,
            } => {
                let address = address.ok_or_else(|| BindingError::LinkWithoutAddress {
                    library: name.clone(),
                })?;
                info!(contract = %self.contract_name(), library = %name, ?address, "Linked library");
                self.config.links.insert(name, address);
                self.config.library_events.extend(events);
            }
            LibraryLink::Table(table) => {
                for (name, address) in table {
                    self.link_library((name, address))?;
                }
            }
        }
        Ok(())
    }

    /// Links in effect: those recorded with the active record, overridden
    /// by libraries linked on this binding.
    pub fn links(&self) -> LinkTable {
        let mut links = self
            .config
            .record
            .as_ref()
            .map(|r| r.links().clone())
            .unwrap_or_default();
        links.extend(self.config.links.iter().map(|(k, v)| (k.clone(), *v)));
        links
    }

    /// Topic index of the active record, extended with the events of
    /// linked libraries.
    pub fn events(&self) -> EventTopicIndex {
        let mut events = self
            .config
            .record
            .as_ref()
            .map(|r| r.events().clone())
            .unwrap_or_default();
        events.extend(
            self.config
                .library_events
                .iter()
                .map(|(k, v)| (*k, v.clone())),
        );
        events
    }

    /// Address recorded for the active network
    pub fn address(&self) -> Option<Address> {
        self.config.record.as_ref().and_then(|r| r.address())
    }

    /// The active bytecode template with the current links applied.
    pub fn binary(&self) -> Option<String> {
        self.config
            .record
            .as_ref()
            .and_then(|r| r.bytecode_template())
            .map(|template| linker::resolve(template, &self.links()))
    }

    /// Prepare a new instance. Every precondition is checked here, before
    /// any request is made: a provider must be set, the active record must
    /// carry bytecode, and that bytecode must be fully linked.
    ///
    /// `args` are ABI encoded for the constructor and appended to the
    /// bytecode. A `data` override replaces the linked bytecode.
    pub fn deploy(&self, args: &[Token], overrides: Option<&TxParams>) -> BindingResult<Deployer> {
        let contract = self.contract_name().to_owned();
        if self.transport.is_none() {
            return Err(BindingError::ProviderNotSet { contract });
        }
        let binary = self
            .binary()
            .ok_or_else(|| BindingError::MissingBinary {
                contract: contract.clone(),
            })?;
        let libraries = linker::detect_unresolved(&binary);
        if !libraries.is_empty() {
            return Err(BindingError::UnresolvedLibraries {
                contract,
                libraries,
            });
        }

        let params = self.config.defaults.merged(overrides);
        let code = match &params.data {
            Some(data) => data.clone(),
            None => linker::decode_bytecode(&binary)?,
        };
        let data = self.encode_constructor(code, args)?;
        let tx = params.apply(TransactionRequest::new().data(data));
        Ok(Deployer::new(self.context()?, tx))
    }

    fn encode_constructor(&self, code: Bytes, args: &[Token]) -> BindingResult<Bytes> {
        let constructor = self.config.record.as_ref().and_then(|r| r.constructor());
        match constructor {
            Some(entry) => Ok(entry.to_constructor()?.encode_input(code.to_vec(), args)?.into()),
            None if args.is_empty() => Ok(code),
            None => Err(AbiError::InvalidData.into()),
        }
    }

    /// Bind to an existing deployment. The address must be `0x` followed by
    /// 40 hex characters; no request is made.
    pub fn attach(&self, address: &str) -> BindingResult<ContractInstance> {
        let parsed = parse_address(address).map_err(|_| BindingError::InvalidAddress {
            contract: self.contract_name().to_owned(),
            address: address.to_owned(),
        })?;
        self.at(parsed)
    }

    /// Bind to an existing deployment at a typed address.
    pub fn at(&self, address: Address) -> BindingResult<ContractInstance> {
        Ok(ContractInstance::new(self.context()?, address, None))
    }

    /// Bind to the address recorded for the active network.
    pub fn deployed(&self) -> BindingResult<ContractInstance> {
        let address = self.address().ok_or_else(|| BindingError::NotDeployed {
            contract: self.contract_name().to_owned(),
        })?;
        self.at(address)
    }

    /// Detect the network if none is pinned, then bind to the address
    /// recorded for it.
    pub async fn deployed_instance(&mut self) -> BindingResult<ContractInstance> {
        self.ensure_network().await?;
        self.deployed()
    }

    fn transport(&self) -> BindingResult<&dyn ContractTransport> {
        self.transport
            .as_deref()
            .ok_or_else(|| BindingError::ProviderNotSet {
                contract: self.contract_name().to_owned(),
            })
    }

    fn context(&self) -> BindingResult<Arc<InstanceContext>> {
        let record = self
            .config
            .record
            .as_ref()
            .ok_or_else(|| BindingError::NetworkNotFound {
                contract: self.contract_name().to_owned(),
                network_id: self
                    .config
                    .network_id
                    .clone()
                    .unwrap_or_else(|| DEFAULT_NETWORK_KEY.to_owned()),
            })?;
        Ok(Arc::new(InstanceContext {
            contract_name: self.contract_name().to_owned(),
            abi: record.abi().to_vec(),
            events: self.events(),
            transport: self.transport.clone(),
            defaults: self.config.defaults.clone(),
            sync: self.config.sync,
            next_gen: self.config.next_gen,
        }))
    }
}
