use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{Address, InterfaceEntry, H256};

/// Library name to resolved address.
pub type LinkTable = BTreeMap<String, Address>;

/// Event signature topic to the event entry it identifies.
pub type EventTopicIndex = HashMap<H256, InterfaceEntry>;

/// Everything known about a contract on one network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    #[serde(default)]
    abi: Vec<InterfaceEntry>,
    #[serde(
        default,
        alias = "unlinked_binary",
        alias = "unlinkedBinary",
        skip_serializing_if = "Option::is_none"
    )]
    bytecode_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    address: Option<Address>,
    #[serde(default)]
    links: LinkTable,
    #[serde(default)]
    events: EventTopicIndex,
    #[serde(
        default,
        alias = "updated_at",
        alias = "updatedAt",
        skip_serializing_if = "Option::is_none"
    )]
    created_at: Option<u64>,
}

impl DeploymentRecord {
    /// A record for the given interface; use the `with_*` methods to fill in
    /// the rest before registering it.
    pub fn new(abi: Vec<InterfaceEntry>) -> Self {
        Self {
            abi,
            ..Default::default()
        }
        .with_derived_topics()
    }

    /// Set the bytecode template
    pub fn with_bytecode(mut self, template: impl Into<String>) -> Self {
        self.bytecode_template = Some(template.into());
        self
    }

    /// Set the deployed address
    pub fn with_address(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    /// Set the link table
    pub fn with_links(mut self, links: LinkTable) -> Self {
        self.links = links;
        self
    }

    /// Set the creation timestamp (ms since epoch)
    pub fn with_created_at(mut self, created_at: u64) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Add explicit topic index entries, e.g. for events emitted by linked
    /// libraries that are not part of this contract's ABI.
    pub fn with_events(mut self, events: EventTopicIndex) -> Self {
        self.events.extend(events);
        self
    }

    /// Fill in topic index entries for ABI events the artifact did not list.
    pub(crate) fn with_derived_topics(mut self) -> Self {
        for entry in self.abi.iter().filter(|e| e.is_event()) {
            if entry.anonymous == Some(true) {
                continue;
            }
            match entry.topic() {
                Ok(topic) => {
                    self.events.entry(topic).or_insert_with(|| entry.clone());
                }
                Err(error) => trace!(event = %entry.name, %error, "Skipping undecodable event"),
            }
        }
        self
    }

    /// The interface description
    pub fn abi(&self) -> &[InterfaceEntry] {
        &self.abi
    }

    /// The bytecode template, if the artifact carries a non-empty one
    pub fn bytecode_template(&self) -> Option<&str> {
        self.bytecode_template
            .as_deref()
            .filter(|b| !b.is_empty() && *b != "0x")
    }

    /// The address this contract is deployed at on this network
    pub fn address(&self) -> Option<Address> {
        self.address
    }

    /// Libraries linked when this record was produced
    pub fn links(&self) -> &LinkTable {
        &self.links
    }

    /// Topic index for decoding receipt logs
    pub fn events(&self) -> &EventTopicIndex {
        &self.events
    }

    /// When the record was produced (ms since epoch)
    pub fn created_at(&self) -> Option<u64> {
        self.created_at
    }

    /// The constructor entry, if the ABI declares one
    pub fn constructor(&self) -> Option<&InterfaceEntry> {
        self.abi
            .iter()
            .find(|e| e.kind == crate::EntryKind::Constructor)
    }
}
