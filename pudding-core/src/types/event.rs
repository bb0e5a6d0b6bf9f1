use ethers_core::abi::{RawLog, Token};
use ethers_core::types::{Log, U64};
use tracing::{trace, warn};

use crate::{Address, BindingResult, EventTopicIndex, InterfaceEntry, H256, U256};

/// A named, decoded event parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct EventArg {
    /// Parameter name from the ABI
    pub name: String,
    /// Decoded value
    pub value: Token,
}

/// A receipt log decoded against a known event entry.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedEvent {
    /// Event name
    pub event: String,
    /// Contract that emitted the log
    pub address: Address,
    /// Decoded parameters, in declaration order
    pub args: Vec<EventArg>,
    /// Transaction that produced the log
    pub transaction_hash: Option<H256>,
    /// Block the log was included in
    pub block_number: Option<U64>,
    /// Position of the log in the block
    pub log_index: Option<U256>,
}

impl DecodedEvent {
    /// Look up a decoded parameter by name.
    pub fn arg(&self, name: &str) -> Option<&Token> {
        self.args.iter().find(|a| a.name == name).map(|a| &a.value)
    }
}

impl InterfaceEntry {
    /// Decode a raw receipt log as an occurrence of this event.
    pub fn decode_log(&self, log: &Log) -> BindingResult<DecodedEvent> {
        let parsed = self.to_event()?.parse_log(RawLog {
            topics: log.topics.clone(),
            data: log.data.to_vec(),
        })?;
        Ok(DecodedEvent {
            event: self.name.clone(),
            address: log.address,
            args: parsed
                .params
                .into_iter()
                .map(|p| EventArg {
                    name: p.name,
                    value: p.value,
                })
                .collect(),
            transaction_hash: log.transaction_hash,
            block_number: log.block_number,
            log_index: log.log_index,
        })
    }
}

/// Decode the logs of a receipt.
///
/// Logs whose first topic is not in the index are dropped: a contract may
/// emit events it does not declare, e.g. from a linked library. A log that
/// matches a known topic but does not decode is dropped with a warning.
pub fn decode_logs(index: &EventTopicIndex, logs: &[Log]) -> Vec<DecodedEvent> {
    logs.iter()
        .filter_map(|log| {
            let topic = log.topics.first()?;
            let Some(entry) = index.get(topic) else {
                trace!(?topic, address = ?log.address, "Dropping log with unknown topic");
                return None;
            };
            match entry.decode_log(log) {
                Ok(decoded) => Some(decoded),
                Err(error) => {
                    warn!(event = %entry.name, ?topic, %error, "Failed to decode log");
                    None
                }
            }
        })
        .collect()
}
