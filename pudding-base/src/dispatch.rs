use std::sync::Arc;

use ethers_core::types::{Filter, Log, TransactionReceipt, TransactionRequest};
use tracing::{debug, instrument};

use pudding_core::{
    decode_logs, Address, BindingError, BindingResult, ContractTransport, DecodedEvent,
    EventTopicIndex, InterfaceEntry, Mutability, Token, TxParams, H256, U256,
};

use crate::{SyncConfig, TransactionSynchronizer};

/// The binding configuration an instance was created with. Captured once so
/// later changes to the binding do not affect instances in use.
#[derive(Debug)]
pub(crate) struct InstanceContext {
    pub(crate) contract_name: String,
    pub(crate) abi: Vec<InterfaceEntry>,
    pub(crate) events: EventTopicIndex,
    pub(crate) transport: Option<Arc<dyn ContractTransport>>,
    pub(crate) defaults: TxParams,
    pub(crate) sync: SyncConfig,
    pub(crate) next_gen: bool,
}

impl InstanceContext {
    pub(crate) fn transport(&self) -> BindingResult<&dyn ContractTransport> {
        self.transport
            .as_deref()
            .ok_or_else(|| BindingError::ProviderNotSet {
                contract: self.contract_name.clone(),
            })
    }
}

/// A mined transaction with its receipt and the events it emitted.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmedTransaction {
    /// Transaction hash
    pub tx: H256,
    /// The receipt
    pub receipt: TransactionReceipt,
    /// Receipt logs with a known topic, decoded
    pub logs: Vec<DecodedEvent>,
}

/// What invoking a contract function produced.
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    /// Decoded return values of a view function
    Value(Vec<Token>),
    /// A mined transaction, reported by hash only
    Transaction(H256),
    /// A mined transaction with its receipt and decoded events. Returned
    /// instead of [`CallOutcome::Transaction`] when the binding opts into
    /// full results.
    Confirmed(Box<ConfirmedTransaction>),
}

impl CallOutcome {
    /// Return values, if this was a view call
    pub fn value(&self) -> Option<&[Token]> {
        match self {
            Self::Value(tokens) => Some(tokens),
            _ => None,
        }
    }

    /// Hash of the mined transaction, if one was sent
    pub fn tx_hash(&self) -> Option<H256> {
        match self {
            Self::Value(_) => None,
            Self::Transaction(tx) => Some(*tx),
            Self::Confirmed(confirmed) => Some(confirmed.tx),
        }
    }
}

/// A contract bound to one address on one network.
#[derive(Debug, Clone)]
pub struct ContractInstance {
    context: Arc<InstanceContext>,
    address: Address,
    transaction_hash: Option<H256>,
}

impl ContractInstance {
    pub(crate) fn new(
        context: Arc<InstanceContext>,
        address: Address,
        transaction_hash: Option<H256>,
    ) -> Self {
        Self {
            context,
            address,
            transaction_hash,
        }
    }

    /// Name of the bound contract
    pub fn contract_name(&self) -> &str {
        &self.context.contract_name
    }

    /// Address the instance is bound to
    pub fn address(&self) -> Address {
        self.address
    }

    /// Hash of the creation transaction, for instances this binding deployed
    pub fn transaction_hash(&self) -> Option<H256> {
        self.transaction_hash
    }

    /// The interface the instance was bound with
    pub fn abi(&self) -> &[InterfaceEntry] {
        &self.context.abi
    }

    /// Names of the callable functions.
    pub fn functions(&self) -> impl Iterator<Item = &str> {
        self.context
            .abi
            .iter()
            .filter(|e| e.is_function())
            .map(|e| e.name.as_str())
    }

    /// The operation for a function. When the interface overloads a name,
    /// the last declaration is used.
    pub fn function(&self, name: &str) -> BindingResult<ContractFunction<'_>> {
        self.context
            .abi
            .iter()
            .rev()
            .find(|e| e.is_function() && e.name == name)
            .map(|entry| ContractFunction {
                instance: self,
                entry,
            })
            .ok_or_else(|| BindingError::UnknownFunction {
                contract: self.context.contract_name.clone(),
                name: name.to_owned(),
            })
    }

    /// Shorthand for `self.function(name)?.invoke(args, overrides)`.
    pub async fn invoke(
        &self,
        name: &str,
        args: &[Token],
        overrides: Option<&TxParams>,
    ) -> BindingResult<CallOutcome> {
        self.function(name)?.invoke(args, overrides).await
    }

    /// Event entries declared by the interface.
    pub fn events(&self) -> impl Iterator<Item = &InterfaceEntry> {
        self.context.abi.iter().filter(|e| e.is_event())
    }

    /// The event entry with this name
    pub fn event(&self, name: &str) -> BindingResult<&InterfaceEntry> {
        self.events()
            .filter(|e| e.name == name)
            .last()
            .ok_or_else(|| BindingError::UnknownEvent {
                contract: self.context.contract_name.clone(),
                name: name.to_owned(),
            })
    }

    /// A log filter matching occurrences of one event emitted by this
    /// instance.
    pub fn event_filter(&self, name: &str) -> BindingResult<Filter> {
        let topic = self.event(name)?.topic()?;
        Ok(self.all_events_filter().topic0(topic))
    }

    /// A log filter matching everything this instance emits.
    pub fn all_events_filter(&self) -> Filter {
        Filter::new().address(self.address)
    }

    /// Decode receipt logs against the events this instance knows, including
    /// those of linked libraries.
    pub fn decode_logs(&self, logs: &[Log]) -> Vec<DecodedEvent> {
        decode_logs(&self.context.events, logs)
    }

    /// Topic index the instance decodes logs with
    pub fn topic_index(&self) -> &EventTopicIndex {
        &self.context.events
    }
}

/// One callable function of a contract instance.
#[derive(Debug, Clone, Copy)]
pub struct ContractFunction<'a> {
    instance: &'a ContractInstance,
    entry: &'a InterfaceEntry,
}

impl<'a> ContractFunction<'a> {
    /// The interface entry this operation was built from
    pub fn entry(&self) -> &'a InterfaceEntry {
        self.entry
    }

    /// Whether invoking sends a transaction
    pub fn mutability(&self) -> Mutability {
        self.entry.mutability()
    }

    /// The request that would be sent: encoded calldata addressed to the
    /// instance, with the binding defaults and `overrides` applied.
    pub fn request(
        &self,
        args: &[Token],
        overrides: Option<&TxParams>,
    ) -> BindingResult<TransactionRequest> {
        let data = self.entry.to_function()?.encode_input(args)?;
        let params = self.instance.context.defaults.merged(overrides);
        Ok(params.apply(
            TransactionRequest::new()
                .to(self.instance.address)
                .data(data),
        ))
    }

    /// Invoke the function the way its mutability requires. Views are
    /// answered by the node directly; mutating functions are submitted and
    /// then polled until mined.
    #[instrument(skip(self, args, overrides), fields(contract = %self.instance.contract_name(), function = %self.entry.name))]
    pub async fn invoke(
        &self,
        args: &[Token],
        overrides: Option<&TxParams>,
    ) -> BindingResult<CallOutcome> {
        match self.mutability() {
            Mutability::View => Ok(CallOutcome::Value(self.call(args, overrides).await?)),
            Mutability::Mutating => {
                let tx = self.request(args, overrides)?;
                let context = &self.instance.context;
                let synchronizer = TransactionSynchronizer::new(context.transport()?, context.sync);
                let (tx_hash, receipt) = synchronizer.send(&tx).await?;
                if !context.next_gen {
                    return Ok(CallOutcome::Transaction(tx_hash));
                }
                let logs = self.instance.decode_logs(&receipt.logs);
                debug!(?tx_hash, decoded = logs.len(), total = receipt.logs.len(), "Decoded receipt logs");
                Ok(CallOutcome::Confirmed(Box::new(ConfirmedTransaction {
                    tx: tx_hash,
                    receipt,
                    logs,
                })))
            }
        }
    }

    /// Execute as a call against the latest state, whatever the function's
    /// mutability, and decode the return values.
    pub async fn call(&self, args: &[Token], overrides: Option<&TxParams>) -> BindingResult<Vec<Token>> {
        let tx = self.request(args, overrides)?;
        let output = self.instance.context.transport()?.call(&tx).await?;
        Ok(self.entry.to_function()?.decode_output(&output)?)
    }

    /// Submit as a transaction and return its hash without waiting for it to
    /// be mined.
    pub async fn send_transaction(
        &self,
        args: &[Token],
        overrides: Option<&TxParams>,
    ) -> BindingResult<H256> {
        let tx = self.request(args, overrides)?;
        self.instance.context.transport()?.send_transaction(&tx).await
    }

    /// Estimate the gas a transaction invoking the function would use.
    pub async fn estimate_gas(
        &self,
        args: &[Token],
        overrides: Option<&TxParams>,
    ) -> BindingResult<U256> {
        let tx = self.request(args, overrides)?;
        self.instance.context.transport()?.estimate_gas(&tx).await
    }
}
