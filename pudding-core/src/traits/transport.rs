use std::fmt::Debug;

use async_trait::async_trait;
use auto_impl::auto_impl;
use ethers_core::types::{TransactionReceipt, TransactionRequest};

use crate::{BindingResult, Bytes, H256, U256};

/// The request/response channel to a node.
///
/// Implementations must not retry on their own: the binding decides what is
/// repeated (only receipt polling) and surfaces every other failure verbatim.
#[async_trait]
#[auto_impl(&, Box, Arc)]
pub trait ContractTransport: Send + Sync + Debug {
    /// Submit a transaction signed by the node for `tx.from`; returns its
    /// hash without waiting for it to be mined.
    async fn send_transaction(&self, tx: &TransactionRequest) -> BindingResult<H256>;

    /// Execute a call against the latest state and return the raw return data.
    async fn call(&self, tx: &TransactionRequest) -> BindingResult<Bytes>;

    /// Estimate the gas a transaction would use.
    async fn estimate_gas(&self, tx: &TransactionRequest) -> BindingResult<U256>;

    /// Fetch the receipt of a transaction; `None` while it is not mined.
    async fn get_transaction_receipt(
        &self,
        tx_hash: H256,
    ) -> BindingResult<Option<TransactionReceipt>>;

    /// The id of the network the node is connected to.
    async fn get_network_id(&self) -> BindingResult<String>;
}
