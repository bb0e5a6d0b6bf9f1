use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use ethers_core::types::{TransactionReceipt, TransactionRequest};
use ethers_providers::Middleware;
use tracing::instrument;

use pudding_core::{BindingError, BindingResult, Bytes, ContractTransport, H256, U256};

/// A [`ContractTransport`] backed by an ethers middleware stack. Requests go
/// to the node as they are; the node signs with the request's `from`.
#[derive(Debug)]
pub struct EthersTransport<M> {
    provider: Arc<M>,
}

impl<M> EthersTransport<M>
where
    M: Middleware + 'static,
{
    /// Wrap a provider
    pub fn new(provider: Arc<M>) -> Self {
        Self { provider }
    }

    /// The wrapped provider
    pub fn provider(&self) -> &Arc<M> {
        &self.provider
    }
}

impl<M> Clone for EthersTransport<M> {
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
        }
    }
}

#[async_trait]
impl<M> ContractTransport for EthersTransport<M>
where
    M: Middleware + 'static,
    M::Error: 'static,
{
    #[instrument(level = "debug", err, ret, skip(self, tx), fields(to = ?tx.to))]
    async fn send_transaction(&self, tx: &TransactionRequest) -> BindingResult<H256> {
        let pending = self
            .provider
            .send_transaction(tx.clone(), None)
            .await
            .map_err(BindingError::from_transport)?;
        Ok(pending.tx_hash())
    }

    #[instrument(level = "debug", err, skip(self, tx), fields(to = ?tx.to))]
    async fn call(&self, tx: &TransactionRequest) -> BindingResult<Bytes> {
        self.provider
            .call(&tx.clone().into(), None)
            .await
            .map_err(BindingError::from_transport)
    }

    #[instrument(level = "debug", err, ret, skip(self, tx))]
    async fn estimate_gas(&self, tx: &TransactionRequest) -> BindingResult<U256> {
        self.provider
            .estimate_gas(&tx.clone().into(), None)
            .await
            .map_err(BindingError::from_transport)
    }

    #[instrument(level = "trace", err, skip(self))]
    async fn get_transaction_receipt(
        &self,
        tx_hash: H256,
    ) -> BindingResult<Option<TransactionReceipt>> {
        self.provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(BindingError::from_transport)
    }

    #[instrument(level = "debug", err, ret, skip(self))]
    async fn get_network_id(&self) -> BindingResult<String> {
        self.provider
            .get_net_version()
            .await
            .map_err(BindingError::from_transport)
    }
}
