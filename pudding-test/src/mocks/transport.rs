#![allow(non_snake_case)]

use async_trait::async_trait;
use ethers_core::types::{TransactionReceipt, TransactionRequest};
use mockall::*;

use pudding_core::*;

mock! {
    pub Transport {
        pub fn _send_transaction(&self, tx: &TransactionRequest) -> BindingResult<H256> {}

        pub fn _call(&self, tx: &TransactionRequest) -> BindingResult<Bytes> {}

        pub fn _estimate_gas(&self, tx: &TransactionRequest) -> BindingResult<U256> {}

        pub fn _get_transaction_receipt(
            &self,
            tx_hash: H256,
        ) -> BindingResult<Option<TransactionReceipt>> {}

        pub fn _get_network_id(&self) -> BindingResult<String> {}
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockTransport")
    }
}

#[async_trait]
impl ContractTransport for MockTransport {
    async fn send_transaction(&self, tx: &TransactionRequest) -> BindingResult<H256> {
        self._send_transaction(tx)
    }

    async fn call(&self, tx: &TransactionRequest) -> BindingResult<Bytes> {
        self._call(tx)
    }

    async fn estimate_gas(&self, tx: &TransactionRequest) -> BindingResult<U256> {
        self._estimate_gas(tx)
    }

    async fn get_transaction_receipt(
        &self,
        tx_hash: H256,
    ) -> BindingResult<Option<TransactionReceipt>> {
        self._get_transaction_receipt(tx_hash)
    }

    async fn get_network_id(&self) -> BindingResult<String> {
        self._get_network_id()
    }
}
