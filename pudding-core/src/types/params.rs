use ethers_core::types::TransactionRequest;
use serde::{Deserialize, Serialize};

use crate::{Address, Bytes, U256};

/// Transaction overrides: the explicit trailing options of every contract
/// operation, merged over the binding's defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxParams {
    /// Sender account, unlocked on the node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    /// Gas limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas: Option<U256>,
    /// Gas price in wei
    #[serde(default, alias = "gasprice", skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<U256>,
    /// Value to transfer in wei
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    /// Raw calldata; only meaningful for deployments, where it replaces the
    /// linked bytecode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Bytes>,
}

impl TxParams {
    /// Sets the sender
    pub fn from(mut self, from: impl Into<Address>) -> Self {
        self.from = Some(from.into());
        self
    }

    /// Sets the gas limit
    pub fn gas(mut self, gas: impl Into<U256>) -> Self {
        self.gas = Some(gas.into());
        self
    }

    /// Sets the gas price
    pub fn gas_price(mut self, gas_price: impl Into<U256>) -> Self {
        self.gas_price = Some(gas_price.into());
        self
    }

    /// Sets the transferred value
    pub fn value(mut self, value: impl Into<U256>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Sets raw calldata
    pub fn data(mut self, data: impl Into<Bytes>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Copy every field that is set in `other` over the fields of `self`.
    pub fn extend(&mut self, other: &TxParams) {
        if other.from.is_some() {
            self.from = other.from;
        }
        if other.gas.is_some() {
            self.gas = other.gas;
        }
        if other.gas_price.is_some() {
            self.gas_price = other.gas_price;
        }
        if other.value.is_some() {
            self.value = other.value;
        }
        if other.data.is_some() {
            self.data = other.data.clone();
        }
    }

    /// `self` are the defaults; fields set in `overrides` win.
    pub fn merged(&self, overrides: Option<&TxParams>) -> TxParams {
        let mut merged = self.clone();
        if let Some(overrides) = overrides {
            merged.extend(overrides);
        }
        merged
    }

    /// Apply sender, gas, price and value to a request. Calldata is left to
    /// the caller, which has already encoded it.
    pub fn apply(&self, mut tx: TransactionRequest) -> TransactionRequest {
        if let Some(from) = self.from {
            tx = tx.from(from);
        }
        if let Some(gas) = self.gas {
            tx = tx.gas(gas);
        }
        if let Some(gas_price) = self.gas_price {
            tx = tx.gas_price(gas_price);
        }
        if let Some(value) = self.value {
            tx = tx.value(value);
        }
        tx
    }
}
