//! JSON-RPC transport for pudding contract bindings

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(unused_extern_crates)]

pub use self::{trait_builder::*, transport::*};

mod trait_builder;
mod transport;

/// Ethereum connection configuration
#[derive(Debug, serde::Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ConnectionConf {
    /// HTTP connection details
    Http {
        /// Fully qualified string to connect to
        url: String,
    },
}

impl Default for ConnectionConf {
    fn default() -> Self {
        Self::Http {
            url: Default::default(),
        }
    }
}
