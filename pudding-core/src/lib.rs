//! Pudding. Contract bindings for EVM chains.
//!
//! This crate contains the core types, traits and pure logic of a contract
//! binding: interface descriptions, per-network deployment records, bytecode
//! library linking and the transport a binding talks through.

#![warn(missing_docs)]
#![warn(unused_extern_crates)]
#![forbid(unsafe_code)]

pub use error::*;
pub use registry::*;
pub use traits::*;
pub use types::*;

pub use ethers_core::abi::Token;
pub use ethers_core::types::{Address, Bytes, H160, H256, U256};

/// Library placeholder resolution
pub mod linker;

/// Hex and address helpers
pub mod utils;

mod error;
mod registry;
mod traits;
mod types;
