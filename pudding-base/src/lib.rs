//! Contract bindings: network selection, call dispatch, transaction
//! confirmation and deployment, plus the settings and tracing setup
//! applications configure them with.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(unused_extern_crates)]

pub use binding::*;
pub use dispatch::{CallOutcome, ConfirmedTransaction, ContractFunction, ContractInstance};
pub use factory::Deployer;
pub use sync::*;

pub(crate) use dispatch::InstanceContext;

/// Settings and tracing setup
pub mod settings;

mod binding;
mod dispatch;
mod factory;
mod sync;
