//! Mocks and fixtures for testing pudding bindings

#![forbid(unsafe_code)]
#![allow(missing_docs)]

/// Mock implementations of the core traits
pub mod mocks;

/// Deployment records and receipts shared by tests
pub mod test_utils;
