use std::any::Any;
use std::error::Error as StdError;
use std::fmt::{Debug, Display, Formatter};
use std::ops::Deref;

use crate::H256;

/// The result of interacting with a contract binding.
pub type BindingResult<T> = Result<T, BindingError>;

/// An "Any"-typed error.
pub trait PuddingCustomError: StdError + Send + Sync + Any {}

impl<E: StdError + Send + Sync + Any> PuddingCustomError for E {}

/// Thin wrapper around a boxed error raised by a transport. The transport is
/// opaque to the binding, so its errors are carried through untouched.
#[repr(transparent)]
pub struct TransportError(Box<dyn PuddingCustomError>);

impl Debug for TransportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", AsRef::<dyn PuddingCustomError>::as_ref(&self))
    }
}

impl Display for TransportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", AsRef::<dyn PuddingCustomError>::as_ref(&self))
    }
}

impl StdError for TransportError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

impl AsRef<dyn PuddingCustomError> for TransportError {
    fn as_ref(&self) -> &dyn PuddingCustomError {
        self.0.as_ref()
    }
}

impl Deref for TransportError {
    type Target = Box<dyn PuddingCustomError>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Errors returned by the contract binding.
///
/// Everything up to and including [`BindingError::UnknownEvent`] is a
/// precondition failure and is returned before any request reaches the
/// transport. The remaining variants can only surface once a request has been
/// made.
#[derive(Debug, thiserror::Error)]
pub enum BindingError {
    /// No transport was configured on the binding
    #[error("{contract} error: Please call set_provider() first before calling deploy().")]
    ProviderNotSet {
        /// contract name
        contract: String,
    },
    /// The active deployment record has no bytecode template
    #[error("{contract} error: contract binary not set. Can't deploy new instance.")]
    MissingBinary {
        /// contract name
        contract: String,
    },
    /// The bytecode still references libraries that were never linked
    #[error(
        "{contract} contains unresolved libraries. You must deploy and link the following libraries before you can deploy a new version of {contract}: {}",
        .libraries.join(", ")
    )]
    UnresolvedLibraries {
        /// contract name
        contract: String,
        /// unresolved library names, sorted and deduplicated
        libraries: Vec<String>,
    },
    /// An address string was not `0x` followed by 40 hex characters
    #[error("Invalid address passed to {contract}.attach(): {address:?}")]
    InvalidAddress {
        /// contract name
        contract: String,
        /// the rejected input
        address: String,
    },
    /// The active deployment record has no address to bind to
    #[error("Cannot find deployed address: {contract} not deployed or address not set.")]
    NotDeployed {
        /// contract name
        contract: String,
    },
    /// A library binding was linked before it had an address
    #[error("Cannot link contract {library} without an address.")]
    LinkWithoutAddress {
        /// library name
        library: String,
    },
    /// No interface entry of kind `function` with this name
    #[error("{contract} has no function named {name:?}")]
    UnknownFunction {
        /// contract name
        contract: String,
        /// requested function name
        name: String,
    },
    /// No interface entry of kind `event` with this name
    #[error("{contract} has no event named {name:?}")]
    UnknownEvent {
        /// contract name
        contract: String,
        /// requested event name
        name: String,
    },
    /// The registry has no record for the detected or requested network
    #[error("{contract} error: Can't find artifacts for network id '{network_id}'")]
    NetworkNotFound {
        /// contract name
        contract: String,
        /// the network id that could not be matched
        network_id: String,
    },
    /// Error raised by the transport, passed through verbatim
    #[error(transparent)]
    Transport(TransportError),
    /// No receipt arrived before the synchronization timeout elapsed. The
    /// transaction itself may still be mined later.
    #[error("Transaction {tx_hash:?} wasn't processed in {timeout_secs} seconds!")]
    ConfirmationTimeout {
        /// the submitted transaction
        tx_hash: H256,
        /// the timeout that elapsed
        timeout_secs: f64,
    },
    /// A creation transaction was mined but no contract address was reported
    #[error("Transaction {0:?} was mined without creating a contract")]
    ContractNotCreated(H256),
    /// ABI encoding or decoding failed
    #[error(transparent)]
    Abi(#[from] ethers_core::abi::Error),
    /// Bytecode could not be hex decoded
    #[error("Bytecode is not valid hex: {0}")]
    InvalidBytecode(#[from] hex::FromHexError),
    /// A deployment artifact could not be parsed
    #[error("Invalid deployment artifact: {0}")]
    Artifact(#[from] serde_json::Error),
    /// A deployment artifact could not be read
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BindingError {
    /// Create a transport error from any other existing error
    pub fn from_transport<E: PuddingCustomError>(err: E) -> Self {
        Self::Transport(TransportError(Box::new(err)))
    }

    /// Creates a transport error from a string
    pub fn from_transport_str(err: impl Into<String>) -> Self {
        #[derive(Debug)]
        #[repr(transparent)]
        struct StringError(String);
        impl Display for StringError {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
        impl StdError for StringError {}

        Self::from_transport(StringError(err.into()))
    }

    /// True if the error happened before any request was made.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::ProviderNotSet { .. }
                | Self::MissingBinary { .. }
                | Self::UnresolvedLibraries { .. }
                | Self::InvalidAddress { .. }
                | Self::NotDeployed { .. }
                | Self::LinkWithoutAddress { .. }
                | Self::UnknownFunction { .. }
                | Self::UnknownEvent { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_libraries_lists_names_in_order() {
        let err = BindingError::UnresolvedLibraries {
            contract: "EtherBank".into(),
            libraries: vec!["Math".into(), "Validate".into()],
        };
        assert_eq!(
            err.to_string(),
            "EtherBank contains unresolved libraries. You must deploy and link the following \
             libraries before you can deploy a new version of EtherBank: Math, Validate"
        );
        assert!(err.is_precondition());
    }

    #[test]
    fn timeout_names_tx_and_seconds() {
        let err = BindingError::ConfirmationTimeout {
            tx_hash: H256::repeat_byte(0xab),
            timeout_secs: 240.0,
        };
        let msg = err.to_string();
        assert!(msg.contains(&format!("{:?}", H256::repeat_byte(0xab))));
        assert!(msg.ends_with("wasn't processed in 240 seconds!"));
        assert!(!err.is_precondition());
    }

    #[test]
    fn transport_errors_pass_through() {
        let err = BindingError::from_transport_str("connection refused");
        assert_eq!(err.to_string(), "connection refused");
    }
}
