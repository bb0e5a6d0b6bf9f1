use ethers_core::abi::{
    self, param_type::Reader, Constructor, Event, EventParam, Function, Param, ParamType,
    StateMutability,
};
use ethers_core::utils::keccak256;
use serde::{Deserialize, Serialize};

use crate::{BindingResult, H256};

/// The kind of an ABI item.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// A callable function. ABI items without a `type` are functions.
    #[default]
    Function,
    /// An event that can appear in receipt logs
    Event,
    /// The creation-time constructor
    Constructor,
    /// The fallback function
    Fallback,
    /// The plain ether receive function
    Receive,
    /// A custom revert error
    Error,
}

/// Whether invoking a function changes chain state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mutability {
    /// Read-only; answered by the node without a transaction.
    View,
    /// State changing; requires a mined transaction.
    Mutating,
}

/// One parameter of an ABI item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceParam {
    /// Parameter name, may be empty
    #[serde(default)]
    pub name: String,
    /// Solidity type, e.g. `uint256`, `address[]` or `tuple`
    #[serde(rename = "type")]
    pub kind: String,
    /// Event parameters only: whether it is stored in a topic
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexed: Option<bool>,
    /// Member types of a `tuple`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<InterfaceParam>>,
    /// Compiler provided type name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_type: Option<String>,
}

impl InterfaceParam {
    /// A named parameter of a plain (non tuple) type.
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            indexed: None,
            components: None,
            internal_type: None,
        }
    }

    /// Mark an event parameter as indexed.
    pub fn indexed(mut self) -> Self {
        self.indexed = Some(true);
        self
    }

    /// Parse the solidity type.
    pub fn param_type(&self) -> BindingResult<ParamType> {
        let Some(suffix) = self.kind.strip_prefix("tuple") else {
            // library storage references like `Validate.Data storage` would
            // otherwise be read as an enum and encode as `uint8`
            if self.kind.contains(|c: char| c == '.' || c.is_whitespace()) {
                return Err(abi::Error::InvalidName(self.kind.clone()).into());
            }
            return Ok(Reader::read(&self.kind)?);
        };

        let members = self
            .components
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(InterfaceParam::param_type)
            .collect::<BindingResult<Vec<_>>>()?;
        let mut kind = ParamType::Tuple(members);

        // array suffixes, innermost first: `tuple[2][]`
        let mut rest = suffix;
        while let Some(stripped) = rest.strip_prefix('[') {
            let end = stripped
                .find(']')
                .ok_or_else(|| abi::Error::InvalidName(self.kind.clone()))?;
            kind = match &stripped[..end] {
                "" => ParamType::Array(Box::new(kind)),
                size => ParamType::FixedArray(
                    Box::new(kind),
                    size.parse()
                        .map_err(|_| abi::Error::InvalidName(self.kind.clone()))?,
                ),
            };
            rest = &stripped[end + 1..];
        }
        if !rest.is_empty() {
            return Err(abi::Error::InvalidName(self.kind.clone()).into());
        }
        Ok(kind)
    }

    fn to_param(&self) -> BindingResult<Param> {
        Ok(Param {
            name: self.name.clone(),
            kind: self.param_type()?,
            internal_type: self.internal_type.clone(),
        })
    }

    fn to_event_param(&self) -> BindingResult<EventParam> {
        Ok(EventParam {
            name: self.name.clone(),
            kind: self.param_type()?,
            indexed: self.indexed.unwrap_or(false),
        })
    }
}

/// One item of a contract interface description (ABI).
///
/// Entries are kept as declared rather than eagerly parsed into typed ABI
/// items: library ABIs may carry types like `Validate.Data storage` that only
/// make sense to the compiler, and those entries must not prevent the rest of
/// the interface from loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceEntry {
    /// The item kind
    #[serde(rename = "type", default)]
    pub kind: EntryKind,
    /// Item name; empty for constructors and fallbacks
    #[serde(default)]
    pub name: String,
    /// Ordered input parameters
    #[serde(default)]
    pub inputs: Vec<InterfaceParam>,
    /// Ordered output parameters
    #[serde(default)]
    pub outputs: Vec<InterfaceParam>,
    /// Pre 0.5 compilers mark view functions as constant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constant: Option<bool>,
    /// Pre 0.5 compilers mark payable functions separately
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payable: Option<bool>,
    /// `pure`, `view`, `nonpayable` or `payable`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_mutability: Option<String>,
    /// Events only: anonymous events have no signature topic
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anonymous: Option<bool>,
}

impl InterfaceEntry {
    fn new(kind: EntryKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            inputs: vec![],
            outputs: vec![],
            constant: None,
            payable: None,
            state_mutability: None,
            anonymous: None,
        }
    }

    /// A function entry with the given mutability.
    pub fn function(name: impl Into<String>, mutability: Mutability) -> Self {
        let mut entry = Self::new(EntryKind::Function, name);
        entry.constant = Some(mutability == Mutability::View);
        entry.state_mutability = Some(
            match mutability {
                Mutability::View => "view",
                Mutability::Mutating => "nonpayable",
            }
            .to_owned(),
        );
        entry
    }

    /// An event entry.
    pub fn event(name: impl Into<String>) -> Self {
        let mut entry = Self::new(EntryKind::Event, name);
        entry.anonymous = Some(false);
        entry
    }

    /// A constructor entry.
    pub fn constructor() -> Self {
        Self::new(EntryKind::Constructor, "")
    }

    /// Append an input parameter.
    pub fn with_input(mut self, param: InterfaceParam) -> Self {
        self.inputs.push(param);
        self
    }

    /// Append an output parameter.
    pub fn with_output(mut self, param: InterfaceParam) -> Self {
        self.outputs.push(param);
        self
    }

    /// Whether this entry is a function.
    pub fn is_function(&self) -> bool {
        self.kind == EntryKind::Function
    }

    /// Whether this entry is an event.
    pub fn is_event(&self) -> bool {
        self.kind == EntryKind::Event
    }

    /// View functions are answered by the node, everything else needs a
    /// transaction.
    pub fn mutability(&self) -> Mutability {
        let view = self.constant == Some(true)
            || matches!(self.state_mutability.as_deref(), Some("view" | "pure"));
        if view {
            Mutability::View
        } else {
            Mutability::Mutating
        }
    }

    fn state_mutability(&self) -> StateMutability {
        match self.state_mutability.as_deref() {
            Some("pure") => StateMutability::Pure,
            Some("view") => StateMutability::View,
            Some("payable") => StateMutability::Payable,
            Some(_) => StateMutability::NonPayable,
            None if self.constant == Some(true) => StateMutability::View,
            None if self.payable == Some(true) => StateMutability::Payable,
            None => StateMutability::NonPayable,
        }
    }

    /// Canonical signature, e.g. `Transfer(address,address,uint256)`.
    pub fn signature(&self) -> BindingResult<String> {
        let types = self
            .inputs
            .iter()
            .map(|p| p.param_type().map(|t| t.to_string()))
            .collect::<BindingResult<Vec<_>>>()?;
        Ok(format!("{}({})", self.name, types.join(",")))
    }

    /// The topic a non-anonymous event is logged under.
    pub fn topic(&self) -> BindingResult<H256> {
        Ok(H256::from(keccak256(self.signature()?.as_bytes())))
    }

    /// Typed function description used for call encoding.
    pub fn to_function(&self) -> BindingResult<Function> {
        #[allow(deprecated)]
        Ok(Function {
            name: self.name.clone(),
            inputs: self
                .inputs
                .iter()
                .map(InterfaceParam::to_param)
                .collect::<BindingResult<_>>()?,
            outputs: self
                .outputs
                .iter()
                .map(InterfaceParam::to_param)
                .collect::<BindingResult<_>>()?,
            constant: None,
            state_mutability: self.state_mutability(),
        })
    }

    /// Typed event description used for log decoding.
    pub fn to_event(&self) -> BindingResult<Event> {
        Ok(Event {
            name: self.name.clone(),
            inputs: self
                .inputs
                .iter()
                .map(InterfaceParam::to_event_param)
                .collect::<BindingResult<_>>()?,
            anonymous: self.anonymous.unwrap_or(false),
        })
    }

    /// Typed constructor description used for deployment encoding.
    pub fn to_constructor(&self) -> BindingResult<Constructor> {
        Ok(Constructor {
            inputs: self
                .inputs
                .iter()
                .map(InterfaceParam::to_param)
                .collect::<BindingResult<_>>()?,
        })
    }
}
