use ethers_core::abi::{encode, Token};
use ethers_core::types::{Log, TransactionReceipt, U64};

use pudding_core::*;

/// Address the `Validate` library is deployed at on every fixture network.
pub fn validate_address() -> Address {
    utils::parse_address("0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa1126").unwrap_or_default()
}

/// A 40 character placeholder field for `library`.
pub fn placeholder(library: &str) -> String {
    let padding = linker::PLACEHOLDER_WIDTH - linker::PLACEHOLDER_PREFIX.len() - library.len();
    format!("{}{library}{}", linker::PLACEHOLDER_PREFIX, "_".repeat(padding))
}

/// `event Checked(address indexed who)`, emitted by the `Validate` library.
pub fn checked_event() -> InterfaceEntry {
    InterfaceEntry::event("Checked").with_input(InterfaceParam::new("who", "address").indexed())
}

/// `event Transfer(address indexed from, address indexed to, uint256 value)`
pub fn transfer_event() -> InterfaceEntry {
    InterfaceEntry::event("Transfer")
        .with_input(InterfaceParam::new("from", "address").indexed())
        .with_input(InterfaceParam::new("to", "address").indexed())
        .with_input(InterfaceParam::new("value", "uint256"))
}

/// Interface of the `EtherBank` contract.
pub fn ether_bank_abi() -> Vec<InterfaceEntry> {
    vec![
        InterfaceEntry::constructor().with_input(InterfaceParam::new("fee", "uint256")),
        InterfaceEntry::function("getBalance", Mutability::View)
            .with_input(InterfaceParam::new("owner", "address"))
            .with_output(InterfaceParam::new("", "uint256")),
        InterfaceEntry::function("transfer", Mutability::Mutating)
            .with_input(InterfaceParam::new("to", "address"))
            .with_input(InterfaceParam::new("value", "uint256"))
            .with_output(InterfaceParam::new("", "bool")),
        transfer_event(),
    ]
}

/// Bytecode template of `EtherBank`, referencing `Validate` once.
pub fn ether_bank_template() -> String {
    format!("0x6060604052{}6060", placeholder("Validate"))
}

/// `EtherBank` as generated: not yet deployed anywhere.
pub fn ether_bank_registry() -> DeploymentRegistry {
    DeploymentRegistry::new(
        "EtherBank",
        [(
            "default".to_owned(),
            DeploymentRecord::new(ether_bank_abi()).with_bytecode(ether_bank_template()),
        )],
    )
}

/// `Validate` deployed on the public network and a local test network.
pub fn validate_registry() -> DeploymentRegistry {
    let record = || {
        DeploymentRecord::new(vec![
            InterfaceEntry::function("check", Mutability::View)
                .with_input(InterfaceParam::new("who", "address"))
                .with_output(InterfaceParam::new("", "bool")),
            checked_event(),
        ])
        .with_bytecode("0x606060")
        .with_address(validate_address())
    };
    DeploymentRegistry::new(
        "Validate",
        [
            ("1".to_owned(), record()),
            ("1337".to_owned(), record()),
            ("default".to_owned(), record()),
        ],
    )
}

/// A mined receipt for `tx_hash` carrying `logs`.
pub fn receipt(tx_hash: H256, logs: Vec<Log>) -> TransactionReceipt {
    TransactionReceipt {
        transaction_hash: tx_hash,
        block_number: Some(U64::from(7)),
        status: Some(U64::from(1)),
        logs,
        ..Default::default()
    }
}

/// A mined creation receipt reporting `contract_address`.
pub fn creation_receipt(tx_hash: H256, contract_address: Option<Address>) -> TransactionReceipt {
    TransactionReceipt {
        contract_address,
        ..receipt(tx_hash, vec![])
    }
}

/// A `Transfer` log emitted by `emitter`.
pub fn transfer_log(emitter: Address, from: Address, to: Address, value: u64) -> Log {
    Log {
        address: emitter,
        topics: vec![
            transfer_event().topic().unwrap_or_default(),
            H256::from(from),
            H256::from(to),
        ],
        data: encode(&[Token::Uint(value.into())]).into(),
        ..Default::default()
    }
}

/// A log whose topic no fixture declares.
pub fn foreign_log(emitter: Address) -> Log {
    Log {
        address: emitter,
        topics: vec![H256::repeat_byte(0xee)],
        data: encode(&[Token::Bool(true)]).into(),
        ..Default::default()
    }
}
