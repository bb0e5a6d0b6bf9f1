use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ethers_core::types::TransactionRequest;
use mockall::predicate::eq;

use pudding_base::{CallOutcome, ContractBinding};
use pudding_core::{
    linker, Address, BindingError, DeploymentRecord, DeploymentRegistry, Token, TxParams, H256,
};
use pudding_test::mocks::MockTransport;
use pudding_test::test_utils::*;

fn mainnet_registry(keys: &[&str]) -> DeploymentRegistry {
    DeploymentRegistry::new(
        "Validate",
        keys.iter().enumerate().map(|(i, key)| {
            (
                key.to_string(),
                DeploymentRecord::new(vec![]).with_address(Address::repeat_byte(i as u8 + 1)),
            )
        }),
    )
}

fn on_network(id: &'static str) -> MockTransport {
    let mut transport = MockTransport::new();
    transport
        .expect__get_network_id()
        .times(1)
        .returning(move || Ok(id.to_owned()));
    transport
}

#[tokio::test]
async fn public_network_prefers_numeric_key() {
    let mut binding = ContractBinding::new(mainnet_registry(&["live", "default", "1"]));
    binding.set_provider(on_network("1"));

    binding.ensure_network().await.unwrap();
    assert_eq!(binding.network_id(), Some("1"));
    assert_eq!(binding.config().network_key(), Some("1"));
    assert_eq!(binding.address(), Some(Address::repeat_byte(3)));
}

#[tokio::test]
async fn public_network_falls_back_to_live() {
    let mut binding = ContractBinding::new(mainnet_registry(&["default", "live"]));
    binding.set_provider(on_network("1"));

    binding.ensure_network().await.unwrap();
    assert_eq!(binding.config().network_key(), Some("live"));
}

#[tokio::test]
async fn pinned_network_skips_detection() {
    let mut binding = ContractBinding::new(validate_registry());
    // any request would fail the test
    binding.set_provider(MockTransport::new());
    binding.set_network("1337").unwrap();

    binding.ensure_network().await.unwrap();
    binding.ensure_network().await.unwrap();
    assert_eq!(binding.network_id(), Some("1337"));
}

#[tokio::test]
async fn failed_detection_leaves_state_untouched() {
    let mut binding = ContractBinding::new(validate_registry());
    let mut transport = MockTransport::new();
    let mut seq = mockall::Sequence::new();
    transport
        .expect__get_network_id()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|| Ok("5".into()));
    transport
        .expect__get_network_id()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|| Err(BindingError::from_transport_str("connection refused")));
    transport
        .expect__get_network_id()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|| Ok("1337".into()));
    binding.set_provider(transport);

    let err = binding.ensure_network().await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Validate error: Can't find artifacts for network id '5'"
    );
    assert_eq!(binding.network_id(), None);
    assert_eq!(binding.config().network_key(), Some("default"));

    let err = binding.ensure_network().await.unwrap_err();
    assert_eq!(err.to_string(), "connection refused");
    assert_eq!(binding.network_id(), None);

    // retry detects again
    binding.ensure_network().await.unwrap();
    assert_eq!(binding.network_id(), Some("1337"));
}

#[tokio::test]
async fn detection_requires_provider() {
    let mut binding = ContractBinding::new(validate_registry());
    assert!(matches!(
        binding.ensure_network().await,
        Err(BindingError::ProviderNotSet { .. })
    ));
}

#[tokio::test]
async fn deployed_instance_detects_then_binds() {
    let mut binding = ContractBinding::new(validate_registry());
    binding.set_provider(on_network("1337"));

    let instance = binding.deployed_instance().await.unwrap();
    assert_eq!(instance.address(), validate_address());
    assert_eq!(instance.transaction_hash(), None);
    assert_eq!(binding.network_id(), Some("1337"));
}

#[test]
fn attach_is_synchronous_and_offline() {
    let mut binding = ContractBinding::new(ether_bank_registry());
    binding.set_provider(MockTransport::new());

    let instance = binding
        .attach("0xABC51b5cee8be8b97d2e9631c5919e4488411126")
        .unwrap();
    assert_eq!(
        format!("{:?}", instance.address()),
        "0xabc51b5cee8be8b97d2e9631c5919e4488411126"
    );

    let err = binding.attach("0xShort").unwrap_err();
    assert!(matches!(err, BindingError::InvalidAddress { ref address, .. } if address == "0xShort"));
    assert_eq!(
        err.to_string(),
        "Invalid address passed to EtherBank.attach(): \"0xShort\""
    );
}

#[test]
fn deploy_checks_preconditions_in_order() {
    let mut binding = ContractBinding::new(ether_bank_registry());
    let args = [Token::Uint(1u64.into())];

    let err = binding.deploy(&args, None).unwrap_err();
    assert_eq!(
        err.to_string(),
        "EtherBank error: Please call set_provider() first before calling deploy()."
    );

    binding.set_provider(MockTransport::new());
    let err = binding.deploy(&args, None).unwrap_err();
    assert!(matches!(err, BindingError::UnresolvedLibraries { ref libraries, .. } if libraries == &["Validate".to_owned()]));
    assert!(err.is_precondition());

    let mut empty = ContractBinding::new(DeploymentRegistry::new(
        "Abstract",
        [("default".to_owned(), DeploymentRecord::new(vec![]).with_bytecode("0x"))],
    ));
    empty.set_provider(MockTransport::new());
    assert!(matches!(
        empty.deploy(&[], None),
        Err(BindingError::MissingBinary { .. })
    ));
}

#[test]
fn unresolved_libraries_are_sorted_and_unique() {
    let template = format!(
        "0x60{}{}{}{}",
        placeholder("Zeta"),
        placeholder("Alpha"),
        placeholder("Zeta"),
        placeholder("Mid")
    );
    let mut binding = ContractBinding::new(DeploymentRegistry::new(
        "Linked",
        [("default".to_owned(), DeploymentRecord::new(vec![]).with_bytecode(template))],
    ));
    binding.set_provider(MockTransport::new());
    binding.link_library(("Mid", Address::repeat_byte(9))).unwrap();

    let err = binding.deploy(&[], None).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Linked contains unresolved libraries. You must deploy and link the following \
         libraries before you can deploy a new version of Linked: Alpha, Zeta"
    );
}

#[test]
fn linked_binary_is_stable() {
    let mut binding = ContractBinding::new(ether_bank_registry());
    binding.link_library(("Validate", validate_address())).unwrap();

    let binary = binding.binary().unwrap();
    assert!(linker::detect_unresolved(&binary).is_empty());
    assert!(binary.contains("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa1126"));
    assert_eq!(linker::resolve(&binary, &binding.links()), binary);
}

#[tokio::test(start_paused = true)]
async fn deploys_linked_contract() {
    let created = Address::repeat_byte(0x99);
    let tx_hash = H256::repeat_byte(0x11);
    let polls = Arc::new(AtomicU32::new(0));
    let counter = polls.clone();

    let mut transport = MockTransport::new();
    transport
        .expect__send_transaction()
        .withf(|tx: &TransactionRequest| tx.to.is_none() && tx.from == Some(Address::repeat_byte(0xf0)))
        .times(1)
        .returning(move |_| Ok(tx_hash));
    transport
        .expect__get_transaction_receipt()
        .with(eq(tx_hash))
        .returning(move |hash| {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            Ok((n == 2).then(|| creation_receipt(hash, Some(created))))
        });

    let mut binding = ContractBinding::new(ether_bank_registry());
    binding.set_provider(transport);
    binding.set_defaults(&TxParams::default().from(Address::repeat_byte(0xf0)));
    binding.link_library(&ContractBinding::new(validate_registry())).unwrap();

    let deployer = binding.deploy(&[Token::Uint(3u64.into())], None).unwrap();
    let data = deployer.request().data.clone().unwrap();
    let code = linker::decode_bytecode(&binding.binary().unwrap()).unwrap();
    assert!(data.starts_with(&code));
    assert_eq!(data.len(), code.len() + 32);

    let instance = deployer.send().await.unwrap();
    assert_eq!(instance.address(), created);
    assert_eq!(instance.transaction_hash(), Some(tx_hash));
    assert_eq!(polls.load(Ordering::SeqCst), 2);
}

#[test]
fn data_override_replaces_bytecode() {
    let mut binding = ContractBinding::new(ether_bank_registry());
    binding.set_provider(MockTransport::new());
    binding.link_library(("Validate", validate_address())).unwrap();

    let overrides = TxParams::default().data(vec![0xde, 0xad]);
    let deployer = binding
        .deploy(&[Token::Uint(3u64.into())], Some(&overrides))
        .unwrap();
    let data = deployer.request().data.clone().unwrap();
    assert_eq!(&data[..2], &[0xde, 0xad]);
    assert_eq!(data.len(), 2 + 32);
}

#[tokio::test(start_paused = true)]
async fn next_gen_decodes_known_logs_only() {
    let tx_hash = H256::repeat_byte(0x21);
    let bank = Address::repeat_byte(0xcc);
    let logs = vec![
        transfer_log(bank, Address::repeat_byte(1), Address::repeat_byte(2), 10),
        foreign_log(bank),
    ];

    let mut transport = MockTransport::new();
    transport
        .expect__send_transaction()
        .times(1)
        .returning(move |_| Ok(tx_hash));
    transport
        .expect__get_transaction_receipt()
        .times(1)
        .returning(move |hash| Ok(Some(receipt(hash, logs.clone()))));

    let mut binding = ContractBinding::new(ether_bank_registry());
    binding.set_provider(transport);
    binding.set_next_gen(true);
    let instance = binding.at(bank).unwrap();

    let outcome = instance
        .invoke(
            "transfer",
            &[Token::Address(Address::repeat_byte(2)), Token::Uint(10u64.into())],
            Some(&TxParams::default().from(Address::repeat_byte(1))),
        )
        .await
        .unwrap();
    let confirmed = match outcome {
        CallOutcome::Confirmed(confirmed) => confirmed,
        other => panic!("expected a confirmed transaction, got {other:?}"),
    };
    assert_eq!(confirmed.tx, tx_hash);
    assert_eq!(confirmed.receipt.logs.len(), 2);
    assert_eq!(confirmed.logs.len(), 1);
    assert_eq!(confirmed.logs[0].event, "Transfer");
    assert_eq!(confirmed.logs[0].arg("value"), Some(&Token::Uint(10u64.into())));
}

#[tokio::test(start_paused = true)]
async fn legacy_mode_resolves_with_hash() {
    let tx_hash = H256::repeat_byte(0x31);
    let mut transport = MockTransport::new();
    transport
        .expect__send_transaction()
        .returning(move |_| Ok(tx_hash));
    transport
        .expect__get_transaction_receipt()
        .returning(|hash| Ok(Some(receipt(hash, vec![]))));

    let mut binding = ContractBinding::new(ether_bank_registry());
    binding.set_provider(transport);
    let instance = binding.at(Address::repeat_byte(0xcc)).unwrap();

    let outcome = instance
        .invoke(
            "transfer",
            &[Token::Address(Address::repeat_byte(2)), Token::Uint(1u64.into())],
            None,
        )
        .await
        .unwrap();
    assert_eq!(outcome, CallOutcome::Transaction(tx_hash));
}

#[tokio::test(start_paused = true)]
async fn instances_keep_configuration_they_were_bound_with() {
    let tx_hash = H256::repeat_byte(0x41);
    let mut transport = MockTransport::new();
    transport
        .expect__send_transaction()
        .returning(move |_| Ok(tx_hash));
    transport
        .expect__get_transaction_receipt()
        .returning(|_| Ok(None));

    let mut binding = ContractBinding::new(ether_bank_registry());
    binding.set_provider(transport);
    binding.set_synchronization_timeout(Duration::from_secs(2));
    let instance = binding.at(Address::repeat_byte(0xcc)).unwrap();
    // does not reach the existing instance
    binding.set_synchronization_timeout(Duration::ZERO);

    let err = instance
        .invoke(
            "transfer",
            &[Token::Address(Address::repeat_byte(2)), Token::Uint(1u64.into())],
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BindingError::ConfirmationTimeout { timeout_secs, .. } if timeout_secs == 2.0));
}
