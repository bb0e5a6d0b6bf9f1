use std::time::Duration;

use ethers_core::types::{TransactionReceipt, TransactionRequest, U64};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, error, info, instrument};

use pudding_core::utils::bytes_to_hex;
use pudding_core::{Address, BindingError, BindingResult, ContractTransport, H256};

/// How long to wait for a receipt before giving up.
pub const DEFAULT_SYNCHRONIZATION_TIMEOUT: Duration = Duration::from_millis(240_000);

/// Delay between two receipt requests.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Timing of the confirmation protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    /// Give up once this much time has passed without a receipt. Zero waits
    /// forever.
    pub timeout: Duration,
    /// Time between receipt requests
    pub poll_interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_SYNCHRONIZATION_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// A submitted transaction that is waiting to be mined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTransaction {
    /// Hash returned by the node on submission
    pub tx_hash: H256,
    /// When the node accepted the transaction
    pub submitted_at: Instant,
    /// How long to wait for it; zero waits forever
    pub timeout: Duration,
}

impl PendingTransaction {
    fn timed_out(&self, now: Instant) -> bool {
        !self.timeout.is_zero() && now.duration_since(self.submitted_at) >= self.timeout
    }
}

/// Submits state changing transactions and polls the node until they are
/// mined or the timeout elapses.
///
/// Only the receipt request repeats. A failed submission or a failed poll
/// ends synchronization with the transport's error, and a timeout does not
/// cancel the transaction on the node.
#[derive(Debug, Clone, Copy)]
pub struct TransactionSynchronizer<'a> {
    transport: &'a dyn ContractTransport,
    config: SyncConfig,
}

impl<'a> TransactionSynchronizer<'a> {
    /// Synchronize over `transport` with the given timing
    pub fn new(transport: &'a dyn ContractTransport, config: SyncConfig) -> Self {
        Self { transport, config }
    }

    /// Submit the transaction and wait for its receipt.
    pub async fn send(&self, tx: &TransactionRequest) -> BindingResult<(H256, TransactionReceipt)> {
        let pending = self.submit(tx).await?;
        let receipt = self.confirm(pending).await?;
        Ok((pending.tx_hash, receipt))
    }

    /// Dispatch the transaction, logging the tx id.
    pub async fn submit(&self, tx: &TransactionRequest) -> BindingResult<PendingTransaction> {
        let data = tx
            .data
            .as_ref()
            .map(bytes_to_hex)
            .unwrap_or_else(|| "None".into());
        info!(to = ?tx.to, from = ?tx.from, %data, "Dispatching transaction");

        let tx_hash = self.transport.send_transaction(tx).await.map_err(|error| {
            error!(%error, "Transaction was rejected");
            error
        })?;
        info!(?tx_hash, "Dispatched tx");

        Ok(PendingTransaction {
            tx_hash,
            submitted_at: Instant::now(),
            timeout: self.config.timeout,
        })
    }

    /// Poll for the receipt of a dispatched transaction. The first request is
    /// made right away, then once per poll interval.
    #[instrument(skip(self, pending), fields(tx_hash = ?pending.tx_hash))]
    pub async fn confirm(&self, pending: PendingTransaction) -> BindingResult<TransactionReceipt> {
        let tx_hash = pending.tx_hash;
        // a zero period would make the ticker panic
        let period = self.config.poll_interval.max(Duration::from_millis(1));
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut attempts: u64 = 0;
        loop {
            ticker.tick().await;
            attempts = attempts.saturating_add(1);
            debug!(?tx_hash, attempts, "Requesting receipt");

            match self.transport.get_transaction_receipt(tx_hash).await {
                Ok(Some(receipt)) => {
                    info!(?tx_hash, attempts, block = ?receipt.block_number, "Confirmed transaction");
                    return Ok(receipt);
                }
                Ok(None) if pending.timed_out(Instant::now()) => {
                    error!(?tx_hash, attempts, timeout = ?pending.timeout, "Waiting for receipt timed out");
                    return Err(BindingError::ConfirmationTimeout {
                        tx_hash,
                        timeout_secs: pending.timeout.as_secs_f64(),
                    });
                }
                Ok(None) => {}
                Err(error) => {
                    error!(?tx_hash, %error, "Encountered error when waiting for receipt");
                    return Err(error);
                }
            }
        }
    }

    /// Wait for a creation transaction and return the address of the new
    /// contract. A poll that has not observed the receipt yet is not a
    /// result; polling continues until the receipt names an address.
    pub async fn confirm_creation(
        &self,
        pending: PendingTransaction,
    ) -> BindingResult<(TransactionReceipt, Address)> {
        let receipt = self.confirm(pending).await?;
        match receipt.contract_address {
            Some(address) if receipt.status != Some(U64::zero()) => Ok((receipt, address)),
            _ => {
                error!(tx_hash = ?pending.tx_hash, status = ?receipt.status, "Creation transaction did not create a contract");
                Err(BindingError::ContractNotCreated(pending.tx_hash))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use tracing_test::traced_test;

    use pudding_test::mocks::MockTransport;
    use pudding_test::test_utils::{creation_receipt, receipt};

    use super::*;

    fn tx_hash() -> H256 {
        H256::repeat_byte(0x42)
    }

    fn config(timeout_ms: u64) -> SyncConfig {
        SyncConfig {
            timeout: Duration::from_millis(timeout_ms),
            poll_interval: Duration::from_secs(1),
        }
    }

    /// A transport that accepts any transaction and reports its receipt on
    /// the given poll, counting polls.
    fn mined_on_poll(poll: Option<u32>, polls: Arc<AtomicU32>) -> MockTransport {
        let mut transport = MockTransport::new();
        transport
            .expect__send_transaction()
            .times(1)
            .returning(|_| Ok(tx_hash()));
        transport
            .expect__get_transaction_receipt()
            .returning(move |hash| {
                let n = polls.fetch_add(1, Ordering::SeqCst) + 1;
                Ok((Some(n) == poll).then(|| receipt(hash, vec![])))
            });
        transport
    }

    #[tokio::test(start_paused = true)]
    async fn resolves_once_after_receipt_poll() {
        let polls = Arc::new(AtomicU32::new(0));
        let transport = mined_on_poll(Some(4), polls.clone());
        let sync = TransactionSynchronizer::new(&transport, config(240_000));

        let start = Instant::now();
        let (hash, receipt) = sync.send(&TransactionRequest::new()).await.unwrap();
        assert_eq!(hash, tx_hash());
        assert_eq!(receipt.transaction_hash, tx_hash());
        assert_eq!(polls.load(Ordering::SeqCst), 4);
        // first poll is immediate, then one per interval
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_within_one_interval() {
        let polls = Arc::new(AtomicU32::new(0));
        let transport = mined_on_poll(None, polls.clone());
        let sync = TransactionSynchronizer::new(&transport, config(5_500));

        let start = Instant::now();
        let err = sync.send(&TransactionRequest::new()).await.unwrap_err();
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(5_500));
        assert!(elapsed < Duration::from_millis(6_500));
        assert!(matches!(
            err,
            BindingError::ConfirmationTimeout { tx_hash: h, timeout_secs } if h == tx_hash() && timeout_secs == 5.5
        ));
        assert!(err.to_string().ends_with("wasn't processed in 5.5 seconds!"));
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_on_exact_boundary() {
        let transport = mined_on_poll(None, Default::default());
        let sync = TransactionSynchronizer::new(&transport, config(3_000));

        let start = Instant::now();
        assert!(sync.send(&TransactionRequest::new()).await.is_err());
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_timeout_never_times_out() {
        let polls = Arc::new(AtomicU32::new(0));
        let transport = mined_on_poll(Some(1_000), polls.clone());
        let sync = TransactionSynchronizer::new(&transport, config(0));

        sync.send(&TransactionRequest::new()).await.unwrap();
        assert_eq!(polls.load(Ordering::SeqCst), 1_000);
    }

    #[tokio::test(start_paused = true)]
    #[traced_test]
    async fn failed_poll_is_not_retried() {
        let mut transport = MockTransport::new();
        transport
            .expect__send_transaction()
            .returning(|_| Ok(tx_hash()));
        let mut seq = mockall::Sequence::new();
        transport
            .expect__get_transaction_receipt()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(None));
        transport
            .expect__get_transaction_receipt()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(BindingError::from_transport_str("connection reset")));

        let sync = TransactionSynchronizer::new(&transport, config(240_000));
        let err = sync.send(&TransactionRequest::new()).await.unwrap_err();
        assert!(matches!(err, BindingError::Transport(_)));
        assert_eq!(err.to_string(), "connection reset");
        assert!(logs_contain("Encountered error when waiting for receipt"));
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_submission_never_polls() {
        let mut transport = MockTransport::new();
        transport
            .expect__send_transaction()
            .returning(|_| Err(BindingError::from_transport_str("sender account not recognized")));
        transport.expect__get_transaction_receipt().never();

        let sync = TransactionSynchronizer::new(&transport, SyncConfig::default());
        let err = sync.send(&TransactionRequest::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "sender account not recognized");
    }

    #[tokio::test(start_paused = true)]
    async fn creation_polls_until_receipt() {
        let address = Address::repeat_byte(0x77);
        let polls = Arc::new(AtomicU32::new(0));
        let counter = polls.clone();
        let mut transport = MockTransport::new();
        transport
            .expect__get_transaction_receipt()
            .returning(move |hash| {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                Ok((n == 3).then(|| creation_receipt(hash, Some(address))))
            });

        let sync = TransactionSynchronizer::new(&transport, SyncConfig::default());
        let pending = PendingTransaction {
            tx_hash: tx_hash(),
            submitted_at: Instant::now(),
            timeout: DEFAULT_SYNCHRONIZATION_TIMEOUT,
        };
        let (_, created) = sync.confirm_creation(pending).await.unwrap();
        assert_eq!(created, address);
        assert_eq!(polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn creation_without_address_fails() {
        let mut transport = MockTransport::new();
        transport
            .expect__get_transaction_receipt()
            .returning(|hash| Ok(Some(creation_receipt(hash, None))));

        let sync = TransactionSynchronizer::new(&transport, SyncConfig::default());
        let pending = PendingTransaction {
            tx_hash: tx_hash(),
            submitted_at: Instant::now(),
            timeout: DEFAULT_SYNCHRONIZATION_TIMEOUT,
        };
        assert!(matches!(
            sync.confirm_creation(pending).await,
            Err(BindingError::ContractNotCreated(h)) if h == tx_hash()
        ));
    }
}
