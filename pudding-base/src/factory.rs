use std::sync::Arc;

use ethers_core::types::TransactionRequest;
use tracing::{info, instrument};

use pudding_core::BindingResult;

use crate::{ContractInstance, InstanceContext, TransactionSynchronizer};

/// A creation transaction that passed every precondition and is ready to
/// be sent. Returned by [`ContractBinding::deploy`](crate::ContractBinding::deploy).
#[derive(Debug)]
pub struct Deployer {
    context: Arc<InstanceContext>,
    tx: TransactionRequest,
}

impl Deployer {
    pub(crate) fn new(context: Arc<InstanceContext>, tx: TransactionRequest) -> Self {
        Self { context, tx }
    }

    /// The creation transaction: linked bytecode with the encoded
    /// constructor arguments, and the merged transaction parameters.
    pub fn request(&self) -> &TransactionRequest {
        &self.tx
    }

    /// Send the creation transaction and wait until the node reports the
    /// address of the new contract.
    #[instrument(skip(self), fields(contract = %self.context.contract_name))]
    pub async fn send(self) -> BindingResult<ContractInstance> {
        let synchronizer = TransactionSynchronizer::new(self.context.transport()?, self.context.sync);
        let pending = synchronizer.submit(&self.tx).await?;
        let (_, address) = synchronizer.confirm_creation(pending).await?;
        info!(?address, tx_hash = ?pending.tx_hash, "Deployed contract");
        Ok(ContractInstance::new(self.context, address, Some(pending.tx_hash)))
    }
}
