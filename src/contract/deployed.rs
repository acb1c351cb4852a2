//! Handle to a contract instance already deployed on the ledger.

use super::ledger::{LedgerStateReader, PublicDataProvider};
use super::{ContractBinding, ContractError, LedgerView};
use crate::config::SecretKey;
use crate::session::OperationError;
use crate::session::menu::ContractActions;
use crate::transaction::types::{SubmissionReceipt, UnbalancedTransaction};
use crate::wallet::WalletProvider;

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

/// Marks an operation as running for as long as it is held.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
	fn acquire(flag: &'a AtomicBool) -> Result<Self, OperationError> {
		flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
			.map_err(|_| OperationError::OperationInFlight)?;
		Ok(Self(flag))
	}
}

impl Drop for InFlight<'_> {
	fn drop(&mut self) {
		self.0.store(false, Ordering::Release);
	}
}

pub struct DeployedContract {
	address: String,
	binding: Arc<dyn ContractBinding>,
	provider: Arc<WalletProvider>,
	reader: LedgerStateReader,
	secret_key: SecretKey,
	in_flight: AtomicBool,
}

impl DeployedContract {
	/// Binds to the contract at `address`, which must already have public state.
	pub async fn find(
		address: &str,
		binding: Arc<dyn ContractBinding>,
		provider: Arc<WalletProvider>,
		public_data: Arc<dyn PublicDataProvider>,
		secret_key: SecretKey,
	) -> Result<Self, ContractError> {
		let reader = LedgerStateReader::new(public_data, binding.clone());
		if reader.read(address).await?.is_none() {
			return Err(ContractError::ContractNotFound(address.to_string()));
		}
		info!("Found {} contract at {}", binding.name(), address);

		Ok(Self {
			address: address.to_string(),
			binding,
			provider,
			reader,
			secret_key,
			in_flight: AtomicBool::new(false),
		})
	}

	pub fn address(&self) -> &str {
		&self.address
	}
}

#[async_trait]
impl ContractActions for DeployedContract {
	async fn submit_proof(
		&self,
		activity_value: u32,
		heart_rate_value: u32,
	) -> Result<SubmissionReceipt, OperationError> {
		let _guard = InFlight::acquire(&self.in_flight)?;

		let call = self.binding.submit_proof_call(
			&self.address,
			activity_value,
			heart_rate_value,
			&self.secret_key,
		)?;
		let proven = self
			.provider
			.balance_tx(UnbalancedTransaction::from_call(call), Vec::new())
			.await?;
		let receipt = self
			.provider
			.submit_tx(&proven)
			.await
			.inspect_err(|e| warn!("Submission to {} failed: {}", self.address, e))?;
		Ok(receipt)
	}

	async fn read_ledger(&self) -> Result<Option<LedgerView>, OperationError> {
		let _guard = InFlight::acquire(&self.in_flight)?;
		Ok(self.reader.read(&self.address).await?)
	}
}
