//! Reads and decodes the public state of a deployed contract.

use super::state::LedgerDecodeError;
use super::{ContractBinding, LedgerView};
use crate::indexer::{ContractState, IndexerError};

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Source of public contract state.
#[async_trait]
pub trait PublicDataProvider: Send + Sync {
	async fn query_contract_state(
		&self,
		address: &str,
	) -> Result<Option<ContractState>, IndexerError>;
}

#[derive(Error, Debug)]
pub enum ReadError {
	#[error("Network error: {0}")]
	Network(#[from] IndexerError),

	#[error("Ledger decode error: {0}")]
	Decode(#[from] LedgerDecodeError),
}

/// Fetches contract state and decodes it with a contract binding. Nothing is cached.
#[derive(Clone)]
pub struct LedgerStateReader {
	provider: Arc<dyn PublicDataProvider>,
	binding: Arc<dyn ContractBinding>,
}

impl LedgerStateReader {
	pub fn new(provider: Arc<dyn PublicDataProvider>, binding: Arc<dyn ContractBinding>) -> Self {
		Self { provider, binding }
	}

	/// Current ledger view, or `None` if the contract has no recorded state.
	pub async fn read(&self, contract_address: &str) -> Result<Option<LedgerView>, ReadError> {
		let Some(state) = self.provider.query_contract_state(contract_address).await? else {
			debug!("No state recorded for contract {}", contract_address);
			return Ok(None);
		};

		let raw = hex::decode(state.data.trim_start_matches("0x"))
			.map_err(|e| LedgerDecodeError::InvalidHex(e.to_string()))?;
		Ok(Some(self.binding.ledger(&raw)?))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::contract::HealthContract;
	use crate::contract::state::encode_uints;
	use crate::test_utils::FakeChain;

	const ADDRESS: &str = "0200cafe";

	fn reader(chain: Arc<FakeChain>) -> LedgerStateReader {
		LedgerStateReader::new(chain, Arc::new(HealthContract))
	}

	#[tokio::test]
	async fn absent_state_is_none() {
		let chain = Arc::new(FakeChain::default());
		assert_eq!(reader(chain).read(ADDRESS).await.unwrap(), None);
	}

	#[tokio::test]
	async fn repeated_reads_agree() {
		let chain = Arc::new(FakeChain::default());
		chain.set_raw_state(ADDRESS, &hex::encode(encode_uints(&[10, 20, 1])));
		let reader = reader(chain);

		let first = reader.read(ADDRESS).await.unwrap();
		let second = reader.read(ADDRESS).await.unwrap();
		assert_eq!(first, second);
		assert_eq!(first.map(|v| v.heart_rate_sum), Some(20));
	}

	#[tokio::test]
	async fn garbage_state_is_a_decode_error_not_absence() {
		let chain = Arc::new(FakeChain::default());
		chain.set_raw_state(ADDRESS, "zz");
		let err = reader(chain.clone()).read(ADDRESS).await.unwrap_err();
		assert!(matches!(err, ReadError::Decode(LedgerDecodeError::InvalidHex(_))));

		chain.set_raw_state(ADDRESS, "0901");
		let err = reader(chain).read(ADDRESS).await.unwrap_err();
		assert!(matches!(err, ReadError::Decode(LedgerDecodeError::UnknownTag { .. })));
	}

	#[tokio::test]
	async fn transport_failures_are_network_errors() {
		let chain = Arc::new(FakeChain::default());
		chain.set_offline(true);
		let err = reader(chain).read(ADDRESS).await.unwrap_err();
		assert!(matches!(err, ReadError::Network(_)));
	}
}
