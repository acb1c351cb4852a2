//!
//! Transaction sender utilities for the Midnight blockchain.
//!
//! Provides a sender for submitting proven transactions to the Midnight node using Subxt,
//! waiting for finalization and reporting the block the transaction landed in.

use crate::transaction::codec;
use crate::transaction::types::{NetworkId, ProvenTransaction, SubmissionReceipt};

use async_trait::async_trait;
use subxt::{
	OnlineClient, PolkadotConfig,
	dynamic::Value,
	tx::{TxProgress, TxStatus},
};
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Error, Debug)]
pub enum SubmissionError {
	#[error("Submission rejected: {0}")]
	Rejected(String),

	#[error("Network error: {0}")]
	Network(String),
}

impl From<subxt::Error> for SubmissionError {
	fn from(err: subxt::Error) -> Self {
		match err {
			subxt::Error::Runtime(e) => SubmissionError::Rejected(format!("{:?}", e)),
			subxt::Error::Transaction(e) => SubmissionError::Rejected(e.to_string()),
			other => SubmissionError::Network(other.to_string()),
		}
	}
}

/// Hands proven transactions to the ledger node.
#[async_trait]
pub trait TransactionSubmitter: Send + Sync {
	async fn submit(&self, tx: &ProvenTransaction) -> Result<SubmissionReceipt, SubmissionError>;
}

/// Transaction sender for submitting transactions to the Midnight network
pub struct Sender {
	network_id: NetworkId,
	api: OnlineClient<PolkadotConfig>,
}

impl Sender {
	/// Creates a new transaction sender
	pub fn new(network_id: NetworkId, api: OnlineClient<PolkadotConfig>) -> Self {
		Self { network_id, api }
	}

	/// Connects to the node RPC endpoint. Plain `ws://` URLs are only used for local nodes.
	pub async fn connect(network_id: NetworkId, url: &str) -> Result<Self, subxt::Error> {
		let api = if url.starts_with("ws://") {
			OnlineClient::<PolkadotConfig>::from_insecure_url(url).await?
		} else {
			OnlineClient::<PolkadotConfig>::from_url(url).await?
		};
		info!("Connected to node at {}", url);
		Ok(Self::new(network_id, api))
	}

	async fn send_tx_no_wait(
		&self,
		tx: &ProvenTransaction,
	) -> Result<
		(
			String,
			TxProgress<PolkadotConfig, OnlineClient<PolkadotConfig>>,
		),
		SubmissionError,
	> {
		let bytes = codec::serialize(tx, self.network_id).map_err(|e| {
			SubmissionError::Rejected(format!("failed to serialize transaction: {}", e))
		})?;
		let mn_tx = subxt::dynamic::tx(
			"Midnight",
			"send_mn_transaction",
			vec![Value::from_bytes(hex::encode(bytes).into_bytes())],
		);

		let unsigned_extrinsic = self.api.tx().create_unsigned(&mn_tx)?;
		let tx_hash_string = format!("0x{}", hex::encode(unsigned_extrinsic.hash().as_bytes()));

		match unsigned_extrinsic.validate().await? {
			subxt::tx::ValidationResult::Valid(_) => {
				debug!("Transaction validated successfully");
			}
			subxt::tx::ValidationResult::Invalid(e) => {
				error!("Transaction validation failed: {:?}", e);
				return Err(SubmissionError::Rejected(format!(
					"Transaction validation failed: {:?}",
					e
				)));
			}
			subxt::tx::ValidationResult::Unknown(e) => {
				error!("Transaction validation unknown: {:?}", e);
				return Err(SubmissionError::Rejected(format!(
					"Transaction validation unknown: {:?}",
					e
				)));
			}
		}

		debug!("SENDING {}", tx_hash_string);
		let tx_progress = unsigned_extrinsic.submit_and_watch().await?;
		debug!("SENT {}", tx_hash_string);
		Ok((tx_hash_string, tx_progress))
	}

	async fn wait_for_finalized(
		&self,
		tx_hash: &str,
		mut progress: TxProgress<PolkadotConfig, OnlineClient<PolkadotConfig>>,
	) -> Result<u64, SubmissionError> {
		while let Some(status) = progress.next().await {
			match status? {
				TxStatus::InBestBlock(in_block) => {
					debug!("BEST_BLOCK - Block hash: {:?}", in_block.block_hash());
				}
				TxStatus::InFinalizedBlock(in_block) => {
					let block_hash = in_block.block_hash();
					debug!("FINALIZED - Block hash: {:?}", block_hash);

					if let Err(e) = in_block.wait_for_success().await {
						error!("Transaction {} failed in finalized block: {:?}", tx_hash, e);
						return Err(e.into());
					}

					let block = self.api.blocks().at(block_hash).await?;
					return Ok(u64::from(block.number()));
				}
				TxStatus::Invalid { message } | TxStatus::Dropped { message } => {
					error!("Transaction {} was not included: {}", tx_hash, message);
					return Err(SubmissionError::Rejected(message));
				}
				TxStatus::Error { message } => {
					return Err(SubmissionError::Network(message));
				}
				_ => debug!("Transaction {} status update", tx_hash),
			}
		}

		error!("FAILED_TO_FINALIZE");
		Err(SubmissionError::Network(
			"transaction status stream ended before finalization".to_string(),
		))
	}
}

#[async_trait]
impl TransactionSubmitter for Sender {
	/// Sends a transaction and waits for it to be finalized
	async fn submit(&self, tx: &ProvenTransaction) -> Result<SubmissionReceipt, SubmissionError> {
		let (tx_id, progress) = self.send_tx_no_wait(tx).await?;
		let block_height = self.wait_for_finalized(&tx_id, progress).await?;
		info!("Transaction {} finalized at height {}", tx_id, block_height);
		Ok(SubmissionReceipt {
			tx_id,
			block_height,
			submitted_at: chrono::Utc::now(),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn subxt_errors_split_into_rejections_and_network_failures() {
		let err: SubmissionError = subxt::Error::Other("connection reset".to_string()).into();
		assert!(matches!(err, SubmissionError::Network(msg) if msg.contains("connection reset")));

		let invalid = subxt::Error::Transaction(subxt::error::TransactionError::Invalid(
			"bad proof".to_string(),
		));
		let err: SubmissionError = invalid.into();
		assert!(matches!(err, SubmissionError::Rejected(msg) if msg.contains("bad proof")));

		let dropped = subxt::Error::Transaction(subxt::error::TransactionError::Dropped(
			"pool full".to_string(),
		));
		let err: SubmissionError = dropped.into();
		assert!(matches!(err, SubmissionError::Rejected(msg) if msg.contains("pool full")));
	}
}
