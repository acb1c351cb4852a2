//!
//! Remote proof server integration for Midnight zero-knowledge proofs.
//!
//! Provides a client for submitting balanced transactions to a remote proof server and
//! retrieving the proven transactions required for submission to the Midnight network.

use crate::transaction::builder::TransactionError;
use crate::transaction::codec;
use crate::transaction::types::{BalancedTransaction, NetworkId, ProvenTransaction};

use async_trait::async_trait;
use backoff::{ExponentialBackoff, future::retry};
use std::time::Duration;
use tracing::{debug, warn};

/// Attaches validity proofs to balanced transactions.
#[async_trait]
pub trait ProofProvider: Send + Sync {
	async fn prove(&self, tx: BalancedTransaction) -> Result<ProvenTransaction, TransactionError>;
}

/// Remote proof server client for generating zero-knowledge proofs
pub struct RemoteProofServer {
	url: String,
	network_id: NetworkId,
	client: reqwest::Client,
	max_elapsed: Duration,
}

impl RemoteProofServer {
	/// Creates a new remote proof server client
	pub fn new(url: String, network_id: NetworkId) -> Result<Self, reqwest::Error> {
		let client = reqwest::ClientBuilder::new()
			.pool_idle_timeout(None)
			.timeout(Duration::from_secs(300))
			.build()?;
		Ok(Self {
			url,
			network_id,
			client,
			max_elapsed: Duration::from_secs(30),
		})
	}

	/// Bounds how long unreachable-server errors are retried before giving up
	pub fn with_max_elapsed(mut self, max_elapsed: Duration) -> Self {
		self.max_elapsed = max_elapsed;
		self
	}

	fn endpoint(&self) -> Result<reqwest::Url, TransactionError> {
		reqwest::Url::parse(&self.url)
			.and_then(|url| url.join("prove-tx"))
			.map_err(|e| {
				TransactionError::ProofServiceUnavailable(format!(
					"invalid proof server URL {}: {}",
					self.url, e
				))
			})
	}
}

#[async_trait]
impl ProofProvider for RemoteProofServer {
	async fn prove(&self, tx: BalancedTransaction) -> Result<ProvenTransaction, TransactionError> {
		let url = self.endpoint()?;
		let body = codec::serialize(&tx, self.network_id).map_err(|e| {
			TransactionError::ProofGenerationFailed(format!("failed to serialize transaction: {}", e))
		})?;

		let policy = ExponentialBackoff {
			initial_interval: Duration::from_millis(100),
			max_elapsed_time: Some(self.max_elapsed),
			..ExponentialBackoff::default()
		};

		let response_bytes = retry(policy, || async {
			let resp = self
				.client
				.post(url.clone())
				.body(body.clone())
				.send()
				.await
				.map_err(|e| {
					warn!("Proof Server Send Error: {}", e);
					backoff::Error::transient(TransactionError::ProofServiceUnavailable(
						e.to_string(),
					))
				})?;

			let status = resp.status();
			let resp_bytes = resp.bytes().await.map_err(|e| {
				warn!("Proof Server to Bytes Error: {}", e);
				backoff::Error::transient(TransactionError::ProofServiceUnavailable(e.to_string()))
			})?;

			if !status.is_success() {
				warn!("Proof Server Response Error: {}", status);
				return Err(backoff::Error::permanent(
					TransactionError::ProofGenerationFailed(format!(
						"proof server responded {}: {}",
						status,
						String::from_utf8_lossy(&resp_bytes)
					)),
				));
			}

			Ok::<Vec<u8>, backoff::Error<TransactionError>>(resp_bytes.to_vec())
		})
		.await?;

		if response_bytes.is_empty() {
			return Err(TransactionError::ProofGenerationFailed(
				"proof server returned empty response".to_string(),
			));
		}
		debug!("Proof server returned {} bytes", response_bytes.len());

		let proven: ProvenTransaction = codec::deserialize(&response_bytes, self.network_id)
			.map_err(|e| {
				TransactionError::ProofGenerationFailed(format!(
					"failed to deserialize proven transaction: {}",
					e
				))
			})?;

		if !proven.matches(&tx) {
			return Err(TransactionError::ProofGenerationFailed(
				"proof server returned a different transaction".to_string(),
			));
		}
		Ok(proven)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::transaction::types::Offer;

	fn balanced() -> BalancedTransaction {
		BalancedTransaction {
			calls: Vec::new(),
			offer: Offer::default(),
			fee: 0,
		}
	}

	#[tokio::test]
	async fn unreachable_server_is_unavailable() {
		let server = RemoteProofServer::new("http://127.0.0.1:1/".to_string(), NetworkId::TestNet)
			.unwrap()
			.with_max_elapsed(Duration::from_millis(300));

		let err = server.prove(balanced()).await.unwrap_err();
		assert!(matches!(err, TransactionError::ProofServiceUnavailable(_)));
	}

	#[tokio::test]
	async fn malformed_url_is_unavailable() {
		let server = RemoteProofServer::new("not a url".to_string(), NetworkId::TestNet).unwrap();
		let err = server.prove(balanced()).await.unwrap_err();
		assert!(matches!(err, TransactionError::ProofServiceUnavailable(_)));
	}
}
