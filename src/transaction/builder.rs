//! Balancing pipeline for contract-call transactions
//!
//! Turns an unbalanced transaction into a proven one in four ordered stages: bridge to the
//! zswap representation, balance, prove, bridge back to the ledger representation. Each stage
//! either succeeds or aborts the whole build; nothing is retried here.

use super::codec::{self, CodecError};
use super::types::{CoinInfo, NetworkIds, ProvenTransaction, UnbalancedTransaction};
use crate::wallet::Wallet;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransactionError {
	#[error("Serialization mismatch: {0}")]
	SerializationMismatch(#[from] CodecError),

	#[error("Insufficient funds: required {required} dust, available {available} dust")]
	InsufficientFunds { required: u128, available: u128 },

	#[error("Proof service unavailable: {0}")]
	ProofServiceUnavailable(String),

	#[error("Proof generation failed: {0}")]
	ProofGenerationFailed(String),
}

/// Builder that drives an unbalanced transaction through balancing and proving
pub struct ProvenTransactionBuilder<'a> {
	/// Wallet that funds and proves the transaction
	wallet: &'a dyn Wallet,
	/// Network identifiers of the ledger and zswap representations
	network_ids: NetworkIds,
	/// Coins minted to the wallet by the call, usable for balancing
	new_coins: Vec<CoinInfo>,
}

impl<'a> ProvenTransactionBuilder<'a> {
	/// Creates a new builder for the given wallet
	pub fn new(wallet: &'a dyn Wallet, network_ids: NetworkIds) -> Self {
		Self {
			wallet,
			network_ids,
			new_coins: Vec::new(),
		}
	}

	/// Sets the coins minted by the call
	pub fn with_new_coins(mut self, new_coins: Vec<CoinInfo>) -> Self {
		self.new_coins = new_coins;
		self
	}

	/// Builds the proven transaction
	pub async fn build(
		self,
		tx: UnbalancedTransaction,
	) -> Result<ProvenTransaction, TransactionError> {
		log::info!("Starting transaction build process");

		let NetworkIds { ledger, zswap } = self.network_ids;

		log::debug!("Bridging transaction from ledger ({}) to zswap ({})", ledger, zswap);
		let zswap_tx = codec::bridge(&tx, ledger, zswap)?;

		log::info!("Balancing transaction...");
		let balanced = self
			.wallet
			.balance_transaction(zswap_tx, self.new_coins)
			.await?;
		log::info!(
			"Balanced transaction with {} inputs, {} outputs, fee {} dust",
			balanced.offer.inputs.len(),
			balanced.offer.outputs.len(),
			balanced.fee
		);

		log::info!("Starting proof generation...");
		let proven = self.wallet.prove_transaction(balanced.clone()).await?;

		if !proven.matches(&balanced) {
			log::error!("Proven transaction does not match the balanced transaction");
			return Err(TransactionError::ProofGenerationFailed(
				"proof server returned a different transaction".to_string(),
			));
		}
		if !proven.offer.is_balanced(proven.fee) {
			log::error!("Proven transaction is not balanced");
			return Err(TransactionError::ProofGenerationFailed(
				"proven transaction is not balanced".to_string(),
			));
		}
		log::info!("Proof generation completed successfully");

		log::debug!("Bridging proven transaction from zswap ({}) to ledger ({})", zswap, ledger);
		Ok(codec::bridge(&proven, zswap, ledger)?)
	}
}
