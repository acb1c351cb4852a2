//! Local Midnight wallet.
//!
//! Keeps the coin book, funds transactions by coin selection and delegates proving and
//! submission to the proof server and the node.

use super::Wallet;
use super::coins::{CoinBook, select_coins};
use super::keys::{WalletKeys, WalletSeed};
use super::sync::{WalletStateStream, wallet_states};
use super::types::WalletSyncError;
use crate::indexer::{MidnightIndexerClient, ViewingKeyFormat};
use crate::transaction::builder::TransactionError;
use crate::transaction::generator::midnight::{ProofProvider, SubmissionError, TransactionSubmitter};
use crate::transaction::types::{
	BalancedTransaction, CoinInfo, FeeSchedule, Input, NATIVE_TOKEN, NetworkIds, Offer, Output,
	ProvenTransaction, SubmissionReceipt, UnbalancedTransaction,
};
use crate::transaction::MIDNIGHT_TOKEN_DECIMALS;
use crate::utils::format_token_amount;

use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum WalletBuildError {
	#[error("wallet seed is required")]
	MissingSeed,
	#[error("proof provider is required")]
	MissingProofProvider,
	#[error("transaction submitter is required")]
	MissingSubmitter,
}

pub struct MidnightWallet {
	keys: WalletKeys,
	network_ids: NetworkIds,
	fee_schedule: FeeSchedule,
	coins: Arc<Mutex<CoinBook>>,
	prover: Box<dyn ProofProvider>,
	submitter: Box<dyn TransactionSubmitter>,
	indexer: Option<MidnightIndexerClient>,
	session_id: Mutex<Option<String>>,
}

impl MidnightWallet {
	pub fn builder() -> MidnightWalletBuilder {
		MidnightWalletBuilder::default()
	}

	pub fn keys(&self) -> &WalletKeys {
		&self.keys
	}

	pub async fn balance(&self) -> u128 {
		self.coins.lock().await.native_balance()
	}

	/// Opens an indexer wallet session and streams wallet snapshots as it syncs.
	pub async fn state(&self) -> Result<WalletStateStream, WalletSyncError> {
		let indexer = self.indexer.as_ref().ok_or_else(|| {
			WalletSyncError::SessionError("wallet has no indexer configured".to_string())
		})?;

		match self.keys.shielded_address(self.network_ids.zswap).encode() {
			Ok(address) => info!("Wallet address: {}", address),
			Err(e) => warn!("Failed to encode wallet address: {}", e),
		}

		let viewing_key = self
			.keys
			.viewing_key(self.network_ids.zswap)
			.encode()
			.map_err(|e| WalletSyncError::ViewingKeyError(e.to_string()))?;
		let session_id = indexer
			.connect_wallet(&ViewingKeyFormat::Bech32m(viewing_key))
			.await
			.map_err(|e| {
				WalletSyncError::SessionError(format!("Failed to connect wallet: {}", e))
			})?;
		*self.session_id.lock().await = Some(session_id.clone());

		let events = indexer.subscribe_wallet(&session_id, Some(0), Some(true)).await?;
		Ok(wallet_states(
			events,
			self.keys.clone(),
			self.network_ids.ledger,
			self.coins.clone(),
		))
	}

	/// Ends the indexer session, if one was opened.
	pub async fn close(&self) -> Result<(), WalletSyncError> {
		let session_id = self.session_id.lock().await.take();
		if let (Some(indexer), Some(session_id)) = (self.indexer.as_ref(), session_id) {
			indexer.disconnect_wallet(&session_id).await?;
			info!("Closed wallet session {}", session_id);
		}
		Ok(())
	}

	fn fresh_nonce() -> [u8; 32] {
		let mut nonce = [0u8; 32];
		rand::rng().fill(&mut nonce);
		nonce
	}
}

#[async_trait]
impl Wallet for MidnightWallet {
	async fn balance_transaction(
		&self,
		tx: UnbalancedTransaction,
		new_coins: Vec<CoinInfo>,
	) -> Result<BalancedTransaction, TransactionError> {
		let (native, foreign): (Vec<CoinInfo>, Vec<CoinInfo>) = new_coins
			.into_iter()
			.partition(|c| c.token_type == NATIVE_TOKEN);
		if !foreign.is_empty() {
			warn!("Ignoring {} new coins of non-native tokens", foreign.len());
		}
		let credit: u128 = native.iter().map(|c| c.value).sum();

		let candidates = self.coins.lock().await.native_coins();
		let selection = select_coins(candidates, &self.fee_schedule, tx.calls.len(), credit)?;
		info!(
			"Selected {} coins, fee {} tDUST, change {} tDUST",
			selection.inputs.len(),
			format_token_amount(selection.fee, MIDNIGHT_TOKEN_DECIMALS),
			format_token_amount(selection.change, MIDNIGHT_TOKEN_DECIMALS)
		);

		let inputs = selection
			.inputs
			.iter()
			.map(|coin| Input {
				nullifier: self.keys.nullifier(coin),
				token_type: coin.token_type,
				value: coin.value,
			})
			.collect();
		let outputs = if selection.change > 0 {
			vec![Output {
				coin: CoinInfo {
					nonce: Self::fresh_nonce(),
					token_type: NATIVE_TOKEN,
					value: selection.change,
				},
				owner: self.keys.coin_public_key,
			}]
		} else {
			Vec::new()
		};

		Ok(BalancedTransaction {
			calls: tx.calls,
			offer: Offer {
				inputs,
				outputs,
				minted: credit,
			},
			fee: selection.fee,
		})
	}

	async fn prove_transaction(
		&self,
		tx: BalancedTransaction,
	) -> Result<ProvenTransaction, TransactionError> {
		self.prover.prove(tx).await
	}

	async fn submit_transaction(
		&self,
		tx: &ProvenTransaction,
	) -> Result<SubmissionReceipt, SubmissionError> {
		let receipt = self.submitter.submit(tx).await?;
		self.coins.lock().await.apply(&self.keys, tx);
		Ok(receipt)
	}
}

/// Builder for [`MidnightWallet`]
#[derive(Default)]
pub struct MidnightWalletBuilder {
	seed: Option<WalletSeed>,
	network_ids: Option<NetworkIds>,
	coins: Vec<CoinInfo>,
	prover: Option<Box<dyn ProofProvider>>,
	submitter: Option<Box<dyn TransactionSubmitter>>,
	indexer: Option<MidnightIndexerClient>,
}

impl MidnightWalletBuilder {
	pub fn with_seed(mut self, seed: WalletSeed) -> Self {
		self.seed = Some(seed);
		self
	}

	pub fn with_network_ids(mut self, network_ids: NetworkIds) -> Self {
		self.network_ids = Some(network_ids);
		self
	}

	/// Seeds the coin book, e.g. with coins restored from an earlier session
	pub fn with_coins(mut self, coins: Vec<CoinInfo>) -> Self {
		self.coins = coins;
		self
	}

	pub fn with_proof_provider(mut self, prover: Box<dyn ProofProvider>) -> Self {
		self.prover = Some(prover);
		self
	}

	pub fn with_submitter(mut self, submitter: Box<dyn TransactionSubmitter>) -> Self {
		self.submitter = Some(submitter);
		self
	}

	pub fn with_indexer(mut self, indexer: MidnightIndexerClient) -> Self {
		self.indexer = Some(indexer);
		self
	}

	pub fn build(self) -> Result<MidnightWallet, WalletBuildError> {
		let seed = self.seed.ok_or(WalletBuildError::MissingSeed)?;
		let prover = self.prover.ok_or(WalletBuildError::MissingProofProvider)?;
		let submitter = self.submitter.ok_or(WalletBuildError::MissingSubmitter)?;
		let network_ids = self
			.network_ids
			.unwrap_or_else(|| NetworkIds::uniform(crate::transaction::types::NetworkId::TestNet));

		let keys = WalletKeys::from_seed(&seed);
		let mut book = CoinBook::default();
		for coin in self.coins {
			book.insert(&keys, coin);
		}

		Ok(MidnightWallet {
			keys,
			network_ids,
			fee_schedule: FeeSchedule::default(),
			coins: Arc::new(Mutex::new(book)),
			prover,
			submitter,
			indexer: self.indexer,
			session_id: Mutex::new(None),
		})
	}
}
