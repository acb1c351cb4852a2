//! Wallet-backed provider used by deployed contracts to fund, prove and submit calls.

use super::MidnightWallet;
use super::sync::WalletStateStream;
use super::types::WalletSyncError;
use crate::transaction::builder::{ProvenTransactionBuilder, TransactionError};
use crate::transaction::generator::midnight::SubmissionError;
use crate::transaction::types::{
	CoinInfo, CoinPublicKey, EncryptionPublicKey, NetworkIds, ProvenTransaction, SubmissionReceipt,
	UnbalancedTransaction,
};
use crate::wallet::Wallet;

use tracing::info;

pub struct WalletProvider {
	wallet: MidnightWallet,
	network_ids: NetworkIds,
}

impl WalletProvider {
	pub fn new(wallet: MidnightWallet, network_ids: NetworkIds) -> Self {
		Self {
			wallet,
			network_ids,
		}
	}

	pub fn coin_public_key(&self) -> CoinPublicKey {
		self.wallet.keys().coin_public_key
	}

	pub fn encryption_public_key(&self) -> EncryptionPublicKey {
		self.wallet.keys().encryption_public_key
	}

	/// Balances and proves `tx`. See [`ProvenTransactionBuilder::build`].
	pub async fn balance_tx(
		&self,
		tx: UnbalancedTransaction,
		new_coins: Vec<CoinInfo>,
	) -> Result<ProvenTransaction, TransactionError> {
		ProvenTransactionBuilder::new(&self.wallet, self.network_ids)
			.with_new_coins(new_coins)
			.build(tx)
			.await
	}

	pub async fn submit_tx(
		&self,
		tx: &ProvenTransaction,
	) -> Result<SubmissionReceipt, SubmissionError> {
		self.wallet.submit_transaction(tx).await
	}

	pub async fn state(&self) -> Result<WalletStateStream, WalletSyncError> {
		self.wallet.state().await
	}

	/// Releases the wallet's indexer session.
	pub async fn close(&self) -> Result<(), WalletSyncError> {
		info!("Closing wallet");
		self.wallet.close().await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_utils::{FakeChain, FakeProver, test_wallet_with_coins};
	use crate::transaction::types::{ContractCall, NetworkId};
	use std::sync::Arc;

	#[tokio::test]
	async fn balance_then_submit_returns_receipt() {
		let chain = Arc::new(FakeChain::default());
		let wallet = test_wallet_with_coins(&[120_000], FakeProver::honest(), chain.clone());
		let provider = WalletProvider::new(wallet, NetworkIds::uniform(NetworkId::TestNet));

		let tx = UnbalancedTransaction::from_call(ContractCall {
			address: "0200".to_string(),
			entry_point: "noop".to_string(),
			args: Vec::new(),
		});
		let proven = provider.balance_tx(tx, Vec::new()).await.unwrap();
		let receipt = provider.submit_tx(&proven).await.unwrap();

		assert!(receipt.tx_id.starts_with("0x"));
		assert_eq!(receipt.block_height, 1);
		assert_eq!(chain.submitted(), 1);
	}
}
