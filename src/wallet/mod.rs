pub mod coins;
pub mod keys;
pub mod midnight_wallet;
pub mod provider;
pub mod sync;
pub mod types;

pub use keys::WalletSeed;
pub use midnight_wallet::{MidnightWallet, WalletBuildError};
pub use provider::WalletProvider;
pub use sync::await_sync_within;
pub use types::*;

use crate::transaction::builder::TransactionError;
use crate::transaction::generator::midnight::SubmissionError;
use crate::transaction::types::{
	BalancedTransaction, CoinInfo, ProvenTransaction, SubmissionReceipt, UnbalancedTransaction,
};

use async_trait::async_trait;

/// Operations the balancing pipeline needs from a wallet.
#[async_trait]
pub trait Wallet: Send + Sync {
	/// Funds `tx` from unspent coins plus `new_coins`.
	async fn balance_transaction(
		&self,
		tx: UnbalancedTransaction,
		new_coins: Vec<CoinInfo>,
	) -> Result<BalancedTransaction, TransactionError>;

	async fn prove_transaction(
		&self,
		tx: BalancedTransaction,
	) -> Result<ProvenTransaction, TransactionError>;

	async fn submit_transaction(
		&self,
		tx: &ProvenTransaction,
	) -> Result<SubmissionReceipt, SubmissionError>;
}
