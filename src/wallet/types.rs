use crate::indexer::IndexerError;
use crate::transaction::types::{CoinPublicKey, EncryptionPublicKey};

/// How far the wallet has caught up with the ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncProgress {
	pub synced: bool,
	/// Highest blockchain index the wallet has applied
	pub applied_index: u64,
	/// Highest blockchain index known to the indexer
	pub highest_index: u64,
}

/// Snapshot of wallet identity and sync state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletState {
	pub coin_public_key: CoinPublicKey,
	pub encryption_public_key: EncryptionPublicKey,
	pub sync_progress: SyncProgress,
	/// Spendable native balance in dust
	pub balance: u128,
}

/// Errors raised while synchronizing the wallet
#[allow(clippy::enum_variant_names)]
#[derive(Debug, thiserror::Error)]
pub enum WalletSyncError {
	#[error("Indexer error: {0}")]
	IndexerError(#[from] IndexerError),

	#[error("Session error: {0}")]
	SessionError(String),

	#[error("Viewing key error: {0}")]
	ViewingKeyError(String),

	#[error("Wallet sync never completed: {0}")]
	SyncNeverCompleted(String),
}
