//! Wallet Synchronization Module
//!
//! Turns the indexer's wallet subscription into a stream of [`WalletState`] snapshots and
//! provides the barrier that holds the session back until the wallet is synced.
//!
//! - `progress_tracker`: tracks processed indices and decides when the wallet counts as synced.

/// Tracks synchronization progress and statistics
pub mod progress_tracker;

use crate::indexer::{IndexerError, TransactionData, WalletSyncEvent, ZswapChainStateUpdate};
use crate::transaction::codec;
use crate::transaction::types::{NetworkId, ProvenTransaction};
use crate::wallet::coins::CoinBook;
use crate::wallet::keys::WalletKeys;
use crate::wallet::types::{SyncProgress, WalletState, WalletSyncError};
use progress_tracker::SyncProgressTracker;

use futures_util::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

pub type WalletStateStream = Pin<Box<dyn Stream<Item = WalletState> + Send>>;

/// Waits for the first snapshot reporting the wallet as synced.
///
/// Unsynced snapshots are skipped. Fails with `SyncNeverCompleted` if the stream ends first.
pub async fn await_sync<S>(mut states: S) -> Result<WalletState, WalletSyncError>
where
	S: Stream<Item = WalletState> + Unpin,
{
	while let Some(state) = states.next().await {
		if state.sync_progress.synced {
			info!(
				"Wallet synced at index {} (balance {} dust)",
				state.sync_progress.applied_index, state.balance
			);
			return Ok(state);
		}
		debug!(
			"Wallet syncing: applied {} of {}",
			state.sync_progress.applied_index, state.sync_progress.highest_index
		);
	}

	Err(WalletSyncError::SyncNeverCompleted(
		"wallet state stream ended before the wallet synced".to_string(),
	))
}

/// [`await_sync`] bounded by `timeout`; expiry also counts as never completing.
pub async fn await_sync_within<S>(states: S, timeout: Duration) -> Result<WalletState, WalletSyncError>
where
	S: Stream<Item = WalletState> + Unpin,
{
	tokio::time::timeout(timeout, await_sync(states))
		.await
		.map_err(|_| {
			WalletSyncError::SyncNeverCompleted(format!(
				"wallet not synced after {} seconds",
				timeout.as_secs()
			))
		})?
}

/// Maps indexer wallet events to wallet snapshots, applying relevant transactions to `coins`.
pub fn wallet_states<E>(
	events: E,
	keys: WalletKeys,
	network_id: NetworkId,
	coins: Arc<Mutex<CoinBook>>,
) -> WalletStateStream
where
	E: Stream<Item = Result<WalletSyncEvent, IndexerError>> + Send + 'static,
{
	let tracker = Arc::new(Mutex::new(SyncProgressTracker::new()));

	Box::pin(events.then(move |event| {
		let keys = keys.clone();
		let coins = coins.clone();
		let tracker = tracker.clone();
		async move {
			let mut tracker = tracker.lock().await;
			match event {
				Ok(event) => apply_event(event, &keys, network_id, &mut tracker, &coins).await,
				Err(e) => error!("Error in wallet subscription: {}", e),
			}

			let balance = coins.lock().await.native_balance();
			WalletState {
				coin_public_key: keys.coin_public_key,
				encryption_public_key: keys.encryption_public_key,
				sync_progress: SyncProgress {
					synced: tracker.is_synced(),
					applied_index: tracker.highest_processed_index(),
					highest_index: tracker.highest_index(),
				},
				balance,
			}
		}
	}))
}

async fn apply_event(
	event: WalletSyncEvent,
	keys: &WalletKeys,
	network_id: NetworkId,
	tracker: &mut SyncProgressTracker,
	coins: &Mutex<CoinBook>,
) {
	match event {
		WalletSyncEvent::ViewingUpdate { index, update, .. } => {
			tracker.record_processed(index);
			for item in update {
				match item {
					ZswapChainStateUpdate::RelevantTransaction { transaction, .. } => {
						let applies = transaction
							.apply_stage
							.as_ref()
							.is_none_or(|stage| stage.should_apply());
						if !applies {
							debug!("Skipping failed transaction {}", transaction.hash);
						} else if let Some(tx) = parse_relevant(&transaction, network_id) {
							coins.lock().await.apply(keys, &tx);
						}
						tracker.record_transaction(index);
					}
					ZswapChainStateUpdate::MerkleTreeCollapsedUpdate { start, end, .. } => {
						debug!(
							"Merkle tree collapsed update at index {}: start={}, end={}",
							index, start, end
						);
						tracker.record_merkle_update(index);
					}
				}
			}
			tracker.log_progress(false);
		}
		WalletSyncEvent::ProgressUpdate {
			highest_index,
			highest_relevant_wallet_index,
			..
		} => {
			debug!(
				"Progress update - highest: {}, wallet: {}, processed up to: {}",
				highest_index,
				highest_relevant_wallet_index,
				tracker.highest_processed_index()
			);
			tracker.record_progress(highest_index, highest_relevant_wallet_index);
			if tracker.is_synced() {
				tracker.log_progress(true);
				tracker.report_gaps();
			}
		}
	}
}

fn parse_relevant(data: &TransactionData, network_id: NetworkId) -> Option<ProvenTransaction> {
	let Some(raw_hex) = data.raw.as_deref() else {
		warn!("Transaction {} has no raw data to process", data.hash);
		return None;
	};
	let bytes = match hex::decode(raw_hex) {
		Ok(bytes) => bytes,
		Err(e) => {
			warn!("Transaction {} is not valid hex: {}", data.hash, e);
			return None;
		}
	};
	match codec::deserialize(&bytes, network_id) {
		Ok(tx) => Some(tx),
		Err(e) => {
			warn!("Failed to deserialize transaction {}: {}", data.hash, e);
			None
		}
	}
}
