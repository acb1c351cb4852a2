//! Progress tracking for wallet synchronization.
//!
//! This module provides the `SyncProgressTracker`, which records the blockchain indices the
//! wallet has applied and the latest progress reported by the indexer, and decides when the
//! wallet counts as synced.

use std::collections::BTreeSet;
use tracing::{info, warn};

/// Service for tracking synchronization progress
#[derive(Debug, Clone, Default)]
pub struct SyncProgressTracker {
    /// The highest blockchain index we've processed
    highest_processed_index: u64,
    /// All blockchain indices we've processed
    processed_indices: BTreeSet<u64>,
    /// Total transactions processed
    transactions_processed: usize,
    /// Total Merkle updates processed
    merkle_updates_processed: usize,
    /// Highest index known to the indexer
    highest_index: u64,
    /// Highest index relevant to this wallet
    highest_relevant_wallet_index: u64,
    /// Whether a progress update has been seen yet
    progress_seen: bool,
    /// Last index at which we logged progress
    last_logged_index: u64,
}

impl SyncProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that we processed data at a specific index
    pub fn record_processed(&mut self, index: u64) {
        self.highest_processed_index = self.highest_processed_index.max(index);
        self.processed_indices.insert(index);
    }

    /// Record a processed transaction at the given index
    pub fn record_transaction(&mut self, index: u64) {
        self.record_processed(index);
        self.transactions_processed += 1;
    }

    /// Record a processed Merkle update at the given index
    pub fn record_merkle_update(&mut self, index: u64) {
        self.record_processed(index);
        self.merkle_updates_processed += 1;
    }

    /// Record a progress update from the indexer
    pub fn record_progress(&mut self, highest_index: u64, highest_relevant_wallet_index: u64) {
        self.highest_index = highest_index;
        self.highest_relevant_wallet_index = highest_relevant_wallet_index;
        self.progress_seen = true;
    }

    pub fn highest_processed_index(&self) -> u64 {
        self.highest_processed_index
    }

    pub fn highest_index(&self) -> u64 {
        self.highest_index
    }

    /// Synced once the indexer has reported progress and every wallet-relevant index has
    /// been applied.
    pub fn is_synced(&self) -> bool {
        self.progress_seen
            && self.highest_index >= self.highest_relevant_wallet_index
            && self.highest_processed_index >= self.highest_relevant_wallet_index
    }

    /// Returns (start, end) pairs around missing index ranges.
    pub fn check_for_gaps(&self) -> Vec<(u64, u64)> {
        let indices: Vec<u64> = self.processed_indices.iter().copied().collect();
        indices
            .windows(2)
            .filter(|w| w[1] - w[0] > 1)
            .map(|w| (w[0], w[1]))
            .collect()
    }

    /// Log progress every 1000 indices or when forced
    pub fn log_progress(&mut self, force: bool) {
        let blocks_since_last_log = self
            .highest_processed_index
            .saturating_sub(self.last_logged_index);
        if force || blocks_since_last_log >= 1000 {
            info!(
                "Sync progress: {} transactions, {} Merkle updates processed up to index {} of {}",
                self.transactions_processed,
                self.merkle_updates_processed,
                self.highest_processed_index,
                self.highest_index
            );
            self.last_logged_index = self.highest_processed_index;
        }
    }

    /// Warn about gaps once sync completes
    pub fn report_gaps(&self) {
        for (start, end) in self.check_for_gaps() {
            warn!(
                "Gap detected: missing indices between {} and {}",
                start, end
            );
        }
    }
}
