//! Types for GraphQL indexer integration with session management

use serde::{Deserialize, Serialize};

/// Transaction application stage from the indexer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub enum ApplyStage {
    /// Transaction is still pending
    Pending,
    /// Transaction succeeded entirely
    SucceedEntirely,
    /// Transaction succeeded partially
    SucceedPartially,
    /// Transaction failed entirely
    FailEntirely,
}

impl ApplyStage {
    /// Check if the transaction should be applied to the wallet state
    pub fn should_apply(&self) -> bool {
        matches!(
            self,
            ApplyStage::SucceedEntirely | ApplyStage::SucceedPartially
        )
    }
}

/// Transaction data from the indexer containing transaction details and application status.
///
/// This struct represents a transaction as returned by the indexer, including its hash, optional identifiers,
/// raw data, application stage, Merkle tree root, and protocol version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionData {
    /// The transaction hash.
    pub hash: String,
    /// Optional list of identifiers associated with the transaction.
    pub identifiers: Option<Vec<String>>,
    /// Optional raw transaction data as a hex string.
    pub raw: Option<String>,
    /// The application stage of the transaction (pending, succeeded, failed, etc.).
    #[serde(rename = "applyStage")]
    pub apply_stage: Option<ApplyStage>,
    /// Optional Merkle tree root associated with the transaction.
    #[serde(rename = "merkleTreeRoot")]
    pub merkle_tree_root: Option<String>,
    /// Optional protocol version for the transaction.
    #[serde(rename = "protocolVersion")]
    pub protocol_version: Option<u32>,
}

/// Public state of a deployed contract as reported by the indexer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractState {
    /// Kind of contract action that produced this state (`ContractDeploy`, `ContractCall`, ...).
    #[serde(rename = "__typename", default)]
    pub action: String,
    /// Hex-encoded contract state.
    #[serde(rename = "state")]
    pub data: String,
}

/// Events emitted during wallet synchronization via GraphQL subscription.
///
/// This enum represents the different event types that can be received from the indexer during wallet sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WalletSyncEvent {
    /// A viewing update event, containing Merkle updates and/or relevant transactions.
    ViewingUpdate {
        #[serde(rename = "__typename")]
        type_name: String,
        /// The blockchain index for this update.
        index: u64,
        /// The list of Zswap chain state updates (transactions or Merkle updates).
        update: Vec<ZswapChainStateUpdate>,
    },
    /// A progress update event, reporting sync progress indices.
    ProgressUpdate {
        #[serde(rename = "__typename")]
        type_name: String,
        /// The highest blockchain index seen.
        #[serde(rename = "highestIndex")]
        highest_index: u64,
        /// The highest relevant index for the wallet.
        #[serde(rename = "highestRelevantIndex")]
        highest_relevant_index: u64,
        /// The highest relevant wallet index.
        #[serde(rename = "highestRelevantWalletIndex")]
        highest_relevant_wallet_index: u64,
    },
}

/// Updates to the Zswap chain state, including transactions and Merkle tree updates.
///
/// This enum represents either a relevant transaction or a Merkle tree collapsed update.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "__typename")]
pub enum ZswapChainStateUpdate {
    /// A relevant transaction update.
    RelevantTransaction {
        /// The transaction data.
        transaction: TransactionData,
        /// The start index for the transaction (optional, defaults to 0).
        #[serde(default)]
        start: u64,
        /// The end index for the transaction (optional, defaults to 0).
        #[serde(default)]
        end: u64,
    },
    /// A collapsed Merkle tree update.
    MerkleTreeCollapsedUpdate {
        /// The protocol version for the update (optional, defaults to 0).
        #[serde(rename = "protocolVersion", default)]
        protocol_version: u32,
        /// The start index of the update range (optional, defaults to 0).
        #[serde(default)]
        start: u64,
        /// The end index of the update range (optional, defaults to 0).
        #[serde(default)]
        end: u64,
        /// The update data as a string (optional, defaults to empty string).
        #[serde(default)]
        update: String,
    },
}

/// Formats for wallet viewing keys used to query the indexer.
///
/// This enum represents the supported viewing key formats for wallet queries.
#[derive(Debug, Clone)]
pub enum ViewingKeyFormat {
    /// Bech32m format (preferred): mn_shield-esk_dev1...
    Bech32m(String),
}

impl ViewingKeyFormat {
    /// Get the viewing key as a string for API calls
    pub fn as_str(&self) -> &str {
        match self {
            ViewingKeyFormat::Bech32m(key) => key,
        }
    }
}

/// Error types for indexer operations and session management
#[derive(Debug, thiserror::Error)]
pub enum IndexerError {
    #[error("GraphQL error: {0}")]
    GraphQLError(String),

    #[error("No data returned")]
    NoData,

    #[error("WebSocket error: {0}")]
    WebSocketError(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Session error: {0}")]
    SessionError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_progress_update() {
        let event: WalletSyncEvent = serde_json::from_value(json!({
            "__typename": "ProgressUpdate",
            "highestIndex": 120,
            "highestRelevantIndex": 80,
            "highestRelevantWalletIndex": 75
        }))
        .unwrap();
        assert!(matches!(
            event,
            WalletSyncEvent::ProgressUpdate {
                highest_index: 120,
                highest_relevant_wallet_index: 75,
                ..
            }
        ));
    }

    #[test]
    fn parses_viewing_update_with_both_update_kinds() {
        let event: WalletSyncEvent = serde_json::from_value(json!({
            "__typename": "ViewingUpdate",
            "index": 9,
            "update": [
                {
                    "__typename": "MerkleTreeCollapsedUpdate",
                    "protocolVersion": 1,
                    "start": 0,
                    "end": 8,
                    "update": "00ff"
                },
                {
                    "__typename": "RelevantTransaction",
                    "transaction": {
                        "hash": "abcd",
                        "identifiers": null,
                        "raw": "6d69646e69676874",
                        "applyStage": "SucceedEntirely",
                        "merkleTreeRoot": null,
                        "protocolVersion": 1
                    },
                    "start": 8,
                    "end": 9
                }
            ]
        }))
        .unwrap();

        let WalletSyncEvent::ViewingUpdate { index, update, .. } = event else {
            panic!("expected a viewing update");
        };
        assert_eq!(index, 9);
        assert_eq!(update.len(), 2);
        match &update[1] {
            ZswapChainStateUpdate::RelevantTransaction { transaction, .. } => {
                assert_eq!(transaction.apply_stage, Some(ApplyStage::SucceedEntirely));
                assert!(transaction.apply_stage.as_ref().is_some_and(|s| s.should_apply()));
            }
            other => panic!("unexpected update {:?}", other),
        }
    }

    #[test]
    fn parses_contract_state() {
        let state: ContractState = serde_json::from_value(json!({
            "__typename": "ContractCall",
            "state": "0101050000"
        }))
        .unwrap();
        assert_eq!(state.data, "0101050000");
        assert_eq!(state.action, "ContractCall");
    }
}
