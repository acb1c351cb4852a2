//!
//! Midnight transaction generator module.
//!
//! Provides bech32m address encoding, the remote proof server client and the node sender.
//! The proof server and the node are reached through the [`ProofProvider`] and
//! [`TransactionSubmitter`] seams so the balancing pipeline can be exercised offline.
/// Address encoding/decoding utilities for Midnight
pub mod address;
/// Remote proof server integration
pub mod remote_prover;
/// Transaction sender utilities
pub mod sender;

pub use remote_prover::{ProofProvider, RemoteProofServer};
pub use sender::{Sender, SubmissionError, TransactionSubmitter};
