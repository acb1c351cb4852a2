//! In-memory stand-ins for the proof server, the node and the indexer.

use crate::contract::PublicDataProvider;
use crate::contract::health::{HealthContract, SubmitProofArgs};
use crate::contract::state::encode_uints;
use crate::indexer::{ContractState, IndexerError};
use crate::transaction::builder::TransactionError;
use crate::transaction::generator::midnight::{ProofProvider, SubmissionError, TransactionSubmitter};
use crate::transaction::types::{
	BalancedTransaction, CoinInfo, NATIVE_TOKEN, NetworkId, NetworkIds, Proof, ProvenTransaction,
	SubmissionReceipt,
};
use crate::wallet::{MidnightWallet, WalletSeed};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Activity value at or above which the fake health circuit counts a goal.
pub const GOAL_ACTIVITY: u32 = 10_000;

#[derive(Debug, Clone, Copy)]
enum ProverMode {
	Honest,
	Unavailable,
	Tampering,
}

/// Proof provider that proves locally, or fails the way the remote server can.
#[derive(Clone)]
pub struct FakeProver {
	mode: ProverMode,
	pub calls: Arc<AtomicUsize>,
}

impl FakeProver {
	fn with_mode(mode: ProverMode) -> Self {
		Self {
			mode,
			calls: Arc::new(AtomicUsize::new(0)),
		}
	}

	pub fn honest() -> Self {
		Self::with_mode(ProverMode::Honest)
	}

	pub fn unavailable() -> Self {
		Self::with_mode(ProverMode::Unavailable)
	}

	/// Returns a transaction with a different fee than the one it was given.
	pub fn tampering() -> Self {
		Self::with_mode(ProverMode::Tampering)
	}
}

#[async_trait]
impl ProofProvider for FakeProver {
	async fn prove(&self, tx: BalancedTransaction) -> Result<ProvenTransaction, TransactionError> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		let proof = Proof(
			Sha256::digest(bincode::serialize(&tx).map_err(|e| {
				TransactionError::ProofGenerationFailed(e.to_string())
			})?)
			.to_vec(),
		);
		match self.mode {
			ProverMode::Honest => Ok(ProvenTransaction {
				calls: tx.calls,
				offer: tx.offer,
				fee: tx.fee,
				proof,
			}),
			ProverMode::Unavailable => Err(TransactionError::ProofServiceUnavailable(
				"connection refused".to_string(),
			)),
			ProverMode::Tampering => Ok(ProvenTransaction {
				calls: tx.calls,
				offer: tx.offer,
				fee: tx.fee + 1,
				proof,
			}),
		}
	}
}

#[derive(Default)]
struct ChainState {
	submitted: usize,
	raw_states: HashMap<String, String>,
}

/// Node and indexer in one: accepted submissions update the health contract state served
/// back through [`PublicDataProvider`].
#[derive(Default)]
pub struct FakeChain {
	state: Mutex<ChainState>,
	rejecting: bool,
	offline: AtomicBool,
}

impl FakeChain {
	/// A chain whose node rejects every submission.
	pub fn rejecting() -> Self {
		Self {
			rejecting: true,
			..Self::default()
		}
	}

	pub fn submitted(&self) -> usize {
		self.state.lock().unwrap().submitted
	}

	pub fn set_raw_state(&self, address: &str, raw_hex: &str) {
		self.state
			.lock()
			.unwrap()
			.raw_states
			.insert(address.to_string(), raw_hex.to_string());
	}

	/// While offline, state queries fail like an unreachable indexer.
	pub fn set_offline(&self, offline: bool) {
		self.offline.store(offline, Ordering::SeqCst);
	}

	fn apply_health_call(raw_states: &mut HashMap<String, String>, address: &str, args: &SubmitProofArgs) {
		use crate::contract::ContractBinding;

		let current = raw_states
			.get(address)
			.and_then(|raw| hex::decode(raw).ok())
			.and_then(|raw| HealthContract.ledger(&raw).ok())
			.unwrap_or_default();
		let goal = u128::from(args.activity_value >= GOAL_ACTIVITY);
		let next = encode_uints(&[
			u128::from(current.activity_sum) + u128::from(args.activity_value),
			u128::from(current.heart_rate_sum) + u128::from(args.heart_rate_value),
			u128::from(current.goal_count) + goal,
		]);
		raw_states.insert(address.to_string(), hex::encode(next));
	}
}

#[async_trait]
impl TransactionSubmitter for FakeChain {
	async fn submit(&self, tx: &ProvenTransaction) -> Result<SubmissionReceipt, SubmissionError> {
		if self.rejecting {
			return Err(SubmissionError::Rejected("invalid transaction".to_string()));
		}

		let mut state = self.state.lock().unwrap();
		for call in &tx.calls {
			if call.entry_point == HealthContract::SUBMIT_PROOF {
				let args: SubmitProofArgs = bincode::deserialize(&call.args)
					.map_err(|e| SubmissionError::Rejected(e.to_string()))?;
				Self::apply_health_call(&mut state.raw_states, &call.address, &args);
			}
		}
		state.submitted += 1;

		let tx_hash = Sha256::digest(&tx.proof.0);
		Ok(SubmissionReceipt {
			tx_id: format!("0x{}", hex::encode(tx_hash)),
			block_height: state.submitted as u64,
			submitted_at: chrono::Utc::now(),
		})
	}
}

#[async_trait]
impl TransactionSubmitter for Arc<FakeChain> {
	async fn submit(&self, tx: &ProvenTransaction) -> Result<SubmissionReceipt, SubmissionError> {
		FakeChain::submit(self, tx).await
	}
}

#[async_trait]
impl PublicDataProvider for FakeChain {
	async fn query_contract_state(
		&self,
		address: &str,
	) -> Result<Option<ContractState>, IndexerError> {
		if self.offline.load(Ordering::SeqCst) {
			return Err(IndexerError::GraphQLError("HTTP error: 503".to_string()));
		}
		Ok(self
			.state
			.lock()
			.unwrap()
			.raw_states
			.get(address)
			.map(|data| ContractState {
				action: "ContractCall".to_string(),
				data: data.clone(),
			}))
	}
}

/// Wallet on testnet owning one native coin per value, backed by `chain`.
pub fn test_wallet_with_coins(
	values: &[u128],
	prover: FakeProver,
	chain: Arc<FakeChain>,
) -> MidnightWallet {
	let coins = values
		.iter()
		.enumerate()
		.map(|(i, value)| CoinInfo {
			nonce: [i as u8 + 1; 32],
			token_type: NATIVE_TOKEN,
			value: *value,
		})
		.collect();

	MidnightWallet::builder()
		.with_seed(WalletSeed::from([7; 32]))
		.with_network_ids(NetworkIds::uniform(NetworkId::TestNet))
		.with_coins(coins)
		.with_proof_provider(Box::new(prover))
		.with_submitter(Box::new(chain))
		.build()
		.unwrap()
}
