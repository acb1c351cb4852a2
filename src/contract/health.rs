//! Binding for the `health` contract.
//!
//! Users submit activity and heart-rate readings; the contract keeps running sums and a
//! count of goals reached.

use super::state::{LedgerDecodeError, StateCursor};
use super::{ContractBinding, ContractError, LedgerView};
use crate::config::SecretKey;
use crate::transaction::types::ContractCall;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const IDENTITY_DOMAIN: &[u8] = b"midnight:health:pk:";

/// Arguments of the `submitProof` circuit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct SubmitProofArgs {
	pub activity_value: u32,
	pub heart_rate_value: u32,
	/// Contract-local identity of the submitter.
	pub identity: [u8; 32],
}

pub struct HealthContract;

impl HealthContract {
	pub const SUBMIT_PROOF: &'static str = "submitProof";

	/// Public identity derived from the contract secret key.
	pub fn identity(secret_key: &SecretKey) -> [u8; 32] {
		let mut hasher = Sha256::new();
		hasher.update(IDENTITY_DOMAIN);
		hasher.update(secret_key.as_bytes());
		hasher.finalize().into()
	}
}

impl ContractBinding for HealthContract {
	fn name(&self) -> &'static str {
		"health"
	}

	fn submit_proof_call(
		&self,
		address: &str,
		activity_value: u32,
		heart_rate_value: u32,
		secret_key: &SecretKey,
	) -> Result<ContractCall, ContractError> {
		let args = SubmitProofArgs {
			activity_value,
			heart_rate_value,
			identity: Self::identity(secret_key),
		};
		Ok(ContractCall {
			address: address.to_string(),
			entry_point: Self::SUBMIT_PROOF.to_string(),
			args: bincode::serialize(&args)?,
		})
	}

	fn ledger(&self, raw: &[u8]) -> Result<LedgerView, LedgerDecodeError> {
		let mut cursor = StateCursor::new(raw);
		let view = LedgerView {
			activity_sum: cursor.u64("activity_sum")?,
			heart_rate_sum: cursor.u64("heart_rate_sum")?,
			goal_count: cursor.u64("goal_count")?,
		};
		cursor.finish()?;
		Ok(view)
	}
}
