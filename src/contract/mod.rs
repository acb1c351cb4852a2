//! Contract bindings and the handle to a deployed contract instance.
//!
//! A binding knows how to build the calls of one contract and how to decode its public
//! state. Bindings are looked up by name in a [`ContractRegistry`] once at startup.

pub mod deployed;
pub mod health;
pub mod ledger;
pub mod state;

pub use deployed::DeployedContract;
pub use health::HealthContract;
pub use ledger::{PublicDataProvider, ReadError};
pub use state::LedgerDecodeError;

use crate::config::SecretKey;
use crate::transaction::types::ContractCall;

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Decoded public state of a health contract.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerView {
	pub activity_sum: u64,
	pub heart_rate_sum: u64,
	pub goal_count: u64,
}

#[derive(Error, Debug)]
pub enum ContractError {
	#[error("Unknown contract '{0}'")]
	UnknownContract(String),

	#[error("No contract found at address {0}")]
	ContractNotFound(String),

	#[error("Failed to look up contract state: {0}")]
	Lookup(#[from] ReadError),

	#[error("Failed to encode call arguments: {0}")]
	Encoding(#[from] bincode::Error),
}

/// The calls and state decoder of one kind of contract.
pub trait ContractBinding: Send + Sync {
	fn name(&self) -> &'static str;

	/// Builds a `submitProof` call against the contract at `address`.
	fn submit_proof_call(
		&self,
		address: &str,
		activity_value: u32,
		heart_rate_value: u32,
		secret_key: &SecretKey,
	) -> Result<ContractCall, ContractError>;

	/// Decodes raw public state.
	fn ledger(&self, raw: &[u8]) -> Result<LedgerView, LedgerDecodeError>;
}

/// Contract bindings by name.
#[derive(Default, Clone)]
pub struct ContractRegistry {
	bindings: HashMap<&'static str, Arc<dyn ContractBinding>>,
}

impl ContractRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registry with every binding shipped with the client.
	pub fn with_builtin_contracts() -> Self {
		let mut registry = Self::new();
		registry.register(Arc::new(HealthContract));
		registry
	}

	pub fn register(&mut self, binding: Arc<dyn ContractBinding>) {
		self.bindings.insert(binding.name(), binding);
	}

	pub fn resolve(&self, name: &str) -> Result<Arc<dyn ContractBinding>, ContractError> {
		self.bindings
			.get(name)
			.cloned()
			.ok_or_else(|| ContractError::UnknownContract(name.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn resolves_builtin_health_binding() {
		let registry = ContractRegistry::with_builtin_contracts();
		assert_eq!(registry.resolve("health").unwrap().name(), "health");
	}

	#[test]
	fn unknown_names_are_rejected() {
		let registry = ContractRegistry::with_builtin_contracts();
		assert!(matches!(
			registry.resolve("counter"),
			Err(ContractError::UnknownContract(name)) if name == "counter"
		));
		assert!(ContractRegistry::new().resolve("health").is_err());
	}
}
