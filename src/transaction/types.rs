//! Transaction model shared by the wallet, the proof server client and the node sender.
//!
//! A contract call starts life as an [`UnbalancedTransaction`], is funded into a
//! [`BalancedTransaction`] by the wallet and leaves the proof server as a
//! [`ProvenTransaction`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Midnight network identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NetworkId {
	Undeployed,
	DevNet,
	TestNet,
	MainNet,
}

impl NetworkId {
	/// Byte embedded in serialized transactions.
	pub fn as_byte(self) -> u8 {
		match self {
			NetworkId::Undeployed => 0,
			NetworkId::DevNet => 1,
			NetworkId::TestNet => 2,
			NetworkId::MainNet => 3,
		}
	}

	pub fn from_byte(byte: u8) -> Option<Self> {
		match byte {
			0 => Some(NetworkId::Undeployed),
			1 => Some(NetworkId::DevNet),
			2 => Some(NetworkId::TestNet),
			3 => Some(NetworkId::MainNet),
			_ => None,
		}
	}

	/// Suffix used in bech32m human-readable prefixes (`mn_<type>_<suffix>`).
	pub fn address_suffix(self) -> Option<&'static str> {
		match self {
			NetworkId::MainNet => None,
			NetworkId::DevNet => Some("dev"),
			NetworkId::TestNet => Some("test"),
			NetworkId::Undeployed => Some("undeployed"),
		}
	}
}

impl fmt::Display for NetworkId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			NetworkId::Undeployed => "undeployed",
			NetworkId::DevNet => "devnet",
			NetworkId::TestNet => "testnet",
			NetworkId::MainNet => "mainnet",
		};
		f.write_str(name)
	}
}

impl FromStr for NetworkId {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"undeployed" => Ok(NetworkId::Undeployed),
			"devnet" | "dev" => Ok(NetworkId::DevNet),
			"testnet" | "test" => Ok(NetworkId::TestNet),
			"mainnet" | "main" => Ok(NetworkId::MainNet),
			other => Err(other.to_string()),
		}
	}
}

/// Network identifiers for the two transaction representations.
///
/// `ledger` is used for the node-facing wire format, `zswap` for the representation the
/// wallet balances and proves. Both are fixed at process start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkIds {
	pub ledger: NetworkId,
	pub zswap: NetworkId,
}

impl NetworkIds {
	pub fn uniform(network_id: NetworkId) -> Self {
		Self {
			ledger: network_id,
			zswap: network_id,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TokenType(pub [u8; 32]);

/// The native token (tDUST on testnet).
pub const NATIVE_TOKEN: TokenType = TokenType([0u8; 32]);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoinPublicKey(pub [u8; 32]);

impl fmt::Debug for CoinPublicKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "CoinPublicKey({})", hex::encode(self.0))
	}
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EncryptionPublicKey(pub [u8; 32]);

impl fmt::Debug for EncryptionPublicKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "EncryptionPublicKey({})", hex::encode(self.0))
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Nullifier(pub [u8; 32]);

/// A single coin: a nonce-distinguished amount of one token type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoinInfo {
	pub nonce: [u8; 32],
	pub token_type: TokenType,
	pub value: u128,
}

/// A coin being spent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Input {
	pub nullifier: Nullifier,
	pub token_type: TokenType,
	pub value: u128,
}

/// A coin being created for `owner`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
	pub coin: CoinInfo,
	pub owner: CoinPublicKey,
}

/// Guaranteed offer attached by the wallet during balancing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
	pub inputs: Vec<Input>,
	pub outputs: Vec<Output>,
	/// Native value minted to the wallet by the contract call and spent in this offer.
	pub minted: u128,
}

impl Offer {
	pub fn input_value(&self, token_type: TokenType) -> u128 {
		self.inputs
			.iter()
			.filter(|i| i.token_type == token_type)
			.map(|i| i.value)
			.sum()
	}

	pub fn output_value(&self, token_type: TokenType) -> u128 {
		self.outputs
			.iter()
			.filter(|o| o.coin.token_type == token_type)
			.map(|o| o.coin.value)
			.sum()
	}

	/// Native inputs plus minted value equal native outputs plus the fee.
	pub fn is_balanced(&self, fee: u128) -> bool {
		self.input_value(NATIVE_TOKEN).checked_add(self.minted)
			== self.output_value(NATIVE_TOKEN).checked_add(fee)
	}
}

/// Call of a contract circuit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractCall {
	pub address: String,
	pub entry_point: String,
	pub args: Vec<u8>,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof(pub Vec<u8>);

impl fmt::Debug for Proof {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Proof({} bytes)", self.0.len())
	}
}

/// A contract call before funding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnbalancedTransaction {
	pub calls: Vec<ContractCall>,
}

impl UnbalancedTransaction {
	pub fn from_call(call: ContractCall) -> Self {
		Self { calls: vec![call] }
	}
}

/// A funded transaction that has not been proven yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalancedTransaction {
	pub calls: Vec<ContractCall>,
	pub offer: Offer,
	pub fee: u128,
}

/// A balanced transaction with its validity proof attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenTransaction {
	pub calls: Vec<ContractCall>,
	pub offer: Offer,
	pub fee: u128,
	pub proof: Proof,
}

impl ProvenTransaction {
	/// Whether this transaction carries the same calls and offer as `balanced`.
	pub fn matches(&self, balanced: &BalancedTransaction) -> bool {
		self.calls == balanced.calls && self.offer == balanced.offer && self.fee == balanced.fee
	}
}

/// Result of a transaction accepted by the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
	pub tx_id: String,
	pub block_height: u64,
	pub submitted_at: chrono::DateTime<chrono::Utc>,
}

/// Fee charged for a transaction, in dust.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSchedule {
	pub base: u128,
	pub per_call: u128,
	pub per_input: u128,
	pub per_output: u128,
}

impl FeeSchedule {
	pub fn fee(&self, calls: usize, inputs: usize, outputs: usize) -> u128 {
		self.base
			+ self.per_call * calls as u128
			+ self.per_input * inputs as u128
			+ self.per_output * outputs as u128
	}
}

impl Default for FeeSchedule {
	/// One call, one input and one output costs 50,000 dust.
	fn default() -> Self {
		Self {
			base: 40_000,
			per_call: 5_000,
			per_input: 2_500,
			per_output: 2_500,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn network_id_round_trips_through_byte_and_name() {
		for id in [
			NetworkId::Undeployed,
			NetworkId::DevNet,
			NetworkId::TestNet,
			NetworkId::MainNet,
		] {
			assert_eq!(NetworkId::from_byte(id.as_byte()), Some(id));
			assert_eq!(id.to_string().parse::<NetworkId>(), Ok(id));
		}
		assert_eq!(NetworkId::from_byte(9), None);
		assert!("moonnet".parse::<NetworkId>().is_err());
	}

	#[test]
	fn offer_balance_accounts_for_minted_value() {
		let owner = CoinPublicKey([1; 32]);
		let offer = Offer {
			inputs: vec![Input {
				nullifier: Nullifier([2; 32]),
				token_type: NATIVE_TOKEN,
				value: 60_000,
			}],
			outputs: vec![Output {
				coin: CoinInfo {
					nonce: [3; 32],
					token_type: NATIVE_TOKEN,
					value: 20_000,
				},
				owner,
			}],
			minted: 10_000,
		};
		assert!(offer.is_balanced(50_000));
		assert!(!offer.is_balanced(40_000));
	}

	#[test]
	fn default_fee_for_simple_call() {
		assert_eq!(FeeSchedule::default().fee(1, 1, 1), 50_000);
	}
}
