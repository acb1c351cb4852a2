//! Unspent coin tracking and coin selection.

use super::keys::WalletKeys;
use crate::transaction::builder::TransactionError;
use crate::transaction::types::{CoinInfo, FeeSchedule, NATIVE_TOKEN, Nullifier, ProvenTransaction};

use std::collections::HashMap;
use tracing::debug;

/// Unspent coins owned by the wallet, keyed by the nullifier that spends them.
#[derive(Debug, Clone, Default)]
pub struct CoinBook {
	coins: HashMap<Nullifier, CoinInfo>,
}

impl CoinBook {
	pub fn insert(&mut self, keys: &WalletKeys, coin: CoinInfo) {
		self.coins.insert(keys.nullifier(&coin), coin);
	}

	pub fn len(&self) -> usize {
		self.coins.len()
	}

	pub fn is_empty(&self) -> bool {
		self.coins.is_empty()
	}

	pub fn native_balance(&self) -> u128 {
		self.native_coins().iter().map(|c| c.value).sum()
	}

	pub fn native_coins(&self) -> Vec<CoinInfo> {
		self.coins
			.values()
			.filter(|c| c.token_type == NATIVE_TOKEN)
			.copied()
			.collect()
	}

	/// Applies a transaction seen on the ledger.
	///
	/// Inputs spending our coins are removed and outputs owned by `keys` are added. Returns
	/// the number of coins spent and received.
	pub fn apply(&mut self, keys: &WalletKeys, tx: &ProvenTransaction) -> (usize, usize) {
		let spent = tx
			.offer
			.inputs
			.iter()
			.filter(|input| self.coins.remove(&input.nullifier).is_some())
			.count();

		let mut received = 0;
		for output in tx.offer.outputs.iter().filter(|o| o.owner == keys.coin_public_key) {
			self.insert(keys, output.coin);
			received += 1;
		}

		debug!("Applied transaction: {} coins spent, {} received", spent, received);
		(spent, received)
	}
}

/// Coins chosen to fund a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinSelection {
	pub inputs: Vec<CoinInfo>,
	pub fee: u128,
	pub change: u128,
}

/// Picks native coins, largest first, until they and `credit` cover the fee.
///
/// The fee always accounts for one change output.
pub fn select_coins(
	mut candidates: Vec<CoinInfo>,
	fee_schedule: &FeeSchedule,
	calls: usize,
	credit: u128,
) -> Result<CoinSelection, TransactionError> {
	candidates.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.nonce.cmp(&b.nonce)));

	let available = candidates
		.iter()
		.fold(credit, |acc, c| acc.saturating_add(c.value));

	let mut inputs = Vec::new();
	let mut total = credit;
	let mut remaining = candidates.into_iter();
	loop {
		let fee = fee_schedule.fee(calls, inputs.len(), 1);
		if total >= fee {
			return Ok(CoinSelection {
				inputs,
				fee,
				change: total - fee,
			});
		}
		match remaining.next() {
			Some(coin) => {
				total = total.saturating_add(coin.value);
				inputs.push(coin);
			}
			None => {
				return Err(TransactionError::InsufficientFunds {
					required: fee,
					available,
				});
			}
		}
	}
}
