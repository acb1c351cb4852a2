//! Wallet key material derived from the wallet seed.

use crate::transaction::generator::midnight::address::MidnightAddress;
use crate::transaction::types::{CoinInfo, CoinPublicKey, EncryptionPublicKey, NetworkId, Nullifier};
use crate::utils::{HexKeyError, decode_hex_32};

use sha2::{Digest, Sha256};
use std::fmt;

fn domain_hash(domain: &[u8], parts: &[&[u8]]) -> [u8; 32] {
	let mut hasher = Sha256::new();
	hasher.update(domain);
	for part in parts {
		hasher.update(part);
	}
	hasher.finalize().into()
}

/// 32-byte wallet seed. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct WalletSeed([u8; 32]);

impl WalletSeed {
	pub fn from_hex(input: &str) -> Result<Self, HexKeyError> {
		decode_hex_32(input).map(Self)
	}
}

impl From<[u8; 32]> for WalletSeed {
	fn from(bytes: [u8; 32]) -> Self {
		Self(bytes)
	}
}

impl fmt::Debug for WalletSeed {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("WalletSeed(<redacted>)")
	}
}

/// Secret and public keys of one wallet.
#[derive(Clone)]
pub struct WalletKeys {
	coin_secret_key: [u8; 32],
	encryption_secret_key: [u8; 32],
	pub coin_public_key: CoinPublicKey,
	pub encryption_public_key: EncryptionPublicKey,
}

impl WalletKeys {
	pub fn from_seed(seed: &WalletSeed) -> Self {
		let coin_secret_key = domain_hash(b"midnight:csk", &[&seed.0]);
		let encryption_secret_key = domain_hash(b"midnight:esk", &[&seed.0]);
		Self {
			coin_public_key: CoinPublicKey(domain_hash(b"midnight:cpk", &[&coin_secret_key])),
			encryption_public_key: EncryptionPublicKey(domain_hash(
				b"midnight:epk",
				&[&encryption_secret_key],
			)),
			coin_secret_key,
			encryption_secret_key,
		}
	}

	/// Nullifier revealed when `coin` is spent by this wallet.
	pub fn nullifier(&self, coin: &CoinInfo) -> Nullifier {
		Nullifier(domain_hash(
			b"midnight:nullifier",
			&[&coin.nonce, &coin.token_type.0, &self.coin_secret_key],
		))
	}

	pub fn viewing_key(&self, network: NetworkId) -> MidnightAddress {
		MidnightAddress::viewing_key(&self.encryption_secret_key, network)
	}

	pub fn shielded_address(&self, network: NetworkId) -> MidnightAddress {
		MidnightAddress::shielded(&self.coin_public_key, &self.encryption_public_key, network)
	}
}

impl fmt::Debug for WalletKeys {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("WalletKeys")
			.field("coin_public_key", &self.coin_public_key)
			.field("encryption_public_key", &self.encryption_public_key)
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::transaction::types::NATIVE_TOKEN;

	#[test]
	fn derivation_is_deterministic_and_seed_specific() {
		let a = WalletKeys::from_seed(&WalletSeed::from([1; 32]));
		let b = WalletKeys::from_seed(&WalletSeed::from([1; 32]));
		let c = WalletKeys::from_seed(&WalletSeed::from([2; 32]));
		assert_eq!(a.coin_public_key, b.coin_public_key);
		assert_ne!(a.coin_public_key, c.coin_public_key);
		assert_ne!(a.coin_public_key.0, a.encryption_public_key.0);
	}

	#[test]
	fn nullifiers_depend_on_owner_and_nonce() {
		let a = WalletKeys::from_seed(&WalletSeed::from([1; 32]));
		let c = WalletKeys::from_seed(&WalletSeed::from([2; 32]));
		let coin = CoinInfo {
			nonce: [5; 32],
			token_type: NATIVE_TOKEN,
			value: 10,
		};
		let other = CoinInfo {
			nonce: [6; 32],
			..coin
		};
		assert_ne!(a.nullifier(&coin), c.nullifier(&coin));
		assert_ne!(a.nullifier(&coin), a.nullifier(&other));
	}

	#[test]
	fn debug_output_hides_secrets() {
		let seed = WalletSeed::from([0xab; 32]);
		assert_eq!(format!("{:?}", seed), "WalletSeed(<redacted>)");
		let keys = WalletKeys::from_seed(&seed);
		assert!(!format!("{:?}", keys).contains("secret"));
	}

	#[test]
	fn viewing_key_uses_shield_esk_prefix() {
		let keys = WalletKeys::from_seed(&WalletSeed::from([3; 32]));
		let encoded = keys.viewing_key(NetworkId::TestNet).encode().unwrap();
		assert!(encoded.starts_with("mn_shield-esk_test1"));
	}
}
