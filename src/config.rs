//! Client configuration.
//!
//! Read from the process environment. `main` loads an optional `.env` first.

use crate::transaction::types::NetworkId;
use crate::utils::{HexKeyError, decode_hex_32};
use crate::wallet::WalletSeed;

use std::fmt;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("{0} must be set")]
	Missing(&'static str),

	#[error("{name} is invalid: {reason}")]
	Invalid { name: &'static str, reason: String },

	#[error("{name} must be a 32-byte hex string: {source}")]
	Key {
		name: &'static str,
		#[source]
		source: HexKeyError,
	},
}

/// 32-byte secret the contract derives the caller's identity from. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey([u8; 32]);

impl SecretKey {
	pub fn as_bytes(&self) -> &[u8; 32] {
		&self.0
	}
}

impl From<[u8; 32]> for SecretKey {
	fn from(bytes: [u8; 32]) -> Self {
		Self(bytes)
	}
}

impl fmt::Debug for SecretKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("SecretKey(<redacted>)")
	}
}

/// Service endpoints of one network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
	pub node_url: String,
	pub indexer_url: String,
	pub indexer_ws_url: String,
	pub proof_server_url: String,
}

impl NetworkConfig {
	/// Well-known endpoints, if the network has any.
	pub fn defaults_for(network_id: NetworkId) -> Option<Self> {
		match network_id {
			NetworkId::TestNet => Some(Self {
				node_url: "wss://rpc.testnet-02.midnight.network".to_string(),
				indexer_url: "https://indexer.testnet-02.midnight.network/api/v1/graphql".to_string(),
				indexer_ws_url: "wss://indexer.testnet-02.midnight.network/api/v1/graphql/ws"
					.to_string(),
				proof_server_url: "http://localhost:6300".to_string(),
			}),
			NetworkId::Undeployed => Some(Self {
				node_url: "ws://127.0.0.1:9944".to_string(),
				indexer_url: "http://127.0.0.1:8088/api/v1/graphql".to_string(),
				indexer_ws_url: "ws://127.0.0.1:8088/api/v1/graphql/ws".to_string(),
				proof_server_url: "http://127.0.0.1:6300".to_string(),
			}),
			NetworkId::DevNet | NetworkId::MainNet => None,
		}
	}
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
	pub network_id: NetworkId,
	pub network: NetworkConfig,
	pub wallet_seed: WalletSeed,
	pub secret_key: SecretKey,
	pub contract_name: String,
	pub deployment_file: String,
	pub sync_timeout: Duration,
	pub proof_server_max_elapsed: Duration,
}

impl ClientConfig {
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Builds the configuration from `lookup`, which returns the value of a variable if set.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

		let network_id = match var("NETWORK_ID") {
			Some(value) => value.parse::<NetworkId>().map_err(|other| ConfigError::Invalid {
				name: "NETWORK_ID",
				reason: format!("unknown network '{}'", other),
			})?,
			None => NetworkId::TestNet,
		};

		let defaults = NetworkConfig::defaults_for(network_id);
		let endpoint = |name: &'static str, default: Option<&String>| {
			var(name)
				.or_else(|| default.cloned())
				.ok_or(ConfigError::Missing(name))
		};
		let network = NetworkConfig {
			node_url: endpoint("NODE_URL", defaults.as_ref().map(|d| &d.node_url))?,
			indexer_url: endpoint("INDEXER_URL", defaults.as_ref().map(|d| &d.indexer_url))?,
			indexer_ws_url: endpoint(
				"INDEXER_WS_URL",
				defaults.as_ref().map(|d| &d.indexer_ws_url),
			)?,
			proof_server_url: endpoint(
				"PROOF_SERVER_URL",
				defaults.as_ref().map(|d| &d.proof_server_url),
			)?,
		};

		let seed_hex = var("WALLET_SEED").ok_or(ConfigError::Missing("WALLET_SEED"))?;
		let wallet_seed = WalletSeed::from_hex(&seed_hex).map_err(|source| ConfigError::Key {
			name: "WALLET_SEED",
			source,
		})?;

		let (key_name, key_hex) = match var("CONTRACT_SECRET_KEY") {
			Some(key) => ("CONTRACT_SECRET_KEY", key),
			None => ("WALLET_SEED", seed_hex),
		};
		let secret_key = decode_hex_32(&key_hex)
			.map(SecretKey)
			.map_err(|source| ConfigError::Key {
				name: key_name,
				source,
			})?;

		let seconds = |name: &'static str, default: u64| -> Result<Duration, ConfigError> {
			match var(name) {
				Some(value) => value
					.trim()
					.parse()
					.map(Duration::from_secs)
					.map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
						name,
						reason: e.to_string(),
					}),
				None => Ok(Duration::from_secs(default)),
			}
		};

		Ok(Self {
			network_id,
			network,
			wallet_seed,
			secret_key,
			contract_name: var("CONTRACT_NAME").unwrap_or_else(|| "health".to_string()),
			deployment_file: var("DEPLOYMENT_FILE").unwrap_or_else(|| "deployment.json".to_string()),
			sync_timeout: seconds("SYNC_TIMEOUT_SECS", 600)?,
			proof_server_max_elapsed: seconds("PROOF_SERVER_MAX_ELAPSED_SECS", 30)?,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;

	const SEED: &str = "2e347e236daa04faad881f1dc5dc3b8a9b4e8e4429e9d0728aad78ada199b66b";
	const OTHER: &str = "0x0101010101010101010101010101010101010101010101010101010101010101";

	fn config(vars: &[(&str, &str)]) -> Result<ClientConfig, ConfigError> {
		let vars: HashMap<String, String> = vars
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect();
		ClientConfig::from_lookup(|name| vars.get(name).cloned())
	}

	#[test]
	fn testnet_defaults_apply() {
		let defaults = config(&[("WALLET_SEED", SEED)]).unwrap();
		assert_eq!(defaults.network_id, NetworkId::TestNet);
		assert_eq!(defaults.network.node_url, "wss://rpc.testnet-02.midnight.network");
		assert_eq!(defaults.contract_name, "health");
		assert_eq!(defaults.deployment_file, "deployment.json");
		assert_eq!(defaults.sync_timeout, Duration::from_secs(600));
		assert_eq!(defaults.proof_server_max_elapsed, Duration::from_secs(30));
	}

	#[test]
	fn secret_key_falls_back_to_wallet_seed() {
		let fallback = config(&[("WALLET_SEED", SEED)]).unwrap();
		assert_eq!(fallback.secret_key.as_bytes(), &decode_hex_32(SEED).unwrap());

		let explicit = config(&[("WALLET_SEED", SEED), ("CONTRACT_SECRET_KEY", OTHER)]).unwrap();
		assert_eq!(explicit.secret_key.as_bytes(), &[1u8; 32]);
	}

	#[test]
	fn malformed_secret_keys_are_rejected() {
		let short = &SEED[..63];
		let long = format!("{}0", SEED);

		for bad in [short, long.as_str()] {
			let err = config(&[("WALLET_SEED", SEED), ("CONTRACT_SECRET_KEY", bad)]).unwrap_err();
			assert!(matches!(
				err,
				ConfigError::Key {
					name: "CONTRACT_SECRET_KEY",
					..
				}
			));
		}

		let err = config(&[("WALLET_SEED", short)]).unwrap_err();
		assert!(matches!(err, ConfigError::Key { name: "WALLET_SEED", .. }));
	}

	#[test]
	fn wallet_seed_is_required() {
		assert!(matches!(
			config(&[]),
			Err(ConfigError::Missing("WALLET_SEED"))
		));
	}

	#[test]
	fn networks_without_defaults_need_explicit_endpoints() {
		let err = config(&[("WALLET_SEED", SEED), ("NETWORK_ID", "devnet")]).unwrap_err();
		assert!(matches!(err, ConfigError::Missing("NODE_URL")));

		let devnet = config(&[
			("WALLET_SEED", SEED),
			("NETWORK_ID", "devnet"),
			("NODE_URL", "wss://node"),
			("INDEXER_URL", "https://indexer"),
			("INDEXER_WS_URL", "wss://indexer/ws"),
			("PROOF_SERVER_URL", "http://prover"),
		])
		.unwrap();
		assert_eq!(devnet.network_id, NetworkId::DevNet);
		assert_eq!(devnet.network.proof_server_url, "http://prover");
	}

	#[test]
	fn bad_numbers_and_networks_are_reported() {
		assert!(matches!(
			config(&[("WALLET_SEED", SEED), ("NETWORK_ID", "moon")]),
			Err(ConfigError::Invalid { name: "NETWORK_ID", .. })
		));
		assert!(matches!(
			config(&[("WALLET_SEED", SEED), ("SYNC_TIMEOUT_SECS", "soon")]),
			Err(ConfigError::Invalid {
				name: "SYNC_TIMEOUT_SECS",
				..
			})
		));
	}

	#[test]
	fn debug_output_hides_secrets() {
		let printed = format!("{:?}", config(&[("WALLET_SEED", SEED)]).unwrap());
		assert!(!printed.contains(SEED));
		assert!(printed.contains("<redacted>"));
	}
}
