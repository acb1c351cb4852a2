use bech32::{Bech32m, Hrp};
use thiserror::Error;

use crate::transaction::types::{CoinPublicKey, EncryptionPublicKey, NetworkId};

#[derive(Error, Debug)]
pub enum MidnightAddressError {
	#[error("prefix first part != 'mn'")]
	PrefixInvalidConstant,
	#[error("prefix missing type")]
	PrefixMissingType,
	#[error("bech32 decode error: {0}")]
	Decode(#[from] bech32::DecodeError),
	#[error("bech32 encode error: {0}")]
	Encode(#[from] bech32::EncodeError),
	#[error("invalid human-readable part: {0}")]
	Hrp(#[from] bech32::primitives::hrp::Error),
}

#[derive(Debug, Clone)]
pub struct MidnightAddress {
	pub type_: String,
	pub network: Option<String>,
	pub data: Vec<u8>,
}

impl MidnightAddress {
	pub fn decode(encoded_data: &str) -> Result<Self, MidnightAddressError> {
		let (hrp, data) = bech32::decode(encoded_data)?;
		let prefix_parts = hrp.as_str().split('_').collect::<Vec<&str>>();
		prefix_parts
			.first()
			.filter(|c| *c == &"mn")
			.ok_or(MidnightAddressError::PrefixInvalidConstant)?;
		let type_ = prefix_parts
			.get(1)
			.ok_or(MidnightAddressError::PrefixMissingType)?
			.to_string();
		let network = prefix_parts.get(2).map(|s| s.to_string());

		Ok(Self {
			type_,
			network,
			data,
		})
	}

	pub fn encode(&self) -> Result<String, MidnightAddressError> {
		let network_str = match &self.network {
			Some(network) => format!("_{}", network),
			None => "".to_string(),
		};

		let hrp = Hrp::parse(&format!("mn_{}{}", self.type_, network_str))?;
		Ok(bech32::encode::<Bech32m>(hrp, &self.data)?)
	}

	/// Shielded address of a wallet: coin public key followed by encryption public key.
	pub fn shielded(
		coin_public_key: &CoinPublicKey,
		encryption_public_key: &EncryptionPublicKey,
		network: NetworkId,
	) -> Self {
		Self {
			type_: "shield-addr".to_string(),
			network: network.address_suffix().map(str::to_string),
			data: [&coin_public_key.0[..], &encryption_public_key.0[..]].concat(),
		}
	}

	/// Viewing key handed to the indexer to find the wallet's relevant transactions.
	pub fn viewing_key(encryption_secret_key: &[u8; 32], network: NetworkId) -> Self {
		Self {
			type_: "shield-esk".to_string(),
			network: network.address_suffix().map(str::to_string),
			data: encryption_secret_key.to_vec(),
		}
	}
}

impl TryFrom<&MidnightAddress> for NetworkId {
	type Error = String;

	fn try_from(value: &MidnightAddress) -> Result<Self, Self::Error> {
		match value.network {
			Some(ref network) => match network.as_str() {
				"dev" => Ok(NetworkId::DevNet),
				"test" => Ok(NetworkId::TestNet),
				"undeployed" => Ok(NetworkId::Undeployed),
				_ => Err(network.to_string()),
			},
			None => Ok(NetworkId::MainNet),
		}
	}
}
