//! Network-tagged wire encoding for transactions.
//!
//! Layout: `midnight:transaction:` tag, one network-id byte, then the bincode payload.
//! The ledger and zswap representations share this layout; bridging between them is a
//! serialize under one network id followed by a deserialize under the other.

use super::types::NetworkId;

use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

const TRANSACTION_TAG: &[u8] = b"midnight:transaction:";

#[derive(Error, Debug)]
pub enum CodecError {
	#[error("missing transaction tag")]
	MissingTag,

	#[error("unknown network id byte {0}")]
	UnknownNetwork(u8),

	#[error("network id mismatch: expected {expected}, found {found}")]
	NetworkMismatch {
		expected: NetworkId,
		found: NetworkId,
	},

	#[error("bincode error: {0}")]
	Bincode(#[from] bincode::Error),
}

pub fn serialize<T: Serialize>(value: &T, network_id: NetworkId) -> Result<Vec<u8>, CodecError> {
	let payload = bincode::serialize(value)?;
	let mut bytes = Vec::with_capacity(TRANSACTION_TAG.len() + 1 + payload.len());
	bytes.extend_from_slice(TRANSACTION_TAG);
	bytes.push(network_id.as_byte());
	bytes.extend_from_slice(&payload);
	Ok(bytes)
}

pub fn deserialize<T: DeserializeOwned>(
	bytes: &[u8],
	network_id: NetworkId,
) -> Result<T, CodecError> {
	let rest = bytes
		.strip_prefix(TRANSACTION_TAG)
		.ok_or(CodecError::MissingTag)?;
	let (&id_byte, payload) = rest.split_first().ok_or(CodecError::MissingTag)?;
	let found = NetworkId::from_byte(id_byte).ok_or(CodecError::UnknownNetwork(id_byte))?;
	if found != network_id {
		return Err(CodecError::NetworkMismatch {
			expected: network_id,
			found,
		});
	}
	Ok(bincode::deserialize(payload)?)
}

/// Re-reads `value` in another representation.
pub fn bridge<T: Serialize + DeserializeOwned>(
	value: &T,
	from: NetworkId,
	to: NetworkId,
) -> Result<T, CodecError> {
	deserialize(&serialize(value, from)?, to)
}
