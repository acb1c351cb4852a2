use thiserror::Error;

/// Errors raised while decoding a 32-byte hex key.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HexKeyError {
	#[error("expected 64 hex characters, found {0}")]
	WrongLength(usize),

	#[error("key contains non-hex characters")]
	InvalidHex,
}

pub fn format_token_amount(amount: u128, decimals: u32) -> String {
	format!(
		"{:.*}",
		decimals as usize,
		amount as f64 / 10f64.powi(decimals as i32)
	)
}

/// Decodes a 32-byte key from 64 hex characters, accepting an optional `0x` prefix.
pub fn decode_hex_32(input: &str) -> Result<[u8; 32], HexKeyError> {
	let trimmed = input.trim();
	let hex_str = trimmed.strip_prefix("0x").unwrap_or(trimmed);
	if hex_str.len() != 64 {
		return Err(HexKeyError::WrongLength(hex_str.len()));
	}
	let mut out = [0u8; 32];
	hex::decode_to_slice(hex_str, &mut out).map_err(|_| HexKeyError::InvalidHex)?;
	Ok(out)
}

#[cfg(test)]
mod tests {
	use super::*;

	const KEY: &str = "2e347e236daa04faad881f1dc5dc3b8a9b4e8e4429e9d0728aad78ada199b66b";

	#[test]
	fn decodes_with_and_without_prefix() {
		let plain = decode_hex_32(KEY).unwrap();
		let prefixed = decode_hex_32(&format!("0x{}", KEY)).unwrap();
		assert_eq!(plain, prefixed);
		assert_eq!(plain[0], 0x2e);
		assert_eq!(plain[31], 0x6b);
	}

	#[test]
	fn rejects_off_by_one_lengths() {
		assert_eq!(decode_hex_32(&KEY[..63]), Err(HexKeyError::WrongLength(63)));
		assert_eq!(
			decode_hex_32(&format!("{}a", KEY)),
			Err(HexKeyError::WrongLength(65))
		);
	}

	#[test]
	fn rejects_non_hex() {
		let bad = format!("zz{}", &KEY[2..]);
		assert_eq!(decode_hex_32(&bad), Err(HexKeyError::InvalidHex));
	}

	#[test]
	fn formats_dust_amounts() {
		assert_eq!(format_token_amount(1_500_000, 6), "1.500000");
		assert_eq!(format_token_amount(0, 2), "0.00");
	}
}
