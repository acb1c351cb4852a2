//! Decoding of public contract state.
//!
//! State bytes are a sequence of cells: a tag byte, a width byte and `width` little-endian
//! value bytes. Only unsigned integer cells are used by the contracts this client knows.

use thiserror::Error;

const TAG_UINT: u8 = 0x01;
const MAX_UINT_WIDTH: u8 = 16;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum LedgerDecodeError {
	#[error("state is not valid hex: {0}")]
	InvalidHex(String),

	#[error("unexpected end of state at byte {0}")]
	Truncated(usize),

	#[error("unknown cell tag {tag:#04x} at byte {offset}")]
	UnknownTag { tag: u8, offset: usize },

	#[error("invalid cell width {width} at byte {offset}")]
	InvalidWidth { width: u8, offset: usize },

	#[error("value of `{field}` does not fit in 64 bits")]
	Overflow { field: &'static str },

	#[error("{0} trailing bytes after the last field")]
	TrailingBytes(usize),
}

/// Reads cells off raw contract state in order.
pub struct StateCursor<'a> {
	bytes: &'a [u8],
	offset: usize,
}

impl<'a> StateCursor<'a> {
	pub fn new(bytes: &'a [u8]) -> Self {
		Self { bytes, offset: 0 }
	}

	fn take(&mut self, n: usize) -> Result<&'a [u8], LedgerDecodeError> {
		let end = self
			.offset
			.checked_add(n)
			.filter(|end| *end <= self.bytes.len())
			.ok_or(LedgerDecodeError::Truncated(self.bytes.len()))?;
		let slice = &self.bytes[self.offset..end];
		self.offset = end;
		Ok(slice)
	}

	fn uint(&mut self) -> Result<u128, LedgerDecodeError> {
		let offset = self.offset;
		let tag = self.take(1)?[0];
		if tag != TAG_UINT {
			return Err(LedgerDecodeError::UnknownTag { tag, offset });
		}
		let width = self.take(1)?[0];
		if width == 0 || width > MAX_UINT_WIDTH {
			return Err(LedgerDecodeError::InvalidWidth {
				width,
				offset: offset + 1,
			});
		}
		let mut buf = [0u8; 16];
		buf[..width as usize].copy_from_slice(self.take(width as usize)?);
		Ok(u128::from_le_bytes(buf))
	}

	/// Next cell as a `u64` named `field` for error reporting.
	pub fn u64(&mut self, field: &'static str) -> Result<u64, LedgerDecodeError> {
		u64::try_from(self.uint()?).map_err(|_| LedgerDecodeError::Overflow { field })
	}

	/// Fails if any bytes remain unread.
	pub fn finish(self) -> Result<(), LedgerDecodeError> {
		match self.bytes.len() - self.offset {
			0 => Ok(()),
			rest => Err(LedgerDecodeError::TrailingBytes(rest)),
		}
	}
}

/// Encodes unsigned cells with the narrowest width that holds each value.
#[cfg(test)]
pub(crate) fn encode_uints(values: &[u128]) -> Vec<u8> {
	let mut out = Vec::new();
	for value in values {
		let bytes = value.to_le_bytes();
		let width = bytes.iter().rposition(|b| *b != 0).map_or(1, |i| i + 1);
		out.push(TAG_UINT);
		out.push(width as u8);
		out.extend_from_slice(&bytes[..width]);
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn reads_cells_in_order() {
		let bytes = encode_uints(&[5, 70_000, 0]);
		let mut cursor = StateCursor::new(&bytes);
		assert_eq!(cursor.u64("a"), Ok(5));
		assert_eq!(cursor.u64("b"), Ok(70_000));
		assert_eq!(cursor.u64("c"), Ok(0));
		assert_eq!(cursor.finish(), Ok(()));
	}

	#[test]
	fn rejects_malformed_cells() {
		let mut cursor = StateCursor::new(&[0x02, 0x01, 0x00]);
		assert_eq!(
			cursor.u64("a"),
			Err(LedgerDecodeError::UnknownTag { tag: 2, offset: 0 })
		);

		let mut cursor = StateCursor::new(&[0x01, 17]);
		assert!(matches!(
			cursor.u64("a"),
			Err(LedgerDecodeError::InvalidWidth { width: 17, .. })
		));

		let mut cursor = StateCursor::new(&[0x01, 0x04, 0xff]);
		assert_eq!(cursor.u64("a"), Err(LedgerDecodeError::Truncated(3)));
	}

	#[test]
	fn rejects_values_wider_than_u64() {
		let bytes = encode_uints(&[u64::MAX as u128 + 1]);
		let mut cursor = StateCursor::new(&bytes);
		assert_eq!(
			cursor.u64("goal_count"),
			Err(LedgerDecodeError::Overflow {
				field: "goal_count"
			})
		);
	}

	#[test]
	fn reports_trailing_bytes() {
		let mut bytes = encode_uints(&[1]);
		bytes.push(0);
		let mut cursor = StateCursor::new(&bytes);
		cursor.u64("a").unwrap();
		assert_eq!(cursor.finish(), Err(LedgerDecodeError::TrailingBytes(1)));
	}
}
