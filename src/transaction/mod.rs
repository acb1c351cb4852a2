/// Balancing pipeline turning contract calls into proven transactions
pub mod builder;
/// Network-tagged wire encoding
pub mod codec;
/// Transaction generator utilities
pub mod generator {
	pub mod midnight;
}
/// Transaction model
pub mod types;

/// Number of decimal places for the Midnight native token (tDUST).
pub const MIDNIGHT_TOKEN_DECIMALS: u32 = 6;
