//!
//! Utility module for the contract client.
//!
//! Re-exports formatting and key-decoding helpers used throughout the codebase.
/// Utility functions for formatting and decoding
pub mod index;

pub use index::{HexKeyError, decode_hex_32, format_token_amount};
