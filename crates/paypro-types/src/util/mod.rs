//! Utility types for paypro.
//!
//! - [`hex_bytes`] - Hex encoding/decoding wrapper with serde support
//! - [`big_uint`] - Serde helpers for `u128` amounts

pub mod big_uint;
pub mod hex_bytes;

pub use hex_bytes::*;
