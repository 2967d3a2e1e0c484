//! Hex encoding and decoding utilities.
//!
//! This module provides [`HexBytes`], an owned byte buffer that travels as a
//! lowercase hex string in JSON and in configuration files.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::Display;
use std::ops::Deref;
use std::str::FromStr;

/// A byte buffer serialized as a hex string.
///
/// # Example
///
/// ```rust
/// use paypro_types::util::HexBytes;
///
/// let bytes: HexBytes = "03a1ff".parse().unwrap();
/// assert_eq!(bytes.as_ref(), &[0x03, 0xa1, 0xff]);
/// assert_eq!(bytes.to_string(), "03a1ff");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct HexBytes(pub Vec<u8>);

impl HexBytes {
    /// Decodes a hex string. An optional `0x` prefix is accepted.
    pub fn decode(s: &str) -> Result<Self, hex::FromHexError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        hex::decode(s).map(HexBytes)
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl Deref for HexBytes {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<[u8]> for HexBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for HexBytes {
    fn from(value: Vec<u8>) -> Self {
        HexBytes(value)
    }
}

impl From<&[u8]> for HexBytes {
    fn from(value: &[u8]) -> Self {
        HexBytes(value.to_vec())
    }
}

impl FromStr for HexBytes {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HexBytes::decode(s)
    }
}

impl Display for HexBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

impl Serialize for HexBytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for HexBytes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        HexBytes::decode(&s)
            .map_err(|e| serde::de::Error::custom(format!("invalid hex string: {e}")))
    }
}
