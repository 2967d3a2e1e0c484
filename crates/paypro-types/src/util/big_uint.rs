//! Serde helpers for integer amounts wider than `u64`.
//!
//! Amounts in wei routinely exceed `u64::MAX`. They are read through
//! [`serde_json::Number`], which keeps every digit when serde_json's
//! `arbitrary_precision` feature is on, both from raw JSON text and from an
//! already parsed [`serde_json::Value`].
//!
//! Use with `#[serde(with = "crate::util::big_uint")]` on a `u128` field.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u128(*value)
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
    let number = serde_json::Number::deserialize(deserializer)?;
    number
        .to_string()
        .parse::<u128>()
        .map_err(|_| DeError::custom(format!("expected a non-negative integer, got {number}")))
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Amount {
        #[serde(with = "super")]
        amount: u128,
    }

    #[test]
    fn test_above_u64_from_text_and_value() {
        let text = r#"{"amount":25000000000000000000}"#;
        let from_text: Amount = serde_json::from_str(text).unwrap();
        assert_eq!(from_text.amount, 25_000_000_000_000_000_000);

        let value: serde_json::Value = serde_json::from_str(text).unwrap();
        let from_value: Amount = serde_json::from_value(value).unwrap();
        assert_eq!(from_value, from_text);

        assert_eq!(serde_json::to_string(&from_text).unwrap(), text);
    }

    #[test]
    fn test_rejects_negative_and_fractional() {
        assert!(serde_json::from_value::<Amount>(json!({ "amount": -1 })).is_err());
        assert!(serde_json::from_value::<Amount>(json!({ "amount": 1.5 })).is_err());
        assert!(serde_json::from_value::<Amount>(json!({ "amount": "10" })).is_err());
    }
}
