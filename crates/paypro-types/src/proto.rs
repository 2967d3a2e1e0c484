//! Wire format types for the JSON payment protocol (version 2).
//!
//! All bodies are JSON objects with camelCase field names. Requests carry the
//! protocol version in the [`header::PAYPRO_VERSION`] header, and the kind of
//! request is announced through its content type (see [`content_type`]).
//!
//! # Key Types
//!
//! - [`PaymentOptions`] / [`PaymentOption`] - Response of the options step
//! - [`SelectPaymentOption`] - Body of the option selection request
//! - [`PaymentRequest`] / [`PaymentInstruction`] - Response of the selection step
//! - [`PaymentSubmission`] / [`PaymentTransaction`] - Body of the verification and payment requests
//! - [`PaymentVerification`] / [`PaymentAck`] - Responses of the verification and payment steps

use serde::{Deserialize, Serialize};
use serde_with::{VecSkipError, serde_as};
use std::fmt;
use std::fmt::Display;
use std::str::FromStr;

use crate::amount::{MinorUnits, MinorUnitsError};

/// Value of the [`header::PAYPRO_VERSION`] header sent with every request.
pub const PAYPRO_VERSION: &str = "2";

/// Header names used by the protocol.
pub mod header {
    /// Protocol version marker sent on every request.
    pub const PAYPRO_VERSION: &str = "x-paypro-version";
    /// `algorithm=hexhash` digest of the exact response body.
    pub const DIGEST: &str = "digest";
    /// Hex-encoded signature over the digest hash.
    pub const SIGNATURE: &str = "signature";
    /// Signature scheme of [`SIGNATURE`].
    pub const SIGNATURE_TYPE: &str = "x-signature-type";
    /// Identity of the signing key.
    pub const IDENTITY: &str = "x-identity";
}

/// Content types announcing each protocol step.
pub mod content_type {
    /// `Accept` value of the options request.
    pub const PAYMENT_OPTIONS: &str = "application/payment-options";
    /// `Content-Type` of the option selection request.
    pub const PAYMENT_REQUEST: &str = "application/payment-request";
    /// `Content-Type` of the unsigned transaction verification request.
    pub const PAYMENT_VERIFICATION: &str = "application/payment-verification";
    /// `Content-Type` of the signed payment request.
    pub const PAYMENT: &str = "application/payment";
}

/// Response of the options step: everything the merchant accepts for an invoice.
///
/// # Example
///
/// ```json
/// {
///   "time": "2019-06-13T18:30:37.143Z",
///   "expires": "2019-06-13T18:45:37.143Z",
///   "memo": "Payment request for BitPay invoice ...",
///   "paymentUrl": "https://bitpay.com/i/...",
///   "paymentId": "...",
///   "paymentOptions": [
///     { "chain": "BTC", "currency": "BTC", "network": "main", "estimatedAmount": 10800, "decimals": 8 }
///   ]
/// }
/// ```
#[serde_as]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,
    #[serde(default)]
    pub memo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    /// Options the merchant accepts. Entries that do not decode are skipped.
    #[serde_as(as = "VecSkipError<_>")]
    pub payment_options: Vec<PaymentOption>,
}

/// A single chain/currency pair the merchant accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOption {
    pub chain: String,
    pub network: String,
    pub currency: String,
    /// Amount in minor units of `currency`. Wei amounts exceed `u64`.
    #[serde(with = "crate::util::big_uint")]
    pub estimated_amount: u128,
    pub decimals: u32,
    #[serde(default)]
    pub selected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub miner_fee: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_fee_rate: Option<f64>,
}

impl PaymentOption {
    pub fn minor_units(&self) -> MinorUnits {
        MinorUnits::new(self.estimated_amount, self.decimals)
    }

    /// Returns the human amount `estimatedAmount × 10^(−decimals)`.
    pub fn display_amount(&self) -> Result<rust_decimal::Decimal, MinorUnitsError> {
        self.minor_units().to_decimal()
    }
}

/// Body of the option selection request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectPaymentOption {
    pub chain: String,
    pub currency: String,
}

/// Response of the selection step: how to pay on the selected chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub chain: String,
    pub network: String,
    pub instructions: Vec<PaymentInstruction>,
}

/// One transaction the wallet has to build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInstruction {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Minimum fee rate the merchant accepts, in the chain's fee unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_fee_rate: Option<f64>,
    pub outputs: Vec<Output>,
}

impl PaymentInstruction {
    /// Sum of all output amounts, `None` on overflow.
    pub fn total_amount(&self) -> Option<u128> {
        self.outputs
            .iter()
            .try_fold(0u128, |acc, o| acc.checked_add(o.amount))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub address: String,
    #[serde(with = "crate::util::big_uint")]
    pub amount: u128,
    #[serde(rename = "invoiceID", default, skip_serializing_if = "Option::is_none")]
    pub invoice_id: Option<String>,
}

/// A hex-encoded transaction together with its weighted size.
///
/// The text form accepted by [`FromStr`] is `HEX[:WEIGHTED_SIZE]`. Without an
/// explicit size the byte length of the transaction is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentTransaction {
    pub tx: String,
    pub weighted_size: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum PaymentTransactionError {
    #[error("transaction is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    #[error("invalid weighted size: {0}")]
    InvalidWeightedSize(String),
}

impl PaymentTransaction {
    /// Hex-encodes raw transaction bytes.
    pub fn new(raw: &[u8], weighted_size: u64) -> Self {
        Self {
            tx: hex::encode(raw),
            weighted_size,
        }
    }

    /// Accepts an already hex-encoded transaction after validating it.
    pub fn from_hex(tx: &str, weighted_size: u64) -> Result<Self, PaymentTransactionError> {
        hex::decode(tx)?;
        Ok(Self {
            tx: tx.to_string(),
            weighted_size,
        })
    }
}

impl FromStr for PaymentTransaction {
    type Err = PaymentTransactionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((tx, size)) => {
                let size = size
                    .parse::<u64>()
                    .map_err(|_| PaymentTransactionError::InvalidWeightedSize(size.to_string()))?;
                PaymentTransaction::from_hex(tx, size)
            }
            None => {
                let raw = hex::decode(s)?;
                Ok(PaymentTransaction::new(&raw, raw.len() as u64))
            }
        }
    }
}

impl Display for PaymentTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tx, self.weighted_size)
    }
}

/// Body of the verification and payment requests.
///
/// The same shape carries unsigned transactions to the verification step and
/// signed transactions to the payment step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSubmission {
    pub chain: String,
    pub currency: String,
    pub transactions: Vec<PaymentTransaction>,
}

/// Response of the verification step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentVerification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Response of the payment step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentAck {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
