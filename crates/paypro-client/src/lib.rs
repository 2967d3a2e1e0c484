#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Authenticating client for the JSON payment protocol (version 2).
//!
//! The [`PayProClient`] fetches payment options from a merchant, selects a
//! chain/currency, submits unsigned transactions for verification and signed
//! transactions for settlement. Every response is authenticated against a
//! [`TrustStore`](paypro_types::trust::TrustStore) of pre-provisioned merchant
//! keys before it is handed back.
//!
//! ## Quickstart
//!
//! ```rust,ignore
//! use paypro_client::{PayProClient, TransportConfig, Verification};
//! use paypro_types::trust::TrustStore;
//!
//! let trust_store = TrustStore::from_json(&std::fs::read_to_string("trusted-keys.json")?)?;
//! let client = PayProClient::try_new(trust_store, &TransportConfig::default())?;
//!
//! let options = client
//!     .get_payment_options("bitcoin:?r=https://merchant.example/i/abc", Verification::Authenticate)
//!     .await?
//!     .payment_options()?;
//! ```
//!
//! ## Modules
//!
//! - [`client`] - The four protocol operations
//! - [`verifier`] - Digest, domain, network and signature checks
//! - [`signature`] - Signature schemes keyed by `x-signature-type`
//! - [`transport`] - The HTTP seam and its reqwest implementation
//! - [`payment_url`] - Resolution of coin URIs to request URLs
//!
//! ## Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation of requests and verification

pub mod client;
pub mod error;
pub mod payment_url;
pub mod signature;
pub mod transport;
pub mod verifier;

pub use client::*;
pub use error::*;
pub use payment_url::*;
pub use signature::*;
pub use transport::*;
pub use verifier::*;
