//! Configuration for the `paypro` command-line client.
//!
//! Command-line arguments select the operation; a JSON file provides the
//! trusted keys and transport settings:
//!
//! ```json
//! {
//!   "trustedKeys": {
//!     "mh65MN7drqmwzgVbqGUxTzyhCzuXmEJ5Qa": {
//!       "owner": "BitPay, Inc.",
//!       "publicKey": "03159069584176096f1c89763488b94dbc8d5e1fa7bf91f50b42f4befe4e45295a",
//!       "domains": ["bitpay.com", "test.bitpay.com"],
//!       "networks": ["main", "test"]
//!     }
//!   },
//!   "transport": { "acceptInvalidCerts": false },
//!   "unsignedVerification": "authenticate"
//! }
//! ```

use clap::{Args, Parser, Subcommand};
use paypro_client::{TransportConfig, UnsignedVerificationPolicy};
use paypro_types::proto::PaymentTransaction;
use paypro_types::trust::{TrustStore, TrustStoreError, TrustedKeysConfig};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// CLI arguments for the `paypro` client.
#[derive(Parser, Debug)]
#[command(name = "paypro", version)]
#[command(about = "JSON payment protocol client with signed-response verification")]
pub struct CliArgs {
    /// Path to the JSON configuration file
    #[arg(long, short, env = "PAYPRO_CONFIG", default_value = "paypro.json", global = true)]
    pub config: PathBuf,
    /// Accept invalid TLS certificates (test servers only)
    #[arg(long, global = true)]
    pub insecure: bool,
    /// Skip signature verification of payment options, payment requests and
    /// payment verifications. Payment acknowledgements are always verified.
    #[arg(long, global = true)]
    pub no_verify: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch the chains and currencies a merchant accepts
    Options {
        /// Payment URL or coin URI (e.g. `bitcoin:?r=https://...`)
        payment_url: String,
    },
    /// Select a chain and currency and fetch the payment instructions
    Select {
        /// Payment URL or coin URI
        payment_url: String,
        #[arg(long)]
        chain: String,
        #[arg(long)]
        currency: String,
    },
    /// Submit unsigned transactions for the merchant to check
    Verify(SubmissionArgs),
    /// Submit signed transactions for settlement
    Pay(SubmissionArgs),
}

#[derive(Args, Debug)]
pub struct SubmissionArgs {
    /// Payment URL or coin URI
    pub payment_url: String,
    #[arg(long)]
    pub chain: String,
    #[arg(long)]
    pub currency: String,
    /// Transaction as `HEX[:WEIGHTED_SIZE]`; repeat for several transactions
    #[arg(long = "tx", required = true)]
    pub transactions: Vec<PaymentTransaction>,
}

/// Client configuration loaded from the JSON file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    trusted_keys: TrustedKeysConfig,
    #[serde(default)]
    transport: TransportConfig,
    #[serde(default)]
    unsigned_verification: UnsignedVerificationPolicy,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {0}: {1}")]
    FileRead(PathBuf, std::io::Error),
    #[error("Failed to parse config file: {0}")]
    JsonParse(#[from] serde_json::Error),
    #[error(transparent)]
    TrustStore(#[from] TrustStoreError),
}

impl Config {
    pub fn transport(&self) -> &TransportConfig {
        &self.transport
    }

    pub fn unsigned_verification(&self) -> UnsignedVerificationPolicy {
        self.unsigned_verification
    }

    /// Builds the trust store from the configured keys.
    pub fn trust_store(&self) -> Result<TrustStore, ConfigError> {
        let store = TrustStore::from_config(self.trusted_keys.clone())?;
        Ok(store)
    }

    /// Load configuration from a specific path.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::FileRead(path.to_path_buf(), e))?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }
}
