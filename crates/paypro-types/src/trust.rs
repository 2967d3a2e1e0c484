//! Trusted merchant identities.
//!
//! A [`TrustedKey`] binds an identity string (the value merchants send in the
//! `x-identity` header) to a public key and to the domains and networks that key
//! may sign for. The [`TrustStore`] is built once and never mutated.
//!
//! # Trust table format
//!
//! ```json
//! {
//!   "mh65MN7drqmwpCRZcEeBEE9ceQCQ95HtZc": {
//!     "owner": "Merchant testnet key",
//!     "publicKey": "03159069584176096f1c89763488b94dbc8d5e1fa7bf91f50b42f4befe4e45295a",
//!     "domains": ["test.merchant.example"],
//!     "networks": ["test"]
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::util::HexBytes;

/// A pre-provisioned merchant signing key and its scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedKey {
    pub identity: String,
    pub owner: Option<String>,
    pub public_key: Vec<u8>,
    pub domains: HashSet<String>,
    pub networks: HashSet<String>,
}

impl TrustedKey {
    pub fn new<I, D, N>(identity: I, public_key: Vec<u8>, domains: D, networks: N) -> Self
    where
        I: Into<String>,
        D: IntoIterator,
        D::Item: Into<String>,
        N: IntoIterator,
        N::Item: Into<String>,
    {
        Self {
            identity: identity.into(),
            owner: None,
            public_key,
            domains: domains.into_iter().map(Into::into).collect(),
            networks: networks.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_owner<S: Into<String>>(mut self, owner: S) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn allows_domain(&self, domain: &str) -> bool {
        self.domains.contains(domain)
    }

    pub fn allows_network(&self, network: &str) -> bool {
        self.networks.contains(network)
    }
}

/// Entry of the trust table as it appears in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustedKeyConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    pub public_key: HexBytes,
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub networks: Vec<String>,
}

/// The trust table: identity to key configuration.
pub type TrustedKeysConfig = HashMap<String, TrustedKeyConfig>;

#[derive(Debug, thiserror::Error)]
pub enum TrustStoreError {
    #[error("Failed to parse trust table: {0}")]
    JsonParse(#[from] serde_json::Error),
    #[error("Trusted key {0} has an empty public key")]
    EmptyPublicKey(String),
}

/// Read-only lookup table of trusted keys.
///
/// Records are shared as [`Arc<TrustedKey>`], so a verified response can
/// hold on to its matched key without copying it.
#[derive(Debug, Clone, Default)]
pub struct TrustStore(HashMap<String, Arc<TrustedKey>>);

impl TrustStore {
    pub fn from_keys<I: IntoIterator<Item = TrustedKey>>(keys: I) -> Self {
        let keys = keys
            .into_iter()
            .map(|key| (key.identity.clone(), Arc::new(key)))
            .collect();
        Self(keys)
    }

    pub fn from_config(config: TrustedKeysConfig) -> Result<Self, TrustStoreError> {
        let mut keys = Vec::with_capacity(config.len());
        for (identity, entry) in config {
            if entry.public_key.is_empty() {
                return Err(TrustStoreError::EmptyPublicKey(identity));
            }
            keys.push(TrustedKey {
                identity,
                owner: entry.owner,
                public_key: entry.public_key.into_inner(),
                domains: entry.domains.into_iter().collect(),
                networks: entry.networks.into_iter().collect(),
            });
        }
        Ok(Self::from_keys(keys))
    }

    pub fn from_json(json: &str) -> Result<Self, TrustStoreError> {
        let config: TrustedKeysConfig = serde_json::from_str(json)?;
        Self::from_config(config)
    }

    /// Exact-match lookup by identity.
    pub fn lookup(&self, identity: &str) -> Option<&Arc<TrustedKey>> {
        self.0.get(identity)
    }

    pub fn identities(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRUST_TABLE: &str = r#"{
        "mh65MN7drqmwpCRZcEeBEE9ceQCQ95HtZc": {
            "owner": "Merchant testnet key",
            "publicKey": "03159069584176096f1c89763488b94dbc8d5e1fa7bf91f50b42f4befe4e45295a",
            "domains": ["test.merchant.example"],
            "networks": ["test"]
        },
        "1Ea6HqCm9UGAnUKtRbfMAgtmcuLUKw1eSy": {
            "publicKey": "02a8b6b7c1b4e8bd1f5b1fa1a3e1bd8e0e0f66fed96e4e8d69f6c6dd0b4a5b1f2c",
            "domains": ["merchant.example", "www.merchant.example"],
            "networks": ["main"]
        }
    }"#;

    #[test]
    fn test_from_json() {
        let store = TrustStore::from_json(TRUST_TABLE).unwrap();
        assert_eq!(store.len(), 2);

        let test_key = store.lookup("mh65MN7drqmwpCRZcEeBEE9ceQCQ95HtZc").unwrap();
        assert_eq!(test_key.owner.as_deref(), Some("Merchant testnet key"));
        assert_eq!(test_key.public_key.len(), 33);
        assert!(test_key.allows_domain("test.merchant.example"));
        assert!(test_key.allows_network("test"));
        assert!(!test_key.allows_network("main"));

        let main_key = store.lookup("1Ea6HqCm9UGAnUKtRbfMAgtmcuLUKw1eSy").unwrap();
        assert!(main_key.owner.is_none());
        assert!(main_key.allows_domain("www.merchant.example"));
    }

    #[test]
    fn test_lookup_is_exact() {
        let store = TrustStore::from_json(TRUST_TABLE).unwrap();
        assert!(store.lookup("mh65mn7drqmwpcrzcecbee9ceqcq95htzc").is_none());
        assert!(store.lookup("").is_none());
    }

    #[test]
    fn test_from_json_rejects_bad_public_key() {
        let json = r#"{ "id": { "publicKey": "not-hex", "domains": [], "networks": [] } }"#;
        assert!(matches!(
            TrustStore::from_json(json),
            Err(TrustStoreError::JsonParse(_))
        ));
    }

    #[test]
    fn test_from_json_rejects_empty_public_key() {
        let json = r#"{ "id": { "publicKey": "", "domains": [], "networks": [] } }"#;
        assert!(matches!(
            TrustStore::from_json(json),
            Err(TrustStoreError::EmptyPublicKey(id)) if id == "id"
        ));
    }

    #[test]
    fn test_from_keys() {
        let key = TrustedKey::new("id1", vec![2; 33], ["merchant.example"], ["main"])
            .with_owner("Merchant");
        let store = TrustStore::from_keys([key.clone()]);
        assert_eq!(store.lookup("id1").map(|k| k.as_ref()), Some(&key));
        assert_eq!(store.identities().collect::<Vec<_>>(), vec!["id1"]);
    }
}
