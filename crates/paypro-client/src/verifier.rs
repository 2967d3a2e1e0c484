//! Authentication of merchant responses.
//!
//! Every protocol response carries four headers binding the exact body bytes to
//! a trusted identity:
//!
//! | Header | Content |
//! |--------|---------|
//! | `digest` | `sha-256=<hex>` of the raw body |
//! | `signature` | hex signature over the digest hash |
//! | `x-signature-type` | signature scheme, `ecc` |
//! | `x-identity` | key into the [`TrustStore`] |
//!
//! [`ResponseVerifier::verify`] checks, in order: JSON body, headers, request
//! URL, identity, digest, domain, network (when asked), signature. The first
//! failing check is reported. The digest is always computed over the bytes as
//! received, never over re-serialized JSON.

use http::HeaderMap;
use paypro_types::proto::{PaymentAck, PaymentOptions, PaymentRequest, PaymentVerification, header};
use paypro_types::trust::{TrustStore, TrustedKey};
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use url::Url;

use crate::signature::{SignatureError, SignatureSchemes};

/// Whether a response is authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verification {
    /// Run every check. The only mode that gives authenticity guarantees.
    #[default]
    Authenticate,
    /// Parse the body and skip all checks. For diagnostics only.
    Bypass,
}

/// A parsed response together with the key that signed it.
#[derive(Debug, Clone)]
pub struct VerifiedResponse {
    pub request_url: String,
    pub response_data: serde_json::Value,
    /// `None` only when verification was bypassed.
    pub matched_key: Option<Arc<TrustedKey>>,
}

impl VerifiedResponse {
    /// Decodes the response body into a wire type.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.response_data)
    }

    pub fn payment_options(&self) -> Result<PaymentOptions, serde_json::Error> {
        self.parse()
    }

    pub fn payment_request(&self) -> Result<PaymentRequest, serde_json::Error> {
        self.parse()
    }

    pub fn payment_verification(&self) -> Result<PaymentVerification, serde_json::Error> {
        self.parse()
    }

    pub fn payment_ack(&self) -> Result<PaymentAck, serde_json::Error> {
        self.parse()
    }

    pub fn is_authenticated(&self) -> bool {
        self.matched_key.is_some()
    }
}

/// A failed authenticity check.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("missing header: {0}")]
    MissingHeader(&'static str),
    #[error("invalid header {header}: {reason}")]
    InvalidHeader {
        header: &'static str,
        reason: &'static str,
    },
    #[error("unsupported signature type: {0}")]
    UnsupportedSignatureType(String),
    #[error("invalid request url: {0}")]
    InvalidRequestUrl(String),
    #[error("unknown signing identity: {0}")]
    UnknownIdentity(String),
    #[error("digest mismatch: header {expected}, body {actual}")]
    DigestMismatch { expected: String, actual: String },
    #[error("untrusted domain: {0}")]
    UntrustedDomain(String),
    #[error("untrusted network: {}", .0.as_deref().unwrap_or("<none>"))]
    UntrustedNetwork(Option<String>),
    #[error("signature invalid: {0}")]
    SignatureInvalid(#[source] SignatureError),
}

#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("Failed to parse response body as JSON: {0}")]
    Parse(#[source] serde_json::Error),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// The four authentication headers, typed.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SignatureHeaders<'a> {
    digest_hash: &'a str,
    signature: Vec<u8>,
    signature_type: &'a str,
    identity: &'a str,
}

impl<'a> SignatureHeaders<'a> {
    fn extract(headers: &'a HeaderMap) -> Result<Self, ValidationError> {
        let digest = header_str(headers, header::DIGEST)?;
        let (_algorithm, digest_hash) =
            digest
                .split_once('=')
                .ok_or(ValidationError::InvalidHeader {
                    header: header::DIGEST,
                    reason: "expected algorithm=hash",
                })?;
        let signature = hex::decode(header_str(headers, header::SIGNATURE)?).map_err(|_| {
            ValidationError::InvalidHeader {
                header: header::SIGNATURE,
                reason: "not a hex string",
            }
        })?;
        let signature_type = header_str(headers, header::SIGNATURE_TYPE)?;
        let identity = header_str(headers, header::IDENTITY)?;
        Ok(Self {
            digest_hash,
            signature,
            signature_type,
            identity,
        })
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str, ValidationError> {
    headers
        .get(name)
        .ok_or(ValidationError::MissingHeader(name))?
        .to_str()
        .map_err(|_| ValidationError::InvalidHeader {
            header: name,
            reason: "not visible ASCII",
        })
}

/// Authenticates responses against a [`TrustStore`].
#[derive(Debug, Clone)]
pub struct ResponseVerifier {
    trust_store: Arc<TrustStore>,
    schemes: Arc<SignatureSchemes>,
}

impl ResponseVerifier {
    pub fn new(trust_store: TrustStore) -> Self {
        Self::with_schemes(trust_store, SignatureSchemes::default_schemes())
    }

    pub fn with_schemes(trust_store: TrustStore, schemes: SignatureSchemes) -> Self {
        Self {
            trust_store: Arc::new(trust_store),
            schemes: Arc::new(schemes),
        }
    }

    pub fn trust_store(&self) -> &TrustStore {
        &self.trust_store
    }

    pub fn schemes(&self) -> &SignatureSchemes {
        &self.schemes
    }

    /// Parses `body` and, unless bypassed, authenticates it.
    ///
    /// With `check_network` the `network` field of the body must be one the
    /// signing identity is trusted for.
    pub fn verify(
        &self,
        request_url: &str,
        body: &[u8],
        headers: &HeaderMap,
        check_network: bool,
        verification: Verification,
    ) -> Result<VerifiedResponse, VerificationError> {
        let response_data: serde_json::Value =
            serde_json::from_slice(body).map_err(VerificationError::Parse)?;

        if verification == Verification::Bypass {
            #[cfg(feature = "telemetry")]
            tracing::warn!(url = request_url, "Response verification bypassed");
            return Ok(VerifiedResponse {
                request_url: request_url.to_string(),
                response_data,
                matched_key: None,
            });
        }

        let matched_key = self.authenticate(request_url, body, headers, &response_data, check_network)?;

        #[cfg(feature = "telemetry")]
        tracing::debug!(identity = %matched_key.identity, "Response authenticated");

        Ok(VerifiedResponse {
            request_url: request_url.to_string(),
            response_data,
            matched_key: Some(matched_key),
        })
    }

    fn authenticate(
        &self,
        request_url: &str,
        body: &[u8],
        headers: &HeaderMap,
        response_data: &serde_json::Value,
        check_network: bool,
    ) -> Result<Arc<TrustedKey>, ValidationError> {
        let headers = SignatureHeaders::extract(headers)?;
        let scheme = self
            .schemes
            .by_kind(headers.signature_type)
            .ok_or_else(|| ValidationError::UnsupportedSignatureType(headers.signature_type.to_string()))?;

        let host = Url::parse(request_url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
            .ok_or_else(|| ValidationError::InvalidRequestUrl(request_url.to_string()))?;

        let key = self
            .trust_store
            .lookup(headers.identity)
            .ok_or_else(|| ValidationError::UnknownIdentity(headers.identity.to_string()))?;

        let hash = Sha256::digest(body);
        let actual = hex::encode(hash);
        if actual != headers.digest_hash {
            return Err(ValidationError::DigestMismatch {
                expected: headers.digest_hash.to_string(),
                actual,
            });
        }

        if !key.allows_domain(&host) {
            return Err(ValidationError::UntrustedDomain(host));
        }

        if check_network {
            let network = response_data.get("network").and_then(|n| n.as_str());
            match network {
                Some(network) if key.allows_network(network) => {}
                _ => {
                    return Err(ValidationError::UntrustedNetwork(network.map(str::to_string)));
                }
            }
        }

        scheme
            .verify(&key.public_key, &hash, &headers.signature)
            .map_err(ValidationError::SignatureInvalid)?;

        Ok(key.clone())
    }
}
