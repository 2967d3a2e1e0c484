//! Signature schemes keyed by the `x-signature-type` header.
//!
//! A [`SignatureScheme`] checks a signature over a message hash with a raw
//! public key. Schemes live in a [`SignatureSchemes`] registry so the verifier
//! dispatches on the header value without knowing any scheme itself.
//!
//! Only [`Ecc`] (ECDSA over secp256k1) ships by default.

use k256::ecdsa::signature::hazmat::PrehashVerifier;
use k256::ecdsa::{Signature, VerifyingKey};
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::ops::Deref;

/// Errors produced by a [`SignatureScheme`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("invalid public key")]
    InvalidPublicKey,
    #[error("malformed signature")]
    MalformedSignature,
    #[error("signature does not match")]
    Mismatch,
}

/// Verifies signatures of a single kind.
pub trait SignatureScheme: Send + Sync {
    /// Value of the `x-signature-type` header this scheme handles.
    fn kind(&self) -> &'static str;

    /// Checks `signature` over the already-hashed `message_hash`.
    fn verify(
        &self,
        public_key: &[u8],
        message_hash: &[u8],
        signature: &[u8],
    ) -> Result<(), SignatureError>;
}

/// ECDSA over secp256k1.
///
/// Public keys are SEC1 encoded (compressed or not). Signatures are either
/// 64-byte compact `r || s` or DER. The signed message is the hash itself,
/// no further hashing is applied.
///
/// High-S signatures are normalized to low-S before checking, so a merchant
/// signer that does not enforce low-S is accepted. Strict low-S verifiers
/// reject those signatures.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ecc;

impl Ecc {
    pub const KIND: &'static str = "ecc";
}

impl SignatureScheme for Ecc {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn verify(
        &self,
        public_key: &[u8],
        message_hash: &[u8],
        signature: &[u8],
    ) -> Result<(), SignatureError> {
        let verifying_key =
            VerifyingKey::from_sec1_bytes(public_key).map_err(|_| SignatureError::InvalidPublicKey)?;
        let signature = if signature.len() == 64 {
            Signature::from_slice(signature)
        } else {
            Signature::from_der(signature)
        }
        .map_err(|_| SignatureError::MalformedSignature)?;
        // k256 only accepts low-S signatures
        let signature = signature.normalize_s().unwrap_or(signature);
        verifying_key
            .verify_prehash(message_hash, &signature)
            .map_err(|_| SignatureError::Mismatch)
    }
}

/// Registry of signature schemes by kind.
#[derive(Default)]
pub struct SignatureSchemes(HashMap<&'static str, Box<dyn SignatureScheme>>);

impl Debug for SignatureSchemes {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let kinds: Vec<&str> = self.0.keys().copied().collect();
        f.debug_tuple("SignatureSchemes").field(&kinds).finish()
    }
}

impl SignatureSchemes {
    /// An empty registry. Every signature type is rejected until one is registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry used unless configured otherwise: [`Ecc`] only.
    pub fn default_schemes() -> Self {
        Self::new().and_register(Ecc)
    }

    pub fn and_register<S: SignatureScheme + 'static>(mut self, scheme: S) -> Self {
        self.register(scheme);
        self
    }

    pub fn register<S: SignatureScheme + 'static>(&mut self, scheme: S) {
        self.0.insert(scheme.kind(), Box::new(scheme));
    }

    pub fn by_kind(&self, kind: &str) -> Option<&dyn SignatureScheme> {
        self.0.get(kind).map(|v| v.deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::ecdsa::SigningKey;
    use k256::ecdsa::signature::hazmat::PrehashSigner;
    use sha2::{Digest, Sha256};

    fn signing_key(seed: u8) -> SigningKey {
        SigningKey::from_slice(&[seed; 32]).unwrap()
    }

    fn public_key(key: &SigningKey, compressed: bool) -> Vec<u8> {
        key.verifying_key()
            .to_encoded_point(compressed)
            .as_bytes()
            .to_vec()
    }

    fn sign(key: &SigningKey, hash: &[u8]) -> Signature {
        key.sign_prehash(hash).unwrap()
    }

    #[test]
    fn test_ecc_compact_signature() {
        let key = signing_key(7);
        let hash = Sha256::digest(b"{\"network\":\"main\"}");
        let signature = sign(&key, &hash);
        let result = Ecc.verify(&public_key(&key, true), &hash, &signature.to_bytes());
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn test_ecc_der_signature_and_uncompressed_key() {
        let key = signing_key(9);
        let hash = Sha256::digest(b"body");
        let signature = sign(&key, &hash);
        let result = Ecc.verify(
            &public_key(&key, false),
            &hash,
            signature.to_der().as_bytes(),
        );
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn test_ecc_accepts_high_s() {
        let key = signing_key(3);
        let hash = Sha256::digest(b"body");
        let signature = sign(&key, &hash);
        let (r, s) = signature.split_scalars();
        let high_s = Signature::from_scalars(r, -*s).unwrap();
        assert!(high_s.normalize_s().is_some());
        let result = Ecc.verify(&public_key(&key, true), &hash, &high_s.to_bytes());
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn test_ecc_wrong_key() {
        let hash = Sha256::digest(b"body");
        let signature = sign(&signing_key(1), &hash);
        let result = Ecc.verify(&public_key(&signing_key(2), true), &hash, &signature.to_bytes());
        assert_eq!(result, Err(SignatureError::Mismatch));
    }

    #[test]
    fn test_ecc_wrong_hash() {
        let key = signing_key(1);
        let signature = sign(&key, &Sha256::digest(b"body"));
        let other = Sha256::digest(b"other body");
        let result = Ecc.verify(&public_key(&key, true), &other, &signature.to_bytes());
        assert_eq!(result, Err(SignatureError::Mismatch));
    }

    #[test]
    fn test_ecc_malformed_inputs() {
        let key = signing_key(1);
        let hash = Sha256::digest(b"body");
        assert_eq!(
            Ecc.verify(&[0x02; 5], &hash, &[0u8; 64]),
            Err(SignatureError::InvalidPublicKey)
        );
        assert_eq!(
            Ecc.verify(&public_key(&key, true), &hash, &[0x30, 0x01]),
            Err(SignatureError::MalformedSignature)
        );
    }

    #[test]
    fn test_registry_dispatch() {
        let schemes = SignatureSchemes::default_schemes();
        assert_eq!(schemes.by_kind("ecc").map(|s| s.kind()), Some("ecc"));
        assert!(schemes.by_kind("ECC").is_none());
        assert!(schemes.by_kind("rsa").is_none());
        assert!(SignatureSchemes::new().by_kind("ecc").is_none());
    }
}
