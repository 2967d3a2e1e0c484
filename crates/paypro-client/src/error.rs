use crate::payment_url::ProtocolError;
use crate::transport::TransportError;
use crate::verifier::{ValidationError, VerificationError};

/// Any failure of a protocol operation.
///
/// Operations fail fast: the first error aborts the call and nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum PayProError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Verification(#[from] VerificationError),
    #[error("Failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),
}

impl PayProError {
    /// The failed authenticity check, if that is what went wrong.
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            PayProError::Verification(VerificationError::Validation(e)) => Some(e),
            _ => None,
        }
    }
}
