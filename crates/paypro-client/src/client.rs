//! The payment protocol client.
//!
//! [`PayProClient`] runs the four protocol steps, one request and one
//! verification per call:
//!
//! | Step | Request | Network check |
//! |------|---------|---------------|
//! | [`get_payment_options`](PayProClient::get_payment_options) | `GET`, `Accept: application/payment-options` | no |
//! | [`select_payment_option`](PayProClient::select_payment_option) | `POST application/payment-request` | yes |
//! | [`verify_payment_request`](PayProClient::verify_payment_request) | `POST application/payment-verification` | no |
//! | [`send_signed_payment`](PayProClient::send_signed_payment) | `POST application/payment` | no |
//!
//! The client holds no state besides its transport and the read-only trust
//! store, so it can be shared between tasks. It never retries: whether a step
//! can safely be repeated is for the caller to decide.

use http::HeaderValue;
use http::header::{ACCEPT, CONTENT_TYPE, HeaderName};
use paypro_types::proto::{
    PAYPRO_VERSION, PaymentSubmission, SelectPaymentOption, content_type, header,
};
use paypro_types::trust::TrustStore;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use url::Url;

use crate::error::PayProError;
use crate::payment_url::resolve_payment_url;
use crate::signature::SignatureSchemes;
use crate::transport::{HttpRequest, ReqwestTransport, Transport, TransportConfig, TransportError};
use crate::verifier::{ResponseVerifier, Verification, VerifiedResponse};

#[cfg(feature = "telemetry")]
use tracing::{Span, instrument};

const PAYPRO_VERSION_HEADER: HeaderName = HeaderName::from_static(header::PAYPRO_VERSION);

/// How the response to [`PayProClient::verify_payment_request`] is treated.
///
/// Merchants are not required to sign the verification response, so this step
/// is governed by its own policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnsignedVerificationPolicy {
    /// Authenticate like every other step.
    #[default]
    Authenticate,
    /// Parse the body only. The returned response has no matched key.
    ParseOnly,
}

/// Client for the JSON payment protocol.
#[derive(Debug, Clone)]
pub struct PayProClient<T = ReqwestTransport> {
    transport: T,
    verifier: ResponseVerifier,
    unsigned_verification: UnsignedVerificationPolicy,
}

impl PayProClient<ReqwestTransport> {
    /// Builds a client on top of a [`ReqwestTransport`].
    pub fn try_new(trust_store: TrustStore, config: &TransportConfig) -> Result<Self, TransportError> {
        let transport = ReqwestTransport::new(config)?;
        Ok(Self::with_transport(transport, trust_store))
    }
}

impl<T: Transport> PayProClient<T> {
    pub fn with_transport(transport: T, trust_store: TrustStore) -> Self {
        Self {
            transport,
            verifier: ResponseVerifier::new(trust_store),
            unsigned_verification: UnsignedVerificationPolicy::default(),
        }
    }

    /// Replaces the accepted signature schemes. Defaults to `ecc` only.
    pub fn with_signature_schemes(mut self, schemes: SignatureSchemes) -> Self {
        let trust_store = self.verifier.trust_store().clone();
        self.verifier = ResponseVerifier::with_schemes(trust_store, schemes);
        self
    }

    pub fn with_unsigned_verification(mut self, policy: UnsignedVerificationPolicy) -> Self {
        self.unsigned_verification = policy;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn verifier(&self) -> &ResponseVerifier {
        &self.verifier
    }

    pub fn unsigned_verification(&self) -> UnsignedVerificationPolicy {
        self.unsigned_verification
    }

    /// Fetches the chains and currencies the merchant accepts.
    ///
    /// `payment_url` may be a coin URI carrying the endpoint in its `r` parameter.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "paypro.client.get_payment_options", skip_all, fields(payment_url = %payment_url), err)
    )]
    pub async fn get_payment_options(
        &self,
        payment_url: &str,
        verification: Verification,
    ) -> Result<VerifiedResponse, PayProError> {
        let url = resolve_payment_url(payment_url)?;
        let request = HttpRequest::get(url)
            .with_header(ACCEPT, HeaderValue::from_static(content_type::PAYMENT_OPTIONS))
            .with_header(PAYPRO_VERSION_HEADER, HeaderValue::from_static(PAYPRO_VERSION));
        self.round_trip(request, false, verification).await
    }

    /// Selects a chain/currency and receives the payment instructions.
    ///
    /// The response must declare a network the signing identity is trusted for.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "paypro.client.select_payment_option", skip_all, fields(payment_url = %payment_url, chain = %chain, currency = %currency), err)
    )]
    pub async fn select_payment_option(
        &self,
        payment_url: &str,
        chain: &str,
        currency: &str,
        verification: Verification,
    ) -> Result<VerifiedResponse, PayProError> {
        let body = SelectPaymentOption {
            chain: chain.to_string(),
            currency: currency.to_string(),
        };
        self.post_json(
            payment_url,
            content_type::PAYMENT_REQUEST,
            &body,
            true,
            verification,
        )
        .await
    }

    /// Submits unsigned transactions so the merchant can check outputs and fees.
    ///
    /// Authentication of the response follows [`UnsignedVerificationPolicy`].
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "paypro.client.verify_payment_request", skip_all, fields(payment_url = %payment_url, chain = %submission.chain), err)
    )]
    pub async fn verify_payment_request(
        &self,
        payment_url: &str,
        submission: &PaymentSubmission,
    ) -> Result<VerifiedResponse, PayProError> {
        let verification = match self.unsigned_verification {
            UnsignedVerificationPolicy::Authenticate => Verification::Authenticate,
            UnsignedVerificationPolicy::ParseOnly => Verification::Bypass,
        };
        self.post_json(
            payment_url,
            content_type::PAYMENT_VERIFICATION,
            submission,
            false,
            verification,
        )
        .await
    }

    /// Submits signed transactions for settlement.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "paypro.client.send_signed_payment", skip_all, fields(payment_url = %payment_url, chain = %submission.chain), err)
    )]
    pub async fn send_signed_payment(
        &self,
        payment_url: &str,
        submission: &PaymentSubmission,
    ) -> Result<VerifiedResponse, PayProError> {
        self.post_json(
            payment_url,
            content_type::PAYMENT,
            submission,
            false,
            Verification::Authenticate,
        )
        .await
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        payment_url: &str,
        content_type: &'static str,
        body: &B,
        check_network: bool,
        verification: Verification,
    ) -> Result<VerifiedResponse, PayProError> {
        let url: Url = resolve_payment_url(payment_url)?;
        let body = serde_json::to_vec(body).map_err(PayProError::Encode)?;
        let request = HttpRequest::post(url, body)
            .with_header(CONTENT_TYPE, HeaderValue::from_static(content_type))
            .with_header(PAYPRO_VERSION_HEADER, HeaderValue::from_static(PAYPRO_VERSION));
        self.round_trip(request, check_network, verification).await
    }

    async fn round_trip(
        &self,
        request: HttpRequest,
        check_network: bool,
        verification: Verification,
    ) -> Result<VerifiedResponse, PayProError> {
        let url = request.url.clone();
        let result = async {
            let response = self.transport.send(request).await?.into_success(&url)?;
            let verified = self.verifier.verify(
                url.as_str(),
                &response.body,
                &response.headers,
                check_network,
                verification,
            )?;
            Ok::<_, PayProError>(verified)
        }
        .await;
        record_result_on_span(&result);
        result
    }
}

/// Records the outcome of a protocol step on the current span.
#[cfg(feature = "telemetry")]
fn record_result_on_span<E: Display>(result: &Result<VerifiedResponse, E>) {
    let span = Span::current();
    match result {
        Ok(verified) => {
            span.record("otel.status_code", "OK");
            match &verified.matched_key {
                Some(key) => tracing::info!(identity = %key.identity, "Response authenticated"),
                None => tracing::warn!("Response accepted without authentication"),
            }
        }
        Err(err) => {
            span.record("otel.status_code", "ERROR");
            span.record("error.message", tracing::field::display(err));
        }
    }
}

/// Records the outcome of a protocol step on the current span.
/// Noop if telemetry feature is off.
#[cfg(not(feature = "telemetry"))]
fn record_result_on_span<E: Display>(_result: &Result<VerifiedResponse, E>) {}
