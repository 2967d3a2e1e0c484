//! HTTP transport for payment protocol requests.
//!
//! A [`Transport`] sends exactly one request and hands back the status, headers
//! and raw body bytes. It knows nothing about the protocol: the body is not
//! parsed here, and non-200 statuses are only turned into errors by
//! [`RawResponse::into_success`], which the protocol client calls for every
//! transport.
//!
//! [`ReqwestTransport`] is the default implementation. It never keeps idle
//! connections around, so every call opens its own connection.

use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method, StatusCode};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::future::Future;
use std::sync::Arc;
use url::Url;

#[cfg(feature = "telemetry")]
use tracing::instrument;

/// Default `User-Agent` of [`ReqwestTransport`].
pub const DEFAULT_USER_AGENT: &str = concat!("paypro-rs/", env!("CARGO_PKG_VERSION"));

/// A single outgoing request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn post(url: Url, body: Vec<u8>) -> Self {
        Self {
            method: Method::POST,
            url,
            headers: HeaderMap::new(),
            body: Some(body),
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// Status, headers and untouched body bytes of a response.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Passes `200 OK` responses through and turns anything else into
    /// [`TransportError::HttpStatus`] carrying the body as text.
    pub fn into_success(self, url: &Url) -> Result<Self, TransportError> {
        if self.status == StatusCode::OK {
            Ok(self)
        } else {
            Err(TransportError::HttpStatus {
                url: url.clone(),
                status: self.status,
                body: String::from_utf8_lossy(&self.body).into_owned(),
            })
        }
    }
}

/// Errors raised while talking HTTP.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// DNS, TLS or socket level failure.
    #[error("HTTP error: {url}: {source}")]
    Http {
        url: Url,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
    #[error("Failed to read response body: {url}: {source}")]
    ResponseBodyRead {
        url: Url,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
    #[error("Unexpected HTTP status {status}: {url}: {body}")]
    HttpStatus {
        url: Url,
        status: StatusCode,
        body: String,
    },
}

/// Sends one request and returns the raw response.
///
/// Implementations must not retry, and must report connection-level failures
/// as [`TransportError::Http`].
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<RawResponse, TransportError>> + Send;
}

impl<T: Transport> Transport for Arc<T> {
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<RawResponse, TransportError>> + Send {
        self.as_ref().send(request)
    }
}

/// Transport settings.
///
/// ```json
/// { "acceptInvalidCerts": false, "userAgent": "my-wallet/1.0" }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportConfig {
    /// Skip TLS certificate validation. Only for test and staging servers.
    #[serde(default)]
    pub accept_invalid_certs: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

/// [`Transport`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    accept_invalid_certs: bool,
}

impl ReqwestTransport {
    pub fn new(config: &TransportConfig) -> Result<Self, TransportError> {
        let user_agent = config.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);
        let mut builder = Client::builder()
            .pool_max_idle_per_host(0)
            .user_agent(user_agent);
        if config.accept_invalid_certs {
            #[cfg(feature = "telemetry")]
            tracing::warn!("TLS certificate validation is disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }
        let client = builder.build().map_err(TransportError::ClientBuild)?;
        Ok(Self {
            client,
            accept_invalid_certs: config.accept_invalid_certs,
        })
    }

    pub fn accepts_invalid_certs(&self) -> bool {
        self.accept_invalid_certs
    }
}

impl Transport for ReqwestTransport {
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "paypro.transport.send", skip_all, fields(method = %request.method, url = %request.url), err)
    )]
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, TransportError> {
        let HttpRequest {
            method,
            url,
            headers,
            body,
        } = request;
        let mut req = self.client.request(method, url.clone()).headers(headers);
        if let Some(body) = body {
            req = req.body(body);
        }
        let response = req.send().await.map_err(|e| TransportError::Http {
            url: url.clone(),
            source: Box::new(e),
        })?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::ResponseBodyRead {
                url,
                source: Box::new(e),
            })?;

        #[cfg(feature = "telemetry")]
        tracing::debug!(status = %status, bytes = body.len(), "Received response");

        Ok(RawResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::ACCEPT;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport() -> ReqwestTransport {
        ReqwestTransport::new(&TransportConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_get_returns_raw_body_and_headers() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/i/1"))
            .and(header("accept", "application/payment-options"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("x-identity", "id1")
                    .set_body_string("{ \"memo\" : \"spaced\" }"),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let url: Url = format!("{}/i/1", mock_server.uri()).parse().unwrap();
        let request = HttpRequest::get(url)
            .with_header(ACCEPT, HeaderValue::from_static("application/payment-options"));
        let response = transport().send(request).await.unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.headers.get("x-identity").unwrap(), "id1");
        assert_eq!(response.body, b"{ \"memo\" : \"spaced\" }");
    }

    #[tokio::test]
    async fn test_post_sends_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/i/1"))
            .and(body_string("{\"chain\":\"BTC\"}"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let url: Url = format!("{}/i/1", mock_server.uri()).parse().unwrap();
        let request = HttpRequest::post(url, b"{\"chain\":\"BTC\"}".to_vec());
        let response = transport().send(request).await.unwrap();
        assert_eq!(response.body, b"{}");
    }

    #[tokio::test]
    async fn test_non_200_is_reported_with_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400).set_body_string("Invoice expired"))
            .mount(&mock_server)
            .await;

        let url: Url = format!("{}/i/1", mock_server.uri()).parse().unwrap();
        let response = transport().send(HttpRequest::get(url.clone())).await.unwrap();
        let err = response.into_success(&url).unwrap_err();
        match err {
            TransportError::HttpStatus { status, body, .. } => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert_eq!(body, "Invoice expired");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_connection_failure() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let url: Url = format!("http://127.0.0.1:{port}/i/1").parse().unwrap();
        let err = transport().send(HttpRequest::get(url)).await.unwrap_err();
        assert!(matches!(err, TransportError::Http { .. }));
    }

    #[test]
    fn test_config_defaults_to_strict_tls() {
        let config: TransportConfig = serde_json::from_str("{}").unwrap();
        assert!(!config.accept_invalid_certs);
        let transport = ReqwestTransport::new(&config).unwrap();
        assert!(!transport.accepts_invalid_certs());
    }

    #[tokio::test]
    async fn test_relaxed_tls_is_opt_in() {
        let config: TransportConfig =
            serde_json::from_str(r#"{"acceptInvalidCerts": true, "userAgent": "test-wallet/1.0"}"#)
                .unwrap();
        let transport = ReqwestTransport::new(&config).unwrap();
        assert!(transport.accepts_invalid_certs());

        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("user-agent", "test-wallet/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(1)
            .mount(&mock_server)
            .await;
        let url: Url = format!("{}/i/1", mock_server.uri()).parse().unwrap();
        let response = transport.send(HttpRequest::get(url)).await.unwrap();
        assert_eq!(response.body, b"{}");
    }
}
