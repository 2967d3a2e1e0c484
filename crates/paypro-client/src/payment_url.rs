//! Resolution of payment URLs and payment URIs.
//!
//! Wallets receive either a plain `https://` payment URL or a coin URI such as
//! `bitcoin:?r=https://merchant.example/i/abc`. In the latter case the real
//! endpoint is the mandatory `r` query parameter.

use url::Url;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("invalid payment protocol url: {0}")]
    InvalidPaymentUrl(String),
}

/// Returns the HTTP(S) endpoint a payment URL or URI points to.
pub fn resolve_payment_url(payment_url: &str) -> Result<Url, ProtocolError> {
    let invalid = || ProtocolError::InvalidPaymentUrl(payment_url.to_string());
    let url = Url::parse(payment_url.trim()).map_err(|_| invalid())?;
    if matches!(url.scheme(), "http" | "https") {
        return Ok(url);
    }
    let request_url = url
        .query_pairs()
        .find(|(key, _)| key == "r")
        .map(|(_, value)| value.into_owned())
        .ok_or_else(invalid)?;
    let request_url = Url::parse(&request_url).map_err(|_| invalid())?;
    if matches!(request_url.scheme(), "http" | "https") {
        Ok(request_url)
    } else {
        Err(invalid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_https_url_is_unchanged() {
        let url = resolve_payment_url("https://merchant.example/i/abc").unwrap();
        assert_eq!(url.as_str(), "https://merchant.example/i/abc");
    }

    #[test]
    fn test_http_url_is_unchanged() {
        let url = resolve_payment_url("http://127.0.0.1:8080/i/abc?x=1").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/i/abc?x=1");
    }

    #[test]
    fn test_uri_with_r_parameter() {
        let url = resolve_payment_url("bitcoin:?r=https://merchant.example/path").unwrap();
        assert_eq!(url.as_str(), "https://merchant.example/path");
    }

    #[test]
    fn test_uri_with_encoded_r_and_other_params() {
        let url = resolve_payment_url(
            "bitcoincash:qqxyz?amount=0.1&r=https%3A%2F%2Fmerchant.example%2Fi%2Fabc%3Fv%3D2",
        )
        .unwrap();
        assert_eq!(url.as_str(), "https://merchant.example/i/abc?v=2");
    }

    #[test]
    fn test_uri_without_r_parameter() {
        let err = resolve_payment_url("bitcoin:1BoatSLRHtKNngkdXEeobR76b53LETtpyT?amount=1").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid payment protocol url: bitcoin:1BoatSLRHtKNngkdXEeobR76b53LETtpyT?amount=1"
        );
    }

    #[test]
    fn test_uri_with_non_http_r_parameter() {
        assert!(resolve_payment_url("bitcoin:?r=ftp://merchant.example/x").is_err());
        assert!(resolve_payment_url("bitcoin:?r=nonsense").is_err());
    }

    #[test]
    fn test_unparsable_url() {
        assert!(resolve_payment_url("merchant.example/i/abc").is_err());
        assert!(resolve_payment_url("").is_err());
    }
}
