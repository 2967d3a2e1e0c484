use clap::Parser;
use dotenvy::dotenv;
use paypro_client::{PayProClient, UnsignedVerificationPolicy, Verification, VerifiedResponse};
use paypro_types::proto::{PaymentOptions, PaymentSubmission};
use std::fmt::Write as _;

use crate::config::{CliArgs, Command, Config, SubmissionArgs};
use crate::telemetry::Telemetry;

/// Runs one protocol operation and prints the verified response.
///
/// - Loads `.env` variables.
/// - Installs logging and, when configured, OTLP span export.
/// - Builds the trust store and client from the configuration file.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let cli = CliArgs::parse();
    let _telemetry = Telemetry::new()
        .with_name(env!("CARGO_PKG_NAME"))
        .with_version(env!("CARGO_PKG_VERSION"))
        .register();

    let config = Config::load_from_path(&cli.config)?;
    let trust_store = config.trust_store()?;
    if trust_store.is_empty() {
        tracing::warn!(config = %cli.config.display(), "No trusted keys configured");
    } else {
        let identities: Vec<&str> = trust_store.identities().collect();
        tracing::debug!(?identities, "Loaded trusted keys");
    }

    let mut transport_config = config.transport().clone();
    if cli.insecure {
        transport_config.accept_invalid_certs = true;
    }
    let unsigned_verification = if cli.no_verify {
        UnsignedVerificationPolicy::ParseOnly
    } else {
        config.unsigned_verification()
    };
    let client = PayProClient::try_new(trust_store, &transport_config)?
        .with_unsigned_verification(unsigned_verification);
    let verification = if cli.no_verify {
        tracing::warn!("Signature verification is disabled");
        Verification::Bypass
    } else {
        Verification::Authenticate
    };

    let output = match cli.command {
        Command::Options { payment_url } => {
            let response = client
                .get_payment_options(&payment_url, verification)
                .await?;
            let options = response.payment_options()?;
            let mut output = render(&response)?;
            output.push_str(&render_amounts(&options));
            output
        }
        Command::Select {
            payment_url,
            chain,
            currency,
        } => {
            let response = client
                .select_payment_option(&payment_url, &chain, &currency, verification)
                .await?;
            // Fails on a body that is not a payment request.
            response.payment_request()?;
            render(&response)?
        }
        Command::Verify(args) => {
            let (payment_url, submission) = args.into_submission();
            let response = client
                .verify_payment_request(&payment_url, &submission)
                .await?;
            let verification = response.payment_verification()?;
            let mut output = render(&response)?;
            output.push_str(&render_memo(verification.memo.as_deref()));
            output
        }
        Command::Pay(args) => {
            let (payment_url, submission) = args.into_submission();
            let response = client.send_signed_payment(&payment_url, &submission).await?;
            let ack = response.payment_ack()?;
            let mut output = render(&response)?;
            output.push_str(&render_memo(ack.memo.as_deref()));
            output
        }
    };
    print!("{output}");
    Ok(())
}

impl SubmissionArgs {
    fn into_submission(self) -> (String, PaymentSubmission) {
        let submission = PaymentSubmission {
            chain: self.chain,
            currency: self.currency,
            transactions: self.transactions,
        };
        (self.payment_url, submission)
    }
}

/// Signer line followed by the pretty-printed response body.
fn render(response: &VerifiedResponse) -> Result<String, serde_json::Error> {
    let signer = match &response.matched_key {
        Some(key) => match &key.owner {
            Some(owner) => format!("Signed by {} ({owner})", key.identity),
            None => format!("Signed by {}", key.identity),
        },
        None => "UNVERIFIED: signature was not checked".to_string(),
    };
    let body = serde_json::to_string_pretty(&response.response_data)?;
    Ok(format!("{signer}\n{body}\n"))
}

fn render_memo(memo: Option<&str>) -> String {
    match memo {
        Some(memo) => format!("Merchant: {memo}\n"),
        None => String::new(),
    }
}

fn render_amounts(options: &PaymentOptions) -> String {
    let mut output = String::new();
    for option in &options.payment_options {
        let amount = match option.display_amount() {
            Ok(amount) => amount.normalize().to_string(),
            Err(err) => format!("<{err}>"),
        };
        let _ = writeln!(
            output,
            "{}/{} ({}): {amount}",
            option.chain, option.currency, option.network
        );
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use paypro_types::trust::TrustedKey;
    use std::sync::Arc;

    fn options() -> PaymentOptions {
        serde_json::from_str(
            r#"{
                "memo": "Invoice",
                "paymentOptions": [
                    { "chain": "BTC", "currency": "BTC", "network": "main", "estimatedAmount": 10800, "decimals": 8 },
                    { "chain": "ETH", "currency": "USDC", "network": "main", "estimatedAmount": 5000000, "decimals": 6 },
                    { "chain": "ETH", "currency": "ETH", "network": "main", "estimatedAmount": 25000000000000000000, "decimals": 18 },
                    { "chain": "XXX", "currency": "XXX", "network": "main", "estimatedAmount": 1, "decimals": 40 }
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_render_amounts() {
        let rendered = render_amounts(&options());
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "BTC/BTC (main): 0.000108");
        assert_eq!(lines[1], "ETH/USDC (main): 5");
        assert_eq!(lines[2], "ETH/ETH (main): 25");
        assert!(lines[3].starts_with("XXX/XXX (main): <"));
    }

    #[test]
    fn test_render_memo() {
        assert_eq!(render_memo(Some("Payment appears valid")), "Merchant: Payment appears valid\n");
        assert_eq!(render_memo(None), "");
    }

    #[test]
    fn test_render_signed_and_unverified() {
        let key = TrustedKey::new("id-1", vec![2; 33], ["merchant.example"], ["main"])
            .with_owner("Merchant Ltd");
        let signed = VerifiedResponse {
            request_url: "https://merchant.example/i/abc".to_string(),
            response_data: serde_json::json!({ "memo": "ok" }),
            matched_key: Some(Arc::new(key)),
        };
        let rendered = render(&signed).unwrap();
        assert!(rendered.starts_with("Signed by id-1 (Merchant Ltd)\n"));
        assert!(rendered.contains("\"memo\": \"ok\""));

        let unverified = VerifiedResponse {
            matched_key: None,
            ..signed
        };
        assert!(render(&unverified).unwrap().starts_with("UNVERIFIED"));
    }
}
