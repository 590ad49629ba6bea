//! Reqwest-backed payment verifier for a Paystack-style gateway.
//!
//! Calls `GET {base}/transaction/verify/{reference}` with the secret key as a
//! bearer token. The adapter owns transport details only; settlement rules
//! live in the reconciliation service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use zeroize::Zeroizing;

use super::dto::VerifyResponseDto;
use crate::domain::ports::{PaymentVerifier, PaymentVerifierError};
use crate::domain::{PaymentReference, PaymentVerification};

/// Default gateway API base.
pub const DEFAULT_GATEWAY_BASE_URL: &str = "https://api.paystack.co";

/// Payment verifier performing one HTTP lookup per call.
pub struct HttpPaymentVerifier {
    client: Client,
    base_url: Url,
    secret_key: Zeroizing<String>,
}

impl HttpPaymentVerifier {
    /// Build a verifier with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        base_url: Url,
        secret_key: Zeroizing<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            secret_key,
        })
    }
}

#[async_trait]
impl PaymentVerifier for HttpPaymentVerifier {
    async fn verify(
        &self,
        reference: &PaymentReference,
    ) -> Result<PaymentVerification, PaymentVerifierError> {
        let url = verify_url(&self.base_url, reference)?;
        let response = self
            .client
            .get(url)
            .bearer_auth(self.secret_key.as_str())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        parse_verification(body.as_ref())
    }
}

fn verify_url(base: &Url, reference: &PaymentReference) -> Result<Url, PaymentVerifierError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| PaymentVerifierError::transport(format!("invalid gateway base URL {base}")))?
        .pop_if_empty()
        .extend(["transaction", "verify", reference.as_ref()]);
    Ok(url)
}

fn parse_verification(body: &[u8]) -> Result<PaymentVerification, PaymentVerifierError> {
    let decoded: VerifyResponseDto = serde_json::from_slice(body).map_err(|error| {
        PaymentVerifierError::decode(format!("invalid verification JSON payload: {error}"))
    })?;
    decoded
        .into_verification()
        .map_err(PaymentVerifierError::decode)
}

fn map_transport_error(error: reqwest::Error) -> PaymentVerifierError {
    if error.is_timeout() {
        PaymentVerifierError::timeout(error.to_string())
    } else {
        PaymentVerifierError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> PaymentVerifierError {
    let preview = body_preview(body);
    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            PaymentVerifierError::timeout(format!("status {}: {preview}", status.as_u16()))
        }
        _ => PaymentVerifierError::status(status.as_u16(), preview),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for non-network verifier helpers.

    use super::*;
    use crate::domain::GatewayStatus;
    use rstest::rstest;

    fn reference() -> PaymentReference {
        PaymentReference::new("BT-1700000000000-K3J9Q2Z").expect("valid reference")
    }

    #[rstest]
    #[case("https://api.paystack.co")]
    #[case("https://api.paystack.co/")]
    fn builds_verify_urls(#[case] base: &str) {
        let base = Url::parse(base).expect("valid base");
        let url = verify_url(&base, &reference()).expect("url builds");
        assert_eq!(
            url.as_str(),
            "https://api.paystack.co/transaction/verify/BT-1700000000000-K3J9Q2Z"
        );
    }

    #[rstest]
    fn keeps_base_path_prefixes() {
        let base = Url::parse("http://127.0.0.1:9000/mock/").expect("valid base");
        let url = verify_url(&base, &reference()).expect("url builds");
        assert_eq!(url.path(), "/mock/transaction/verify/BT-1700000000000-K3J9Q2Z");
    }

    #[rstest]
    fn parses_successful_verifications() {
        let body = r#"{
            "status": true,
            "message": "Verification successful",
            "data": {
                "status": "success",
                "amount": 50000,
                "currency": "NGN",
                "reference": "BT-1700000000000-K3J9Q2Z",
                "gateway_response": "Successful"
            }
        }"#;
        let verification = parse_verification(body.as_bytes()).expect("decodes");
        assert_eq!(verification.status, GatewayStatus::Success);
        assert_eq!(verification.amount, 50_000);
        assert!(verification.is_for(&reference()));
    }

    #[rstest]
    #[case::rejected(r#"{"status": false, "message": "Transaction reference not found"}"#)]
    #[case::missing_data(r#"{"status": true, "message": "ok"}"#)]
    #[case::not_json("<html>")]
    fn rejects_unusable_bodies(#[case] body: &str) {
        let error = parse_verification(body.as_bytes()).expect_err("decode fails");
        assert!(matches!(error, PaymentVerifierError::Decode { .. }));
    }

    #[rstest]
    #[case(StatusCode::GATEWAY_TIMEOUT, true)]
    #[case(StatusCode::UNAUTHORIZED, false)]
    #[case(StatusCode::INTERNAL_SERVER_ERROR, false)]
    fn maps_http_statuses(#[case] status: StatusCode, #[case] is_timeout: bool) {
        let error = map_status_error(status, b"{\"message\": \"nope\"}");
        if is_timeout {
            assert!(matches!(error, PaymentVerifierError::Timeout { .. }));
        } else {
            assert_eq!(
                error,
                PaymentVerifierError::status(status.as_u16(), "{\"message\": \"nope\"}")
            );
        }
    }

    #[rstest]
    fn previews_are_truncated() {
        let body = "x".repeat(500);
        let preview = body_preview(body.as_bytes());
        assert_eq!(preview.chars().count(), 163);
        assert!(preview.ends_with("..."));
    }
}
