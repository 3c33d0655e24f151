// src/services/otp_service.rs
//
// Phone-path verification is delegated entirely to a Twilio-Verify-style
// provider: it issues the code, custodies it, and reports a status when we
// ask it to check a caller-supplied code. We never see the code value.

use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

/// Provider status on a verification check. Only `approved` authorizes a
/// password reset.
pub const OTP_STATUS_APPROVED: &str = "approved";

#[async_trait]
pub trait OtpProvider: Send + Sync {
    /// Ask the provider to send a fresh OTP to the phone number.
    async fn start_verification(&self, phone: &str) -> anyhow::Result<()>;
    /// Check a caller-supplied code; returns the provider's status string
    /// ("approved", "pending", "canceled", ...).
    async fn check_verification(&self, phone: &str, code: &str) -> anyhow::Result<String>;
}

#[derive(Debug, Deserialize)]
struct VerificationResponse {
    status: String,
}

#[derive(Clone)]
pub struct TwilioVerifyClient {
    account_sid: String,
    auth_token: String,
    verify_service_sid: String,
    client: Client,
}

impl TwilioVerifyClient {
    pub fn new(account_sid: String, auth_token: String, verify_service_sid: String) -> Self {
        Self {
            account_sid,
            auth_token,
            verify_service_sid,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl OtpProvider for TwilioVerifyClient {
    async fn start_verification(&self, phone: &str) -> anyhow::Result<()> {
        let url = format!(
            "https://verify.twilio.com/v2/Services/{}/Verifications",
            self.verify_service_sid
        );

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("To", phone), ("Channel", "sms")])
            .send()
            .await
            .map_err(|e| anyhow!("Twilio Verify API error: {}", e))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(anyhow!(
                "OTP sending failed with status: {}",
                response.status()
            ))
        }
    }

    async fn check_verification(&self, phone: &str, code: &str) -> anyhow::Result<String> {
        let url = format!(
            "https://verify.twilio.com/v2/Services/{}/VerificationCheck",
            self.verify_service_sid
        );

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("To", phone), ("Code", code)])
            .send()
            .await
            .map_err(|e| anyhow!("Twilio Verify API error: {}", e))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "OTP check failed with status: {}",
                response.status()
            ));
        }

        let body: VerificationResponse = response
            .json()
            .await
            .map_err(|e| anyhow!("Twilio Verify response parse error: {}", e))?;

        Ok(body.status)
    }
}
