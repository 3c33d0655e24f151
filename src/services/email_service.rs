// src/services/email_service.rs

use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

#[async_trait]
pub trait EmailClient: Send + Sync {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()>;
}

/// SendGrid v3 mail client.
#[derive(Clone)]
pub struct SendGridClient {
    api_key: String,
    from: String,
    client: Client,
}

impl SendGridClient {
    pub fn new(api_key: String, from: String) -> Self {
        Self {
            api_key,
            from,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl EmailClient for SendGridClient {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        let url = "https://api.sendgrid.com/v3/mail/send";

        let payload = json!({
            "personalizations": [{ "to": [{ "email": to }] }],
            "from": { "email": self.from },
            "subject": subject,
            "content": [{ "type": "text/plain", "value": body }],
        });

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| anyhow!("SendGrid API error: {}", e))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(anyhow!(
                "email sending failed with status: {}",
                response.status()
            ))
        }
    }
}
