//! Resend transactional email API.
//!
//! API docs: https://resend.com/docs/api-reference/emails/send-email

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::debug;

use super::{DeliveryOutcome, MailTransport, MessageBody, NotificationMessage};
use crate::config::ResendConfig;
use crate::error::NotifyError;

const HTTP_TIMEOUT: Duration = Duration::from_secs(20);

/// Sends through `POST /emails` with a bearer API key.
pub struct ResendTransport {
    client: Client,
    api_key: Option<SecretString>,
    api_url: String,
    from: String,
}

impl ResendTransport {
    pub fn new(config: &ResendConfig, from: String) -> anyhow::Result<Self> {
        let client = Client::builder()
            .connect_timeout(HTTP_TIMEOUT)
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("Failed to build Resend HTTP client")?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            api_url: config.api_url.clone(),
            from,
        })
    }
}

#[async_trait]
impl MailTransport for ResendTransport {
    fn name(&self) -> &str {
        "resend"
    }

    async fn send(
        &self,
        message: &NotificationMessage,
        recipient: &str,
    ) -> Result<DeliveryOutcome, NotifyError> {
        let api_key = self.api_key.as_ref().ok_or(NotifyError::MissingApiKey)?;

        let request = SendEmailRequest::new(&self.from, recipient, message);

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| NotifyError::DeliveryFailed {
                provider: "resend".into(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::DeliveryFailed {
                provider: "resend".into(),
                reason: format!("{status}: {body}"),
            });
        }

        let provider_response = response
            .json::<serde_json::Value>()
            .await
            .unwrap_or(serde_json::Value::Null);
        debug!(status = %status, "Resend accepted message");

        Ok(DeliveryOutcome {
            delivered: true,
            provider_response,
        })
    }
}

// --- Resend request types ---

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<String>,
}

impl<'a> SendEmailRequest<'a> {
    fn new(from: &'a str, recipient: &'a str, message: &'a NotificationMessage) -> Self {
        let (html, text) = match &message.body {
            MessageBody::Html(b) => (Some(b.as_str()), None),
            MessageBody::Text(b) => (None, Some(b.as_str())),
        };
        Self {
            from,
            to: [recipient],
            subject: &message.subject,
            html,
            text,
            reply_to: message.reply_to_mailbox().map(|m| m.to_string()),
        }
    }
}
