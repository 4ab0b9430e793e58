//! SMTP relay transport via lettre.
//!
//! A fresh connection is opened per message. The configured timeout bounds
//! the TCP connect, the server greeting and every later socket operation, so
//! a stalled relay cannot hold a request forever.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::ExposeSecret;
use tracing::debug;

use super::{DeliveryOutcome, MailTransport, MessageBody, NotificationMessage};
use crate::config::SmtpConfig;
use crate::error::NotifyError;

/// Authenticated SMTP relay (implicit TLS or STARTTLS).
pub struct SmtpRelayTransport {
    config: SmtpConfig,
    from: String,
}

impl SmtpRelayTransport {
    pub fn new(config: &SmtpConfig, from: String) -> Self {
        Self {
            config: config.clone(),
            from,
        }
    }

    fn build_transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, NotifyError> {
        let host = self
            .config
            .host
            .as_deref()
            .ok_or(NotifyError::MissingRelayHost)?;

        // TLS is always required, either implicit or upgraded via STARTTLS.
        let builder = if self.config.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
        };
        let builder = builder.map_err(|e| failed(format!("SMTP relay error: {e}")))?;

        let mut builder = builder
            .port(self.config.port)
            .timeout(Some(self.config.timeout));

        if let (Some(user), Some(pass)) = (&self.config.username, &self.config.password) {
            builder = builder.credentials(Credentials::new(
                user.clone(),
                pass.expose_secret().to_string(),
            ));
        }

        Ok(builder.build())
    }

    fn build_message(
        &self,
        message: &NotificationMessage,
        recipient: &str,
    ) -> Result<Message, NotifyError> {
        let from: Mailbox = self.from.parse().map_err(|e| NotifyError::InvalidAddress {
            field: "from",
            reason: format!("{e}"),
        })?;
        let to: Mailbox = recipient.parse().map_err(|e| NotifyError::InvalidAddress {
            field: "to",
            reason: format!("{e}"),
        })?;

        let mut builder = Message::builder()
            .from(from)
            .to(to)
            .subject(message.subject.as_str());

        if let Some(reply_to) = message.reply_to_mailbox() {
            builder = builder.reply_to(reply_to);
        }

        let (content_type, body) = match &message.body {
            MessageBody::Html(b) => (ContentType::TEXT_HTML, b.clone()),
            MessageBody::Text(b) => (ContentType::TEXT_PLAIN, b.clone()),
        };

        builder
            .header(content_type)
            .body(body)
            .map_err(|e| failed(format!("Failed to build email: {e}")))
    }
}

fn failed(reason: String) -> NotifyError {
    NotifyError::DeliveryFailed {
        provider: "smtp".into(),
        reason,
    }
}

#[async_trait]
impl MailTransport for SmtpRelayTransport {
    fn name(&self) -> &str {
        "smtp"
    }

    async fn send(
        &self,
        message: &NotificationMessage,
        recipient: &str,
    ) -> Result<DeliveryOutcome, NotifyError> {
        let transport = self.build_transport()?;
        let email = self.build_message(message, recipient)?;

        let response = transport
            .send(email)
            .await
            .map_err(|e| failed(format!("SMTP send failed: {e}")))?;

        let code = response.code().to_string();
        let lines: Vec<&str> = response.message().collect();
        debug!(code = %code, "SMTP relay accepted message");

        Ok(DeliveryOutcome {
            delivered: response.is_positive(),
            provider_response: serde_json::json!({
                "code": code,
                "message": lines,
            }),
        })
    }
}
