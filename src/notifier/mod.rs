//! Notifier: composes the notification and hands it to a mail transport.
//!
//! Transports:
//! - **Resend**: transactional email HTTP API (`resend`)
//! - **SMTP**: authenticated relay via lettre (`smtp`)
//!
//! The transport is picked once from `MailConfig::transport`. Each
//! submission gets at most one delivery attempt.

pub mod compose;
pub mod resend;
pub mod smtp;

pub use compose::{MessageBody, NotificationMessage, compose};
pub use resend::ResendTransport;
pub use smtp::SmtpRelayTransport;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{BodyFormat, MailConfig, TransportKind};
use crate::error::NotifyError;
use crate::pipeline::types::VerifiedSubmission;

/// Result of a delivery attempt that the provider accepted.
#[derive(Debug, Clone)]
pub struct DeliveryOutcome {
    pub delivered: bool,
    /// Whatever the provider returned (message id, SMTP reply, ...).
    pub provider_response: serde_json::Value,
}

/// A way to deliver one composed message to one recipient.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Deliver once. Failures are returned, never retried.
    async fn send(
        &self,
        message: &NotificationMessage,
        recipient: &str,
    ) -> Result<DeliveryOutcome, NotifyError>;
}

/// Create the transport selected by configuration.
pub fn create_transport(config: &MailConfig) -> anyhow::Result<Arc<dyn MailTransport>> {
    let from = config.from_address.clone();
    Ok(match config.transport {
        TransportKind::Resend => Arc::new(ResendTransport::new(&config.resend, from)?),
        TransportKind::Smtp => Arc::new(SmtpRelayTransport::new(&config.smtp, from)),
    })
}

/// Composes and delivers notifications for verified submissions.
pub struct Notifier {
    transport: Arc<dyn MailTransport>,
    format: BodyFormat,
    recipient: Option<String>,
}

impl Notifier {
    pub fn new(transport: Arc<dyn MailTransport>, config: &MailConfig) -> Self {
        Self {
            transport,
            format: config.format,
            recipient: config.to_address.clone(),
        }
    }

    /// Notifier using the configured transport.
    pub fn from_config(config: &MailConfig) -> anyhow::Result<Self> {
        Ok(Self::new(create_transport(config)?, config))
    }

    pub fn transport_name(&self) -> &str {
        self.transport.name()
    }

    /// Compose and send the notification for one submission.
    pub async fn notify(
        &self,
        submission: &VerifiedSubmission,
    ) -> Result<DeliveryOutcome, NotifyError> {
        let recipient = self
            .recipient
            .as_deref()
            .ok_or(NotifyError::MissingRecipient)?;

        let message = compose(submission, self.format);
        self.transport.send(&message, recipient).await
    }
}
