//! Error types for form-relay.
//!
//! Every stage returns its own error enum. `PipelineError` wraps them so the
//! HTTP boundary can map an error kind to a status code and a terse,
//! user-safe message while logging the full `Display` server-side.

use axum::http::StatusCode;

/// Top-level error for one submission.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Verification error: {0}")]
    Verification(#[from] VerificationError),

    #[error("Notify error: {0}")]
    Notify(#[from] NotifyError),
}

impl PipelineError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Verification(e) => e.status(),
            Self::Notify(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to an untrusted client.
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::Verification(e) => e.public_message().to_string(),
            Self::Notify(_) => "Error sending form".to_string(),
        }
    }

    /// Short, PII-free label used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Verification(e) => e.kind(),
            Self::Notify(e) => e.kind(),
        }
    }
}

/// Submitter left required fields out.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required fields: {}", .fields.join(", "))]
    MissingField { fields: Vec<&'static str> },
}

/// Bot verification failures.
#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    /// Client did not send a token.
    #[error("Missing verification token")]
    MissingToken,

    /// Operator did not configure the verifier secret.
    #[error("Missing required configuration: RECAPTCHA_SECRET")]
    MissingSecret,

    #[error("Verification endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("Bot check failed (score: {score:?}, action: {action:?}, reason: {reason:?})")]
    BotCheckFailed {
        score: Option<f64>,
        action: Option<String>,
        reason: Option<String>,
    },
}

impl VerificationError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingToken => StatusCode::BAD_REQUEST,
            Self::BotCheckFailed { .. } => StatusCode::FORBIDDEN,
            Self::MissingSecret | Self::Unreachable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn public_message(&self) -> &'static str {
        match self {
            Self::MissingToken => "Missing reCAPTCHA token",
            Self::BotCheckFailed { .. } => "reCAPTCHA verification failed",
            Self::MissingSecret | Self::Unreachable(_) => "Error verifying reCAPTCHA",
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingToken => "missing_token",
            Self::MissingSecret => "missing_secret",
            Self::Unreachable(_) => "verification_unreachable",
            Self::BotCheckFailed { .. } => "bot_check_failed",
        }
    }
}

/// Notification failures. Everything except `DeliveryFailed` is an operator fault.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Missing required configuration: RESEND_API_KEY")]
    MissingApiKey,

    #[error("Missing required configuration: TO_EMAIL")]
    MissingRecipient,

    #[error("Missing required configuration: SMTP_HOST")]
    MissingRelayHost,

    #[error("Invalid {field} address: {reason}")]
    InvalidAddress { field: &'static str, reason: String },

    #[error("Delivery via {provider} failed: {reason}")]
    DeliveryFailed { provider: String, reason: String },
}

impl NotifyError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingApiKey => "missing_api_key",
            Self::MissingRecipient => "missing_recipient",
            Self::MissingRelayHost => "missing_relay_host",
            Self::InvalidAddress { .. } => "invalid_address",
            Self::DeliveryFailed { .. } => "delivery_failed",
        }
    }
}
