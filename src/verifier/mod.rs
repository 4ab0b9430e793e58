//! Bot verification.
//!
//! `BotVerifier` is the seam the pipeline talks to. `RecaptchaVerifier` is
//! the production implementation; tests swap in stubs.

pub mod recaptcha;

pub use recaptcha::RecaptchaVerifier;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::VerificationError;

/// Outcome of one verification call.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationResult {
    pub accepted: bool,
    /// 0.0 (bot) to 1.0 (human), when the endpoint reports one.
    pub score: Option<f64>,
    pub action: Option<String>,
    pub reason: Option<String>,
}

impl VerificationResult {
    /// Convert a rejected result into `BotCheckFailed`.
    pub fn into_result(self) -> Result<Self, VerificationError> {
        if self.accepted {
            Ok(self)
        } else {
            Err(VerificationError::BotCheckFailed {
                score: self.score,
                action: self.action,
                reason: self.reason,
            })
        }
    }
}

/// Body returned by a siteverify endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SiteverifyResponse {
    pub success: bool,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default, rename = "error-codes")]
    pub error_codes: Vec<String>,
}

/// Acceptance policy applied to a siteverify response.
#[derive(Debug, Clone)]
pub struct ScorePolicy {
    pub min_score: f64,
    pub expected_action: Option<String>,
}

impl ScorePolicy {
    /// Accept when the endpoint reports success and the score, if any,
    /// meets the threshold. A missing score is accepted. When an expected
    /// action is configured, the reported action must match it.
    pub fn evaluate(&self, response: SiteverifyResponse) -> VerificationResult {
        let reason = if !response.success {
            Some(if response.error_codes.is_empty() {
                "unsuccessful".to_string()
            } else {
                response.error_codes.join(",")
            })
        } else if response.score.is_some_and(|s| s < self.min_score) {
            Some("score below threshold".to_string())
        } else if let Some(expected) = &self.expected_action
            && response.action.as_deref() != Some(expected.as_str())
        {
            Some("action mismatch".to_string())
        } else {
            None
        };

        VerificationResult {
            accepted: reason.is_none(),
            score: response.score,
            action: response.action,
            reason,
        }
    }
}

/// Something that can tell a human submission from a bot.
#[async_trait]
pub trait BotVerifier: Send + Sync {
    /// Verify a client token. Rejections come back as
    /// `VerificationError::BotCheckFailed`.
    async fn verify(&self, token: Option<&str>) -> Result<VerificationResult, VerificationError>;
}
