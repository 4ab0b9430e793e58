//! Submission pipeline.
//!
//! Every submission flows through, in order:
//! 1. `validator::validate()`: required fields present and non-blank
//! 2. `BotVerifier::verify()`: reCAPTCHA token and score check
//! 3. `Notifier::notify()`: compose and deliver one email
//!
//! The first failing stage ends the submission. Nothing is retried.

pub mod types;
pub mod validator;

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::error::PipelineError;
use crate::notifier::{DeliveryOutcome, Notifier};
use crate::verifier::BotVerifier;
use types::{SubmissionRequest, VerifiedSubmission};

/// What a successful submission produced.
#[derive(Debug, Clone)]
pub struct Receipt {
    pub delivery: DeliveryOutcome,
}

/// Validator → bot verifier → notifier.
pub struct SubmissionPipeline {
    verifier: Arc<dyn BotVerifier>,
    notifier: Arc<Notifier>,
}

impl SubmissionPipeline {
    pub fn new(verifier: Arc<dyn BotVerifier>, notifier: Arc<Notifier>) -> Self {
        Self { verifier, notifier }
    }

    /// Run one submission through all three stages.
    pub async fn process(
        &self,
        request: SubmissionRequest,
        token: Option<String>,
    ) -> Result<Receipt, PipelineError> {
        let started = Instant::now();

        let validated = validator::validate(&request)?;

        let verification = self.verifier.verify(token.as_deref()).await?;
        info!(score = ?verification.score, "Bot check passed");

        let Some(verified) = VerifiedSubmission::new(validated, verification) else {
            // A verifier must not return Ok for a rejected result.
            warn!("Verifier returned an unaccepted result");
            return Err(crate::error::VerificationError::BotCheckFailed {
                score: None,
                action: None,
                reason: Some("verifier returned unaccepted result".into()),
            }
            .into());
        };

        let delivery = self.notifier.notify(&verified).await?;
        info!(
            transport = self.notifier.transport_name(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Submission delivered"
        );

        Ok(Receipt { delivery })
    }
}
