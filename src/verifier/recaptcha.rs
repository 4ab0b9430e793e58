//! Google reCAPTCHA v3 siteverify client.
//!
//! API docs: https://developers.google.com/recaptcha/docs/verify

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use super::{BotVerifier, ScorePolicy, SiteverifyResponse, VerificationResult};
use crate::config::RecaptchaConfig;
use crate::error::VerificationError;

const HTTP_TIMEOUT: Duration = Duration::from_secs(20);

/// reCAPTCHA verifier. One POST per call, never retried.
pub struct RecaptchaVerifier {
    client: Client,
    secret: Option<SecretString>,
    verify_url: String,
    policy: ScorePolicy,
}

impl RecaptchaVerifier {
    pub fn new(config: &RecaptchaConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .connect_timeout(HTTP_TIMEOUT)
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("Failed to build siteverify HTTP client")?;

        Ok(Self {
            client,
            secret: config.secret.clone(),
            verify_url: config.verify_url.clone(),
            policy: ScorePolicy {
                min_score: config.min_score,
                expected_action: config.expected_action.clone(),
            },
        })
    }

    async fn siteverify(
        &self,
        secret: &SecretString,
        token: &str,
    ) -> Result<SiteverifyResponse, VerificationError> {
        let response = self
            .client
            .post(&self.verify_url)
            .form(&[("secret", secret.expose_secret()), ("response", token)])
            .send()
            .await
            .map_err(|e| VerificationError::Unreachable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(VerificationError::Unreachable(format!(
                "siteverify returned {status}: {body}"
            )));
        }

        response.json().await.map_err(|e| {
            VerificationError::Unreachable(format!("Failed to parse siteverify response: {e}"))
        })
    }
}

#[async_trait]
impl BotVerifier for RecaptchaVerifier {
    async fn verify(&self, token: Option<&str>) -> Result<VerificationResult, VerificationError> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(VerificationError::MissingToken)?;
        let secret = self
            .secret
            .as_ref()
            .ok_or(VerificationError::MissingSecret)?;

        let response = self.siteverify(secret, token).await?;
        let result = self.policy.evaluate(response);

        debug!(
            accepted = result.accepted,
            score = ?result.score,
            action = ?result.action,
            "Siteverify result"
        );

        result.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: Option<&str>) -> RecaptchaConfig {
        RecaptchaConfig {
            secret: secret.map(SecretString::from),
            // Unroutable: these tests must fail before any request is made.
            verify_url: "http://127.0.0.1:9/siteverify".into(),
            min_score: 0.5,
            expected_action: None,
            expose_details: false,
        }
    }

    #[tokio::test]
    async fn missing_token_is_client_fault() {
        let v = RecaptchaVerifier::new(&config(Some("secret"))).unwrap();
        assert!(matches!(
            v.verify(None).await,
            Err(VerificationError::MissingToken)
        ));
        assert!(matches!(
            v.verify(Some("   ")).await,
            Err(VerificationError::MissingToken)
        ));
    }

    #[tokio::test]
    async fn missing_secret_is_config_fault() {
        let v = RecaptchaVerifier::new(&config(None)).unwrap();
        assert!(matches!(
            v.verify(Some("tok")).await,
            Err(VerificationError::MissingSecret)
        ));
    }

    #[tokio::test]
    async fn unreachable_endpoint_reported() {
        let v = RecaptchaVerifier::new(&config(Some("secret"))).unwrap();
        assert!(matches!(
            v.verify(Some("tok")).await,
            Err(VerificationError::Unreachable(_))
        ));
    }
}
