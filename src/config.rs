//! Configuration types.
//!
//! Built once at startup from environment variables and shared by `Arc`.
//! Missing secrets stay `None` here and fail at the operation that needs
//! them, so `GET /` keeps answering even when email is misconfigured.

use std::time::Duration;

use secrecy::SecretString;

pub const DEFAULT_PORT: u16 = 10000;
pub const DEFAULT_VERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";
pub const DEFAULT_MIN_SCORE: f64 = 0.5;
pub const DEFAULT_RESEND_URL: &str = "https://api.resend.com/emails";
pub const DEFAULT_FROM: &str = "Formulario Web <onboarding@resend.dev>";
pub const DEFAULT_SMTP_TIMEOUT: Duration = Duration::from_secs(20);

/// Full service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub recaptcha: RecaptchaConfig,
    pub mail: MailConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub port: u16,
    /// Empty means any origin.
    pub allowed_origins: Vec<String>,
}

/// Bot verifier settings.
#[derive(Debug, Clone)]
pub struct RecaptchaConfig {
    pub secret: Option<SecretString>,
    pub verify_url: String,
    /// Scores below this are rejected. A response without a score passes.
    pub min_score: f64,
    /// When set, the reported action must match.
    pub expected_action: Option<String>,
    /// Return score and action in 403 bodies (operator debugging only).
    pub expose_details: bool,
}

/// Which delivery backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Resend,
    Smtp,
}

/// Notification body format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    Html,
    Text,
}

/// Notifier settings.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub transport: TransportKind,
    pub format: BodyFormat,
    pub from_address: String,
    pub to_address: Option<String>,
    pub resend: ResendConfig,
    pub smtp: SmtpConfig,
}

#[derive(Debug, Clone)]
pub struct ResendConfig {
    pub api_key: Option<SecretString>,
    pub api_url: String,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: Option<String>,
    pub port: u16,
    /// Implicit TLS when true, required STARTTLS otherwise. There is no
    /// plaintext mode: a relay that does not offer STARTTLS is rejected.
    pub secure: bool,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    /// Bounds connect, greeting and every socket operation.
    pub timeout: Duration,
}

impl AppConfig {
    /// Build config from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let port = parse_or(get("PORT"), "PORT", DEFAULT_PORT);

        let allowed_origins: Vec<String> = get("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty() && s != "*")
            .collect();

        let mut min_score = parse_or(
            get("RECAPTCHA_MIN_SCORE"),
            "RECAPTCHA_MIN_SCORE",
            DEFAULT_MIN_SCORE,
        );
        if !(0.0..=1.0).contains(&min_score) {
            tracing::warn!(value = min_score, "RECAPTCHA_MIN_SCORE outside 0..=1, using default");
            min_score = DEFAULT_MIN_SCORE;
        }

        let transport = match get("EMAIL_TRANSPORT").map(|s| s.to_lowercase()).as_deref() {
            None | Some("resend") => TransportKind::Resend,
            Some("smtp") => TransportKind::Smtp,
            Some(other) => {
                tracing::warn!(value = other, "Unknown EMAIL_TRANSPORT, using resend");
                TransportKind::Resend
            }
        };

        let format = match get("EMAIL_FORMAT").map(|s| s.to_lowercase()).as_deref() {
            None | Some("html") => BodyFormat::Html,
            Some("text") | Some("plain") => BodyFormat::Text,
            Some(other) => {
                tracing::warn!(value = other, "Unknown EMAIL_FORMAT, using html");
                BodyFormat::Html
            }
        };

        let secure = parse_bool(get("SMTP_SECURE"));
        let smtp_port = parse_or(get("SMTP_PORT"), "SMTP_PORT", if secure { 465 } else { 587 });
        let timeout_secs = parse_or(
            get("SMTP_TIMEOUT_SECS"),
            "SMTP_TIMEOUT_SECS",
            DEFAULT_SMTP_TIMEOUT.as_secs(),
        );

        Self {
            server: ServerConfig {
                bind_addr: get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0".to_string()),
                port,
                allowed_origins,
            },
            recaptcha: RecaptchaConfig {
                secret: get("RECAPTCHA_SECRET").map(SecretString::from),
                verify_url: get("RECAPTCHA_VERIFY_URL")
                    .unwrap_or_else(|| DEFAULT_VERIFY_URL.to_string()),
                min_score,
                expected_action: get("RECAPTCHA_EXPECTED_ACTION"),
                expose_details: parse_bool(get("RECAPTCHA_EXPOSE_DETAILS")),
            },
            mail: MailConfig {
                transport,
                format,
                from_address: get("FROM_EMAIL").unwrap_or_else(|| DEFAULT_FROM.to_string()),
                to_address: get("TO_EMAIL"),
                resend: ResendConfig {
                    api_key: get("RESEND_API_KEY").map(SecretString::from),
                    api_url: get("RESEND_API_URL")
                        .unwrap_or_else(|| DEFAULT_RESEND_URL.to_string()),
                },
                smtp: SmtpConfig {
                    host: get("SMTP_HOST"),
                    port: smtp_port,
                    secure,
                    username: get("SMTP_USER"),
                    password: get("SMTP_PASS").map(SecretString::from),
                    timeout: Duration::from_secs(timeout_secs),
                },
            },
        }
    }
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, key: &str, default: T) -> T {
    match raw {
        None => default,
        Some(s) => s.parse().unwrap_or_else(|_| {
            tracing::warn!(key, "Invalid configuration value, using default");
            default
        }),
    }
}

fn parse_bool(raw: Option<String>) -> bool {
    matches!(
        raw.map(|s| s.to_lowercase()).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}
