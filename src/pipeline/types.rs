//! Shared types for the submission pipeline.
//!
//! The raw JSON body only lives as long as `SubmitPayload`. It is turned into
//! a `SubmissionRequest` (string fields only), which the validator turns into
//! a `ValidatedSubmission`, which an accepted verification turns into a
//! `VerifiedSubmission`. Only the last one can be handed to the notifier.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::de::IgnoredAny;
use serde_json::{Map, Value};

use crate::verifier::VerificationResult;

// ── Inbound payload ─────────────────────────────────────────────────

/// Body of `POST /api/submit`.
///
/// Form fields may be sent flat or nested under `data`; anything not named
/// here lands in `fields`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitPayload {
    #[serde(default)]
    pub recaptcha_token: Option<String>,
    /// Site the form was served for.
    #[serde(default)]
    pub brand: Option<String>,
    /// Sent by the web client. Captured so it stays out of `fields`.
    #[serde(default, rename = "userAgent")]
    _user_agent: Option<IgnoredAny>,
    #[serde(default)]
    pub data: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl SubmitPayload {
    /// Split into the form fields and the bot-verifier token.
    pub fn into_parts(self) -> (SubmissionRequest, Option<String>) {
        let mut fields = BTreeMap::new();

        // Top-level first so nested `data` wins for the same key.
        for (key, value) in self.fields.iter().chain(self.data.iter().flatten()) {
            if let Some(s) = scalar_to_string(value) {
                fields.insert(key.clone(), s);
            }
        }

        let request = SubmissionRequest::new(fields, self.brand);
        (request, self.recaptcha_token)
    }
}

/// Spanish field names accepted alongside the canonical ones.
const FIELD_ALIASES: [(&str, &str); 4] = [
    ("nombre", "name"),
    ("telefono", "phone"),
    ("servicio", "service"),
    ("mensaje", "details"),
];

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

// ── Submission request ──────────────────────────────────────────────

/// Untrusted form fields, keyed by canonical field name.
#[derive(Debug, Clone, Default)]
pub struct SubmissionRequest {
    fields: BTreeMap<String, String>,
    brand: Option<String>,
}

impl SubmissionRequest {
    /// Build a request, folding alias keys into their canonical names.
    /// A non-blank canonical value wins over its alias.
    pub fn new(mut fields: BTreeMap<String, String>, brand: Option<String>) -> Self {
        for (alias, canonical) in FIELD_ALIASES {
            let has_canonical = fields
                .get(canonical)
                .is_some_and(|v| !v.trim().is_empty());
            if let Some(value) = fields.remove(alias)
                && !has_canonical
            {
                fields.insert(canonical.to_string(), value);
            }
        }
        Self { fields, brand }
    }

    /// Convenience constructor from `(key, value)` pairs.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let fields = pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self::new(fields, None)
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    /// Trimmed value of a field, `None` when absent or blank.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn brand(&self) -> Option<&str> {
        self.brand.as_deref().map(str::trim).filter(|b| !b.is_empty())
    }
}

// ── Validated submission ────────────────────────────────────────────

/// Structured detail fields, in display order, with their labels.
pub const DETAIL_FIELDS: [(&str, &str); 6] = [
    ("service_details", "Service details"),
    ("location", "Location"),
    ("city", "City"),
    ("event_date", "Event date"),
    ("event_time", "Event time"),
    ("coordinator", "Coordinator"),
];

/// One labeled detail line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailLine {
    pub label: &'static str,
    pub value: String,
}

/// The single detail representation used for a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Details {
    /// Freeform `details` blob. Takes precedence over structured fields.
    Freeform(String),
    /// Non-blank structured fields, in `DETAIL_FIELDS` order.
    Structured(Vec<DetailLine>),
    /// Nothing supplied.
    Empty,
}

impl Details {
    pub(crate) fn from_request(request: &SubmissionRequest) -> Self {
        if let Some(blob) = request.get("details") {
            return Details::Freeform(blob.to_string());
        }

        let lines: Vec<DetailLine> = DETAIL_FIELDS
            .iter()
            .filter_map(|&(key, label)| {
                request.get(key).map(|value| DetailLine {
                    label,
                    value: value.to_string(),
                })
            })
            .collect();

        if lines.is_empty() {
            Details::Empty
        } else {
            Details::Structured(lines)
        }
    }
}

/// A submission whose required fields are present. Only `validate` builds one.
#[derive(Debug, Clone)]
pub struct ValidatedSubmission {
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) phone: String,
    pub(crate) service: String,
    pub(crate) details: Details,
    pub(crate) brand: Option<String>,
}

impl ValidatedSubmission {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn details(&self) -> &Details {
        &self.details
    }

    pub fn brand(&self) -> Option<&str> {
        self.brand.as_deref()
    }
}

// ── Verified submission ─────────────────────────────────────────────

/// A validated submission that also passed the bot check.
#[derive(Debug, Clone)]
pub struct VerifiedSubmission {
    submission: ValidatedSubmission,
    verification: VerificationResult,
}

impl VerifiedSubmission {
    /// Returns `None` unless the verification was accepted.
    pub fn new(submission: ValidatedSubmission, verification: VerificationResult) -> Option<Self> {
        verification.accepted.then_some(Self {
            submission,
            verification,
        })
    }

    pub fn submission(&self) -> &ValidatedSubmission {
        &self.submission
    }

    pub fn verification(&self) -> &VerificationResult {
        &self.verification
    }
}
