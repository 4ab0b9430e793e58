//! Required-field validation.

use super::types::{Details, SubmissionRequest, ValidatedSubmission};
use crate::error::ValidationError;

/// Required fields, in the order they are reported.
pub const REQUIRED_FIELDS: [&str; 4] = ["name", "email", "phone", "service"];

/// Check that every required field is present and non-blank.
///
/// All missing fields are reported together. Values are trimmed; no format
/// checking is done on email or phone.
pub fn validate(request: &SubmissionRequest) -> Result<ValidatedSubmission, ValidationError> {
    let missing: Vec<&'static str> = REQUIRED_FIELDS
        .into_iter()
        .filter(|key| request.get(key).is_none())
        .collect();

    if !missing.is_empty() {
        return Err(ValidationError::MissingField { fields: missing });
    }

    let field = |key: &str| request.get(key).unwrap_or_default().to_string();

    Ok(ValidatedSubmission {
        name: field("name"),
        email: field("email"),
        phone: field("phone"),
        service: field("service"),
        details: Details::from_request(request),
        brand: request.brand().map(str::to_string),
    })
}
