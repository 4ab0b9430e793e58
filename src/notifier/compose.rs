//! Notification message composition.
//!
//! Output depends only on the submission and the configured body format.

use lettre::message::Mailbox;
use tracing::warn;

use crate::config::BodyFormat;
use crate::pipeline::types::{Details, ValidatedSubmission, VerifiedSubmission};

/// Shown when a submission carries no detail content at all.
pub const NO_DETAILS: &str = "N/A";

/// Composed notification, ready for a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationMessage {
    pub subject: String,
    pub body: MessageBody,
    /// Submitter's email, so the operator can answer directly.
    pub reply_to: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    Html(String),
    Text(String),
}

impl NotificationMessage {
    /// The submitter's address as a mailbox, if it parses as one.
    ///
    /// Submitter emails are only checked for presence, so transports must
    /// drop a Reply-To that is not an address rather than fail delivery.
    pub fn reply_to_mailbox(&self) -> Option<Mailbox> {
        match self.reply_to.parse::<Mailbox>() {
            Ok(mailbox) => Some(mailbox),
            Err(_) => {
                warn!("Submitter email is not a valid mailbox, omitting Reply-To");
                None
            }
        }
    }
}

impl MessageBody {
    pub fn as_str(&self) -> &str {
        match self {
            MessageBody::Html(s) | MessageBody::Text(s) => s,
        }
    }
}

/// Build the notification for a verified submission.
pub fn compose(verified: &VerifiedSubmission, format: BodyFormat) -> NotificationMessage {
    let submission = verified.submission();
    let body = match format {
        BodyFormat::Html => MessageBody::Html(render_html(submission)),
        BodyFormat::Text => MessageBody::Text(render_text(submission)),
    };

    NotificationMessage {
        subject: subject_line(submission),
        body,
        reply_to: submission.email().to_string(),
    }
}

/// `[brand] New form submission: <service>`, folded onto one line.
pub fn subject_line(submission: &ValidatedSubmission) -> String {
    let subject = match submission.brand() {
        Some(brand) => format!("[{brand}] New form submission: {}", submission.service()),
        None => format!("New form submission: {}", submission.service()),
    };
    subject.replace(['\r', '\n'], " ")
}

/// Escape the five markup-significant characters.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn render_html(s: &ValidatedSubmission) -> String {
    let mut html = String::from("<h3>New form submission</h3>\n");
    for (label, value) in summary_fields(s) {
        html.push_str(&format!("<p><b>{label}:</b> {}</p>\n", escape_html(value)));
    }
    html.push_str("<p><b>Details:</b></p>\n");
    html.push_str(&render_details_html(s.details()));
    html
}

fn render_text(s: &ValidatedSubmission) -> String {
    let mut text = String::from("New form submission\n\n");
    for (label, value) in summary_fields(s) {
        text.push_str(&format!("{label}: {value}\n"));
    }
    text.push_str("\nDetails:\n");
    text.push_str(&render_details_text(s.details()));
    text
}

fn summary_fields(s: &ValidatedSubmission) -> Vec<(&'static str, &str)> {
    let mut fields = vec![
        ("Name", s.name()),
        ("Email", s.email()),
        ("Phone", s.phone()),
        ("Service", s.service()),
    ];
    if let Some(brand) = s.brand() {
        fields.push(("Brand", brand));
    }
    fields
}

/// Detail block as plain text: one `Label: value` line per present field.
pub fn render_details_text(details: &Details) -> String {
    match details {
        Details::Freeform(blob) => format!("{blob}\n"),
        Details::Structured(lines) => lines
            .iter()
            .map(|line| format!("{}: {}\n", line.label, line.value))
            .collect(),
        Details::Empty => format!("{NO_DETAILS}\n"),
    }
}

/// Detail block as HTML. Structured fields become an ordered list.
pub fn render_details_html(details: &Details) -> String {
    match details {
        Details::Freeform(blob) => {
            let lines: Vec<String> = blob.lines().map(escape_html).collect();
            format!("<p>{}</p>\n", lines.join("<br>"))
        }
        Details::Structured(lines) => {
            let items: String = lines
                .iter()
                .map(|line| {
                    format!(
                        "<li><b>{}:</b> {}</li>\n",
                        line.label,
                        escape_html(&line.value)
                    )
                })
                .collect();
            format!("<ol>\n{items}</ol>\n")
        }
        Details::Empty => format!("<p>{NO_DETAILS}</p>\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::{DETAIL_FIELDS, SubmissionRequest};
    use crate::pipeline::validator::validate;
    use crate::verifier::VerificationResult;

    fn verified(pairs: &[(&str, &str)]) -> VerifiedSubmission {
        let mut all = vec![
            ("name", "Ana"),
            ("email", "a@x.com"),
            ("phone", "123"),
            ("service", "Photo"),
        ];
        all.extend_from_slice(pairs);
        let submission = validate(&SubmissionRequest::from_pairs(all)).unwrap();
        let result = VerificationResult {
            accepted: true,
            score: Some(0.9),
            action: None,
            reason: None,
        };
        VerifiedSubmission::new(submission, result).unwrap()
    }

    #[test]
    fn escapes_all_five_characters() {
        assert_eq!(escape_html(r#"&<>"'"#), "&amp;&lt;&gt;&quot;&#39;");
    }

    #[test]
    fn html_body_escapes_name() {
        let mut v = verified(&[]);
        let mut submission = v.submission().clone();
        submission.name = "<b>Eve</b>".into();
        v = VerifiedSubmission::new(submission, v.verification().clone()).unwrap();

        let msg = compose(&v, BodyFormat::Html);
        let body = msg.body.as_str();
        assert!(body.contains("&lt;b&gt;Eve&lt;/b&gt;"));
        assert!(!body.contains("<b>Eve</b>"));
    }

    #[test]
    fn html_body_escapes_every_interpolated_field() {
        let hostile = r#"<x a="1">'&'</x>"#;
        let escaped = escape_html(hostile);
        let v = verified(&[("city", hostile)]);
        let mut submission = v.submission().clone();
        submission.name = hostile.into();
        submission.email = hostile.into();
        submission.phone = hostile.into();
        submission.service = hostile.into();
        submission.brand = Some(hostile.into());
        let v = VerifiedSubmission::new(submission, v.verification().clone()).unwrap();

        let body = compose(&v, BodyFormat::Html).body.as_str().to_string();
        assert!(!body.contains(hostile));
        // name, email, phone, service, brand, city
        assert_eq!(body.matches(&escaped).count(), 6);
    }

    #[test]
    fn freeform_html_escapes_and_breaks_lines() {
        let html = render_details_html(&Details::Freeform("a<b\nsecond".into()));
        assert_eq!(html, "<p>a&lt;b<br>second</p>\n");
    }

    #[test]
    fn text_body_is_not_escaped() {
        let v = verified(&[("details", "Tom & Jerry <3")]);
        let msg = compose(&v, BodyFormat::Text);
        assert!(matches!(msg.body, MessageBody::Text(_)));
        assert!(msg.body.as_str().contains("Tom & Jerry <3"));
    }

    #[test]
    fn subject_includes_service() {
        let msg = compose(&verified(&[]), BodyFormat::Html);
        assert_eq!(msg.subject, "New form submission: Photo");
    }

    #[test]
    fn subject_prefixes_brand_and_folds_newlines() {
        let v = verified(&[]);
        let mut submission = v.submission().clone();
        submission.brand = Some("oasis".into());
        submission.service = "Photo\r\nBcc: x@evil.com".into();
        assert_eq!(
            subject_line(&submission),
            "[oasis] New form submission: Photo  Bcc: x@evil.com"
        );
    }

    #[test]
    fn reply_to_is_submitter_email() {
        let msg = compose(&verified(&[]), BodyFormat::Text);
        assert_eq!(msg.reply_to, "a@x.com");
        assert_eq!(msg.reply_to_mailbox().unwrap().to_string(), "a@x.com");
    }

    #[test]
    fn unparseable_submitter_email_has_no_mailbox() {
        let mut submission = verified(&[]).submission().clone();
        submission.email = "call me".into();
        let v = VerifiedSubmission::new(submission, verified(&[]).verification().clone()).unwrap();

        let msg = compose(&v, BodyFormat::Html);
        assert_eq!(msg.reply_to, "call me");
        assert!(msg.reply_to_mailbox().is_none());
    }

    #[test]
    fn only_city_renders_one_line() {
        let v = verified(&[("city", "Miami")]);
        let text = render_details_text(v.submission().details());
        assert_eq!(text, "City: Miami\n");

        let html = render_details_html(v.submission().details());
        assert_eq!(html.matches("<li>").count(), 1);
        assert!(html.contains("<li><b>City:</b> Miami</li>"));
        for (_, label) in DETAIL_FIELDS.iter().filter(|(k, _)| *k != "city") {
            assert!(!html.contains(label), "unexpected {label}");
        }
    }

    #[test]
    fn no_details_renders_na() {
        let v = verified(&[]);
        assert_eq!(render_details_text(v.submission().details()), "N/A\n");
        assert_eq!(render_details_html(v.submission().details()), "<p>N/A</p>\n");
        assert!(compose(&v, BodyFormat::Html).body.as_str().contains("<p>N/A</p>"));
    }

    #[test]
    fn blank_detail_fields_are_skipped() {
        let v = verified(&[("city", "  "), ("location", "Hall B"), ("coordinator", "")]);
        assert_eq!(
            render_details_text(v.submission().details()),
            "Location: Hall B\n"
        );
    }

    #[test]
    fn composition_is_deterministic() {
        let v = verified(&[("event_date", "2026-11-02"), ("event_time", "18:00")]);
        assert_eq!(compose(&v, BodyFormat::Html), compose(&v, BodyFormat::Html));
    }
}
