//! Integration tests for the Resend transport against a fake API server.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;

use form_relay::config::ResendConfig;
use form_relay::error::NotifyError;
use form_relay::notifier::{MailTransport, MessageBody, NotificationMessage, ResendTransport};

const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Recorded request: (Authorization header, JSON body).
type Seen = Arc<Mutex<Vec<(Option<String>, Value)>>>;

#[derive(Clone)]
struct FakeResend {
    status: StatusCode,
    reply: Value,
    seen: Seen,
}

async fn emails(
    State(fake): State<FakeResend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    fake.seen.lock().unwrap().push((auth, body));
    (fake.status, Json(fake.reply.clone()))
}

/// Start a fake Resend API, return (endpoint URL, recorded requests).
async fn start_fake(status: StatusCode, reply: Value) -> (String, Seen) {
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let fake = FakeResend {
        status,
        reply,
        seen: Arc::clone(&seen),
    };
    let app = Router::new().route("/emails", post(emails)).with_state(fake);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/emails"), seen)
}

fn transport(api_url: String) -> ResendTransport {
    ResendTransport::new(
        &ResendConfig {
            api_key: Some(SecretString::from("re_test_key")),
            api_url,
        },
        "Formulario Web <onboarding@resend.dev>".into(),
    )
    .unwrap()
}

fn message() -> NotificationMessage {
    NotificationMessage {
        subject: "New form submission: Photo".into(),
        body: MessageBody::Html("<h3>New form submission</h3>".into()),
        reply_to: "a@x.com".into(),
    }
}

#[tokio::test]
async fn posts_message_with_bearer_key() {
    timeout(TEST_TIMEOUT, async {
        let (url, seen) = start_fake(StatusCode::OK, json!({ "id": "email_123" })).await;

        let outcome = transport(url)
            .send(&message(), "owner@example.com")
            .await
            .unwrap();
        assert!(outcome.delivered);
        assert_eq!(outcome.provider_response["id"], "email_123");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (auth, body) = &seen[0];
        assert_eq!(auth.as_deref(), Some("Bearer re_test_key"));
        assert_eq!(body["from"], "Formulario Web <onboarding@resend.dev>");
        assert_eq!(body["to"], json!(["owner@example.com"]));
        assert_eq!(body["subject"], "New form submission: Photo");
        assert_eq!(body["html"], "<h3>New form submission</h3>");
        assert_eq!(body["reply_to"], "a@x.com");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn unparseable_submitter_email_is_sent_without_reply_to() {
    timeout(TEST_TIMEOUT, async {
        let (url, seen) = start_fake(StatusCode::OK, json!({ "id": "email_456" })).await;

        let mut msg = message();
        msg.reply_to = "not-an-email".into();
        let outcome = transport(url).send(&msg, "owner@example.com").await.unwrap();
        assert!(outcome.delivered);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (_, body) = &seen[0];
        assert!(body.get("reply_to").is_none());
        assert_eq!(body["to"], json!(["owner@example.com"]));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn non_success_status_carries_provider_body() {
    timeout(TEST_TIMEOUT, async {
        let (url, seen) = start_fake(
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({ "name": "validation_error", "message": "The from domain is not verified" }),
        )
        .await;

        let err = transport(url)
            .send(&message(), "owner@example.com")
            .await
            .unwrap_err();
        match err {
            NotifyError::DeliveryFailed { provider, reason } => {
                assert_eq!(provider, "resend");
                assert!(reason.contains("422"));
                assert!(reason.contains("The from domain is not verified"));
            }
            other => panic!("expected DeliveryFailed, got {other:?}"),
        }
        // One attempt only.
        assert_eq!(seen.lock().unwrap().len(), 1);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn unreachable_api_is_delivery_failure() {
    timeout(TEST_TIMEOUT, async {
        let err = transport("http://127.0.0.1:9/emails".into())
            .send(&message(), "owner@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::DeliveryFailed { .. }));
    })
    .await
    .expect("test timed out");
}
