//! HTTP surface: `POST /api/submit` plus a plain `GET /` health check.

mod routes;

use std::any::Any;
use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::Response;
use axum::routing::{get, post};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{error, warn};

use crate::config::AppConfig;
use crate::notifier::Notifier;
use crate::pipeline::SubmissionPipeline;
use crate::verifier::{BotVerifier, RecaptchaVerifier};

pub(crate) use routes::error_response;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<SubmissionPipeline>,
    /// Add score/action to 403 bodies. Off unless the operator opts in.
    pub expose_verification_details: bool,
}

impl AppState {
    pub fn new(pipeline: Arc<SubmissionPipeline>, expose_verification_details: bool) -> Self {
        Self {
            pipeline,
            expose_verification_details,
        }
    }

    /// Production wiring: reCAPTCHA verifier plus the configured transport.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let verifier: Arc<dyn BotVerifier> = Arc::new(RecaptchaVerifier::new(&config.recaptcha)?);
        let notifier = Arc::new(Notifier::from_config(&config.mail)?);
        Ok(Self::new(
            Arc::new(SubmissionPipeline::new(verifier, notifier)),
            config.recaptcha.expose_details,
        ))
    }
}

/// Build the router. An empty origin list allows any origin.
pub fn router(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(routes::health))
        .route("/api/submit", post(routes::submit))
        .layer(cors_layer(allowed_origins))
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origin = if allowed_origins.is_empty() {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

fn handle_panic(_panic: Box<dyn Any + Send + 'static>) -> Response {
    error!("Handler panicked");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}
