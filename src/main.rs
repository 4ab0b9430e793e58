use form_relay::api::{self, AppState};
use form_relay::config::{AppConfig, TransportKind};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    let _ = rustls::crypto::ring::default_provider().install_default();

    // A missing .env file is fine; real deployments set the environment directly.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env();

    eprintln!("📨 form-relay v{}", env!("CARGO_PKG_VERSION"));
    eprintln!(
        "   Transport: {}",
        match config.mail.transport {
            TransportKind::Resend => "resend",
            TransportKind::Smtp => "smtp",
        }
    );
    if config.recaptcha.secret.is_none() {
        eprintln!("   Warning: RECAPTCHA_SECRET not set, submissions will fail");
    }
    if config.mail.to_address.is_none() {
        eprintln!("   Warning: TO_EMAIL not set, submissions will fail");
    }

    let state = AppState::from_config(&config)?;
    let app = api::router(state, &config.server.allowed_origins);

    let addr = format!("{}:{}", config.server.bind_addr, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
