use dispatch_portal::{
    AppState, HttpBackend,
    backend::BackendState,
    config::{AppConfig, Env},
    create_router,
};
use std::{process::ExitCode, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Entry point: loads configuration, initialises logging, wires the backend
/// client and the access gate, and serves HTTP until the process is stopped.
#[tokio::main]
async fn main() -> ExitCode {
    // 1. Configuration & Environment Loading (Fail-Fast)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging Filter Setup
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "dispatch_portal=debug,tower_http=info".into());

    // 3. Initialize Logging based on Environment
    // A config error still needs a subscriber to be reported, so fall back to
    // the pretty format until the environment is known.
    let env = config.as_ref().map_or(Env::Local, |config| config.env);
    match env {
        Env::Local => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init(),
        Env::Production => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "refusing to start with invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!("Application starting in {:?} mode", config.env);
    tracing::info!(
        backend = %config.backend_url,
        static_dir = %config.static_dir.display(),
        "configuration loaded"
    );

    // 4. Backend Client
    let backend = Arc::new(HttpBackend::new(config.backend_url.clone())) as BackendState;

    // 5. Unified State Assembly (builds the HS256 verifier from the secret)
    let bind_addr = config.bind_addr.clone();
    let app = create_router(AppState::new(config, backend));

    // 6. Server Startup
    let listener = match TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, addr = %bind_addr, "failed to bind");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!("Listening on {}", bind_addr);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server terminated");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
