//! carewizard-server entry point

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use carewizard_server::{build_router, config::ServerConfig, spawn_session_sweeper, AppState};

#[tokio::main]
async fn main() {
    // Load configuration before logging so the configured level applies
    let loaded = ServerConfig::load(
        std::path::Path::new("config.yaml")
            .exists()
            .then_some("config.yaml"),
    );
    let config = loaded.as_ref().cloned().unwrap_or_default();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log.level)),
        )
        .init();

    if let Err(e) = &loaded {
        tracing::warn!("Failed to load config, using defaults: {}", e);
    }

    tracing::info!("Starting carewizard server...");

    let state = AppState::new(config.clone()).unwrap_or_else(|e| {
        tracing::error!("Failed to create clinic API client: {}", e);
        std::process::exit(1);
    });

    tracing::info!(
        api = %state.api.base_url(),
        policy = ?config.wizard.completion_policy,
        session_ttl_secs = config.wizard.session_ttl_secs,
        "Clinic API configured"
    );

    let state = Arc::new(state);
    let sweeper = spawn_session_sweeper(state.clone());
    let app = build_router(state.clone());

    let bind_addr = config.bind_addr();
    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Failed to bind to {}: {}", bind_addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Server error: {}", e);
        });

    sweeper.abort();
    tracing::info!(
        open_sessions = state.sessions.len().await,
        "carewizard server stopped; open wizard sessions discarded"
    );
}

/// Resolves on Ctrl+C or SIGTERM. Wizard sessions are in memory only, so
/// whatever is still open is lost once this returns.
async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Ctrl+C handler unavailable, relying on SIGTERM: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!("SIGTERM handler unavailable, relying on Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let signal = tokio::select! {
        _ = interrupt => "interrupt",
        _ = terminate => "terminate",
    };
    tracing::info!(signal, "Stopping carewizard server, draining in-flight submissions");
}
