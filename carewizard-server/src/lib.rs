//! carewizard-server - HTTP host for the registration and booking wizards
//!
//! Keeps wizard sessions in memory and submits them to the clinic backend.

pub mod config;
pub mod handlers;
pub mod sessions;

use axum::{
    http::Method,
    routing::{get, post, put},
    Router,
};
use carewizard_core::TracingNotifier;
use carewizard_remote::HttpClinicApi;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::sessions::SessionStore;

/// Application state
pub struct AppState {
    pub config: config::ServerConfig,
    pub api: HttpClinicApi,
    pub sessions: SessionStore,
    pub notifier: TracingNotifier,
}

impl AppState {
    pub fn new(config: config::ServerConfig) -> carewizard_remote::Result<Self> {
        let api = HttpClinicApi::new(&config.api.base_url, config.api.token.clone())?;
        let sessions = SessionStore::new(config.wizard.session_ttl());
        Ok(Self {
            config,
            api,
            sessions,
            notifier: TracingNotifier,
        })
    }
}

/// Periodically drop idle wizard sessions.
pub fn spawn_session_sweeper(state: Arc<AppState>) -> tokio::task::JoinHandle<()> {
    let period = state.sessions.ttl().max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.tick().await;
        loop {
            interval.tick().await;
            state.sessions.sweep().await;
        }
    })
}

/// Build the application router with all routes and middleware
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/flows", get(handlers::flows::list_flows))
        // Wizard sessions
        .route("/wizards", post(handlers::wizards::create_wizard))
        .route(
            "/wizards/{id}",
            get(handlers::wizards::get_wizard).delete(handlers::wizards::delete_wizard),
        )
        .route("/wizards/{id}/fields/{key}", put(handlers::wizards::set_field))
        .route("/wizards/{id}/fields/{key}/items", post(handlers::wizards::add_item))
        .route(
            "/wizards/{id}/fields/{key}/items/{index}",
            axum::routing::delete(handlers::wizards::remove_item),
        )
        .route("/wizards/{id}/advance", post(handlers::wizards::advance))
        .route("/wizards/{id}/retreat", post(handlers::wizards::retreat))
        .route("/wizards/{id}/jump/{step}", post(handlers::wizards::jump))
        .route("/wizards/{id}/booking", post(handlers::wizards::start_booking))
        // Dashboard derivations
        .route("/dashboard/patients", post(handlers::dashboard::my_patients))
        .route("/dashboard/reviews", post(handlers::dashboard::reviews))
        // Middleware
        .layer(RequestBodyLimitLayer::new(1024 * 1024)) // 1MB
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
