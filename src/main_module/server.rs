//! HTTP server initialization and routing

use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::{routing::get, Router};
use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::bia::configure_bia_routes;
use crate::catalog::configure_catalog_routes;
use crate::core::middleware::{
    ORGANIZATION_HEADER, USER_ID_HEADER, USER_NAME_HEADER, USER_ROLE_HEADER,
};
use crate::core::shared::state::AppState;
use crate::dashboard::configure_dashboard_routes;
use crate::evaluations::configure_evaluations_routes;
use crate::history::configure_history_routes;
use crate::organizations::configure_organizations_routes;

use super::{health_check, shutdown_signal};

/// Without configured origins any origin is allowed.
pub fn create_cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    if allowed.is_empty() {
        if !origins.is_empty() {
            warn!("No valid CORS origin in configuration, allowing any origin");
        }
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    info!("CORS restricted to {} origins", allowed.len());
    let headers: Vec<HeaderName> = [
        ORGANIZATION_HEADER,
        USER_ID_HEADER,
        USER_ROLE_HEADER,
        USER_NAME_HEADER,
    ]
    .iter()
    .filter_map(|h| h.parse().ok())
    .chain([header::CONTENT_TYPE, header::AUTHORIZATION])
    .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(headers)
}

pub fn build_router(app_state: Arc<AppState>) -> Router {
    let cors = create_cors_layer(&app_state.config.cors_origins);

    Router::new()
        .route("/health", get(health_check))
        .merge(configure_organizations_routes())
        .merge(configure_catalog_routes())
        .merge(configure_evaluations_routes())
        .merge(configure_bia_routes())
        .merge(configure_dashboard_routes())
        .merge(configure_history_routes())
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_axum_server(app_state: Arc<AppState>) -> std::io::Result<()> {
    let server = &app_state.config.server;
    let addr: SocketAddr = format!("{}:{}", server.host, server.port)
        .parse()
        .map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Invalid listen address {}:{}: {}", server.host, server.port, e),
            )
        })?;

    let app = build_router(app_state.clone());

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!(
                "Failed to bind to {}: {} - is another instance running?",
                addr, e
            );
            return Err(e);
        }
    };
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(std::io::Error::other)
}
