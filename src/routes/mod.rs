//! API Routes
//!
//! This module organizes all HTTP endpoints for the application:
//! - `/api/ai/chat` - Assistant chat with plan suggestions (rate limited)
//! - `/api/insurance/search` - Semantic plan search
//! - `/api/insurance/plans` - Catalog listing and lookup
//! - `/api/health` - Health checks

pub mod chat;
pub mod health;
pub mod plans;
pub mod search;

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::middleware::cors_layer;
use crate::models::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let cors = cors_layer(&state.config.server.cors_allowed_origins);

    Router::new()
        .merge(chat::router(state.clone()))
        .merge(search::router(state.clone()))
        .merge(plans::router(state.clone()))
        .merge(health::router(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
