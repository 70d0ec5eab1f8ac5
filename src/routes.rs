use crate::{AppState, errors::AppError, handlers, ws};
use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Restricts CORS to the configured client origin; permissive when none is
/// set.
pub fn cors_layer(allowed_origin: Option<&str>) -> Result<CorsLayer, AppError> {
    match allowed_origin {
        Some(origin) => {
            let origin = origin.parse::<HeaderValue>().map_err(|e| {
                AppError::ConfigError(format!("Invalid CLIENT_ORIGIN '{}': {}", origin, e))
            })?;
            Ok(CorsLayer::new()
                .allow_origin(origin)
                .allow_methods(Any)
                .allow_headers(Any))
        }
        None => Ok(CorsLayer::permissive()),
    }
}

/// Creates the Axum router and associates routes with handlers.
pub fn create_router(state: Arc<AppState>, cors: CorsLayer) -> Router {
    Router::new()
        .route(
            "/api/memes",
            post(handlers::create_meme).get(handlers::list_memes),
        )
        .route("/api/memes/{id}/vote", post(handlers::vote))
        .route("/api/memes/{id}/bid", post(handlers::place_bid))
        .route("/api/leaderboard", get(handlers::leaderboard))
        .route("/ws", get(ws::channel_handler))
        // Middleware Layers
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
