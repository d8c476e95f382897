mod cors;

use axum::Router;
use axum::routing::{get, post};
use grantline_core::AppError;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

use self::cors::build_cors_layer;

pub fn build_router(app_state: AppState, frontend_url: &str) -> Result<Router, AppError> {
    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/command", post(handlers::command::command_handler))
        .layer(build_cors_layer(frontend_url)?)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state))
}
