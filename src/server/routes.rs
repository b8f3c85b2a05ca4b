use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::server::{handlers, state::AppState};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Form page
        .route("/", get(handlers::index))
        .route("/predict", post(handlers::predict))
        // Process supervision
        .route("/healthz", get(handlers::healthz))
        // Add state and request tracing
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
