pub mod error;
pub mod notices;
pub mod state;

use axum::{Router, routing::get};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use state::{AppState, AppStateInner};

/// Full HTTP surface: the action endpoint at `/` plus `/health`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(notices::get_action).post(notices::post_action))
        .route("/health", get(notices::health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
