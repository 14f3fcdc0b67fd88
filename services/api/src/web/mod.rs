pub mod protocol;
pub mod rest;
pub mod state;
pub mod study_task;
pub mod ws_handler;

use axum::{routing::get, routing::post, Router};
use std::sync::Arc;

// Re-export the main WebSocket handler to make it easily accessible
// to the binary that will build the web server router.
pub use rest::{
    chapter_handler, check_recitation_handler, commentary_handler, last_read_handler,
    list_chapters_handler,
};
pub use state::AppState;
pub use ws_handler::ws_handler;

/// Builds the REST and WebSocket routes over the shared state.
pub fn api_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/chapters", get(list_chapters_handler))
        .route("/chapters/{id}", get(chapter_handler))
        .route("/chapters/{id}/verses/{number}/commentary", get(commentary_handler))
        .route("/recitation/check", post(check_recitation_handler))
        .route("/last-read", get(last_read_handler))
        .route("/ws", get(ws_handler))
        .with_state(app_state)
}
