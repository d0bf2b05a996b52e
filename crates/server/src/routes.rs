//! Route configuration.

use crate::handlers;
use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let max_upload_bytes = state.config.server.max_upload_bytes;

    Router::new()
        // Health check (intentionally unauthenticated for load balancers/k8s probes)
        .route("/health", get(handlers::health::health_check))
        // File lifecycle
        .route("/files/{user_id}", post(handlers::files::upload_file))
        .route(
            "/files/{user_id}/{filename_or_id}",
            get(handlers::files::retrieve_file)
                .patch(handlers::files::update_access_level)
                .delete(handlers::files::delete_file),
        )
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
