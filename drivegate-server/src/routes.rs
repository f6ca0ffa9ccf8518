use std::sync::Arc;

use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::handlers::files;
use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/{site}/{drive}", get(files::list_root))
        .route(
            "/{site}/{drive}/{*rest}",
            get(files::get_entry)
                .post(files::create_file)
                .put(files::update_file)
                .delete(files::delete_entry)
                .patch(files::patch_entry),
        )
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}
