//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! One Axum router serves the room channel at `/ws`, the media upload and
//! listing API under `/api`, and the stored media tree at `/uploads`.

pub mod uploads;
pub mod ws;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::services::media::PUBLIC_PREFIX;
use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let media_files = ServeDir::new(&state.config.upload_dir);
    let body_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);

    Router::new()
        .route("/ws", get(ws::handle_ws))
        .route("/healthz", get(healthz))
        .route("/api/upload/{kind}", post(uploads::upload).layer(body_limit))
        .route("/api/uploads", get(uploads::list_uploads))
        .nest_service(PUBLIC_PREFIX, media_files)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
