use std::time::Duration;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::timeout::TimeoutLayer;

use crate::handlers;
use crate::pipeline::Pipeline;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Pipeline,
}

/// Image uploads are small chat attachments; anything bigger is rejected.
const MAX_UPLOAD_BYTES: usize = 8 * 1024 * 1024;

pub fn build_app(state: AppState, request_timeout_secs: u64) -> Router {
    let api = Router::new()
        .route("/chat", post(handlers::chat))
        .route("/clear", post(handlers::clear_conversation))
        .route("/conversation", get(handlers::get_conversation))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state);

    Router::new()
        .route("/livez", get(handlers::livez))
        .route("/readyz", get(handlers::readyz))
        .route("/version", get(handlers::version))
        .nest("/api", api)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(request_timeout_secs),
        ))
}
