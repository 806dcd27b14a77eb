use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};

use crate::web::{AppState, auth, bills, dashboard, new_bill, storage};

const ROBOTS_TXT_BODY: &str = "User-agent: *\nDisallow: /\n";

pub fn build_router(state: AppState) -> Router {
    // Leave room for the multipart envelope around the attachment itself.
    let body_limit = state.config().max_upload_bytes + 64 * 1024;

    Router::new()
        .route("/healthz", get(healthz))
        .route("/robots.txt", get(robots_txt))
        .merge(auth::router())
        .merge(bills::router())
        .merge(new_bill::router())
        .merge(dashboard::router())
        .merge(storage::router())
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

async fn robots_txt() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        ROBOTS_TXT_BODY,
    )
}

async fn healthz() -> impl IntoResponse {
    StatusCode::OK
}
