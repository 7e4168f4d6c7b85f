//! Contains all the routes that this application can handle.

mod api;

use crate::{
    web::{Error, WebResult},
    AppState,
};

use axum::{
    http::StatusCode,
    routing::{any, get},
    Router,
};

async fn health_check() -> StatusCode {
    StatusCode::OK
}

async fn method_not_allowed() -> WebResult<()> {
    Err(Error::MethodNotAllowed)
}

/// All the routes of the server
pub fn routes(app_state: AppState) -> Router {
    Router::new()
        .nest("/api", api_routes(app_state))
        .route("/health-check", get(health_check))
}

/// API - Routes nested under "/api" path
fn api_routes(app_state: AppState) -> Router {
    Router::new()
        // Every method reaches the handler, it answers anything but POST with a JSON 405.
        .route("/subscribe", any(api::subscribe))
        .route("/dashboard", get(api::dashboard).fallback(method_not_allowed))
        .with_state(app_state)
}
