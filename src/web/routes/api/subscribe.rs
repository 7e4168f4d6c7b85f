use axum::{
    body,
    extract::{Request, State},
    http::Method,
    Json,
};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::{
    web::{
        types::{DeserSignup, ValidSignup},
        Error, WebResult,
    },
    AppState,
};

/// Upper bound on a buffered signup body.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Validates a signup and relays it to the mailing-list provider.
///
/// Only POST is accepted, and the method is checked before any of the body is read.
/// The body is parsed by hand so malformed JSON maps to our own 400.
#[tracing::instrument(
    name = "Relaying signup to the provider",
    skip(app_state, request),
    fields(method = %request.method())
)]
pub async fn subscribe(
    State(app_state): State<AppState>,
    request: Request,
) -> WebResult<Json<Value>> {
    if request.method() != Method::POST {
        return Err(Error::MethodNotAllowed);
    }

    let body = body::to_bytes(request.into_body(), MAX_BODY_BYTES).await?;
    let signup: DeserSignup = serde_json::from_slice(&body)?;
    let signup = ValidSignup::try_from(signup)?;

    let provider = &app_state.provider_client;
    if !provider.has_api_key() {
        error!("no provider api key configured, refusing signup");
        return Err(Error::ServerConfig);
    }

    provider
        .create_subscriber(&signup.email, signup.variant.as_deref())
        .await?;

    info!(variant = ?signup.variant, "New subscriber relayed to the provider.");

    Ok(Json(json!({ "success": true })))
}
