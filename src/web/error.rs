use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{json, Value};
use std::sync::Arc;
use strum_macros::AsRefStr;

use crate::provider;

use super::types::DataParsingError;

pub type WebResult<T> = core::result::Result<T, Error>;

#[derive(Debug, AsRefStr, thiserror::Error)]
pub enum Error {
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("request body is not valid json: {0}")]
    InvalidBody(#[from] serde_json::Error),
    #[error("failed to read the request body: {0}")]
    BodyRead(#[from] axum::Error),
    #[error("missing or invalid dashboard action")]
    InvalidAction,
    #[error("provider api key is not configured")]
    ServerConfig,

    #[error("data parsing error: {0}")]
    DataParsing(#[from] DataParsingError),
    #[error("provider error: {0}")]
    Provider(#[from] provider::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn status_code_and_client_error(&self) -> (StatusCode, ClientError) {
        use ClientError::*;

        match self {
            Error::MethodNotAllowed => (StatusCode::METHOD_NOT_ALLOWED, MethodNotAllowed),
            Error::InvalidBody(_) | Error::BodyRead(_) => (StatusCode::BAD_REQUEST, InvalidBody),
            Error::InvalidAction => (StatusCode::BAD_REQUEST, InvalidAction),
            Error::DataParsing(DataParsingError::EmailMissing) => {
                (StatusCode::BAD_REQUEST, EmailRequired)
            }
            Error::DataParsing(DataParsingError::ActionInvalid(_)) => {
                (StatusCode::BAD_REQUEST, InvalidAction)
            }
            Error::DataParsing(data_er) => {
                (StatusCode::BAD_REQUEST, InvalidInput(data_er.to_string()))
            }
            Error::ServerConfig => (StatusCode::INTERNAL_SERVER_ERROR, ServerConfig),
            Error::Provider(provider::Error::Rejected { status, message }) => (
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
                SignupRejected(message.clone()),
            ),
            Error::Provider(provider_er) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Upstream(provider_er.to_string()),
            ),
            Error::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, ServiceError),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        tracing::debug!("{:<12} - into_response(Error: {self:?})", "INTO_RESP");

        // Construct a response
        let mut res = StatusCode::INTERNAL_SERVER_ERROR.into_response();

        // Insert the Error into response so that it can be retrieved later.
        res.extensions_mut().insert(Arc::new(self));

        res
    }
}

/// The error as the client gets to see it.
#[derive(Debug, AsRefStr, derive_more::Display)]
pub enum ClientError {
    #[display("Method not allowed")]
    MethodNotAllowed,
    #[display("Invalid request body")]
    InvalidBody,
    #[display("Email is required")]
    EmailRequired,
    #[display("Received invalid input: {_0}")]
    InvalidInput(String),
    #[display("Missing or invalid ?action= parameter. Use stats or test-pipeline.")]
    InvalidAction,
    #[display("Server configuration error")]
    ServerConfig,
    #[display("{_0}")]
    SignupRejected(String),
    #[display("{_0}")]
    Upstream(String),
    #[display("Service Error!")]
    ServiceError,
}

impl ClientError {
    /// JSON body sent to the client.
    /// Provider rejections of a signup keep the `success` flag of the signup response.
    pub fn body(&self) -> Value {
        match self {
            ClientError::SignupRejected(message) => json!({ "success": false, "error": message }),
            other => json!({ "error": other.to_string() }),
        }
    }
}
