//! Error responses for the session API
//!
//! Credential and token failures are reported with one generic message each;
//! the detailed cause only reaches the logs.

use serde::Serialize;
use std::convert::Infallible;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::Rejection;

use crate::constants::ERROR_INVALID_LOGIN;
use crate::error::RustySessionsError;
use crate::handlers::negotiate::MediaType;

const ERROR_UNAUTHORIZED: &str = "Missing or invalid authentication token.";

/// `{statusCode, error, message}`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub status_code: u16,
    pub error: String,
    pub message: String,
}

impl ErrorBody {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status_code: status.as_u16(),
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: message.into(),
        }
    }
}

/// HTTP status for each failure kind
pub fn status_for(err: &RustySessionsError) -> StatusCode {
    match err {
        RustySessionsError::InvalidCredentials => StatusCode::FORBIDDEN,
        RustySessionsError::TokenMalformed(_)
        | RustySessionsError::TokenInvalid(_)
        | RustySessionsError::AlgorithmRejected(_) => StatusCode::UNAUTHORIZED,
        RustySessionsError::Forbidden => StatusCode::FORBIDDEN,
        RustySessionsError::NotFound(_) => StatusCode::NOT_FOUND,
        RustySessionsError::ValidationError(_) => StatusCode::BAD_REQUEST,
        RustySessionsError::Timeout(_) => StatusCode::SERVICE_UNAVAILABLE,
        RustySessionsError::StorageError(_)
        | RustySessionsError::HashingError(_)
        | RustySessionsError::SystemError(_)
        | RustySessionsError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Message safe to show a client
pub fn public_message(err: &RustySessionsError) -> String {
    match err {
        RustySessionsError::InvalidCredentials => ERROR_INVALID_LOGIN.to_string(),
        e if e.is_auth_failure() => ERROR_UNAUTHORIZED.to_string(),
        RustySessionsError::Forbidden
        | RustySessionsError::NotFound(_)
        | RustySessionsError::ValidationError(_) => err.to_string(),
        RustySessionsError::Timeout(_) => "Service temporarily unavailable.".to_string(),
        _ => "An internal server error occurred.".to_string(),
    }
}

pub fn error_response(media: MediaType, err: &RustySessionsError) -> Response {
    let status = status_for(err);
    if status.is_server_error() {
        log::error!("Request failed: {}", err);
    } else {
        log::debug!("Request rejected ({}): {}", status.as_u16(), err);
    }
    media.render(&ErrorBody::new(status, public_message(err)), status)
}

/// Turn warp's own rejections (unknown route, bad body, wrong method) into error bodies
pub async fn handle_rejection(rejection: Rejection) -> Result<Response, Infallible> {
    let (status, message) = if rejection.is_not_found() {
        (StatusCode::NOT_FOUND, "Not Found".to_string())
    } else if let Some(e) = rejection.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, format!("Invalid request body: {}", e))
    } else if rejection.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large".to_string())
    } else if rejection.find::<warp::reject::LengthRequired>().is_some() {
        (StatusCode::LENGTH_REQUIRED, "Content-Length required".to_string())
    } else if rejection.find::<warp::reject::UnsupportedMediaType>().is_some() {
        (StatusCode::UNSUPPORTED_MEDIA_TYPE, "Expected application/json body".to_string())
    } else if rejection.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed".to_string())
    } else if let Some(e) = rejection.find::<warp::reject::InvalidHeader>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else {
        log::error!("Unhandled rejection: {:?}", rejection);
        (StatusCode::INTERNAL_SERVER_ERROR, "An internal server error occurred.".to_string())
    };

    Ok(MediaType::Json.render(&ErrorBody::new(status, message), status))
}
