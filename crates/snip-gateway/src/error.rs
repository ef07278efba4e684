use crate::model::FieldErrors;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use jiff::Timestamp;
use serde::Serialize;
use snip_core::{ShortCode, ShortenerError};
use tracing::{error, warn};

pub type Result<T> = std::result::Result<T, AppError>;

pub const INTERNAL_ERROR_MESSAGE: &str = "An unexpected error occurred";

#[derive(Debug)]
pub enum AppError {
    /// One or more request fields failed validation.
    Validation(FieldErrors),
    /// The request body could not be read as JSON.
    MalformedBody(String),
    /// The path does not name a well-formed short code.
    UnknownCode(String),
    /// The stored URL cannot be sent as a `Location` header.
    InvalidRedirect(ShortCode),
    Shortener(ShortenerError),
}

impl From<ShortenerError> for AppError {
    fn from(err: ShortenerError) -> Self {
        AppError::Shortener(err)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    status: u16,
    message: String,
    timestamp: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<FieldErrors>,
}

fn envelope(status: StatusCode, message: impl Into<String>, errors: Option<FieldErrors>) -> Response {
    let body = ErrorBody {
        status: status.as_u16(),
        message: message.into(),
        timestamp: Timestamp::now(),
        errors,
    };
    (status, Json(body)).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(errors) => {
                warn!(?errors, "rejected shorten request");
                envelope(StatusCode::BAD_REQUEST, "Validation failed", Some(errors))
            }
            AppError::MalformedBody(message) => {
                warn!(%message, "malformed request body");
                envelope(StatusCode::BAD_REQUEST, message, None)
            }
            AppError::UnknownCode(code) => envelope(
                StatusCode::NOT_FOUND,
                format!("Short URL not found: {code}"),
                None,
            ),
            AppError::Shortener(ShortenerError::NotFound(code)) => {
                warn!(code = %code, "short url not found");
                envelope(
                    StatusCode::NOT_FOUND,
                    format!("Short URL not found: {code}"),
                    None,
                )
            }
            AppError::Shortener(ShortenerError::Expired(code)) => {
                warn!(code = %code, "short url expired");
                envelope(
                    StatusCode::GONE,
                    format!("Short URL has expired: {code}"),
                    None,
                )
            }
            AppError::InvalidRedirect(code) => {
                error!(code = %code, "stored url is not a valid location header");
                envelope(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE, None)
            }
            AppError::Shortener(err) => {
                error!(error = %err, "request failed");
                envelope(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE, None)
            }
        }
    }
}
