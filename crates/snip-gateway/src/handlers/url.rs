use crate::error::{AppError, Result};
use crate::model::{ShortenRequest, ShortenResponse};
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::header::LOCATION;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use snip_core::ShortCode;

pub async fn shorten_handler(
    State(state): State<AppState>,
    body: std::result::Result<Json<ShortenRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(request) = body.map_err(|rejection| AppError::MalformedBody(rejection.body_text()))?;
    let params = request.validate().map_err(AppError::Validation)?;

    let result = state.shortener().shorten(params).await?;

    Ok((StatusCode::CREATED, Json(ShortenResponse::from(result))).into_response())
}

pub async fn redirect_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Response> {
    let code = ShortCode::new(&code).map_err(|_| AppError::UnknownCode(code))?;

    let original_url = state.shortener().resolve(&code).await?;
    let location = HeaderValue::from_bytes(original_url.as_bytes())
        .map_err(|_| AppError::InvalidRedirect(code))?;

    Ok((StatusCode::FOUND, [(LOCATION, location)]).into_response())
}
