use jiff::civil::DateTime;
use jiff::tz::TimeZone;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use snip_core::{ShortenParams, ShortenResult};
use std::collections::BTreeMap;

pub const MAX_URL_LENGTH: usize = 255;

/// Body of `POST /api/shorten`.
///
/// Fields are optional at the serde level so that a missing `url` is
/// reported as a validation error instead of a deserialization failure.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortenRequest {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub expires_at: Option<String>,
}

/// Field name to message, in field order.
pub type FieldErrors = BTreeMap<&'static str, String>;

impl ShortenRequest {
    /// Checks the request and turns it into service parameters.
    pub fn validate(self) -> Result<ShortenParams, FieldErrors> {
        let mut errors = FieldErrors::new();

        let url = self.url.unwrap_or_default();
        if let Err(message) = validate_url(&url) {
            errors.insert("url", message.to_string());
        }

        let expires_at = match self.expires_at.as_deref().map(parse_expiry) {
            None => None,
            Some(Some(ts)) => Some(ts),
            Some(None) => {
                errors.insert("expiresAt", "expiresAt must be an ISO 8601 date-time".to_string());
                None
            }
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(ShortenParams {
            original_url: url,
            expires_at,
        })
    }
}

/// Accepts an instant with an offset, or a zone-less date-time read as UTC.
fn parse_expiry(value: &str) -> Option<Timestamp> {
    if let Ok(ts) = value.parse::<Timestamp>() {
        return Some(ts);
    }
    let civil = value.parse::<DateTime>().ok()?;
    civil.to_zoned(TimeZone::UTC).ok().map(|zoned| zoned.timestamp())
}

fn validate_url(url: &str) -> Result<(), &'static str> {
    if url.trim().is_empty() {
        return Err("URL cannot be blank");
    }
    if url.chars().count() > MAX_URL_LENGTH {
        return Err("URL cannot exceed 255 characters");
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err("URL must start with http:// or https://");
    }
    if url.chars().any(char::is_control) {
        return Err("URL must not contain control characters");
    }
    Ok(())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortenResponse {
    pub short_code: String,
    pub original_url: String,
    pub short_url: String,
    pub created_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<Timestamp>,
}

impl From<ShortenResult> for ShortenResponse {
    fn from(result: ShortenResult) -> Self {
        Self {
            short_code: result.code.to_string(),
            original_url: result.original_url,
            short_url: result.short_url,
            created_at: result.created_at,
            expires_at: result.expires_at,
        }
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
