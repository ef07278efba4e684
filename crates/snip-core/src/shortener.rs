use crate::shortcode::ShortCode;
use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

type Result<T> = std::result::Result<T, crate::error::ShortenerError>;

/// Parameters for creating a shortened URL.
///
/// The boundary layer validates `original_url` before it gets here.
#[derive(Debug, Clone)]
pub struct ShortenParams {
    /// The original URL to be shortened.
    pub original_url: String,
    /// When the shortened URL stops resolving, if ever.
    pub expires_at: Option<Timestamp>,
}

/// The externally visible outcome of a successful shorten call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortenResult {
    pub code: ShortCode,
    pub original_url: String,
    pub short_url: String,
    pub created_at: Timestamp,
    pub expires_at: Option<Timestamp>,
}

#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Creates a mapping under a freshly assigned unique code.
    async fn shorten(&self, params: ShortenParams) -> Result<ShortenResult>;

    /// Resolves a short code to its original URL.
    ///
    /// Fails with `NotFound` for unknown codes and `Expired` once the
    /// mapping's expiry instant has passed.
    async fn resolve(&self, code: &ShortCode) -> Result<String>;
}
