use crate::error::StorageError;
use crate::mapping::{NewUrlMapping, UrlMapping};
use crate::shortcode::ShortCode;
use async_trait::async_trait;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Durable storage of [`UrlMapping`]s keyed by a unique short code.
///
/// Implementations must reject, never overwrite, a second mapping with the
/// same code. That constraint is the only serialization point between
/// concurrent shorten requests.
#[async_trait]
pub trait MappingStore: Send + Sync + 'static {
    /// Persists a new mapping, assigning its `id` and `created_at`.
    ///
    /// Returns `Err(StorageError::DuplicateKey)` if the code is already
    /// taken. Nothing is written in that case.
    async fn save(&self, mapping: NewUrlMapping) -> Result<UrlMapping>;

    /// Checks whether a code is taken. Expired mappings still count.
    async fn exists_by_code(&self, code: &ShortCode) -> Result<bool>;

    /// Retrieves the mapping for a code regardless of its expiry.
    /// Returns `None` if the code does not exist.
    async fn find_by_code(&self, code: &ShortCode) -> Result<Option<UrlMapping>>;

    /// Retrieves a mapping by its storage identity regardless of its expiry.
    async fn find_by_id(&self, id: u64) -> Result<Option<UrlMapping>>;

    /// Bumps the access counter of a mapping. Best-effort telemetry;
    /// unknown codes are ignored.
    async fn increment_access_count(&self, code: &ShortCode) -> Result<()>;
}
