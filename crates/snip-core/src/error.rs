use crate::shortcode::ShortCode;
use thiserror::Error;

/// Errors related to the core value types.
pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("invalid short code: {0}")]
    InvalidShortCode(String),
}

/// Errors returned by [`MappingStore`](crate::store::MappingStore) implementations.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// The code is already taken. Inserts never overwrite.
    #[error("short code already exists: {0}")]
    DuplicateKey(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
}

/// Errors returned while producing a candidate short code.
#[derive(Debug, Clone, Error)]
pub enum GeneratorError {
    #[error("counter unavailable: {0}")]
    Counter(String),
    #[error("cannot encode value {0}")]
    Encoding(u64),
}

#[derive(Debug, Clone, Error)]
pub enum ShortenerError {
    /// Every candidate within the retry bound collided with an existing code.
    #[error("could not assign a unique short code after {attempts} attempts")]
    AssignmentExhausted { attempts: u32 },
    #[error("short url not found: {0}")]
    NotFound(ShortCode),
    #[error("short url has expired: {0}")]
    Expired(ShortCode),
    #[error("generator error: {0}")]
    Generator(#[from] GeneratorError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
