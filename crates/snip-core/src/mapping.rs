use crate::shortcode::ShortCode;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// A persisted mapping from a short code to its original URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlMapping {
    /// Storage-assigned identity. Never reused.
    pub id: u64,
    pub code: ShortCode,
    pub original_url: String,
    /// Set once when the mapping is persisted.
    pub created_at: Timestamp,
    /// When the mapping stops resolving, if ever.
    pub expires_at: Option<Timestamp>,
    /// Best-effort redirect counter.
    pub access_count: u64,
}

/// A mapping that has not been persisted yet.
///
/// The store assigns `id`, `created_at` and the initial `access_count`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUrlMapping {
    pub code: ShortCode,
    pub original_url: String,
    pub expires_at: Option<Timestamp>,
}

/// Logical lifecycle of a mapping. Never stored, always derived from the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingState {
    Active,
    Expired,
}

impl UrlMapping {
    /// Evaluates the mapping's state at `now`.
    ///
    /// A mapping is expired once `expires_at` is strictly before `now`.
    pub fn state_at(&self, now: Timestamp) -> MappingState {
        match self.expires_at {
            Some(expires_at) if expires_at < now => MappingState::Expired,
            _ => MappingState::Active,
        }
    }

    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.state_at(now) == MappingState::Expired
    }
}
