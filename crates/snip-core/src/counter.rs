use crate::error::GeneratorError;
use async_trait::async_trait;

/// A shared, monotonically increasing counter.
///
/// Every call to [`increment`](Counter::increment) must return a distinct
/// value exactly once, across every process sharing the counter.
#[async_trait]
pub trait Counter: Send + Sync + 'static {
    async fn increment(&self) -> Result<u64, GeneratorError>;
}
