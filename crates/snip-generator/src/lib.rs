pub mod counter;
pub mod hashids;
pub mod random;

pub use counter::{AtomicCounter, CounterGenerator, CounterSettings};
pub use hashids::Hashids;
pub use random::RandomGenerator;

use async_trait::async_trait;
use snip_core::{GeneratorError, ShortCode};
use std::sync::Arc;

/// Trait for generating candidate short codes.
///
/// Implementations are pure generators that don't interact with the mapping
/// store. Uniqueness against storage is the resolver's job.
///
/// Implementations can vary from random draws to encodings of a shared
/// counter.
#[async_trait]
pub trait Generator: Send + Sync + 'static {
    /// Produces the next candidate code.
    async fn generate(&self) -> Result<ShortCode, GeneratorError>;

    /// Whether every code this generator produces is unique by construction.
    ///
    /// When `false`, callers must check storage before using a candidate.
    fn is_collision_free(&self) -> bool;
}

#[async_trait]
impl<G: Generator + ?Sized> Generator for Arc<G> {
    async fn generate(&self) -> Result<ShortCode, GeneratorError> {
        (**self).generate().await
    }

    fn is_collision_free(&self) -> bool {
        (**self).is_collision_free()
    }
}
