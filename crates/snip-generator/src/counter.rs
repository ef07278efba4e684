use crate::hashids::Hashids;
use crate::Generator;
use async_trait::async_trait;
use snip_core::{Counter, GeneratorError, ShortCode};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;
use typed_builder::TypedBuilder;

pub const DEFAULT_SALT: &str = "default-salt-change-in-production";
pub const DEFAULT_MIN_CODE_LENGTH: usize = 7;

/// An in-process counter.
///
/// Guarantees uniqueness within a single instance only. Deployments with
/// more than one process need a shared counter such as Redis `INCR`.
#[derive(Debug, Default)]
pub struct AtomicCounter {
    value: AtomicU64,
}

impl AtomicCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a counter whose first increment returns `offset + 1`.
    ///
    /// Useful for resuming from a known state.
    pub fn with_offset(offset: u64) -> Self {
        Self {
            value: AtomicU64::new(offset),
        }
    }

    pub fn current(&self) -> u64 {
        self.value.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Counter for AtomicCounter {
    async fn increment(&self) -> Result<u64, GeneratorError> {
        let previous = self.value.fetch_add(1, Ordering::SeqCst);
        previous
            .checked_add(1)
            .ok_or_else(|| GeneratorError::Counter("counter overflowed".to_string()))
    }
}

/// Settings for the counter-encoding strategy.
#[derive(Debug, Clone, TypedBuilder)]
pub struct CounterSettings {
    #[builder(default = DEFAULT_SALT.to_string(), setter(into))]
    pub salt: String,
    #[builder(default = DEFAULT_MIN_CODE_LENGTH)]
    pub min_length: usize,
}

impl Default for CounterSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Encodes values from a shared counter into codes with [`Hashids`].
///
/// Distinct counter values always encode to distinct codes, so this generator
/// never collides as long as the counter is the single source of truth.
pub struct CounterGenerator<C> {
    counter: C,
    hashids: Hashids,
}

impl<C: Counter> CounterGenerator<C> {
    pub fn new(counter: C, settings: CounterSettings) -> Self {
        Self {
            counter,
            hashids: Hashids::new(settings.salt, settings.min_length),
        }
    }

    pub fn counter(&self) -> &C {
        &self.counter
    }

    /// Recovers the counter value a code was generated from.
    pub fn decode(&self, code: &ShortCode) -> Option<u64> {
        self.hashids.decode(code.as_str())
    }
}

#[async_trait]
impl<C: Counter> Generator for CounterGenerator<C> {
    async fn generate(&self) -> Result<ShortCode, GeneratorError> {
        let id = self.counter.increment().await?;
        let code =
            ShortCode::new(self.hashids.encode(id)).map_err(|_| GeneratorError::Encoding(id))?;
        debug!(id, code = %code, "generated short code from counter");
        Ok(code)
    }

    fn is_collision_free(&self) -> bool {
        true
    }
}
