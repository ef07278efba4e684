use ::redis::aio::MultiplexedConnection;
use ::redis::AsyncCommands;
use async_trait::async_trait;
use snip_core::{Counter, GeneratorError};
use tracing::trace;

pub const DEFAULT_COUNTER_KEY: &str = "snip:counter";

/// A counter shared across processes, backed by Redis `INCR`.
///
/// `INCR` is atomic on the server, so every caller observes a distinct value
/// exactly once. A missing key starts at zero, making the first value 1.
#[derive(Clone)]
pub struct RedisCounter {
    redis: MultiplexedConnection,
    key: String,
}

impl RedisCounter {
    pub fn new(redis: MultiplexedConnection, key: impl Into<String>) -> Self {
        Self {
            redis,
            key: key.into(),
        }
    }

    /// Opens a multiplexed connection to `redis_url` and uses `key` as the
    /// counter.
    pub async fn connect(redis_url: &str, key: impl Into<String>) -> Result<Self, GeneratorError> {
        let client = ::redis::Client::open(redis_url).map_err(map_redis_error)?;
        let redis = client
            .get_multiplexed_async_connection()
            .await
            .map_err(map_redis_error)?;
        Ok(Self::new(redis, key))
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

fn map_redis_error(err: ::redis::RedisError) -> GeneratorError {
    GeneratorError::Counter(err.to_string())
}

#[async_trait]
impl Counter for RedisCounter {
    async fn increment(&self) -> Result<u64, GeneratorError> {
        let mut redis = self.redis.clone();
        let value = redis
            .incr::<_, _, u64>(&self.key, 1)
            .await
            .map_err(map_redis_error)?;
        trace!(key = %self.key, value, "incremented redis counter");
        Ok(value)
    }
}
