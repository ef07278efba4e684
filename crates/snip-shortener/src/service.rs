use crate::resolver::{UniquenessResolver, DEFAULT_MAX_RETRIES};
use async_trait::async_trait;
use snip_core::{
    Clock, MappingStore, ShortCode, ShortenParams, ShortenResult, Shortener, ShortenerError,
    SystemClock,
};
use snip_generator::Generator;
use std::sync::Arc;
use tracing::{info, warn};
use typed_builder::TypedBuilder;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone, TypedBuilder)]
pub struct ShortenerSettings {
    /// Prefix of every short URL handed back to callers.
    #[builder(default = DEFAULT_BASE_URL.to_string(), setter(into))]
    base_url: String,
    #[builder(default = DEFAULT_MAX_RETRIES)]
    max_retries: u32,
}

impl Default for ShortenerSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// A concrete implementation of the `Shortener` trait.
///
/// This service wraps a `MappingStore` and a `Generator` to handle:
/// - Unique code assignment through the [`UniquenessResolver`]
/// - Short URL composition
/// - Expiry checks on resolve, against the injected clock
pub struct ShortenerService<S, G, C = SystemClock> {
    store: Arc<S>,
    resolver: UniquenessResolver<S, G>,
    clock: C,
    base_url: String,
}

impl<S: MappingStore, G: Generator> ShortenerService<S, G> {
    pub fn new(store: Arc<S>, generator: G, settings: ShortenerSettings) -> Self {
        Self::with_clock(store, generator, settings, SystemClock)
    }
}

impl<S: MappingStore, G: Generator, C: Clock> ShortenerService<S, G, C> {
    pub fn with_clock(
        store: Arc<S>,
        generator: G,
        settings: ShortenerSettings,
        clock: C,
    ) -> Self {
        Self {
            resolver: UniquenessResolver::new(Arc::clone(&store), generator, settings.max_retries),
            store,
            clock,
            base_url: settings.base_url,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl<S: MappingStore, G: Generator, C: Clock> Shortener for ShortenerService<S, G, C> {
    async fn shorten(&self, params: ShortenParams) -> Result<ShortenResult, ShortenerError> {
        let mapping = self
            .resolver
            .assign_and_save(params.original_url, params.expires_at)
            .await?;

        info!(
            code = %mapping.code,
            id = mapping.id,
            expires_at = ?mapping.expires_at,
            "created short url"
        );

        Ok(ShortenResult {
            short_url: mapping.code.to_url(&self.base_url),
            code: mapping.code,
            original_url: mapping.original_url,
            created_at: mapping.created_at,
            expires_at: mapping.expires_at,
        })
    }

    async fn resolve(&self, code: &ShortCode) -> Result<String, ShortenerError> {
        let mapping = self
            .store
            .find_by_code(code)
            .await?
            .ok_or_else(|| ShortenerError::NotFound(code.clone()))?;

        if mapping.is_expired_at(self.clock.now()) {
            info!(code = %code, expires_at = ?mapping.expires_at, "short url expired");
            return Err(ShortenerError::Expired(code.clone()));
        }

        // A lost hit is preferable to failing the redirect.
        if let Err(err) = self.store.increment_access_count(code).await {
            warn!(code = %code, error = %err, "failed to record access");
        }

        info!(code = %code, "resolved short url");
        Ok(mapping.original_url)
    }
}
