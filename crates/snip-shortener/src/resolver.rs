use jiff::Timestamp;
use snip_core::{MappingStore, NewUrlMapping, ShortCode, ShortenerError, StorageError, UrlMapping};
use snip_generator::Generator;
use std::sync::Arc;
use tracing::{error, trace, warn};

pub const DEFAULT_MAX_RETRIES: u32 = 10;

type Result<T> = std::result::Result<T, ShortenerError>;

/// Turns generator candidates into codes that are free in the store.
///
/// The existence check only filters obvious collisions. Check-then-insert is
/// not atomic, so the store's uniqueness constraint is the final arbiter and
/// a duplicate-key failure on insert consumes an attempt like any other
/// collision. Generators that are collision free by construction skip the
/// check.
pub struct UniquenessResolver<S, G> {
    store: Arc<S>,
    generator: G,
    max_retries: u32,
}

impl<S: MappingStore, G: Generator> UniquenessResolver<S, G> {
    /// Creates a resolver. At least one attempt is always made, so a
    /// `max_retries` of zero behaves like one.
    pub fn new(store: Arc<S>, generator: G, max_retries: u32) -> Self {
        Self {
            store,
            generator,
            max_retries: max_retries.max(1),
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Finds a code that is currently free in the store.
    ///
    /// Fails with `AssignmentExhausted` once `max_retries` candidates have
    /// all collided.
    pub async fn assign(&self) -> Result<ShortCode> {
        for attempt in 1..=self.max_retries {
            if let Some(code) = self.candidate(attempt).await? {
                return Ok(code);
            }
        }

        Err(self.exhausted())
    }

    /// Assigns a free code and persists the mapping under it.
    ///
    /// Nothing is persisted when the attempts run out.
    pub async fn assign_and_save(
        &self,
        original_url: String,
        expires_at: Option<Timestamp>,
    ) -> Result<UrlMapping> {
        for attempt in 1..=self.max_retries {
            let Some(code) = self.candidate(attempt).await? else {
                continue;
            };

            let mapping = NewUrlMapping {
                code,
                original_url: original_url.clone(),
                expires_at,
            };

            match self.store.save(mapping).await {
                Ok(saved) => return Ok(saved),
                Err(StorageError::DuplicateKey(code)) => {
                    warn!(
                        code = %code,
                        attempt,
                        max_retries = self.max_retries,
                        "short code taken on insert, retrying"
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(self.exhausted())
    }

    /// Generates one candidate. Returns `None` when it collides.
    async fn candidate(&self, attempt: u32) -> Result<Option<ShortCode>> {
        let code = self.generator.generate().await?;

        if self.generator.is_collision_free() {
            return Ok(Some(code));
        }

        if self.store.exists_by_code(&code).await? {
            warn!(
                code = %code,
                attempt,
                max_retries = self.max_retries,
                "short code collision"
            );
            return Ok(None);
        }

        trace!(code = %code, attempt, "short code is free");
        Ok(Some(code))
    }

    fn exhausted(&self) -> ShortenerError {
        error!(
            attempts = self.max_retries,
            "could not assign a unique short code, consider a longer code length"
        );
        ShortenerError::AssignmentExhausted {
            attempts: self.max_retries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CountingStore, ScriptedGenerator};
    use snip_core::GeneratorError;

    fn resolver(
        store: &Arc<CountingStore>,
        generator: ScriptedGenerator,
    ) -> UniquenessResolver<CountingStore, ScriptedGenerator> {
        UniquenessResolver::new(Arc::clone(store), generator, DEFAULT_MAX_RETRIES)
    }

    #[tokio::test]
    async fn first_free_candidate_wins_without_retry() {
        let store = Arc::new(CountingStore::new());
        let resolver = resolver(&store, ScriptedGenerator::new(["free1", "free2"]));

        let code = resolver.assign().await.unwrap();

        assert_eq!(code.as_str(), "free1");
        assert_eq!(store.lookups(), 1);
    }

    #[tokio::test]
    async fn k_collisions_take_k_plus_one_lookups() {
        for k in 1..DEFAULT_MAX_RETRIES as usize {
            let taken: Vec<String> = (0..k).map(|i| format!("taken{i}")).collect();
            let taken: Vec<&str> = taken.iter().map(String::as_str).collect();

            let store = Arc::new(CountingStore::new());
            store.occupy(&taken).await;

            let script = taken.iter().copied().chain(["free1", "free2"]);
            let resolver = resolver(&store, ScriptedGenerator::new(script));

            let saved = resolver
                .assign_and_save("https://example.com".to_string(), None)
                .await
                .unwrap();

            assert_eq!(saved.code.as_str(), "free1");
            assert_eq!(store.lookups(), k + 1, "k = {k}");
            assert_eq!(store.len(), k + 1);
        }
    }

    #[tokio::test]
    async fn exhausted_attempts_persist_nothing() {
        let taken: Vec<String> = (0..DEFAULT_MAX_RETRIES).map(|i| format!("taken{i}")).collect();
        let taken: Vec<&str> = taken.iter().map(String::as_str).collect();

        let store = Arc::new(CountingStore::new());
        store.occupy(&taken).await;

        let script = taken.iter().copied().chain(["free1"]);
        let generator = ScriptedGenerator::new(script);
        let resolver = resolver(&store, generator);

        let err = resolver
            .assign_and_save("https://example.com".to_string(), None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ShortenerError::AssignmentExhausted { attempts } if attempts == DEFAULT_MAX_RETRIES
        ));
        assert_eq!(store.lookups(), DEFAULT_MAX_RETRIES as usize);
        assert_eq!(store.len(), DEFAULT_MAX_RETRIES as usize);
        // the free candidate after the bound was never drawn
        assert_eq!(resolver.generator.remaining(), 1);
    }

    #[tokio::test]
    async fn assign_fails_when_every_candidate_collides() {
        let store = Arc::new(CountingStore::new());
        store.occupy(&["aaaaa"]).await;

        let resolver = UniquenessResolver::new(
            Arc::clone(&store),
            ScriptedGenerator::new(["aaaaa", "aaaaa", "aaaaa"]),
            3,
        );

        let err = resolver.assign().await.unwrap_err();
        assert!(matches!(err, ShortenerError::AssignmentExhausted { attempts: 3 }));
        assert_eq!(store.lookups(), 3);
    }

    #[tokio::test]
    async fn zero_retries_still_makes_one_attempt() {
        let store = Arc::new(CountingStore::new());
        let resolver = UniquenessResolver::new(
            Arc::clone(&store),
            ScriptedGenerator::new(["free1"]),
            0,
        );
        assert_eq!(resolver.max_retries(), 1);

        let saved = resolver
            .assign_and_save("https://example.com".to_string(), None)
            .await
            .unwrap();
        assert_eq!(saved.code.as_str(), "free1");
        assert_eq!(store.lookups(), 1);
    }

    #[tokio::test]
    async fn duplicate_key_on_insert_is_retried() {
        // The lookup misses the collision, so only the insert notices it.
        let store = Arc::new(CountingStore::blind());
        store.occupy(&["raced"]).await;

        let resolver = resolver(&store, ScriptedGenerator::new(["raced", "free1"]));

        let saved = resolver
            .assign_and_save("https://example.com".to_string(), None)
            .await
            .unwrap();

        assert_eq!(saved.code.as_str(), "free1");
        assert_eq!(store.lookups(), 2);

        let original = store
            .find_by_code(&ShortCode::new_unchecked("raced"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(original.original_url, "https://taken.example/raced");
    }

    #[tokio::test]
    async fn duplicate_keys_count_towards_the_bound() {
        let store = Arc::new(CountingStore::blind());
        store.occupy(&["raced"]).await;

        let resolver = UniquenessResolver::new(
            Arc::clone(&store),
            ScriptedGenerator::new(["raced", "raced"]),
            2,
        );

        let err = resolver
            .assign_and_save("https://example.com".to_string(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ShortenerError::AssignmentExhausted { attempts: 2 }));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn collision_free_generators_skip_the_lookup() {
        let store = Arc::new(CountingStore::new());
        let generator = ScriptedGenerator::new(["cnt01", "cnt02"]).collision_free();
        let resolver = resolver(&store, generator);

        let first = resolver
            .assign_and_save("https://a.example".to_string(), None)
            .await
            .unwrap();
        let second = resolver
            .assign_and_save("https://b.example".to_string(), None)
            .await
            .unwrap();

        assert_eq!(first.code.as_str(), "cnt01");
        assert_eq!(second.code.as_str(), "cnt02");
        assert_eq!(store.lookups(), 0);
    }

    #[tokio::test]
    async fn generator_failure_is_fatal() {
        let store = Arc::new(CountingStore::new());
        let resolver = resolver(&store, ScriptedGenerator::new(Vec::<&str>::new()));

        let err = resolver
            .assign_and_save("https://example.com".to_string(), None)
            .await
            .unwrap_err();

        assert!(matches!(err, ShortenerError::Generator(GeneratorError::Counter(_))));
        assert_eq!(store.len(), 0);
    }
}
