use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use snip_core::store::{MappingStore, Result};
use snip_core::{Clock, NewUrlMapping, ShortCode, StorageError, SystemClock, UrlMapping};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

/// In-memory implementation of [`MappingStore`] using DashMap.
///
/// Inserts go through DashMap's entry API, so the existence check and the
/// insert happen under the same shard lock and a duplicate code can never
/// overwrite an existing mapping.
pub struct InMemoryStore {
    mappings: DashMap<ShortCode, UrlMapping>,
    codes_by_id: DashMap<u64, ShortCode>,
    last_id: AtomicU64,
    clock: Arc<dyn Clock>,
}

impl InMemoryStore {
    /// Creates a new in-memory store.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }

    /// Creates a store that stamps `created_at` from the given clock.
    pub fn with_clock(clock: impl Clock) -> Self {
        Self {
            mappings: DashMap::new(),
            codes_by_id: DashMap::new(),
            last_id: AtomicU64::new(0),
            clock: Arc::new(clock),
        }
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("mappings", &self.mappings.len())
            .field("last_id", &self.last_id.load(Ordering::Relaxed))
            .finish()
    }
}

#[async_trait]
impl MappingStore for InMemoryStore {
    async fn save(&self, mapping: NewUrlMapping) -> Result<UrlMapping> {
        let saved = match self.mappings.entry(mapping.code.clone()) {
            Entry::Occupied(_) => {
                return Err(StorageError::DuplicateKey(mapping.code.to_string()));
            }
            Entry::Vacant(vacant) => {
                let id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
                let saved = UrlMapping {
                    id,
                    code: mapping.code,
                    original_url: mapping.original_url,
                    created_at: self.clock.now(),
                    expires_at: mapping.expires_at,
                    access_count: 0,
                };
                vacant.insert(saved.clone());
                saved
            }
        };

        self.codes_by_id.insert(saved.id, saved.code.clone());
        trace!(id = saved.id, code = %saved.code, "stored mapping in memory");
        Ok(saved)
    }

    async fn exists_by_code(&self, code: &ShortCode) -> Result<bool> {
        Ok(self.mappings.contains_key(code))
    }

    async fn find_by_code(&self, code: &ShortCode) -> Result<Option<UrlMapping>> {
        Ok(self.mappings.get(code).map(|entry| entry.value().clone()))
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<UrlMapping>> {
        // Release the id index guard before touching the mappings map.
        let code = self.codes_by_id.get(&id).map(|entry| entry.value().clone());
        let Some(code) = code else {
            return Ok(None);
        };
        self.find_by_code(&code).await
    }

    async fn increment_access_count(&self, code: &ShortCode) -> Result<()> {
        if let Some(mut entry) = self.mappings.get_mut(code) {
            entry.access_count = entry.access_count.saturating_add(1);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::{SignedDuration, Timestamp};
    use snip_core::ManualClock;

    fn code(s: &str) -> ShortCode {
        ShortCode::new_unchecked(s)
    }

    fn new_mapping(c: &str, url: &str, expires_at: Option<Timestamp>) -> NewUrlMapping {
        NewUrlMapping {
            code: code(c),
            original_url: url.to_string(),
            expires_at,
        }
    }

    #[tokio::test]
    async fn save_and_find() {
        let store = InMemoryStore::new();

        let saved = store
            .save(new_mapping("abc12", "https://example.com", None))
            .await
            .unwrap();
        assert_eq!(saved.id, 1);
        assert_eq!(saved.access_count, 0);

        let found = store.find_by_code(&code("abc12")).await.unwrap().unwrap();
        assert_eq!(found, saved);
        assert_eq!(found.original_url, "https://example.com");
        assert_eq!(found.expires_at, None);
    }

    #[tokio::test]
    async fn save_stamps_created_at_from_clock() {
        let now = Timestamp::from_second(1_700_000_000).unwrap();
        let store = InMemoryStore::with_clock(ManualClock::new(now));

        let saved = store
            .save(new_mapping("abc12", "https://example.com", None))
            .await
            .unwrap();
        assert_eq!(saved.created_at, now);
    }

    #[tokio::test]
    async fn ids_are_sequential_and_never_reused() {
        let store = InMemoryStore::new();

        let first = store.save(new_mapping("aaaaa", "https://a.com", None)).await.unwrap();
        let _ = store
            .save(new_mapping("aaaaa", "https://dup.com", None))
            .await
            .unwrap_err();
        let second = store.save(new_mapping("bbbbb", "https://b.com", None)).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
    }

    #[tokio::test]
    async fn find_nonexistent() {
        let store = InMemoryStore::new();
        assert!(store.find_by_code(&code("nope1")).await.unwrap().is_none());
        assert!(store.find_by_id(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_code_is_rejected_without_overwrite() {
        let store = InMemoryStore::new();

        store
            .save(new_mapping("abc12", "https://example.com", None))
            .await
            .unwrap();

        let err = store
            .save(new_mapping("abc12", "https://other.com", None))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::DuplicateKey(ref c) if c == "abc12"));

        let found = store.find_by_code(&code("abc12")).await.unwrap().unwrap();
        assert_eq!(found.original_url, "https://example.com");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn expired_mappings_still_occupy_their_code() {
        let store = InMemoryStore::new();
        let expired = Timestamp::now() - SignedDuration::from_secs(60);

        store
            .save(new_mapping("abc12", "https://old.com", Some(expired)))
            .await
            .unwrap();

        assert!(store.exists_by_code(&code("abc12")).await.unwrap());
        let found = store.find_by_code(&code("abc12")).await.unwrap().unwrap();
        assert_eq!(found.expires_at, Some(expired));

        let err = store
            .save(new_mapping("abc12", "https://new.com", None))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::DuplicateKey(_)));
    }

    #[tokio::test]
    async fn find_by_id_returns_mapping() {
        let store = InMemoryStore::new();
        let saved = store
            .save(new_mapping("abc12", "https://example.com", None))
            .await
            .unwrap();

        let found = store.find_by_id(saved.id).await.unwrap().unwrap();
        assert_eq!(found.code, code("abc12"));
    }

    #[tokio::test]
    async fn exists_checks() {
        let store = InMemoryStore::new();

        assert!(!store.exists_by_code(&code("abc12")).await.unwrap());

        store
            .save(new_mapping("abc12", "https://example.com", None))
            .await
            .unwrap();

        assert!(store.exists_by_code(&code("abc12")).await.unwrap());
    }

    #[tokio::test]
    async fn increment_access_count() {
        let store = InMemoryStore::new();
        store
            .save(new_mapping("abc12", "https://example.com", None))
            .await
            .unwrap();

        store.increment_access_count(&code("abc12")).await.unwrap();
        store.increment_access_count(&code("abc12")).await.unwrap();
        // unknown codes are ignored
        store.increment_access_count(&code("zzzzz")).await.unwrap();

        let found = store.find_by_code(&code("abc12")).await.unwrap().unwrap();
        assert_eq!(found.access_count, 2);
    }

    #[tokio::test]
    async fn concurrent_saves_of_same_code_admit_exactly_one() {
        let store = Arc::new(InMemoryStore::new());
        let mut handles = vec![];

        for i in 0..32u64 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .save(new_mapping("race1", &format!("https://example{}.com", i), None))
                    .await
            }));
        }

        let mut saved = 0;
        let mut duplicates = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => saved += 1,
                Err(StorageError::DuplicateKey(_)) => duplicates += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(saved, 1);
        assert_eq!(duplicates, 31);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_access() {
        let store = Arc::new(InMemoryStore::new());
        let mut handles = vec![];

        for i in 0..10u64 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let m = new_mapping(&format!("code{:03}", i), &format!("https://example{}.com", i), None);
                store.save(m).await.unwrap();
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        for i in 0..10u64 {
            let found = store
                .find_by_code(&code(&format!("code{:03}", i)))
                .await
                .unwrap()
                .unwrap();
            assert_eq!(found.original_url, format!("https://example{}.com", i));
        }
    }
}
