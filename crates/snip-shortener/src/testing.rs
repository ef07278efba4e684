//! Test doubles shared by the resolver and service tests.

use async_trait::async_trait;
use snip_core::store::{MappingStore, Result};
use snip_core::{GeneratorError, NewUrlMapping, ShortCode, UrlMapping};
use snip_generator::Generator;
use snip_storage::InMemoryStore;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Hands out a fixed sequence of codes, then fails.
pub struct ScriptedGenerator {
    codes: Mutex<VecDeque<ShortCode>>,
    collision_free: bool,
}

impl ScriptedGenerator {
    pub fn new<'a>(codes: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            codes: Mutex::new(codes.into_iter().map(ShortCode::new_unchecked).collect()),
            collision_free: false,
        }
    }

    pub fn collision_free(mut self) -> Self {
        self.collision_free = true;
        self
    }

    pub fn remaining(&self) -> usize {
        self.codes.lock().unwrap().len()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self) -> std::result::Result<ShortCode, GeneratorError> {
        self.codes
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| GeneratorError::Counter("script exhausted".to_string()))
    }

    fn is_collision_free(&self) -> bool {
        self.collision_free
    }
}

/// Wraps an [`InMemoryStore`] and counts existence checks.
///
/// With `blind` set, every existence check answers "free" so collisions only
/// surface as duplicate-key failures on insert, the way a lost race does.
#[derive(Default)]
pub struct CountingStore {
    inner: InMemoryStore,
    lookups: AtomicUsize,
    blind: bool,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blind() -> Self {
        Self {
            blind: true,
            ..Self::default()
        }
    }

    pub async fn occupy(&self, codes: &[&str]) {
        for code in codes {
            self.inner
                .save(NewUrlMapping {
                    code: ShortCode::new_unchecked(*code),
                    original_url: format!("https://taken.example/{code}"),
                    expires_at: None,
                })
                .await
                .unwrap();
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }
}

#[async_trait]
impl MappingStore for CountingStore {
    async fn save(&self, mapping: NewUrlMapping) -> Result<UrlMapping> {
        self.inner.save(mapping).await
    }

    async fn exists_by_code(&self, code: &ShortCode) -> Result<bool> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.blind {
            return Ok(false);
        }
        self.inner.exists_by_code(code).await
    }

    async fn find_by_code(&self, code: &ShortCode) -> Result<Option<UrlMapping>> {
        self.inner.find_by_code(code).await
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<UrlMapping>> {
        self.inner.find_by_id(id).await
    }

    async fn increment_access_count(&self, code: &ShortCode) -> Result<()> {
        self.inner.increment_access_count(code).await
    }
}
