use async_trait::async_trait;
use jiff::Timestamp;
use snip_core::store::{MappingStore, Result};
use snip_core::{NewUrlMapping, ShortCode, StorageError, UrlMapping};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use tracing::trace;

/// The schema expected by [`MySqlStore`].
pub const SCHEMA: &str = include_str!("../ddl/mysql/url_mappings.sql");

/// MySQL implementation of the mapping store contract.
///
/// The `code` column carries a unique index with a binary collation, so
/// codes differing only in letter case are distinct, and a concurrent insert
/// of the same code fails with a unique violation instead of overwriting.
/// Timestamps are stored as Unix milliseconds.
#[derive(Debug, Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    /// Creates a store from an existing MySQL connection pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Creates a store by opening a new MySQL connection pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = MySqlPool::connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Creates the `url_mappings` table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

fn parse_millis(column: &str, millis: i64) -> Result<Timestamp> {
    Timestamp::from_millisecond(millis).map_err(|e| {
        StorageError::InvalidData(format!("invalid {column} timestamp '{millis}': {e}"))
    })
}

/// Drops sub-millisecond precision so the returned mapping equals what a
/// later read produces.
fn truncate_to_millis(ts: Timestamp) -> Result<Timestamp> {
    parse_millis("timestamp", ts.as_millisecond())
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

fn row_to_mapping(row: &MySqlRow) -> Result<UrlMapping> {
    let id: u64 = row.try_get("id").map_err(map_sqlx_error)?;
    let code: String = row.try_get("code").map_err(map_sqlx_error)?;
    let original_url: String = row.try_get("original_url").map_err(map_sqlx_error)?;
    let created_at: i64 = row.try_get("created_at").map_err(map_sqlx_error)?;
    let expires_at: Option<i64> = row.try_get("expires_at").map_err(map_sqlx_error)?;
    let access_count: u64 = row.try_get("access_count").map_err(map_sqlx_error)?;

    Ok(UrlMapping {
        id,
        code: ShortCode::new_unchecked(code),
        original_url,
        created_at: parse_millis("created_at", created_at)?,
        expires_at: expires_at
            .map(|millis| parse_millis("expires_at", millis))
            .transpose()?,
        access_count,
    })
}

#[async_trait]
impl MappingStore for MySqlStore {
    async fn save(&self, mapping: NewUrlMapping) -> Result<UrlMapping> {
        let created_at = truncate_to_millis(Timestamp::now())?;
        let expires_at = mapping.expires_at.map(truncate_to_millis).transpose()?;

        let result = sqlx::query(
            r#"
            INSERT INTO url_mappings (code, original_url, created_at, expires_at, access_count)
            VALUES (?, ?, ?, ?, 0)
            "#,
        )
        .bind(mapping.code.as_str())
        .bind(&mapping.original_url)
        .bind(created_at.as_millisecond())
        .bind(expires_at.map(|ts| ts.as_millisecond()))
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => {
                trace!(id = done.last_insert_id(), code = %mapping.code, "inserted mapping");
                Ok(UrlMapping {
                    id: done.last_insert_id(),
                    code: mapping.code,
                    original_url: mapping.original_url,
                    created_at,
                    expires_at,
                    access_count: 0,
                })
            }
            Err(err) if is_unique_violation(&err) => {
                Err(StorageError::DuplicateKey(mapping.code.to_string()))
            }
            Err(err) => Err(map_sqlx_error(err)),
        }
    }

    async fn exists_by_code(&self, code: &ShortCode) -> Result<bool> {
        let exists = sqlx::query(
            r#"
            SELECT 1
            FROM url_mappings
            WHERE code = ?
            LIMIT 1
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .is_some();

        Ok(exists)
    }

    async fn find_by_code(&self, code: &ShortCode) -> Result<Option<UrlMapping>> {
        let row = sqlx::query(
            r#"
            SELECT id, code, original_url, created_at, expires_at, access_count
            FROM url_mappings
            WHERE code = ?
            LIMIT 1
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(row_to_mapping).transpose()
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<UrlMapping>> {
        let row = sqlx::query(
            r#"
            SELECT id, code, original_url, created_at, expires_at, access_count
            FROM url_mappings
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(row_to_mapping).transpose()
    }

    async fn increment_access_count(&self, code: &ShortCode) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE url_mappings
            SET access_count = access_count + 1
            WHERE code = ?
            "#,
        )
        .bind(code.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }
}
