//! PostgreSQL implementation of the entry store.
//!
//! ## Error Mapping
//!
//! | SQLx error                        | `StoreError`     |
//! |-----------------------------------|------------------|
//! | Database, code `23505` (unique)   | `Conflict`       |
//! | Database, code `42P01` (no table) | `SchemaMissing`  |
//! | `PoolClosed`                      | `Unavailable`    |
//! | anything else                     | `Database`       |

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::EntryStore;
use super::mapper::EntryMapper;
use super::models::GuestbookEntryRow;
use crate::config::{DatabaseConfig, StoreBackend};
use crate::domain::{EntryId, GuestbookEntry};
use crate::error::StoreError;

/// Table holding one row per entry.
pub const ENTRIES_TABLE: &str = "guestbook_entries";

/// PostgreSQL-backed [`EntryStore`] using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresEntryStore {
    pool: PgPool,
}

impl PostgresEntryStore {
    /// Creates a store over an existing connection pool.
    ///
    /// The caller is responsible for the schema; see
    /// [`PostgresEntryStore::ensure_schema`].
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a pool from `config`, applies migrations if enabled, and
    /// checks the entries table exists.
    ///
    /// The database itself must already exist; creating it is a
    /// provisioning task.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the database cannot be reached and
    /// [`StoreError::SchemaMissing`] if the table is absent.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .connect(&config.url)
            .await?;

        let store = Self::new(pool);
        if config.run_migrations {
            store.run_migrations().await?;
        }
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Applies the migrations bundled under `migrations/`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if a migration fails.
    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(sqlx::Error::from(e)))?;
        tracing::info!("database migrations applied");
        Ok(())
    }

    /// Verifies the entries table exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::SchemaMissing`] if it does not, or
    /// [`StoreError::Database`] if the check itself fails.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM information_schema.tables \
             WHERE table_schema = current_schema() AND table_name = $1)",
        )
        .bind(ENTRIES_TABLE)
        .fetch_one(&self.pool)
        .await?;

        if exists {
            Ok(())
        } else {
            Err(StoreError::SchemaMissing(format!(
                "table {ENTRIES_TABLE} does not exist"
            )))
        }
    }
}

#[async_trait]
impl EntryStore for PostgresEntryStore {
    async fn save(&self, entry: GuestbookEntry) -> Result<GuestbookEntry, StoreError> {
        let row = GuestbookEntryRow::from(&entry);
        let saved = sqlx::query_as::<_, GuestbookEntryRow>(
            "INSERT INTO guestbook_entries (id, name, message, created_at) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, name, message, created_at",
        )
        .bind(&row.id)
        .bind(&row.name)
        .bind(&row.message)
        .bind(row.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(&row.id, e))?;

        tracing::debug!(id = %saved.id, "entry row inserted");
        Ok(GuestbookEntry::from(saved))
    }

    async fn find_all(&self) -> Result<Vec<GuestbookEntry>, StoreError> {
        let rows = sqlx::query_as::<_, GuestbookEntryRow>(
            "SELECT id, name, message, created_at FROM guestbook_entries \
             ORDER BY created_at ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("", e))?;

        Ok(rows.into_iter().map(GuestbookEntry::from).collect())
    }

    async fn find_by_id(&self, id: &EntryId) -> Result<Option<GuestbookEntry>, StoreError> {
        if !is_storable_id(id.as_str()) {
            return Ok(None);
        }
        let row = sqlx::query_as::<_, GuestbookEntryRow>(
            "SELECT id, name, message, created_at FROM guestbook_entries WHERE id = $1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(id.as_str(), e))?;

        Ok(EntryMapper::to_domain(row))
    }

    fn backend(&self) -> StoreBackend {
        StoreBackend::Postgres
    }
}

/// `TEXT` cannot hold NUL bytes, so no stored id contains one.
fn is_storable_id(id: &str) -> bool {
    !id.contains('\0')
}

/// Maps SQLx errors to [`StoreError`]; `id` names the entry involved, if any.
fn map_sqlx_error(id: &str, err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        let code = db_err.code().map(|c| c.into_owned());
        match code.as_deref() {
            Some("23505") => return StoreError::Conflict(id.to_string()),
            Some("42P01") => return StoreError::SchemaMissing(db_err.message().to_string()),
            _ => {}
        }
    }
    if matches!(err, sqlx::Error::PoolClosed) {
        return StoreError::Unavailable("connection pool closed".to_string());
    }
    StoreError::Database(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nul_bytes_are_never_storable() {
        assert!(is_storable_id("3f0c1a52-9a7e-4a53-8d1e-1b2f0c9d7e11"));
        assert!(is_storable_id(""));
        assert!(!is_storable_id("abc\0def"));
        assert!(!is_storable_id("\0"));
    }

    #[test]
    fn pool_closed_maps_to_unavailable() {
        let err = map_sqlx_error("id", sqlx::Error::PoolClosed);
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    #[test]
    fn other_errors_stay_database_errors() {
        let err = map_sqlx_error("id", sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Database(sqlx::Error::RowNotFound)));
    }
}
