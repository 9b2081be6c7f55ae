//! Relational record store.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::PostgresConfig;
use crate::error::{Error, Result};

/// Additive schema statements, applied in order on every startup.
///
/// The non-empty check is a named constraint so tables created before it
/// existed gain it too. It is added `NOT VALID`: new rows are checked,
/// rows already stored are left alone.
const MIGRATIONS: [&str; 3] = [
    "CREATE TABLE IF NOT EXISTS records (
        id BIGSERIAL PRIMARY KEY,
        field TEXT NOT NULL,
        CONSTRAINT records_field_not_empty CHECK (field <> '')
    )",
    "ALTER TABLE records ADD COLUMN IF NOT EXISTS field TEXT NOT NULL",
    "DO $$
    BEGIN
        IF NOT EXISTS (
            SELECT 1 FROM pg_constraint
            WHERE conname = 'records_field_not_empty'
              AND conrelid = 'records'::regclass
        ) THEN
            ALTER TABLE records
                ADD CONSTRAINT records_field_not_empty CHECK (field <> '') NOT VALID;
        END IF;
    END
    $$",
];

/// A persisted row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Record {
    /// Store-assigned, monotonically increasing identifier.
    pub id: i64,
    /// Non-empty payload.
    pub field: String,
}

/// Narrow view of the relational store used by the service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch the record with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecordNotFound`] if no row matches, or the
    /// underlying database error.
    async fn find_by_id(&self, id: i64) -> Result<Record>;

    /// Insert a new record; the store assigns its id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Constraint`] for an empty `field`, or the
    /// underlying database error.
    async fn insert(&self, field: &str) -> Result<Record>;

    /// Bring the schema up to date without dropping or renaming anything.
    ///
    /// # Errors
    ///
    /// Returns error if the schema cannot be reconciled.
    async fn migrate(&self) -> Result<()>;

    /// Liveness probe.
    ///
    /// # Errors
    ///
    /// Returns error if the database is unreachable.
    async fn ping(&self) -> Result<()>;
}

/// PostgreSQL-backed record store.
#[derive(Debug, Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool using `config`.
    ///
    /// # Errors
    ///
    /// Returns error if no connection can be established.
    pub async fn connect(config: &PostgresConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout())
            .connect_with(config.connect_options())
            .await?;

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn find_by_id(&self, id: i64) -> Result<Record> {
        sqlx::query_as::<_, Record>("SELECT id, field FROM records WHERE id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => Error::RecordNotFound(id),
                other => other.into(),
            })
    }

    async fn insert(&self, field: &str) -> Result<Record> {
        let record = sqlx::query_as::<_, Record>(
            "INSERT INTO records (field) VALUES ($1) RETURNING id, field",
        )
        .bind(field)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    async fn migrate(&self) -> Result<()> {
        for statement in MIGRATIONS {
            sqlx::raw_sql(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
