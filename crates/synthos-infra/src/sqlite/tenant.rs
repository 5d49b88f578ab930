//! SQLite tenant repository implementation.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use sqlx::Row;

use synthos_core::repository::tenant::TenantRepository;
use synthos_types::error::RepositoryError;
use synthos_types::tenant::{TenantId, TenantRecord};

use super::pool::DatabasePool;

/// SQLite-backed implementation of `TenantRepository`.
pub struct SqliteTenantRepository {
    pool: DatabasePool,
}

impl SqliteTenantRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct TenantRow {
    id: String,
    owner_id: String,
    application_id: String,
    token: String,
    enabled: bool,
    created_at: String,
    updated_at: String,
}

impl TenantRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            application_id: row.try_get("application_id")?,
            token: row.try_get("token")?,
            enabled: row.try_get("enabled")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_record(self) -> Result<TenantRecord, RepositoryError> {
        let id = self
            .id
            .parse::<TenantId>()
            .map_err(|e| RepositoryError::Query(format!("invalid tenant id: {e}")))?;

        Ok(TenantRecord {
            id,
            owner_id: self.owner_id,
            application_id: self.application_id,
            token: SecretString::from(self.token),
            enabled: self.enabled,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn decode(row: &sqlx::sqlite::SqliteRow) -> Result<TenantRecord, RepositoryError> {
    TenantRow::from_row(row)
        .map_err(|e| RepositoryError::Query(e.to_string()))?
        .into_record()
}

impl TenantRepository for SqliteTenantRepository {
    async fn create(&self, record: &TenantRecord) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO tenants (id, owner_id, application_id, token, enabled, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(record.id.to_string())
        .bind(&record.owner_id)
        .bind(&record.application_id)
        .bind(record.token.expose_secret())
        .bind(record.enabled)
        .bind(format_datetime(&record.created_at))
        .bind(format_datetime(&record.updated_at))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("UNIQUE") => {
                Err(RepositoryError::Conflict(format!(
                    "owner '{}' already has a tenant",
                    record.owner_id
                )))
            }
            Err(e) => Err(RepositoryError::Query(e.to_string())),
        }
    }

    async fn get_by_owner(&self, owner_id: &str) -> Result<Option<TenantRecord>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM tenants WHERE owner_id = ?")
            .bind(owner_id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        row.as_ref().map(decode).transpose()
    }

    async fn list_enabled(&self) -> Result<Vec<TenantRecord>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM tenants WHERE enabled = 1 ORDER BY created_at ASC")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter().map(decode).collect()
    }
}
