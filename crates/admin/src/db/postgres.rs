//! `PostgreSQL` document store.
//!
//! Table names come from [`Collection::name`], never from user input.

use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use binh_vuong_core::{Change, Collection, Record};

use super::RepositoryError;

/// Internal row type for document queries.
#[derive(Debug, sqlx::FromRow)]
struct DocumentRow {
    id: Uuid,
    body: serde_json::Value,
}

impl DocumentRow {
    fn into_record(self, collection: Collection) -> Result<Record, RepositoryError> {
        let record = Record::from_json(collection, self.body).map_err(|e| {
            RepositoryError::DataCorruption(format!("{collection} {}: {e}", self.id))
        })?;
        if record.id() != self.id {
            return Err(RepositoryError::DataCorruption(format!(
                "{collection} {}: body id {} does not match row id",
                self.id,
                record.id()
            )));
        }
        Ok(record)
    }
}

/// Store backed by one JSONB table per collection.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Load every collection.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored body is invalid.
    pub async fn load_all(&self) -> Result<Vec<Record>, RepositoryError> {
        let mut records = Vec::new();
        for collection in Collection::ALL {
            let rows: Vec<DocumentRow> = sqlx::query_as(&format!(
                "SELECT id, body FROM {} ORDER BY seq DESC",
                collection.name()
            ))
            .fetch_all(&self.pool)
            .await?;
            for row in rows {
                records.push(row.into_record(collection)?);
            }
        }
        Ok(records)
    }

    /// Write `changes` in a single transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if an update or delete matches no
    /// row, `RepositoryError::Conflict` on a unique violation, and
    /// `RepositoryError::Database` for anything else. The transaction is
    /// rolled back in every case.
    pub async fn commit(&self, changes: &[Change]) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        for change in changes {
            apply_change(&mut tx, change).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Whether a trivial query succeeds.
    pub async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok()
    }
}

async fn apply_change(
    tx: &mut Transaction<'_, Postgres>,
    change: &Change,
) -> Result<(), RepositoryError> {
    let table = change.collection().name();
    let affected = match change {
        Change::Create(record) => sqlx::query(&format!(
            "INSERT INTO {table} (id, body) VALUES ($1, $2)"
        ))
        .bind(record.id())
        .bind(record.to_json()?)
        .execute(&mut **tx)
        .await
        .map_err(conflict_or_database)?
        .rows_affected(),
        Change::Update(record) => sqlx::query(&format!(
            "UPDATE {table} SET body = $2, updated_at = now() WHERE id = $1"
        ))
        .bind(record.id())
        .bind(record.to_json()?)
        .execute(&mut **tx)
        .await
        .map_err(conflict_or_database)?
        .rows_affected(),
        Change::Delete { id, .. } => sqlx::query(&format!("DELETE FROM {table} WHERE id = $1"))
            .bind(id)
            .execute(&mut **tx)
            .await?
            .rows_affected(),
    };
    if affected == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

fn conflict_or_database(error: sqlx::Error) -> RepositoryError {
    match &error {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepositoryError::Conflict(db.message().to_owned())
        }
        _ => RepositoryError::Database(error),
    }
}
