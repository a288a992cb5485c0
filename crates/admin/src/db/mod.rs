//! Persistence for the factory state.
//!
//! Every collection is a document table (`id`, `body JSONB`), see
//! `crates/admin/migrations/`. A [`Store`] loads every record at startup and
//! commits the [`Change`]s of one transition as a unit.
//!
//! # Migrations
//!
//! Migrations are run explicitly via:
//! ```bash
//! cargo run -p binh-vuong-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use binh_vuong_core::{Change, Record};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A record could not be encoded for storage.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate id or username).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The store refused the write.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Backing store for the factory state.
#[derive(Debug, Clone)]
pub enum Store {
    Postgres(PgStore),
    Memory(MemoryStore),
}

impl Store {
    /// Every record of every collection, newest first within a collection.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if reading or decoding fails.
    pub async fn load_all(&self) -> Result<Vec<Record>, RepositoryError> {
        match self {
            Self::Postgres(store) => store.load_all().await,
            Self::Memory(store) => store.load_all().await,
        }
    }

    /// Apply `changes` atomically: either all are written or none are.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if any write fails.
    pub async fn commit(&self, changes: &[Change]) -> Result<(), RepositoryError> {
        if changes.is_empty() {
            return Ok(());
        }
        match self {
            Self::Postgres(store) => store.commit(changes).await,
            Self::Memory(store) => store.commit(changes).await,
        }
    }

    /// Short name for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::Memory(_) => "memory",
        }
    }

    /// Whether the store is reachable.
    pub async fn ping(&self) -> bool {
        match self {
            Self::Postgres(store) => store.ping().await,
            Self::Memory(_) => true,
        }
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
