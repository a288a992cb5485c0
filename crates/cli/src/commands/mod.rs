//! Subcommand implementations.
//!
//! Every command except `migrate` loads the full factory state from
//! `PostgreSQL` and writes through the same service layer as the server.

pub mod debt;
pub mod migrate;
pub mod seed;
pub mod users;

use binh_vuong_admin::config::AdminConfig;
use binh_vuong_admin::db::{self, PgStore, Store};
use binh_vuong_admin::state::AppState;

/// Connect to the configured database and load the factory state.
///
/// # Errors
///
/// Returns an error if no database URL is set, the connection fails, or a
/// stored record cannot be decoded.
pub async fn open_state() -> Result<AppState, Box<dyn std::error::Error>> {
    let config = AdminConfig::from_env()?;
    let pool = db::create_pool(config.require_database_url()?).await?;
    tracing::info!("Connected to database");
    let state = AppState::load(config, Store::Postgres(PgStore::new(pool))).await?;
    Ok(state)
}
