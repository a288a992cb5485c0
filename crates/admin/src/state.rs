//! Application state shared across handlers.

use std::sync::Arc;

use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use binh_vuong_core::FactoryState;

use crate::config::AdminConfig;
use crate::db::{RepositoryError, Store};
use crate::services::Argon2Verifier;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. The factory snapshot sits
/// behind a single lock: readers share it, and a mutation holds the write
/// guard from validation until its changes are committed.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    store: Store,
    factory: RwLock<FactoryState>,
    verifier: Argon2Verifier,
}

impl AppState {
    /// Load every collection from `store` and build the state.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the initial load fails.
    pub async fn load(config: AdminConfig, store: Store) -> Result<Self, RepositoryError> {
        let records = store.load_all().await?;
        let factory = FactoryState::from_records(records);
        tracing::info!(
            store = store.kind(),
            orders = factory.orders.len(),
            customers = factory.customers.len(),
            users = factory.users.len(),
            "Factory state loaded"
        );
        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                factory: RwLock::new(factory),
                verifier: Argon2Verifier,
            }),
        })
    }

    /// Get a reference to the admin configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Get a reference to the backing store.
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.inner.store
    }

    /// Get the password verifier.
    #[must_use]
    pub fn verifier(&self) -> &Argon2Verifier {
        &self.inner.verifier
    }

    /// Shared read access to the current snapshot.
    pub async fn read(&self) -> RwLockReadGuard<'_, FactoryState> {
        self.inner.factory.read().await
    }

    /// Exclusive access for a mutation.
    pub(crate) async fn write(&self) -> RwLockWriteGuard<'_, FactoryState> {
        self.inner.factory.write().await
    }
}
