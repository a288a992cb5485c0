//! In-memory document store.
//!
//! Used when no database is configured and by the test suites. Records are
//! kept as JSON so they go through the same encoding as the `PostgreSQL`
//! store.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::RwLock;
use uuid::Uuid;

use binh_vuong_core::{Change, Collection, Record};

use super::RepositoryError;

type Documents = HashMap<Collection, Vec<(Uuid, serde_json::Value)>>;

/// Cheaply cloneable in-memory store; clones share data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    documents: Arc<RwLock<Documents>>,
    fail_commits: Arc<AtomicBool>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following commit fail until switched off again.
    pub fn set_fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    /// Number of stored documents in `collection`.
    pub async fn count(&self, collection: Collection) -> usize {
        self.documents
            .read()
            .await
            .get(&collection)
            .map_or(0, Vec::len)
    }

    /// Load every collection.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if a stored body is invalid.
    pub async fn load_all(&self) -> Result<Vec<Record>, RepositoryError> {
        let documents = self.documents.read().await;
        let mut records = Vec::new();
        for collection in Collection::ALL {
            for (id, body) in documents.get(&collection).into_iter().flatten() {
                let record = Record::from_json(collection, body.clone()).map_err(|e| {
                    RepositoryError::DataCorruption(format!("{collection} {id}: {e}"))
                })?;
                records.push(record);
            }
        }
        Ok(records)
    }

    /// Apply `changes` to a copy and swap it in only if all succeed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Unavailable` when failure injection is on,
    /// `RepositoryError::Conflict` for a duplicate id, and
    /// `RepositoryError::NotFound` for an update or delete of a missing id.
    pub async fn commit(&self, changes: &[Change]) -> Result<(), RepositoryError> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable(
                "commit rejected by memory store".to_string(),
            ));
        }

        let mut documents = self.documents.write().await;
        let mut next = documents.clone();
        for change in changes {
            apply_change(&mut next, change)?;
        }
        *documents = next;
        Ok(())
    }
}

fn apply_change(documents: &mut Documents, change: &Change) -> Result<(), RepositoryError> {
    let table = documents.entry(change.collection()).or_default();
    match change {
        Change::Create(record) => {
            let id = record.id();
            if table.iter().any(|(existing, _)| *existing == id) {
                return Err(RepositoryError::Conflict(format!(
                    "duplicate id {id} in {}",
                    record.collection()
                )));
            }
            table.insert(0, (id, record.to_json()?));
        }
        Change::Update(record) => {
            let id = record.id();
            let slot = table
                .iter_mut()
                .find(|(existing, _)| *existing == id)
                .ok_or(RepositoryError::NotFound)?;
            slot.1 = record.to_json()?;
        }
        Change::Delete { id, .. } => {
            let before = table.len();
            table.retain(|(existing, _)| existing != id);
            if table.len() == before {
                return Err(RepositoryError::NotFound);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use binh_vuong_core::customer::CustomerForm;

    fn customer_record(name: &str) -> Record {
        let form = CustomerForm {
            name: name.to_string(),
            ..CustomerForm::default()
        };
        Record::Customer(form.into_customer(chrono::Utc::now()).unwrap())
    }

    #[tokio::test]
    async fn test_commit_then_load_newest_first() {
        let store = MemoryStore::new();
        let first = customer_record("LA CAMIE");
        let second = customer_record("SHOES HOUSE");
        store.commit(&[Change::Create(first.clone())]).await.unwrap();
        store.commit(&[Change::Create(second.clone())]).await.unwrap();

        let records = store.load_all().await.unwrap();
        assert_eq!(records, vec![second, first]);
    }

    #[tokio::test]
    async fn test_failed_change_rolls_back_whole_batch() {
        let store = MemoryStore::new();
        let good = customer_record("LA CAMIE");
        let missing = customer_record("GHOST");

        let result = store
            .commit(&[Change::Create(good), Change::Update(missing)])
            .await;

        assert!(matches!(result, Err(RepositoryError::NotFound)));
        assert_eq!(store.count(Collection::Customers).await, 0);
    }

    #[tokio::test]
    async fn test_duplicate_create_conflicts() {
        let store = MemoryStore::new();
        let record = customer_record("LA CAMIE");
        store.commit(&[Change::Create(record.clone())]).await.unwrap();
        let result = store.commit(&[Change::Create(record)]).await;
        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let store = MemoryStore::new();
        store.set_fail_commits(true);
        let result = store
            .commit(&[Change::Create(customer_record("LA CAMIE"))])
            .await;
        assert!(matches!(result, Err(RepositoryError::Unavailable(_))));

        store.set_fail_commits(false);
        store
            .commit(&[Change::Create(customer_record("LA CAMIE"))])
            .await
            .unwrap();
        assert_eq!(store.count(Collection::Customers).await, 1);
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let store = MemoryStore::new();
        let result = store
            .commit(&[Change::Delete {
                collection: Collection::Payments,
                id: Uuid::new_v4(),
            }])
            .await;
        assert!(matches!(result, Err(RepositoryError::NotFound)));
    }
}
