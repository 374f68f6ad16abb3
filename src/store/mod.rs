//! Deployment record repository
//!
//! Records live behind [`DeploymentStore`] so the volatile in-memory map can be
//! replaced by a persistent backend without touching pipeline code. `update` is
//! atomic per record: a reader never sees half of one mutation.

use crate::pipeline::{DeploymentFilter, DeploymentRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("deployment {0} not found")]
    NotFound(String),

    #[error("store backend error: {0}")]
    Backend(String),
}

pub type RecordUpdate = Box<dyn FnOnce(&mut DeploymentRecord) + Send>;

#[async_trait]
pub trait DeploymentStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<DeploymentRecord, StoreError>;

    /// Inserts or replaces the record with the same id
    async fn put(&self, record: DeploymentRecord) -> Result<(), StoreError>;

    async fn delete(&self, id: Uuid) -> Result<DeploymentRecord, StoreError>;

    /// Records matching `filter`, in insertion order
    async fn list(&self, filter: &DeploymentFilter) -> Result<Vec<DeploymentRecord>, StoreError>;

    /// Applies `update` atomically and returns the updated record
    async fn update(&self, id: Uuid, update: RecordUpdate) -> Result<DeploymentRecord, StoreError>;
}

#[derive(Default)]
struct Inner {
    records: HashMap<Uuid, DeploymentRecord>,
    order: Vec<Uuid>,
}

/// Process-local store; contents are lost on exit
#[derive(Default)]
pub struct InMemoryDeploymentStore {
    inner: RwLock<Inner>,
}

impl InMemoryDeploymentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl DeploymentStore for InMemoryDeploymentStore {
    async fn get(&self, id: Uuid) -> Result<DeploymentRecord, StoreError> {
        self.inner
            .read()
            .await
            .records
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn put(&self, record: DeploymentRecord) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.records.insert(record.id, record.clone()).is_none() {
            inner.order.push(record.id);
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<DeploymentRecord, StoreError> {
        let mut inner = self.inner.write().await;
        let record = inner
            .records
            .remove(&id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        inner.order.retain(|existing| *existing != id);
        Ok(record)
    }

    async fn list(&self, filter: &DeploymentFilter) -> Result<Vec<DeploymentRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(filter.apply(inner.order.iter().filter_map(|id| inner.records.get(id))))
    }

    async fn update(&self, id: Uuid, update: RecordUpdate) -> Result<DeploymentRecord, StoreError> {
        let mut inner = self.inner.write().await;
        let record = inner
            .records
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        update(record);
        Ok(record.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{DeploymentRequest, DeploymentStatus};

    fn record(name: &str) -> DeploymentRecord {
        DeploymentRecord::new(DeploymentRequest::new(name))
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = InMemoryDeploymentStore::new();
        let r = record("demo");
        let id = r.id;

        store.put(r).await.unwrap();
        assert_eq!(store.get(id).await.unwrap().project_name, "demo");

        store.delete(id).await.unwrap();
        assert!(store.is_empty().await);
        match store.get(id).await.unwrap_err() {
            StoreError::NotFound(missing) => assert_eq!(missing, id.to_string()),
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_delete_unknown_is_not_found() {
        let store = InMemoryDeploymentStore::new();
        assert!(matches!(
            store.delete(Uuid::new_v4()).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_keeps_insertion_order() {
        let store = InMemoryDeploymentStore::new();
        let names = ["a", "b", "c", "d"];
        for name in names {
            store.put(record(name)).await.unwrap();
        }

        let all = store.list(&DeploymentFilter::default()).await.unwrap();
        let listed: Vec<&str> = all.iter().map(|r| r.project_name.as_str()).collect();
        assert_eq!(listed, names);
    }

    #[tokio::test]
    async fn test_put_existing_keeps_position() {
        let store = InMemoryDeploymentStore::new();
        let first = record("first");
        store.put(first.clone()).await.unwrap();
        store.put(record("second")).await.unwrap();
        store.put(first).await.unwrap();

        let all = store.list(&DeploymentFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].project_name, "first");
    }

    #[tokio::test]
    async fn test_update_is_applied() {
        let store = InMemoryDeploymentStore::new();
        let r = record("demo");
        let id = r.id;
        store.put(r).await.unwrap();

        let updated = store
            .update(
                id,
                Box::new(|r| {
                    r.transition(DeploymentStatus::Detecting);
                    r.advance(10);
                }),
            )
            .await
            .unwrap();
        assert_eq!(updated.status, DeploymentStatus::Detecting);
        assert_eq!(store.get(id).await.unwrap().progress, 10);
    }
}
