//! In-process key store.
//!
//! Backs `--in-memory` demo mode and the test suites. Keeps insertion order,
//! assigns UUID v4 ids, and can be switched into a failing mode to exercise
//! error paths.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{DeleteOutcome, KeyStore};
use crate::errors::StoreError;
use crate::models::api_key::{ApiKeyRecord, KeyId, KeyUpdate, NewApiKey};

#[derive(Clone, Default)]
pub struct MemoryKeyStore {
    rows: Arc<RwLock<Vec<ApiKeyRecord>>>,
    calls: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `rows`.
    pub fn with_rows(rows: Vec<ApiKeyRecord>) -> Self {
        Self {
            rows: Arc::new(RwLock::new(rows)),
            ..Self::default()
        }
    }

    /// Number of store operations issued so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// While set, every operation fails with a 503 rejection.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn rows(&self) -> Vec<ApiKeyRecord> {
        self.rows.read().await.clone()
    }

    fn enter(&self) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Rejected {
                status: 503,
                message: "store unavailable".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl KeyStore for MemoryKeyStore {
    async fn list_all(&self) -> Result<Vec<ApiKeyRecord>, StoreError> {
        self.enter()?;
        Ok(self.rows.read().await.clone())
    }

    async fn insert(&self, record: &NewApiKey) -> Result<ApiKeyRecord, StoreError> {
        self.enter()?;
        let created = ApiKeyRecord {
            id: KeyId::new(uuid::Uuid::new_v4().to_string()),
            name: record.name.clone(),
            key: record.key.clone(),
            usage: record.usage,
            created_at: record.created_at,
        };
        self.rows.write().await.push(created.clone());
        Ok(created)
    }

    async fn update_fields(&self, id: &KeyId, update: &KeyUpdate) -> Result<(), StoreError> {
        self.enter()?;
        let mut rows = self.rows.write().await;
        let row = rows
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if let Some(name) = &update.name {
            row.name = name.clone();
        }
        Ok(())
    }

    async fn delete_by_id(&self, id: &KeyId) -> Result<DeleteOutcome, StoreError> {
        self.enter()?;
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|r| &r.id != id);
        if rows.len() == before {
            Ok(DeleteOutcome::NotFound)
        } else {
            Ok(DeleteOutcome::Deleted)
        }
    }
}
