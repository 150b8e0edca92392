//! Record store adapters for the API key collection.

use async_trait::async_trait;

use crate::errors::StoreError;
use crate::models::api_key::{ApiKeyRecord, KeyId, KeyUpdate, NewApiKey};

pub mod memory;
pub mod rest;

/// Result of a delete. A missing row is reported, not treated as a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

/// The four primitives the dashboard needs over one collection of keys.
#[async_trait]
pub trait KeyStore: Send + Sync + 'static {
    /// Every record visible to the caller. Empty is a valid result.
    async fn list_all(&self) -> Result<Vec<ApiKeyRecord>, StoreError>;

    /// Persist a new record and return it with its assigned id.
    async fn insert(&self, record: &NewApiKey) -> Result<ApiKeyRecord, StoreError>;

    /// Apply a partial update. `StoreError::NotFound` if no row has `id`.
    async fn update_fields(&self, id: &KeyId, update: &KeyUpdate) -> Result<(), StoreError>;

    async fn delete_by_id(&self, id: &KeyId) -> Result<DeleteOutcome, StoreError>;

    /// Cheap reachability probe.
    async fn health_check(&self) -> Result<(), StoreError> {
        self.list_all().await.map(|_| ())
    }
}
