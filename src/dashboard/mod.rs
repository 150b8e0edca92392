//! Dashboard controller.
//!
//! Owns the whole UI state for one dashboard session and exposes the
//! operations the page (or CLI) invokes. State is only changed after the
//! store confirms an operation; the lock is never held across a store call,
//! so overlapping operations interleave and the last completion wins.

use std::collections::HashSet;
use std::sync::{Arc, Weak};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::clipboard::Clipboard;
use crate::errors::{DashboardError, ValidationError};
use crate::keygen::{generate_api_key, DEFAULT_KEY_PREFIX};
use crate::models::api_key::{ApiKeyRecord, KeyId, KeyUpdate, NewApiKey};
use crate::models::usage::UsageSummary;
use crate::store::{DeleteOutcome, KeyStore};

pub mod notification;
pub mod view;

use notification::{Notification, NotificationKind, DEFAULT_NOTIFICATION_SECS};
use view::{DashboardView, KeyRow, ModalView};

/// Knobs that come from configuration.
#[derive(Debug, Clone)]
pub struct DashboardSettings {
    pub key_prefix: String,
    pub notification_ttl: Duration,
    pub plan_name: String,
    pub plan_limit: u64,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            notification_ttl: Duration::from_secs(DEFAULT_NOTIFICATION_SECS),
            plan_name: "Researcher".to_string(),
            plan_limit: 1000,
        }
    }
}

/// A rename in progress on one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditSession {
    pub id: KeyId,
    pub draft: String,
}

#[derive(Debug)]
struct DashboardState {
    loading: bool,
    keys: Vec<ApiKeyRecord>,
    editing: Option<EditSession>,
    modal_open: bool,
    create_draft: String,
    visible: HashSet<KeyId>,
    notification: Option<Notification>,
    last_notification_id: u64,
}

impl DashboardState {
    fn new() -> Self {
        Self {
            loading: true,
            keys: Vec::new(),
            editing: None,
            modal_open: false,
            create_draft: String::new(),
            visible: HashSet::new(),
            notification: None,
            last_notification_id: 0,
        }
    }

    fn find(&self, id: &KeyId) -> Option<&ApiKeyRecord> {
        self.keys.iter().find(|k| &k.id == id)
    }
}

struct Inner {
    store: Arc<dyn KeyStore>,
    clipboard: Arc<dyn Clipboard>,
    settings: DashboardSettings,
    state: RwLock<DashboardState>,
}

/// Cheaply-cloneable handle to one dashboard session.
#[derive(Clone)]
pub struct Dashboard(Arc<Inner>);

impl Dashboard {
    pub fn new(
        store: Arc<dyn KeyStore>,
        clipboard: Arc<dyn Clipboard>,
        settings: DashboardSettings,
    ) -> Self {
        Self(Arc::new(Inner {
            store,
            clipboard,
            settings,
            state: RwLock::new(DashboardState::new()),
        }))
    }

    pub fn settings(&self) -> &DashboardSettings {
        &self.0.settings
    }

    // -- Loading --

    /// Initial fetch. Clears `loading` whether or not the fetch succeeds.
    pub async fn load(&self) -> Result<usize, DashboardError> {
        match self.0.store.health_check().await {
            Ok(()) => tracing::info!("key store connection successful"),
            Err(e) => tracing::warn!("key store connection check failed: {}", e),
        }

        let result = self.0.store.list_all().await;
        let mut st = self.0.state.write().await;
        st.loading = false;
        match result {
            Ok(keys) => {
                let count = keys.len();
                st.keys = keys;
                drop(st);
                tracing::info!(count, "loaded API keys");
                Ok(count)
            }
            Err(e) => {
                drop(st);
                tracing::error!("Error fetching API keys: {}", e);
                self.notify(
                    NotificationKind::Error,
                    format!("Failed to load API keys: {}", e),
                )
                .await;
                Err(e.into())
            }
        }
    }

    // -- Create --

    /// Validate, generate, persist, then append. Nothing changes locally
    /// unless the store returns the persisted record.
    pub async fn create_key(&self, name: &str) -> Result<ApiKeyRecord, DashboardError> {
        let name = name.trim();
        if name.is_empty() {
            let err = ValidationError::EmptyName;
            tracing::warn!("create_key rejected: {}", err);
            self.notify(NotificationKind::Error, err.to_string()).await;
            return Err(err.into());
        }

        let record = NewApiKey::new(name, generate_api_key(&self.0.settings.key_prefix));

        match self.0.store.insert(&record).await {
            Ok(created) => {
                {
                    let mut st = self.0.state.write().await;
                    st.keys.push(created.clone());
                    st.modal_open = false;
                    st.create_draft.clear();
                }
                tracing::info!(id = %created.id, name = %created.name, "API key created");
                self.notify(NotificationKind::Success, "API key created successfully!")
                    .await;
                Ok(created)
            }
            Err(e) => {
                tracing::error!("Error creating new key: {}", e);
                self.notify(
                    NotificationKind::Error,
                    format!("Failed to create API key: {}", e),
                )
                .await;
                Err(e.into())
            }
        }
    }

    /// Create from the modal's name field.
    pub async fn submit_create(&self) -> Result<ApiKeyRecord, DashboardError> {
        let name = self.0.state.read().await.create_draft.clone();
        self.create_key(&name).await
    }

    pub async fn open_create_modal(&self) {
        self.0.state.write().await.modal_open = true;
    }

    /// Hides the dialog. The typed name is kept for the next open.
    pub async fn close_create_modal(&self) {
        self.0.state.write().await.modal_open = false;
    }

    pub async fn set_create_draft(&self, name: impl Into<String>) {
        self.0.state.write().await.create_draft = name.into();
    }

    // -- Rename --

    /// Enter rename mode on `id`, abandoning any other unsaved rename.
    pub async fn begin_edit(&self, id: &KeyId) -> Result<(), DashboardError> {
        let mut st = self.0.state.write().await;
        let name = st
            .find(id)
            .map(|k| k.name.clone())
            .ok_or_else(|| DashboardError::UnknownKey(id.to_string()))?;
        if let Some(prev) = &st.editing {
            if &prev.id != id {
                tracing::debug!(abandoned = %prev.id, "discarding unsaved rename");
            }
        }
        st.editing = Some(EditSession {
            id: id.clone(),
            draft: name,
        });
        Ok(())
    }

    pub async fn set_edit_draft(&self, draft: impl Into<String>) -> Result<(), DashboardError> {
        let mut st = self.0.state.write().await;
        let session = st.editing.as_mut().ok_or(DashboardError::NotEditing)?;
        session.draft = draft.into();
        Ok(())
    }

    pub async fn cancel_edit(&self) {
        self.0.state.write().await.editing = None;
    }

    /// Save the in-progress rename.
    pub async fn save_edit(&self) -> Result<(), DashboardError> {
        let session = self
            .0
            .state
            .read()
            .await
            .editing
            .clone()
            .ok_or(DashboardError::NotEditing)?;
        self.rename_key(&session.id, &session.draft).await
    }

    /// Persist a new name. On failure the local name and edit mode are left
    /// as they were and an error notification is shown.
    pub async fn rename_key(&self, id: &KeyId, new_name: &str) -> Result<(), DashboardError> {
        match self
            .0
            .store
            .update_fields(id, &KeyUpdate::rename(new_name))
            .await
        {
            Ok(()) => {
                {
                    let mut st = self.0.state.write().await;
                    if let Some(key) = st.keys.iter_mut().find(|k| &k.id == id) {
                        key.name = new_name.to_string();
                    }
                    if st.editing.as_ref().is_some_and(|e| &e.id == id) {
                        st.editing = None;
                    }
                }
                tracing::info!(id = %id, "API key renamed");
                self.notify(NotificationKind::Success, "API key renamed").await;
                Ok(())
            }
            Err(e) => {
                tracing::error!(id = %id, "Error updating key name: {}", e);
                self.notify(
                    NotificationKind::Error,
                    format!("Failed to rename API key: {}", e),
                )
                .await;
                Err(e.into())
            }
        }
    }

    // -- Delete --

    /// Delete from the store, then locally. A key the store no longer has is
    /// treated as already deleted.
    pub async fn delete_key(&self, id: &KeyId) -> Result<DeleteOutcome, DashboardError> {
        match self.0.store.delete_by_id(id).await {
            Ok(outcome) => {
                {
                    let mut st = self.0.state.write().await;
                    st.keys.retain(|k| &k.id != id);
                    st.visible.remove(id);
                    if st.editing.as_ref().is_some_and(|e| &e.id == id) {
                        st.editing = None;
                    }
                }
                let message = match outcome {
                    DeleteOutcome::Deleted => {
                        tracing::info!(id = %id, "API key deleted");
                        "API key deleted"
                    }
                    DeleteOutcome::NotFound => {
                        tracing::info!(id = %id, "API key was already deleted");
                        "API key was already deleted"
                    }
                };
                self.notify(NotificationKind::Success, message).await;
                Ok(outcome)
            }
            Err(e) => {
                tracing::error!(id = %id, "Error deleting key: {}", e);
                self.notify(
                    NotificationKind::Error,
                    format!("Failed to delete API key: {}", e),
                )
                .await;
                Err(e.into())
            }
        }
    }

    // -- Reveal / copy --

    /// Flip masked/full display for one row. Local only. Returns the new state.
    pub async fn toggle_visibility(&self, id: &KeyId) -> Result<bool, DashboardError> {
        let mut st = self.0.state.write().await;
        if st.find(id).is_none() {
            return Err(DashboardError::UnknownKey(id.to_string()));
        }
        if st.visible.remove(id) {
            Ok(false)
        } else {
            st.visible.insert(id.clone());
            Ok(true)
        }
    }

    pub async fn copy_key(&self, text: &str) -> Result<(), DashboardError> {
        match self.0.clipboard.write_text(text).await {
            Ok(()) => {
                self.notify(NotificationKind::Success, "API key copied to clipboard!")
                    .await;
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to copy text: {}", e);
                self.notify(NotificationKind::Error, format!("Failed to copy API key: {}", e))
                    .await;
                Err(e.into())
            }
        }
    }

    /// Copy the full key of row `id`.
    pub async fn copy_key_by_id(&self, id: &KeyId) -> Result<(), DashboardError> {
        let key = self.0.state.read().await.find(id).map(|k| k.key.clone());
        match key {
            Some(key) => self.copy_key(&key).await,
            None => {
                let err = DashboardError::UnknownKey(id.to_string());
                self.notify(NotificationKind::Error, err.to_string()).await;
                Err(err)
            }
        }
    }

    // -- Notifications --

    /// Replace the notification slot and start its expiry timer.
    pub async fn notify(&self, kind: NotificationKind, message: impl Into<String>) -> u64 {
        let id = {
            let mut st = self.0.state.write().await;
            st.last_notification_id += 1;
            let id = st.last_notification_id;
            st.notification = Some(Notification {
                id,
                kind,
                message: message.into(),
            });
            id
        };

        let inner: Weak<Inner> = Arc::downgrade(&self.0);
        let ttl = self.0.settings.notification_ttl;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            if let Some(inner) = inner.upgrade() {
                Dashboard(inner).expire_notification(id).await;
            }
        });

        id
    }

    pub async fn dismiss_notification(&self) {
        self.0.state.write().await.notification = None;
    }

    async fn expire_notification(&self, id: u64) {
        let mut st = self.0.state.write().await;
        if st.notification.as_ref().is_some_and(|n| n.id == id) {
            st.notification = None;
        }
    }

    // -- Read side --

    pub async fn is_loading(&self) -> bool {
        self.0.state.read().await.loading
    }

    pub async fn keys(&self) -> Vec<ApiKeyRecord> {
        self.0.state.read().await.keys.clone()
    }

    pub async fn key(&self, id: &KeyId) -> Option<ApiKeyRecord> {
        self.0.state.read().await.find(id).cloned()
    }

    pub async fn editing(&self) -> Option<EditSession> {
        self.0.state.read().await.editing.clone()
    }

    pub async fn is_modal_open(&self) -> bool {
        self.0.state.read().await.modal_open
    }

    pub async fn create_draft(&self) -> String {
        self.0.state.read().await.create_draft.clone()
    }

    pub async fn is_visible(&self, id: &KeyId) -> bool {
        self.0.state.read().await.visible.contains(id)
    }

    pub async fn notification(&self) -> Option<Notification> {
        self.0.state.read().await.notification.clone()
    }

    /// The key as the table shows it right now.
    pub async fn displayed_key(&self, id: &KeyId) -> Option<String> {
        let st = self.0.state.read().await;
        let visible = st.visible.contains(id);
        st.find(id).map(|k| k.display_key(visible))
    }

    pub async fn snapshot(&self) -> DashboardView {
        let st = self.0.state.read().await;
        let settings = &self.0.settings;

        let keys = st
            .keys
            .iter()
            .map(|k| {
                let visible = st.visible.contains(&k.id);
                KeyRow {
                    id: k.id.clone(),
                    name: k.name.clone(),
                    display_key: k.display_key(visible),
                    visible,
                    usage: k.usage,
                    created_at: k.created_at,
                    editing: st.editing.as_ref().is_some_and(|e| e.id == k.id),
                }
            })
            .collect();

        DashboardView {
            loading: st.loading,
            keys,
            editing: st.editing.clone(),
            modal: ModalView {
                open: st.modal_open,
                name: st.create_draft.clone(),
            },
            notification: st.notification.clone(),
            usage: UsageSummary::from_keys(&settings.plan_name, settings.plan_limit, &st.keys),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::NoClipboard;
    use crate::keygen::is_well_formed;
    use crate::store::memory::MemoryKeyStore;
    use chrono::Utc;

    fn record(id: &str, name: &str) -> ApiKeyRecord {
        ApiKeyRecord {
            id: KeyId::new(id),
            name: name.to_string(),
            key: format!("ingest_{:0>32}", id),
            usage: 0,
            created_at: Utc::now(),
        }
    }

    async fn loaded(rows: Vec<ApiKeyRecord>) -> (Dashboard, MemoryKeyStore) {
        let store = MemoryKeyStore::with_rows(rows);
        let dash = Dashboard::new(
            Arc::new(store.clone()),
            Arc::new(NoClipboard),
            DashboardSettings::default(),
        );
        dash.load().await.unwrap();
        (dash, store)
    }

    #[tokio::test]
    async fn test_load_clears_loading_even_on_failure() {
        let store = MemoryKeyStore::new();
        store.set_failing(true);
        let dash = Dashboard::new(
            Arc::new(store),
            Arc::new(NoClipboard),
            DashboardSettings::default(),
        );
        assert!(dash.is_loading().await);
        assert!(dash.load().await.is_err());
        assert!(!dash.is_loading().await);
        assert!(dash.notification().await.unwrap().is_error());
    }

    #[tokio::test]
    async fn test_create_appends_well_formed_key() {
        let (dash, _) = loaded(vec![record("1", "first")]).await;
        dash.open_create_modal().await;
        dash.set_create_draft("  test-key ").await;

        let created = dash.submit_create().await.unwrap();
        let keys = dash.keys().await;
        assert_eq!(keys.len(), 2);
        let last = keys.last().unwrap();
        assert_eq!(last.name, "test-key");
        assert_eq!(last.usage, 0);
        assert_eq!(last.id, created.id);
        assert!(is_well_formed(&last.key, DEFAULT_KEY_PREFIX));

        assert!(!dash.is_modal_open().await);
        assert_eq!(dash.create_draft().await, "");
        assert_eq!(
            dash.notification().await.unwrap().kind,
            NotificationKind::Success
        );
    }

    #[tokio::test]
    async fn test_create_rejects_blank_names_without_store_call() {
        let (dash, store) = loaded(vec![]).await;
        let calls = store.calls();

        for name in ["", "   ", "\t\n"] {
            let err = dash.create_key(name).await.unwrap_err();
            assert!(matches!(err, DashboardError::Validation(ValidationError::EmptyName)));
        }
        assert_eq!(store.calls(), calls);
        assert!(dash.keys().await.is_empty());
        assert!(dash.notification().await.unwrap().is_error());
    }

    #[tokio::test]
    async fn test_create_failure_keeps_modal_and_draft() {
        let (dash, store) = loaded(vec![]).await;
        dash.open_create_modal().await;
        dash.set_create_draft("prod").await;
        store.set_failing(true);

        assert!(dash.submit_create().await.is_err());
        assert!(dash.keys().await.is_empty());
        assert!(dash.is_modal_open().await);
        assert_eq!(dash.create_draft().await, "prod");
        let note = dash.notification().await.unwrap();
        assert!(note.is_error());
        assert!(note.message.contains("store unavailable"));
    }

    #[tokio::test]
    async fn test_cancel_modal_keeps_draft() {
        let (dash, _) = loaded(vec![]).await;
        dash.open_create_modal().await;
        dash.set_create_draft("half-typed").await;
        dash.close_create_modal().await;
        assert!(!dash.is_modal_open().await);
        assert_eq!(dash.create_draft().await, "half-typed");
    }

    #[tokio::test]
    async fn test_rename_success_and_failure() {
        let (dash, store) = loaded(vec![record("K1", "old")]).await;
        let id = KeyId::new("K1");

        store.set_failing(true);
        dash.begin_edit(&id).await.unwrap();
        dash.set_edit_draft("new").await.unwrap();
        assert!(dash.save_edit().await.is_err());
        assert_eq!(dash.key(&id).await.unwrap().name, "old");
        assert_eq!(dash.editing().await.unwrap().draft, "new");
        assert!(dash.notification().await.unwrap().is_error());

        store.set_failing(false);
        dash.save_edit().await.unwrap();
        assert_eq!(dash.key(&id).await.unwrap().name, "new");
        assert!(dash.editing().await.is_none());
        assert_eq!(store.rows().await[0].name, "new");
    }

    #[tokio::test]
    async fn test_begin_edit_abandons_previous_row() {
        let (dash, store) = loaded(vec![record("a", "alpha"), record("b", "beta")]).await;
        dash.begin_edit(&KeyId::new("a")).await.unwrap();
        dash.set_edit_draft("unsaved").await.unwrap();
        dash.begin_edit(&KeyId::new("b")).await.unwrap();

        let editing = dash.editing().await.unwrap();
        assert_eq!(editing.id, KeyId::new("b"));
        assert_eq!(editing.draft, "beta");
        assert_eq!(dash.key(&KeyId::new("a")).await.unwrap().name, "alpha");
        assert_eq!(store.rows().await[0].name, "alpha");
    }

    #[tokio::test]
    async fn test_save_edit_without_session() {
        let (dash, _) = loaded(vec![]).await;
        assert!(matches!(dash.save_edit().await, Err(DashboardError::NotEditing)));
    }

    #[tokio::test]
    async fn test_delete_existing_and_missing() {
        let (dash, store) = loaded(vec![record("a", "alpha"), record("b", "beta")]).await;
        let a = KeyId::new("a");
        dash.toggle_visibility(&a).await.unwrap();

        assert_eq!(dash.delete_key(&a).await.unwrap(), DeleteOutcome::Deleted);
        assert!(dash.key(&a).await.is_none());
        assert!(!dash.is_visible(&a).await);
        assert_eq!(store.rows().await.len(), 1);

        let before = dash.keys().await;
        assert_eq!(
            dash.delete_key(&KeyId::new("ghost")).await.unwrap(),
            DeleteOutcome::NotFound
        );
        assert_eq!(dash.keys().await, before);
    }

    #[tokio::test]
    async fn test_delete_failure_keeps_keys() {
        let (dash, store) = loaded(vec![record("a", "alpha")]).await;
        store.set_failing(true);
        assert!(dash.delete_key(&KeyId::new("a")).await.is_err());
        assert_eq!(dash.keys().await.len(), 1);
        assert!(dash.notification().await.unwrap().is_error());
    }

    #[tokio::test]
    async fn test_toggle_visibility_is_local_and_reversible() {
        let (dash, store) = loaded(vec![record("a", "alpha")]).await;
        let id = KeyId::new("a");
        let full = dash.key(&id).await.unwrap().key;
        let calls = store.calls();

        assert_eq!(dash.displayed_key(&id).await.unwrap(), format!("{}...", &full[..12]));
        assert!(dash.toggle_visibility(&id).await.unwrap());
        assert_eq!(dash.displayed_key(&id).await.unwrap(), full);
        assert!(!dash.toggle_visibility(&id).await.unwrap());
        assert_eq!(dash.displayed_key(&id).await.unwrap(), format!("{}...", &full[..12]));

        assert_eq!(store.calls(), calls);
        assert!(matches!(
            dash.toggle_visibility(&KeyId::new("ghost")).await,
            Err(DashboardError::UnknownKey(_))
        ));
    }

    #[tokio::test]
    async fn test_copy_without_clipboard_reports_error() {
        let (dash, _) = loaded(vec![record("a", "alpha")]).await;
        assert!(dash.copy_key_by_id(&KeyId::new("a")).await.is_err());
        let note = dash.notification().await.unwrap();
        assert!(note.is_error());
        assert!(note.message.contains("not supported"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_notification_expires_after_ttl() {
        let (dash, _) = loaded(vec![]).await;
        dash.notify(NotificationKind::Success, "hello").await;

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(dash.notification().await.unwrap().message, "hello");

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(dash.notification().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_timer_does_not_clear_newer_notification() {
        let (dash, _) = loaded(vec![]).await;
        dash.notify(NotificationKind::Success, "first").await;

        tokio::time::sleep(Duration::from_secs(3)).await;
        let second = dash.notify(NotificationKind::Error, "second").await;

        // First timer fires at t=5 and must leave "second" alone.
        tokio::time::sleep(Duration::from_secs(3)).await;
        let note = dash.notification().await.unwrap();
        assert_eq!(note.id, second);
        assert_eq!(note.message, "second");

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(dash.notification().await.is_none());
    }

    #[tokio::test]
    async fn test_snapshot_masks_hidden_keys() {
        let (dash, _) = loaded(vec![record("a", "alpha"), record("b", "beta")]).await;
        dash.toggle_visibility(&KeyId::new("b")).await.unwrap();
        dash.begin_edit(&KeyId::new("a")).await.unwrap();

        let view = dash.snapshot().await;
        assert!(!view.loading);
        assert!(view.keys[0].display_key.ends_with("..."));
        assert!(view.keys[0].editing);
        assert!(!view.keys[1].display_key.ends_with("..."));
        assert!(view.keys[1].visible);
        assert_eq!(view.usage.plan, "Researcher");
        assert_eq!(view.usage.limit, 1000);
    }
}
