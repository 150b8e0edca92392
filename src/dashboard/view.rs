//! Serializable read model handed to the page and the CLI.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::notification::Notification;
use super::EditSession;
use crate::models::api_key::KeyId;
use crate::models::usage::UsageSummary;

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub loading: bool,
    pub keys: Vec<KeyRow>,
    pub editing: Option<EditSession>,
    pub modal: ModalView,
    pub notification: Option<Notification>,
    pub usage: UsageSummary,
}

/// One table row. `display_key` is masked unless `visible` is set.
#[derive(Debug, Clone, Serialize)]
pub struct KeyRow {
    pub id: KeyId,
    pub name: String,
    pub display_key: String,
    pub visible: bool,
    pub usage: u64,
    pub created_at: DateTime<Utc>,
    pub editing: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModalView {
    pub open: bool,
    pub name: String,
}
