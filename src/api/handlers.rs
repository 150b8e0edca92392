use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use crate::dashboard::view::DashboardView;
use crate::errors::{AppError, DashboardError};
use crate::models::api_key::KeyId;
use super::AppState;

// ── Request DTOs ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct NameRequest {
    pub name: String,
}

#[derive(Deserialize)]
pub struct DraftRequest {
    pub draft: String,
}

type ViewResult = Result<Json<DashboardView>, AppError>;

/// Operation failures are already in the view's notification; only a
/// missing row becomes an HTTP error.
fn check(result: Result<impl Sized, DashboardError>) -> Result<(), AppError> {
    match result {
        Err(DashboardError::UnknownKey(_)) => Err(AppError::KeyNotFound),
        _ => Ok(()),
    }
}

async fn view(state: &AppState) -> ViewResult {
    Ok(Json(state.dashboard.snapshot().await))
}

/// GET /api/v1/state
pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<DashboardView> {
    Json(state.dashboard.snapshot().await)
}

/// POST /api/v1/keys — create from the modal's name field
pub async fn create_key(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NameRequest>,
) -> ViewResult {
    state.dashboard.set_create_draft(payload.name).await;
    let _ = state.dashboard.submit_create().await;
    view(&state).await
}

/// PUT /api/v1/keys/:id — rename
pub async fn rename_key(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<NameRequest>,
) -> ViewResult {
    let id = KeyId::from(id);
    if state.dashboard.key(&id).await.is_none() {
        return Err(AppError::KeyNotFound);
    }

    let editing_this = state
        .dashboard
        .editing()
        .await
        .is_some_and(|e| e.id == id);
    if editing_this {
        // Keep the typed draft in the session so a failed save can be retried.
        check(state.dashboard.set_edit_draft(payload.name).await)?;
        let _ = state.dashboard.save_edit().await;
    } else {
        let _ = state.dashboard.rename_key(&id, &payload.name).await;
    }
    view(&state).await
}

/// DELETE /api/v1/keys/:id
pub async fn delete_key(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ViewResult {
    let _ = state.dashboard.delete_key(&KeyId::from(id)).await;
    view(&state).await
}

/// POST /api/v1/keys/:id/visibility — show/hide the full key
pub async fn toggle_visibility(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ViewResult {
    check(state.dashboard.toggle_visibility(&KeyId::from(id)).await)?;
    view(&state).await
}

/// POST /api/v1/keys/:id/copy — copy the full key to the host clipboard
pub async fn copy_key(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ViewResult {
    check(state.dashboard.copy_key_by_id(&KeyId::from(id)).await)?;
    view(&state).await
}

/// POST /api/v1/keys/:id/edit — enter rename mode
pub async fn begin_edit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ViewResult {
    check(state.dashboard.begin_edit(&KeyId::from(id)).await)?;
    view(&state).await
}

/// PUT /api/v1/edit — keep the typed rename draft in the session
pub async fn set_edit_draft(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<DraftRequest>,
) -> ViewResult {
    match state.dashboard.set_edit_draft(payload.draft).await {
        Err(DashboardError::NotEditing) => {
            Err(AppError::BadRequest("no key is being renamed".into()))
        }
        _ => view(&state).await,
    }
}

/// DELETE /api/v1/edit — leave rename mode without saving
pub async fn cancel_edit(State(state): State<Arc<AppState>>) -> ViewResult {
    state.dashboard.cancel_edit().await;
    view(&state).await
}

/// POST /api/v1/modal
pub async fn open_modal(State(state): State<Arc<AppState>>) -> ViewResult {
    state.dashboard.open_create_modal().await;
    view(&state).await
}

/// PUT /api/v1/modal — keep the typed name while the modal is open or closed
pub async fn set_create_draft(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NameRequest>,
) -> ViewResult {
    state.dashboard.set_create_draft(payload.name).await;
    view(&state).await
}

/// DELETE /api/v1/modal
pub async fn close_modal(State(state): State<Arc<AppState>>) -> ViewResult {
    state.dashboard.close_create_modal().await;
    view(&state).await
}

/// DELETE /api/v1/notification
pub async fn dismiss_notification(State(state): State<Arc<AppState>>) -> ViewResult {
    state.dashboard.dismiss_notification().await;
    view(&state).await
}
