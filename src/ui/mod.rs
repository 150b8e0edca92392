//! The dashboard page. A single static document; it renders the JSON view
//! from `/api/v1/state` and calls the operation endpoints.

use axum::response::Html;

pub const DASHBOARD_HTML: &str = include_str!("dashboard.html");

/// GET /
pub async fn index() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}
