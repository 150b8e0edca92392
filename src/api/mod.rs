use std::sync::Arc;

use axum::{
    http::{HeaderName, HeaderValue, Method, StatusCode},
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::dashboard::Dashboard;
use crate::ui;

pub mod handlers;

/// Shared application state passed to handlers.
pub struct AppState {
    pub dashboard: Dashboard,
}

/// Full application router: page, health probe and the JSON API.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(ui::index))
        .route("/healthz", get(|| async { "ok" }))
        .nest("/api/v1", api_router())
        .fallback(fallback_404)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .layer(axum::middleware::from_fn(security_headers_middleware))
}

/// Dashboard API. Every operation responds with the updated view.
/// All routes are relative — the caller mounts this under `/api/v1`.
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/state", get(handlers::get_state))
        .route("/keys", post(handlers::create_key))
        .route(
            "/keys/:id",
            put(handlers::rename_key).delete(handlers::delete_key),
        )
        .route("/keys/:id/visibility", post(handlers::toggle_visibility))
        .route("/keys/:id/copy", post(handlers::copy_key))
        .route("/keys/:id/edit", post(handlers::begin_edit))
        .route(
            "/edit",
            put(handlers::set_edit_draft).delete(handlers::cancel_edit),
        )
        .route(
            "/modal",
            post(handlers::open_modal)
                .put(handlers::set_create_draft)
                .delete(handlers::close_modal),
        )
        .route("/notification", delete(handlers::dismiss_notification))
}

async fn fallback_404() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// The dashboard is served for local use; only loopback origins may call it.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(|origin: &HeaderValue, _| {
            let origin_str = origin.to_str().unwrap_or("");
            origin_str.starts_with("http://localhost:") || origin_str.starts_with("http://127.0.0.1:")
        }))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([HeaderName::from_static("content-type")])
}

/// Middleware: security headers on every response. Full keys travel in API
/// responses once revealed, so nothing may be cached.
async fn security_headers_middleware(
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let mut resp = next.run(req).await;
    let headers = resp.headers_mut();

    headers.insert("X-Content-Type-Options", HeaderValue::from_static("nosniff"));
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert("Cache-Control", HeaderValue::from_static("no-store"));
    headers.insert("Referrer-Policy", HeaderValue::from_static("no-referrer"));

    resp
}
