use crate::web::{auth_routes, secrets_routes, AppState};
use axum::{
    body::Body,
    http::Request,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::Span;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Request span with the path only; the OAuth callback query carries the code
fn request_span<B>(request: &Request<B>) -> Span {
    tracing::debug_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
    )
}

/// Create the web router
pub fn create_router(state: AppState, static_dir: Option<&str>) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .route("/api/auth/github", get(auth_routes::github_login))
        .route("/api/auth/github/callback", get(auth_routes::github_callback))
        .route("/api/auth/logout", post(auth_routes::logout))
        .route("/api/auth/me", get(auth_routes::me))
        .route("/api/github/repos", get(secrets_routes::list_repos))
        .route("/api/github/repos/search", get(secrets_routes::search_repos))
        .route(
            "/api/github/secrets",
            get(secrets_routes::list_secrets)
                .put(secrets_routes::put_secrets)
                .delete(secrets_routes::delete_secrets),
        )
        .route("/api/github/secrets/copy", post(secrets_routes::copy_secrets))
        .with_state(state);

    // The dashboard frontend, when it is served from the same origin
    let router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };

    router.layer(TraceLayer::new_for_http().make_span_with(request_span::<Body>))
}
