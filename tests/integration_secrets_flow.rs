//! Secret writes through the real router against a mock GitHub API.
//!
//! The mock holds the private half of the repository key, so it can check
//! that what the dashboard sends actually opens to the submitted values.

use axum::{
    body::{to_bytes, Body},
    extract::{Path, State},
    http::{header, HeaderMap, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use crypto_box::{aead::OsRng, SecretKey};
use ghsecrets::config::AppConfig;
use ghsecrets::crypto::{Sensitive, TokenVault};
use ghsecrets::db;
use ghsecrets::github::GitHubUser;
use ghsecrets::web::{create_router, AppState};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower::ServiceExt;

const TOKEN: &str = "gh_abc123";

/// Secret as received (and opened) by the mock
#[derive(Debug, Clone)]
struct ReceivedSecret {
    repo: String,
    name: String,
    key_id: String,
    plaintext: String,
}

struct MockState {
    secret_key: SecretKey,
    key_fetches: Mutex<Vec<String>>,
    received: Mutex<Vec<ReceivedSecret>>,
    deleted: Mutex<Vec<String>>,
}

/// Mock GitHub REST API on a random local port
struct MockGitHub {
    state: Arc<MockState>,
    url: String,
    _task: tokio::task::JoinHandle<()>,
}

#[derive(Deserialize)]
struct PutBody {
    encrypted_value: String,
    key_id: String,
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", TOKEN))
        .unwrap_or(false)
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({"message": "Not Found"}))).into_response()
}

async fn mock_user(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({"id": 583231, "login": "octocat", "avatar_url": "https://avatars.example/1"}))
        .into_response()
}

async fn mock_public_key(
    State(state): State<Arc<MockState>>,
    Path((owner, repo)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if repo == "missing" {
        return not_found();
    }
    state.key_fetches.lock().await.push(format!("{}/{}", owner, repo));
    Json(json!({
        "key_id": format!("key-{}", repo),
        "key": BASE64.encode(state.secret_key.public_key().as_bytes()),
    }))
    .into_response()
}

async fn mock_put_secret(
    State(state): State<Arc<MockState>>,
    Path((_owner, repo, name)): Path<(String, String, String)>,
    headers: HeaderMap,
    Json(body): Json<PutBody>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if name == "REJECTED" {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"message": "Validation Failed"})),
        )
            .into_response();
    }

    let Ok(ciphertext) = BASE64.decode(&body.encrypted_value) else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    let Ok(opened) = state.secret_key.unseal(&ciphertext) else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    state.received.lock().await.push(ReceivedSecret {
        repo,
        name,
        key_id: body.key_id,
        plaintext: String::from_utf8(opened).unwrap_or_default(),
    });
    StatusCode::CREATED.into_response()
}

async fn mock_delete_secret(
    State(state): State<Arc<MockState>>,
    Path((_owner, repo, name)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    state.deleted.lock().await.push(format!("{}:{}", repo, name));
    StatusCode::NO_CONTENT.into_response()
}

async fn mock_list_secrets(Path((_owner, repo)): Path<(String, String)>) -> Response {
    if repo == "missing" {
        return not_found();
    }
    Json(json!({
        "total_count": 1,
        "secrets": [
            {"name": "API_KEY", "created_at": "2024-01-01T00:00:00Z", "updated_at": "2024-02-01T00:00:00Z"}
        ]
    }))
    .into_response()
}

impl MockGitHub {
    async fn start() -> Self {
        let state = Arc::new(MockState {
            secret_key: SecretKey::generate(&mut OsRng),
            key_fetches: Mutex::new(Vec::new()),
            received: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/user", get(mock_user))
            .route("/repos/{owner}/{repo}/actions/secrets", get(mock_list_secrets))
            .route(
                "/repos/{owner}/{repo}/actions/secrets/public-key",
                get(mock_public_key),
            )
            .route(
                "/repos/{owner}/{repo}/actions/secrets/{name}",
                axum::routing::put(mock_put_secret).delete(mock_delete_secret),
            )
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            state,
            url: format!("http://{}", addr),
            _task: task,
        }
    }
}

/// Dashboard state wired to the mock, plus a signed-in session id
async fn dashboard(github: &MockGitHub) -> (AppState, String) {
    let mut config = AppConfig::default();
    config.github.client_id = "Iv1.test-client".to_string();
    config.github.api_url = github.url.clone();

    let pool = db::connect("sqlite::memory:", 1).await.unwrap();
    db::init_db(&pool).await.unwrap();
    let state = AppState::new(&config, pool, Arc::new(TokenVault::new([7u8; 32]))).unwrap();

    let user = state
        .accounts
        .upsert_user(
            &GitHubUser {
                id: 583231,
                login: "octocat".to_string(),
                avatar_url: "https://avatars.example/1".to_string(),
            },
            Sensitive::new(TOKEN),
        )
        .await
        .unwrap();
    let session = state.sessions.create_session(&user.id).await.unwrap();
    (state, session.id)
}

async fn call(state: &AppState, session_id: &str, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, format!("session={}", session_id))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = create_router(state.clone(), None).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_put_secrets_are_sealed_for_the_repository() {
    let github = MockGitHub::start().await;
    let (state, session_id) = dashboard(&github).await;

    let (status, body) = call(
        &state,
        &session_id,
        "PUT",
        "/api/github/secrets",
        json!({
            "owner": "octocat",
            "repo": "hello",
            "secrets": [
                {"name": "API_KEY", "value": "sk-live-123"},
                {"name": "DB_PASSWORD", "value": "hunter2"}
            ]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["results"].as_array().unwrap().len(), 2);
    assert!(!body.to_string().contains("sk-live-123"));

    let received = github.state.received.lock().await.clone();
    assert_eq!(received.len(), 2);
    for secret in &received {
        assert_eq!(secret.repo, "hello");
        assert_eq!(secret.key_id, "key-hello");
        let expected = match secret.name.as_str() {
            "API_KEY" => "sk-live-123",
            "DB_PASSWORD" => "hunter2",
            other => panic!("unexpected secret {}", other),
        };
        assert_eq!(secret.plaintext, expected);
    }

    // One key fetch for the whole batch
    assert_eq!(*github.state.key_fetches.lock().await, vec!["octocat/hello"]);
}

#[tokio::test]
async fn test_partial_failure_reports_each_secret() {
    let github = MockGitHub::start().await;
    let (state, session_id) = dashboard(&github).await;

    let (status, body) = call(
        &state,
        &session_id,
        "PUT",
        "/api/github/secrets",
        json!({
            "owner": "octocat",
            "repo": "hello",
            "secrets": [
                {"name": "API_KEY", "value": "v1"},
                {"name": "REJECTED", "value": "v2"}
            ]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["ok"], false);
    let results = body["results"].as_array().unwrap();
    let ok = results.iter().find(|r| r["name"] == "API_KEY").unwrap();
    let failed = results.iter().find(|r| r["name"] == "REJECTED").unwrap();
    assert_eq!(ok["ok"], true);
    assert_eq!(failed["ok"], false);
    assert!(failed["error"].as_str().unwrap().contains("Validation Failed"));

    // The good secret still landed
    assert_eq!(github.state.received.lock().await.len(), 1);
}

#[tokio::test]
async fn test_copy_fetches_a_key_per_target() {
    let github = MockGitHub::start().await;
    let (state, session_id) = dashboard(&github).await;

    let (status, body) = call(
        &state,
        &session_id,
        "POST",
        "/api/github/secrets/copy",
        json!({
            "targets": [
                {"owner": "octocat", "repo": "alpha"},
                {"owner": "octocat", "repo": "beta"},
                {"owner": "octocat", "repo": "missing"}
            ],
            "secrets": [{"name": "SHARED_TOKEN", "value": "same-everywhere"}]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    let missing = results
        .iter()
        .find(|r| r["repository"] == "octocat/missing")
        .unwrap();
    assert_eq!(missing["ok"], false);

    let mut fetched = github.state.key_fetches.lock().await.clone();
    fetched.sort();
    assert_eq!(fetched, vec!["octocat/alpha", "octocat/beta"]);

    let received = github.state.received.lock().await.clone();
    assert_eq!(received.len(), 2);
    for secret in received {
        assert_eq!(secret.key_id, format!("key-{}", secret.repo));
        assert_eq!(secret.plaintext, "same-everywhere");
    }
}

#[tokio::test]
async fn test_delete_and_list() {
    let github = MockGitHub::start().await;
    let (state, session_id) = dashboard(&github).await;

    let (status, body) = call(
        &state,
        &session_id,
        "GET",
        "/api/github/secrets?owner=octocat&repo=hello",
        Value::Null,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_count"], 1);
    assert_eq!(body["secrets"][0]["name"], "API_KEY");

    let (status, body) = call(
        &state,
        &session_id,
        "DELETE",
        "/api/github/secrets",
        json!({"owner": "octocat", "repo": "hello", "names": ["API_KEY", "OLD_TOKEN"]}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);

    let mut deleted = github.state.deleted.lock().await.clone();
    deleted.sort();
    assert_eq!(deleted, vec!["hello:API_KEY", "hello:OLD_TOKEN"]);
}

#[tokio::test]
async fn test_github_not_found_passes_through() {
    let github = MockGitHub::start().await;
    let (state, session_id) = dashboard(&github).await;

    let (status, body) = call(
        &state,
        &session_id,
        "GET",
        "/api/github/secrets?owner=octocat&repo=missing",
        Value::Null,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("Not Found"));
}

#[tokio::test]
async fn test_current_user_uses_bearer_token() {
    let github = MockGitHub::start().await;
    let client = ghsecrets::github::GitHubClient::new(&ghsecrets::config::GitHubConfig {
        api_url: github.url.clone(),
        ..Default::default()
    })
    .unwrap();

    let user = client.current_user(&Sensitive::new(TOKEN)).await.unwrap();
    assert_eq!(user.login, "octocat");

    let rejected = client.current_user(&Sensitive::new("wrong")).await;
    assert!(rejected.is_err());
}
