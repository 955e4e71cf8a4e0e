//! Repository browsing and Actions secret management.
//!
//! Writes are bulk operations: every item is attempted, each gets its own
//! result, and the response status is 200 only if all of them succeeded.

use crate::crypto::{RepoPublicKey, Sensitive};
use crate::error::{AppError, AppResult};
use crate::github::{GitHubClient, GitHubRepo, SecretList};
use crate::web::extract::CurrentUser;
use crate::web::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{info, warn};

/// Names GitHub reserves for itself
const RESERVED_PREFIX: &str = "GITHUB_";

// --- Request / response types ---

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "first_page")]
    pub page: u32,
}

fn first_page() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct ReposResponse {
    pub repos: Vec<GitHubRepo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepoRef {
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub repo: String,
}

/// Plaintext secret as submitted by the dashboard
#[derive(Debug, Deserialize)]
pub struct SecretInput {
    pub name: String,
    pub value: Sensitive,
}

#[derive(Debug, Deserialize)]
pub struct PutSecretsRequest {
    #[serde(flatten)]
    pub target: RepoRef,
    #[serde(default)]
    pub secrets: Vec<SecretInput>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteSecretsRequest {
    #[serde(flatten)]
    pub target: RepoRef,
    #[serde(default)]
    pub names: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CopySecretsRequest {
    #[serde(default)]
    pub targets: Vec<RepoRef>,
    #[serde(default)]
    pub secrets: Vec<SecretInput>,
}

/// Outcome for one secret in one repository
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SecretResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    pub name: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SecretResult {
    fn from_outcome(name: &str, outcome: AppResult<()>) -> Self {
        match outcome {
            Ok(()) => Self {
                repository: None,
                name: name.to_string(),
                ok: true,
                error: None,
            },
            Err(e) => Self::failed(name, e.to_string()),
        }
    }

    fn failed(name: &str, message: String) -> Self {
        Self {
            repository: None,
            name: name.to_string(),
            ok: false,
            error: Some(message),
        }
    }

    fn in_repo(mut self, target: &RepoRef) -> Self {
        self.repository = Some(format!("{}/{}", target.owner, target.repo));
        self
    }
}

#[derive(Debug, Serialize)]
pub struct BulkResponse {
    pub ok: bool,
    pub results: Vec<SecretResult>,
}

impl BulkResponse {
    fn into_reply(self) -> (StatusCode, Json<BulkResponse>) {
        let status = if self.ok {
            StatusCode::OK
        } else {
            StatusCode::BAD_GATEWAY
        };
        (status, Json(self))
    }
}

fn bulk(results: Vec<SecretResult>) -> (StatusCode, Json<BulkResponse>) {
    let ok = results.iter().all(|r| r.ok);
    BulkResponse { ok, results }.into_reply()
}

// --- Validation ---

/// Owner and repository names as GitHub allows them
fn validate_repo_ref(target: &RepoRef) -> AppResult<()> {
    fn valid_segment(s: &str) -> bool {
        !s.is_empty()
            && s != "."
            && s != ".."
            && s.chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    }

    if target.owner.is_empty() || target.repo.is_empty() {
        return Err(AppError::bad_request("owner and repo are required"));
    }
    if !valid_segment(&target.owner) || !valid_segment(&target.repo) {
        return Err(AppError::bad_request(format!(
            "invalid repository {}/{}",
            target.owner, target.repo
        )));
    }
    Ok(())
}

/// `^[A-Z_][A-Z0-9_]*$`, not starting with `GITHUB_`
fn validate_secret_name(name: &str) -> AppResult<()> {
    let mut chars = name.chars();
    let well_formed = match chars.next() {
        Some(first) => {
            (first.is_ascii_uppercase() || first == '_')
                && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
        }
        None => false,
    };

    if !well_formed {
        return Err(AppError::bad_request(format!(
            "invalid secret name {:?}: use A-Z, 0-9 and _, not starting with a digit",
            name
        )));
    }
    if name.starts_with(RESERVED_PREFIX) {
        return Err(AppError::bad_request(format!(
            "invalid secret name {:?}: the GITHUB_ prefix is reserved",
            name
        )));
    }
    Ok(())
}

fn validate_secrets(secrets: &[SecretInput]) -> AppResult<()> {
    if secrets.is_empty() {
        return Err(AppError::bad_request("at least one secret is required"));
    }
    let mut seen = HashSet::with_capacity(secrets.len());
    for secret in secrets {
        validate_secret_name(&secret.name)?;
        if secret.value.is_empty() {
            return Err(AppError::bad_request(format!(
                "secret {} has an empty value",
                secret.name
            )));
        }
        // Concurrent writes to one name would race
        if !seen.insert(secret.name.as_str()) {
            return Err(AppError::bad_request(format!(
                "secret {} appears more than once",
                secret.name
            )));
        }
    }
    Ok(())
}

// --- Handlers ---

/// Repositories the user can manage, most recently updated first
pub async fn list_repos(
    CurrentUser(auth): CurrentUser,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<ReposResponse>> {
    let repos = state.github.list_repos(&auth.user.github_token, query.page).await?;
    Ok(Json(ReposResponse { repos }))
}

pub async fn search_repos(
    CurrentUser(auth): CurrentUser,
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<ReposResponse>> {
    let q = query.q.trim();
    if q.is_empty() {
        return Ok(Json(ReposResponse { repos: Vec::new() }));
    }

    let repos = state
        .github
        .search_repos(&auth.user.github_token, &auth.user.username, q)
        .await?;
    Ok(Json(ReposResponse { repos }))
}

/// Secret names and timestamps for one repository
pub async fn list_secrets(
    CurrentUser(auth): CurrentUser,
    State(state): State<AppState>,
    Query(target): Query<RepoRef>,
) -> AppResult<Json<SecretList>> {
    validate_repo_ref(&target)?;
    let secrets = state
        .github
        .list_repo_secrets(&auth.user.github_token, &target.owner, &target.repo)
        .await?;
    Ok(Json(secrets))
}

/// Create or update secrets in one repository
pub async fn put_secrets(
    CurrentUser(auth): CurrentUser,
    State(state): State<AppState>,
    Json(request): Json<PutSecretsRequest>,
) -> AppResult<(StatusCode, Json<BulkResponse>)> {
    validate_repo_ref(&request.target)?;
    validate_secrets(&request.secrets)?;

    let token = &auth.user.github_token;
    let target = &request.target;
    let key = state
        .github
        .repo_public_key(token, &target.owner, &target.repo)
        .await?;

    let results = write_secrets(&state.github, token, target, &key, &request.secrets).await;
    info!(
        "{} wrote {} secrets to {}/{}",
        auth.user.username,
        results.iter().filter(|r| r.ok).count(),
        target.owner,
        target.repo
    );
    Ok(bulk(results))
}

/// Delete secrets from one repository
pub async fn delete_secrets(
    CurrentUser(auth): CurrentUser,
    State(state): State<AppState>,
    Json(request): Json<DeleteSecretsRequest>,
) -> AppResult<(StatusCode, Json<BulkResponse>)> {
    validate_repo_ref(&request.target)?;
    if request.names.is_empty() {
        return Err(AppError::bad_request("at least one secret name is required"));
    }
    for name in &request.names {
        validate_secret_name(name)?;
    }

    let github = &state.github;
    let token = &auth.user.github_token;
    let target = &request.target;
    let results = join_all(request.names.iter().map(|name| async move {
        let outcome = github
            .delete_secret(token, &target.owner, &target.repo, name)
            .await;
        SecretResult::from_outcome(name, outcome)
    }))
    .await;

    info!(
        "{} deleted {} secrets from {}/{}",
        auth.user.username,
        results.iter().filter(|r| r.ok).count(),
        target.owner,
        target.repo
    );
    Ok(bulk(results))
}

/// Write the same secrets into several repositories, each under its own key
pub async fn copy_secrets(
    CurrentUser(auth): CurrentUser,
    State(state): State<AppState>,
    Json(request): Json<CopySecretsRequest>,
) -> AppResult<(StatusCode, Json<BulkResponse>)> {
    if request.targets.is_empty() {
        return Err(AppError::bad_request("at least one target repository is required"));
    }
    for target in &request.targets {
        validate_repo_ref(target)?;
    }
    validate_secrets(&request.secrets)?;

    let token = &auth.user.github_token;
    let github = &state.github;
    let secrets = &request.secrets;
    let per_target = join_all(request.targets.iter().map(|target| async move {
        let results = match github.repo_public_key(token, &target.owner, &target.repo).await {
            Ok(key) => write_secrets(github, token, target, &key, secrets).await,
            Err(e) => {
                warn!("No public key for {}/{}: {}", target.owner, target.repo, e);
                let message = e.to_string();
                secrets
                    .iter()
                    .map(|s| SecretResult::failed(&s.name, message.clone()))
                    .collect()
            }
        };
        results
            .into_iter()
            .map(|r| r.in_repo(target))
            .collect::<Vec<_>>()
    }))
    .await;

    let results: Vec<SecretResult> = per_target.into_iter().flatten().collect();
    info!(
        "{} copied {} secrets into {} repositories",
        auth.user.username,
        secrets.len(),
        request.targets.len()
    );
    Ok(bulk(results))
}

/// Seal and write each secret concurrently under one repository key
async fn write_secrets(
    github: &GitHubClient,
    token: &Sensitive,
    target: &RepoRef,
    key: &RepoPublicKey,
    secrets: &[SecretInput],
) -> Vec<SecretResult> {
    join_all(secrets.iter().map(|secret| async move {
        let outcome = write_secret(github, token, target, key, secret).await;
        SecretResult::from_outcome(&secret.name, outcome)
    }))
    .await
}

async fn write_secret(
    github: &GitHubClient,
    token: &Sensitive,
    target: &RepoRef,
    key: &RepoPublicKey,
    secret: &SecretInput,
) -> AppResult<()> {
    let sealed = key.seal_secret(&secret.name, &secret.value)?;
    github
        .put_secret(token, &target.owner, &target.repo, &sealed)
        .await
}
