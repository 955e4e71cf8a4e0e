use crate::config::GitHubConfig;
use crate::crypto::{RepoPublicKey, SealedSecret, Sensitive};
use crate::error::{AppError, AppResult};
use crate::github::types::*;
use reqwest::{header, Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

const API_VERSION: &str = "2022-11-28";
const MEDIA_TYPE: &str = "application/vnd.github+json";
const PER_PAGE: &str = "30";

/// Thin client for the GitHub REST endpoints the dashboard needs.
///
/// Every call takes the caller's decrypted token; the client itself holds no
/// credentials. Failures are returned as-is, without retries.
pub struct GitHubClient {
    http: Client,
    base_url: Url,
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl GitHubClient {
    pub fn new(config: &GitHubConfig) -> AppResult<Self> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let base_url = Url::parse(&config.api_url).map_err(|e| {
            AppError::Configuration(format!("invalid github.api_url {:?}: {}", config.api_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Configuration(format!(
                "github.api_url {:?} is not a base URL",
                config.api_url
            )));
        }

        Ok(Self { http, base_url })
    }

    /// Build an API URL from path segments, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::internal("GitHub base URL cannot hold a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, token: &Sensitive, request: RequestBuilder) -> AppResult<Response> {
        let response = request
            .bearer_auth(token.expose())
            .header(header::ACCEPT, MEDIA_TYPE)
            .header("X-GitHub-Api-Version", API_VERSION)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .map(|e| e.message)
            .unwrap_or(body);
        warn!("GitHub API returned {}: {}", status.as_u16(), message);
        Err(AppError::GitHub {
            status: status.as_u16(),
            message,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        token: &Sensitive,
        request: RequestBuilder,
    ) -> AppResult<T> {
        Ok(self.send(token, request).await?.json().await?)
    }

    /// `GET /user`
    pub async fn current_user(&self, token: &Sensitive) -> AppResult<GitHubUser> {
        let url = self.endpoint(&["user"])?;
        self.get_json(token, self.http.get(url)).await
    }

    /// `GET /user/repos`, most recently updated first
    pub async fn list_repos(&self, token: &Sensitive, page: u32) -> AppResult<Vec<GitHubRepo>> {
        let url = self.endpoint(&["user", "repos"])?;
        let page = page.max(1).to_string();
        debug!("Listing repositories page {}", page);
        let request = self.http.get(url).query(&[
            ("sort", "updated"),
            ("per_page", PER_PAGE),
            ("page", page.as_str()),
            ("affiliation", "owner,collaborator,organization_member"),
        ]);
        self.get_json(token, request).await
    }

    /// Search repositories by name within the user's namespace
    pub async fn search_repos(
        &self,
        token: &Sensitive,
        login: &str,
        query: &str,
    ) -> AppResult<Vec<GitHubRepo>> {
        let url = self.endpoint(&["search", "repositories"])?;
        let q = format!("{} in:name user:{}", query.trim(), login);
        let request = self
            .http
            .get(url)
            .query(&[("q", q.as_str()), ("per_page", PER_PAGE)]);
        let response: RepoSearchResponse = self.get_json(token, request).await?;
        Ok(response.items)
    }

    /// `GET /repos/{owner}/{repo}/actions/secrets`
    pub async fn list_repo_secrets(
        &self,
        token: &Sensitive,
        owner: &str,
        repo: &str,
    ) -> AppResult<SecretList> {
        let url = self.endpoint(&["repos", owner, repo, "actions", "secrets"])?;
        self.get_json(token, self.http.get(url)).await
    }

    /// `GET /repos/{owner}/{repo}/actions/secrets/public-key`
    ///
    /// Always fetched fresh: keys rotate and must never be shared across repos.
    pub async fn repo_public_key(
        &self,
        token: &Sensitive,
        owner: &str,
        repo: &str,
    ) -> AppResult<RepoPublicKey> {
        let url = self.endpoint(&["repos", owner, repo, "actions", "secrets", "public-key"])?;
        self.get_json(token, self.http.get(url)).await
    }

    /// `PUT /repos/{owner}/{repo}/actions/secrets/{name}`
    pub async fn put_secret(
        &self,
        token: &Sensitive,
        owner: &str,
        repo: &str,
        secret: &SealedSecret,
    ) -> AppResult<()> {
        let url = self.endpoint(&["repos", owner, repo, "actions", "secrets", &secret.name])?;
        let body = PutSecretBody {
            encrypted_value: &secret.encrypted_value,
            key_id: &secret.key_id,
        };
        self.send(token, self.http.put(url).json(&body)).await?;
        debug!("Wrote secret {} to {}/{}", secret.name, owner, repo);
        Ok(())
    }

    /// `DELETE /repos/{owner}/{repo}/actions/secrets/{name}`
    pub async fn delete_secret(
        &self,
        token: &Sensitive,
        owner: &str,
        repo: &str,
        name: &str,
    ) -> AppResult<()> {
        let url = self.endpoint(&["repos", owner, repo, "actions", "secrets", name])?;
        self.send(token, self.http.delete(url)).await?;
        debug!("Deleted secret {} from {}/{}", name, owner, repo);
        Ok(())
    }
}
