use crate::auth::{AccountService, GitHubOAuth, SessionManager};
use crate::config::AppConfig;
use crate::crypto::TokenVault;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::github::GitHubClient;
use std::sync::Arc;

/// Shared state for web handlers
#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountService,
    pub sessions: SessionManager,
    pub oauth: Arc<GitHubOAuth>,
    pub github: Arc<GitHubClient>,
    pub secure_cookies: bool,
}

impl AppState {
    pub fn new(config: &AppConfig, pool: DbPool, vault: Arc<TokenVault>) -> AppResult<Self> {
        Ok(Self {
            accounts: AccountService::new(pool.clone(), vault.clone()),
            sessions: SessionManager::new(pool, vault),
            oauth: Arc::new(GitHubOAuth::new(&config.github, &config.web)?),
            github: Arc::new(GitHubClient::new(&config.github)?),
            secure_cookies: config.web.secure_cookies,
        })
    }
}
