use crate::crypto::{Sensitive, TokenVault};
use crate::db::{DbPool, NewUser, UserRepo, UserRow};
use crate::error::AppResult;
use crate::github::GitHubUser;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Signed-in user with the access token already decrypted.
///
/// Lives for a single request; only [`UserProfile`] ever leaves the server.
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub github_id: i64,
    pub username: String,
    pub avatar_url: String,
    pub github_token: Sensitive,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub(crate) fn from_row(row: UserRow, vault: &TokenVault) -> AppResult<Self> {
        let github_token = vault.decrypt(&row.github_token)?;
        Ok(Self {
            id: row.id,
            github_id: row.github_id,
            username: row.username,
            avatar_url: row.avatar_url,
            github_token,
            created_at: row.created_at,
        })
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.clone(),
            username: self.username.clone(),
            avatar_url: self.avatar_url.clone(),
        }
    }
}

/// Client-facing view of a user
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub avatar_url: String,
}

/// User accounts keyed by GitHub id, with tokens sealed by the vault
#[derive(Clone)]
pub struct AccountService {
    pool: DbPool,
    vault: Arc<TokenVault>,
}

impl AccountService {
    pub fn new(pool: DbPool, vault: Arc<TokenVault>) -> Self {
        Self { pool, vault }
    }

    /// Record a GitHub sign-in, encrypting the fresh access token.
    pub async fn upsert_user(&self, profile: &GitHubUser, access_token: Sensitive) -> AppResult<User> {
        let envelope = self.vault.encrypt(access_token.expose())?;
        let row = UserRepo::upsert(
            &self.pool,
            NewUser {
                github_id: profile.id,
                username: profile.login.clone(),
                avatar_url: profile.avatar_url.clone(),
                github_token: envelope,
            },
        )
        .await?;

        info!("Upserted user {} (github id {})", row.username, row.github_id);
        Ok(User {
            id: row.id,
            github_id: row.github_id,
            username: row.username,
            avatar_url: row.avatar_url,
            github_token: access_token,
            created_at: row.created_at,
        })
    }

    pub async fn get_user_by_id(&self, id: &str) -> AppResult<Option<User>> {
        UserRepo::get_by_id(&self.pool, id)
            .await?
            .map(|row| User::from_row(row, &self.vault))
            .transpose()
    }
}
