//! Login sessions.
//!
//! Sessions carry a fixed 7-day expiry set at creation and are never renewed.
//! Expired sessions are deleted the first time they are presented; an
//! optional background sweep removes the ones nobody presents again.

use crate::auth::accounts::User;
use crate::crypto::TokenVault;
use crate::db::{DbPool, Session, SessionRepo};
use crate::error::AppResult;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// A live session together with its user
#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
    pub user: User,
    pub session: Session,
}

/// Creates, validates and destroys login sessions
#[derive(Clone)]
pub struct SessionManager {
    pool: DbPool,
    vault: Arc<TokenVault>,
}

impl SessionManager {
    pub fn new(pool: DbPool, vault: Arc<TokenVault>) -> Self {
        Self { pool, vault }
    }

    pub async fn create_session(&self, user_id: &str) -> AppResult<Session> {
        let session = Session::issue(user_id, Utc::now());
        SessionRepo::insert(&self.pool, &session).await?;
        debug!("Created session {}… for user {}", session.log_prefix(), user_id);
        Ok(session)
    }

    /// Resolve a session id to its user, or `None` if unknown or expired.
    pub async fn validate_session(&self, session_id: &str) -> AppResult<Option<AuthenticatedSession>> {
        self.validate_session_at(session_id, Utc::now()).await
    }

    pub(crate) async fn validate_session_at(
        &self,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<AuthenticatedSession>> {
        if session_id.is_empty() {
            return Ok(None);
        }

        let Some(row) = SessionRepo::get_with_user(&self.pool, session_id).await? else {
            return Ok(None);
        };

        let (session, user_row) = row.into_parts();
        if session.is_expired_at(now) {
            SessionRepo::delete(&self.pool, &session.id).await?;
            debug!("Session {}… expired, removed", session.log_prefix());
            return Ok(None);
        }

        let user = User::from_row(user_row, &self.vault)?;
        Ok(Some(AuthenticatedSession { user, session }))
    }

    /// Remove a session; unknown ids are ignored.
    pub async fn destroy_session(&self, session_id: &str) -> AppResult<()> {
        SessionRepo::delete(&self.pool, session_id).await
    }

    /// Delete every session that has already expired.
    pub async fn sweep_expired(&self) -> AppResult<u64> {
        SessionRepo::delete_expired(&self.pool, Utc::now()).await
    }

    /// Run [`Self::sweep_expired`] on a fixed interval until the runtime stops.
    pub fn spawn_sweeper(self, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                match self.sweep_expired().await {
                    Ok(0) => {}
                    Ok(removed) => info!("Swept {} expired sessions", removed),
                    Err(e) => warn!("Session sweep failed: {}", e),
                }
            }
        })
    }
}
