use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use sqlx::FromRow;
use uuid::Uuid;

/// Fixed session lifetime; there is no sliding renewal.
pub const SESSION_DURATION_DAYS: i64 = 7;

/// Random bytes per session id (256 bits).
const SESSION_ID_BYTES: usize = 32;

/// Persisted user. `github_token` holds the vault envelope, never plaintext.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: String,
    pub github_id: i64,
    pub username: String,
    pub avatar_url: String,
    pub github_token: String,
    pub created_at: DateTime<Utc>,
}

/// Login session
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Build a fresh session for a user, expiring after the fixed lifetime.
    pub fn issue(user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: Self::generate_id(),
            user_id: user_id.to_string(),
            expires_at: now + Duration::days(SESSION_DURATION_DAYS),
            created_at: now,
        }
    }

    /// Opaque, hex-encoded session id from the OS CSPRNG.
    pub fn generate_id() -> String {
        let mut bytes = [0u8; SESSION_ID_BYTES];
        OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Short id prefix that is safe to put in logs
    pub fn log_prefix(&self) -> &str {
        &self.id[..8.min(self.id.len())]
    }
}

/// Session joined with its owning user, as read during validation
#[derive(Debug, Clone, FromRow)]
pub struct SessionUserRow {
    pub session_id: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
    pub session_created_at: DateTime<Utc>,
    pub github_id: i64,
    pub username: String,
    pub avatar_url: String,
    pub github_token: String,
    pub user_created_at: DateTime<Utc>,
}

impl SessionUserRow {
    pub fn into_parts(self) -> (Session, UserRow) {
        let session = Session {
            id: self.session_id,
            user_id: self.user_id.clone(),
            expires_at: self.expires_at,
            created_at: self.session_created_at,
        };
        let user = UserRow {
            id: self.user_id,
            github_id: self.github_id,
            username: self.username,
            avatar_url: self.avatar_url,
            github_token: self.github_token,
            created_at: self.user_created_at,
        };
        (session, user)
    }
}

/// User upsert keyed by GitHub id
#[derive(Debug, Clone)]
pub struct NewUser {
    pub github_id: i64,
    pub username: String,
    pub avatar_url: String,
    /// Vault envelope of the access token
    pub github_token: String,
}

impl NewUser {
    pub fn generate_user_id() -> String {
        Uuid::new_v4().to_string()
    }
}
