use crate::db::models::*;
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};
use tracing::info;

pub type DbPool = Pool<Sqlite>;

/// Open a connection pool.
pub async fn connect(url: &str, max_connections: u32) -> AppResult<DbPool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(url)
        .await?;
    Ok(pool)
}

/// Database operations for users
pub struct UserRepo;

impl UserRepo {
    /// Get user by internal id
    pub async fn get_by_id(pool: &DbPool, id: &str) -> AppResult<Option<UserRow>> {
        let user = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    /// Get user by GitHub account id
    pub async fn get_by_github_id(pool: &DbPool, github_id: i64) -> AppResult<Option<UserRow>> {
        let user = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE github_id = ?")
            .bind(github_id)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    /// Create or update a user keyed by GitHub id.
    ///
    /// Existing rows keep their `id` and `created_at`; profile fields and the
    /// token envelope are replaced.
    pub async fn upsert(pool: &DbPool, new_user: NewUser) -> AppResult<UserRow> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO users (id, github_id, username, avatar_url, github_token, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(github_id) DO UPDATE SET
                username = excluded.username,
                avatar_url = excluded.avatar_url,
                github_token = excluded.github_token
            "#,
        )
        .bind(NewUser::generate_user_id())
        .bind(new_user.github_id)
        .bind(&new_user.username)
        .bind(&new_user.avatar_url)
        .bind(&new_user.github_token)
        .bind(now)
        .execute(pool)
        .await?;

        Self::get_by_github_id(pool, new_user.github_id)
            .await?
            .ok_or_else(|| AppError::internal("Failed to retrieve upserted user"))
    }
}

/// Database operations for login sessions
pub struct SessionRepo;

impl SessionRepo {
    /// Persist a session record
    pub async fn insert(pool: &DbPool, session: &Session) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (id, user_id, expires_at, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&session.id)
        .bind(&session.user_id)
        .bind(session.expires_at)
        .bind(session.created_at)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Get a session with its user, regardless of expiry
    pub async fn get_with_user(
        pool: &DbPool,
        session_id: &str,
    ) -> AppResult<Option<SessionUserRow>> {
        let row = sqlx::query_as::<_, SessionUserRow>(
            r#"
            SELECT s.id AS session_id, s.user_id, s.expires_at, s.created_at AS session_created_at,
                   u.github_id, u.username, u.avatar_url, u.github_token, u.created_at AS user_created_at
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.id = ?
            "#,
        )
        .bind(session_id)
        .fetch_optional(pool)
        .await?;

        Ok(row)
    }

    /// Delete session; deleting a missing session is not an error
    pub async fn delete(pool: &DbPool, session_id: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(session_id)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Delete sessions that expired before `now`
    pub async fn delete_expired(pool: &DbPool, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at < ?")
            .bind(now)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
pub async fn setup_test_db() -> DbPool {
    let pool = connect("sqlite::memory:", 1)
        .await
        .expect("Failed to create in-memory database");
    init_db(&pool).await.expect("Failed to init database");
    pool
}

/// Initialize database with migrations
pub async fn init_db(pool: &DbPool) -> AppResult<()> {
    info!("Running database migrations");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY NOT NULL,
            github_id INTEGER UNIQUE NOT NULL,
            username TEXT NOT NULL,
            avatar_url TEXT NOT NULL,
            github_token TEXT NOT NULL,
            created_at DATETIME NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            id TEXT PRIMARY KEY NOT NULL,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            expires_at DATETIME NOT NULL,
            created_at DATETIME NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at)")
        .execute(pool)
        .await?;

    info!("Database migrations complete");
    Ok(())
}
