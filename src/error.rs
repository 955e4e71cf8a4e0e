use crate::crypto::{SealError, VaultError};
use thiserror::Error;

/// Application-wide error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Token vault error: {0}")]
    Vault(#[from] VaultError),

    #[error("Secret sealing error: {0}")]
    Seal(#[from] SealError),

    #[error("GitHub API {status}: {message}")]
    GitHub { status: u16, message: String },

    #[error("OAuth exchange failed: {0}")]
    OAuth(String),

    #[error("Invalid OAuth state")]
    InvalidOAuthState,

    #[error("Authentication required")]
    AuthRequired,

    #[error("{0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn bad_request<S: Into<String>>(msg: S) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convert AppError to HTTP status codes for web responses
impl AppError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Http(_) => StatusCode::BAD_GATEWAY,
            Self::Vault(_) => StatusCode::INTERNAL_SERVER_ERROR,
            // GitHub served a key we cannot use; refetching is the only fix
            Self::Seal(SealError::InvalidPublicKey(_)) => StatusCode::BAD_GATEWAY,
            Self::Seal(SealError::Encoding) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::GitHub { status: 404, .. } => StatusCode::NOT_FOUND,
            Self::GitHub { .. } => StatusCode::BAD_GATEWAY,
            Self::OAuth(_) => StatusCode::BAD_REQUEST,
            Self::InvalidOAuthState => StatusCode::BAD_REQUEST,
            Self::AuthRequired => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        let body = serde_json::json!({
            "error": self.to_string(),
            "code": status.as_u16()
        });
        (status, axum::Json(body)).into_response()
    }
}
