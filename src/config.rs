use crate::crypto::TokenVault;
use crate::error::{AppError, AppResult};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::sync::OnceLock;

static CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Web server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct WebConfig {
    #[serde(default = "default_web_host")]
    pub host: String,
    #[serde(default = "default_web_port")]
    pub port: u16,
    /// Externally visible origin, used to build the OAuth redirect URI
    #[serde(default = "default_public_url")]
    pub public_url: String,
    /// Mark session cookies `Secure` (enable behind HTTPS)
    #[serde(default)]
    pub secure_cookies: bool,
    /// Optional directory holding the built dashboard frontend
    #[serde(default)]
    pub static_dir: Option<String>,
}

fn default_web_host() -> String {
    "0.0.0.0".to_string()
}

fn default_web_port() -> u16 {
    3000
}

fn default_public_url() -> String {
    "http://localhost:3000".to_string()
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_web_host(),
            port: default_web_port(),
            public_url: default_public_url(),
            secure_cookies: false,
            static_dir: None,
        }
    }
}

/// Database configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://ghsecrets.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

/// GitHub OAuth app and REST API settings
#[derive(Deserialize, Clone)]
pub struct GitHubConfig {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_authorize_url")]
    pub authorize_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_authorize_url() -> String {
    "https://github.com/login/oauth/authorize".to_string()
}

fn default_token_url() -> String {
    "https://github.com/login/oauth/access_token".to_string()
}

fn default_user_agent() -> String {
    "ghsecrets".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            api_url: default_api_url(),
            authorize_url: default_authorize_url(),
            token_url: default_token_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("client_id", &self.client_id)
            .field("api_url", &self.api_url)
            .field("authorize_url", &self.authorize_url)
            .field("token_url", &self.token_url)
            .field("user_agent", &self.user_agent)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

/// Process-wide secret material.
#[derive(Deserialize, Clone, Default)]
pub struct SecurityConfig {
    /// 256-bit token vault key, hex encoded (64 characters).
    /// There is no default: startup fails without it.
    #[serde(default)]
    pub encryption_key: Option<String>,
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("encryption_key", &self.encryption_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Session housekeeping
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SessionsConfig {
    /// Interval for the background sweep of expired sessions, 0 disables it.
    /// Expired sessions are always removed lazily when presented.
    #[serde(default)]
    pub sweep_interval_secs: u64,
}

/// Root application configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., GHSECRETS_SECURITY__ENCRYPTION_KEY, GHSECRETS_GITHUB__CLIENT_ID
            // Values stay strings so hex keys are never read as numbers
            .add_source(
                Environment::with_prefix("GHSECRETS")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Initialize the global config singleton
    pub fn init() -> Result<&'static Self, ConfigError> {
        let config = Self::load()?;
        Ok(CONFIG.get_or_init(|| config))
    }
}

impl WebConfig {
    /// Absolute URL under the public origin, tolerant of stray slashes
    pub fn public_endpoint(&self, path: &str) -> String {
        let base = self.public_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }
}

impl SecurityConfig {
    /// Build the token vault; a missing key is fatal at startup.
    pub fn token_vault(&self) -> AppResult<TokenVault> {
        let key = self
            .encryption_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                AppError::Configuration(
                    "security.encryption_key is not set (GHSECRETS_SECURITY__ENCRYPTION_KEY)"
                        .to_string(),
                )
            })?;
        Ok(TokenVault::from_hex(key)?)
    }
}
