use crate::config::{GitHubConfig, WebConfig};
use crate::crypto::Sensitive;
use crate::error::{AppError, AppResult};
use oauth2::basic::BasicClient;
use oauth2::reqwest::async_http_client;
use oauth2::url::Url;
use oauth2::{
    AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, RedirectUrl, Scope,
    TokenResponse, TokenUrl,
};
use tracing::debug;

pub const CALLBACK_PATH: &str = "/api/auth/github/callback";

/// Full control of private repos is needed to manage Actions secrets
const OAUTH_SCOPE: &str = "repo";

/// GitHub OAuth web flow
pub struct GitHubOAuth {
    client: BasicClient,
}

impl GitHubOAuth {
    pub fn new(github: &GitHubConfig, web: &WebConfig) -> AppResult<Self> {
        let invalid = |what: &str, e: oauth2::url::ParseError| {
            AppError::Configuration(format!("invalid {}: {}", what, e))
        };

        let client = BasicClient::new(
            ClientId::new(github.client_id.clone()),
            Some(ClientSecret::new(github.client_secret.clone())),
            AuthUrl::new(github.authorize_url.clone()).map_err(|e| invalid("github.authorize_url", e))?,
            Some(TokenUrl::new(github.token_url.clone()).map_err(|e| invalid("github.token_url", e))?),
        )
        .set_auth_type(AuthType::RequestBody)
        .set_redirect_uri(
            RedirectUrl::new(web.public_endpoint(CALLBACK_PATH))
                .map_err(|e| invalid("web.public_url", e))?,
        );

        Ok(Self { client })
    }

    /// Authorization URL plus the CSRF state to pin in a cookie
    pub fn authorize_url(&self) -> (Url, CsrfToken) {
        self.client
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new(OAUTH_SCOPE.to_string()))
            .url()
    }

    /// Trade an authorization code for an access token
    pub async fn exchange_code(&self, code: String) -> AppResult<Sensitive> {
        let token = self
            .client
            .exchange_code(AuthorizationCode::new(code))
            .request_async(async_http_client)
            .await
            .map_err(|e| AppError::OAuth(e.to_string()))?;

        debug!("Exchanged OAuth code for access token");
        Ok(Sensitive::new(token.access_token().secret().clone()))
    }
}
