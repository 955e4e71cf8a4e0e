use crate::auth::UserProfile;
use crate::error::{AppError, AppResult};
use crate::web::cookies::{self, OAUTH_STATE_COOKIE, SESSION_COOKIE};
use crate::web::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Start the GitHub OAuth flow
pub async fn github_login(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Redirect) {
    let (url, csrf) = state.oauth.authorize_url();
    let jar = jar.add(cookies::oauth_state_cookie(csrf.secret(), state.secure_cookies));
    (jar, Redirect::to(url.as_str()))
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
}

/// OAuth redirect target: verify state, exchange code, open a session
pub async fn github_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> AppResult<(CookieJar, Redirect)> {
    let expected = jar.get(OAUTH_STATE_COOKIE).map(|c| c.value().to_string());
    let (Some(code), Some(returned)) = (query.code, query.state) else {
        warn!("OAuth callback missing code or state");
        return Err(AppError::InvalidOAuthState);
    };
    if returned.is_empty() || expected.as_deref() != Some(returned.as_str()) {
        warn!("OAuth callback state mismatch");
        return Err(AppError::InvalidOAuthState);
    }

    let token = state.oauth.exchange_code(code).await?;
    let profile = state.github.current_user(&token).await?;
    let user = state.accounts.upsert_user(&profile, token).await?;
    let session = state.sessions.create_session(&user.id).await?;
    info!("User {} signed in", user.username);

    let jar = jar
        .remove(cookies::removal(OAUTH_STATE_COOKIE))
        .add(cookies::session_cookie(&session.id, state.secure_cookies));
    Ok((jar, Redirect::to("/")))
}

/// End the current session, if any
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> AppResult<(CookieJar, Redirect)> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions.destroy_session(cookie.value()).await?;
    }
    let jar = jar.remove(cookies::removal(SESSION_COOKIE));
    Ok((jar, Redirect::to("/login")))
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: Option<UserProfile>,
}

/// Current user's public profile; `{"user": null}` with 401 when signed out
pub async fn me(State(state): State<AppState>, jar: CookieJar) -> AppResult<Response> {
    let auth = match jar.get(SESSION_COOKIE) {
        Some(cookie) => state.sessions.validate_session(cookie.value()).await?,
        None => None,
    };

    Ok(match auth {
        Some(auth) => Json(MeResponse {
            user: Some(auth.user.profile()),
        })
        .into_response(),
        None => (StatusCode::UNAUTHORIZED, Json(MeResponse { user: None })).into_response(),
    })
}
