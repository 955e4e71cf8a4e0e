use crate::auth::AuthenticatedSession;
use crate::error::AppError;
use crate::web::cookies::SESSION_COOKIE;
use crate::web::AppState;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;

/// Signed-in caller, resolved from the session cookie.
///
/// Rejects with 401 when the cookie is missing, unknown or expired.
pub struct CurrentUser(pub AuthenticatedSession);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let session_id = jar
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .ok_or(AppError::AuthRequired)?;

        state
            .sessions
            .validate_session(&session_id)
            .await?
            .map(CurrentUser)
            .ok_or(AppError::AuthRequired)
    }
}
