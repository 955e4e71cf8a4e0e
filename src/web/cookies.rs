use crate::db::SESSION_DURATION_DAYS;
use axum_extra::extract::cookie::{Cookie, SameSite};

pub const SESSION_COOKIE: &str = "session";
pub const OAUTH_STATE_COOKIE: &str = "oauth_state";

/// The OAuth round trip must finish within ten minutes
const OAUTH_STATE_MAX_AGE_SECS: i64 = 600;

fn hardened(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .secure(secure)
        .build()
}

pub fn session_cookie(session_id: &str, secure: bool) -> Cookie<'static> {
    let mut cookie = hardened(SESSION_COOKIE, session_id.to_string(), secure);
    cookie.set_max_age(time::Duration::days(SESSION_DURATION_DAYS));
    cookie
}

pub fn oauth_state_cookie(state: &str, secure: bool) -> Cookie<'static> {
    let mut cookie = hardened(OAUTH_STATE_COOKIE, state.to_string(), secure);
    cookie.set_max_age(time::Duration::seconds(OAUTH_STATE_MAX_AGE_SECS));
    cookie
}

/// Cookie matching `name`'s path, for `CookieJar::remove`
pub fn removal(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, "")).path("/").build()
}
