use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use time::OffsetDateTime;

use crate::auth::jwt::SESSION_TTL_DAYS;

pub const SESSION_COOKIE: &str = "token";

/// Cookie carrying a freshly issued session token.
///
/// `SameSite=None` lets the separately hosted frontend send it on cross-site requests.
pub fn session_cookie(token: &str) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token.to_string()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .expires(OffsetDateTime::now_utc() + time::Duration::days(SESSION_TTL_DAYS))
        .build()
}

/// Empty session cookie that expired at the Unix epoch.
pub fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .expires(OffsetDateTime::UNIX_EPOCH)
        .max_age(time::Duration::ZERO)
        .build()
}

pub fn session_jar(token: &str) -> CookieJar {
    CookieJar::new().add(session_cookie(token))
}

pub fn cleared_session_jar() -> CookieJar {
    CookieJar::new().add(expired_session_cookie())
}
