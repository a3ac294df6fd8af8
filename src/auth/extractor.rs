use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum_extra::extract::CookieJar;
use uuid::Uuid;

use crate::auth::cookie::SESSION_COOKIE;
use crate::auth::jwt;
use crate::db;
use crate::error::AppError;
use crate::models::User;
use crate::state::SharedState;

const NOT_AUTHORIZED: &str = "Not authorized, please login";

/// The user behind a verified session, loaded fresh from the database.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
}

impl AuthUser {
    pub fn id(&self) -> Uuid {
        self.user.id
    }
}

/// Session token from the `token` cookie, falling back to a Bearer header.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers)
            .ok_or_else(|| AppError::Unauthorized(NOT_AUTHORIZED.to_string()))?;

        let claims = jwt::decode_token(&token, &state.config.jwt_secret).map_err(|e| {
            tracing::debug!("Rejected session token: {e}");
            AppError::Unauthorized(NOT_AUTHORIZED.to_string())
        })?;

        let user = db::users::find_by_id(&state.pool, claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized(NOT_AUTHORIZED.to_string()))?;

        Ok(AuthUser { user })
    }
}
