use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use axum_extra::extract::CookieJar;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::extractor::{session_token, AuthUser};
use crate::auth::{cookie, jwt, password, reset_token};
use crate::db;
use crate::email;
use crate::error::AppError;
use crate::extract::{ApiJson, ApiPath};
use crate::models::UserProfile;
use crate::state::SharedState;
use crate::validation::{self, present};

const REQUIRED_FIELDS: &str = "Please fill in all the required fields";
const INVALID_CREDENTIALS: &str = "Invalid email or password";
const EMAIL_TAKEN: &str = "Email has already been registered";

#[derive(Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default, alias = "Bio")]
    pub bio: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub oldpassword: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Serialize)]
pub struct AuthResponse {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub token: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

pub async fn register(
    State(state): State<SharedState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>), AppError> {
    let (Some(name), Some(email), Some(raw_password)) = (
        present(req.name.as_deref()),
        present(req.email.as_deref()),
        non_empty(req.password.as_deref()),
    ) else {
        return Err(AppError::BadRequest(REQUIRED_FIELDS.to_string()));
    };

    let email = validation::normalize_email(email);
    validation::validate_name(name)?;
    validation::validate_email(&email)?;
    validation::validate_password("password", raw_password)?;

    if db::users::find_by_email(&state.pool, &email).await?.is_some() {
        return Err(AppError::BadRequest(EMAIL_TAKEN.to_string()));
    }

    let pw_hash = password::hash(raw_password).map_err(AppError::Internal)?;

    let user = db::users::create(&state.pool, name, &email, &pw_hash)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::BadRequest(EMAIL_TAKEN.to_string())
            }
            _ => AppError::Database(e),
        })?;

    let token = jwt::issue_session(user.id, &state.config.jwt_secret).map_err(AppError::Internal)?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        cookie::session_jar(&token),
        Json(AuthResponse {
            profile: UserProfile::from(&user),
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<SharedState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let (Some(email), Some(raw_password)) = (
        present(req.email.as_deref()),
        non_empty(req.password.as_deref()),
    ) else {
        return Err(AppError::BadRequest(REQUIRED_FIELDS.to_string()));
    };

    let email = validation::normalize_email(email);

    let Some(user) = db::users::find_by_email(&state.pool, &email).await? else {
        return Err(AppError::BadRequest(INVALID_CREDENTIALS.to_string()));
    };

    let valid = password::verify(raw_password, &user.password_hash).map_err(AppError::Internal)?;
    if !valid {
        tracing::debug!(user_id = %user.id, "Login rejected: wrong password");
        return Err(AppError::BadRequest(INVALID_CREDENTIALS.to_string()));
    }

    let token = jwt::issue_session(user.id, &state.config.jwt_secret).map_err(AppError::Internal)?;

    Ok((
        cookie::session_jar(&token),
        Json(AuthResponse {
            profile: UserProfile::from(&user),
            token,
        }),
    ))
}

pub async fn logout() -> (CookieJar, Json<MessageResponse>) {
    (
        cookie::cleared_session_jar(),
        Json(MessageResponse {
            message: "Successfully logged out".to_string(),
        }),
    )
}

/// `true` when the request carries a session token that still verifies.
pub async fn login_status(State(state): State<SharedState>, headers: HeaderMap) -> Json<bool> {
    let logged_in = session_token(&headers)
        .is_some_and(|token| jwt::decode_token(&token, &state.config.jwt_secret).is_ok());
    Json(logged_in)
}

pub async fn get_profile(auth: AuthUser) -> Json<UserProfile> {
    Json(UserProfile::from(&auth.user))
}

pub async fn update_profile(
    auth: AuthUser,
    State(state): State<SharedState>,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> Result<Json<UserProfile>, AppError> {
    let current = &auth.user;

    let name = present(req.name.as_deref()).unwrap_or(&current.name);
    let phone = present(req.phone.as_deref()).unwrap_or(&current.phone);
    let bio = present(req.bio.as_deref()).unwrap_or(&current.bio);
    let image = present(req.image.as_deref()).unwrap_or(&current.image);

    validation::validate_name(name)?;
    validation::validate_bio(bio)?;

    let updated = db::users::update_profile(&state.pool, current.id, name, image, phone, bio).await?;
    Ok(Json(UserProfile::from(&updated)))
}

pub async fn change_password(
    auth: AuthUser,
    State(state): State<SharedState>,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> Result<(StatusCode, &'static str), AppError> {
    let (Some(old_password), Some(new_password)) = (
        non_empty(req.oldpassword.as_deref()),
        non_empty(req.password.as_deref()),
    ) else {
        return Err(AppError::BadRequest(
            "Please provide old and new password".to_string(),
        ));
    };

    validation::validate_password("password", new_password)?;

    let valid = password::verify(old_password, &auth.user.password_hash)
        .map_err(AppError::Internal)?;
    if !valid {
        return Err(AppError::BadRequest("Old password is incorrect".to_string()));
    }

    let pw_hash = password::hash(new_password).map_err(AppError::Internal)?;
    db::users::update_password(&state.pool, auth.id(), &pw_hash).await?;

    tracing::info!(user_id = %auth.id(), "Password changed");

    Ok((StatusCode::OK, "Password changed successfully"))
}

pub async fn forgot_password(
    State(state): State<SharedState>,
    ApiJson(req): ApiJson<ForgotPasswordRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let email = present(req.email.as_deref())
        .map(validation::normalize_email)
        .ok_or_else(|| AppError::BadRequest("Please provide an email".to_string()))?;

    let user = db::users::find_by_email(&state.pool, &email)
        .await?
        .ok_or_else(|| AppError::NotFound("User does not exist".to_string()))?;

    let mailer = state
        .mailer
        .clone()
        .ok_or_else(|| AppError::Email("no mailer configured".to_string()))?;

    let token = reset_token::generate(user.id);
    db::password_reset_tokens::replace_for_user(
        &state.pool,
        user.id,
        &reset_token::hash(&token),
        reset_token::expiry_from(Utc::now()),
    )
    .await?;

    let reset_url = format!("{}/resetpassword/{token}", state.config.frontend_url);
    if let Err(e) = mailer
        .send(email::password_reset(&user.email, &user.name, &reset_url))
        .await
    {
        if let Err(cleanup) = db::password_reset_tokens::delete_for_user(&state.pool, user.id).await
        {
            tracing::warn!(user_id = %user.id, "Failed to drop unsent reset token: {cleanup}");
        }
        return Err(AppError::Email(e));
    }

    tracing::info!(user_id = %user.id, "Password reset email sent");

    Ok(Json(json!({
        "success": true,
        "message": "Reset email sent",
    })))
}

pub async fn reset_password(
    State(state): State<SharedState>,
    ApiPath(token): ApiPath<String>,
    ApiJson(req): ApiJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let new_password = non_empty(req.password.as_deref())
        .ok_or_else(|| AppError::BadRequest("Please provide a new password".to_string()))?;
    validation::validate_password("password", new_password)?;

    let pw_hash = password::hash(new_password).map_err(AppError::Internal)?;

    let mut tx = state.pool.begin().await?;

    let stored = db::password_reset_tokens::consume_valid(&mut *tx, &reset_token::hash(&token))
        .await?
        .ok_or_else(|| AppError::NotFound("Invalid or expired token".to_string()))?;

    let user = db::users::find_by_id(&mut *tx, stored.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Invalid or expired token".to_string()))?;

    db::users::update_password(&mut *tx, user.id, &pw_hash).await?;
    tx.commit().await?;

    tracing::info!(user_id = %user.id, "Password reset completed");

    Ok(Json(MessageResponse {
        message: "Password reset successful, please login".to_string(),
    }))
}
