use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::auth::extractor::AuthUser;
use crate::email;
use crate::error::AppError;
use crate::extract::ApiJson;
use crate::state::SharedState;
use crate::validation::present;

#[derive(Deserialize)]
pub struct ContactRequest {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Forward a signed-in user's message to the support mailbox, replying to the user.
pub async fn send(
    auth: AuthUser,
    State(state): State<SharedState>,
    ApiJson(req): ApiJson<ContactRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let (Some(subject), Some(message)) = (
        present(req.subject.as_deref()),
        present(req.message.as_deref()),
    ) else {
        return Err(AppError::BadRequest(
            "Please add subject and message".to_string(),
        ));
    };

    let support_email = state
        .config
        .support_email
        .as_deref()
        .ok_or_else(|| AppError::Email("no support address configured".to_string()))?;
    let mailer = state
        .mailer
        .as_ref()
        .ok_or_else(|| AppError::Email("no mailer configured".to_string()))?;

    mailer
        .send(email::contact_message(
            support_email,
            &auth.user.name,
            &auth.user.email,
            subject,
            message,
        ))
        .await
        .map_err(AppError::Email)?;

    tracing::info!(user_id = %auth.id(), "Contact message sent");

    Ok(Json(json!({
        "success": true,
        "message": "Email sent",
    })))
}
