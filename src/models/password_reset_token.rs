use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Stored reset token; only the SHA-256 hash of the emailed token is kept.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PasswordResetToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
