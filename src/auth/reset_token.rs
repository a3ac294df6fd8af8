use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// How long a password reset link stays valid.
pub const RESET_TOKEN_TTL_MINUTES: i64 = 20;

pub fn expiry_from(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::minutes(RESET_TOKEN_TTL_MINUTES)
}

/// Generate the plaintext reset token: 32 random bytes, hex encoded, followed by the user id.
///
/// Only the output of [`hash`] is ever stored.
pub fn generate(user_id: Uuid) -> String {
    let bytes: [u8; 32] = rand::random();
    format!("{}{}", hex::encode(bytes), user_id.simple())
}

/// One-way SHA-256 digest of a reset token, hex encoded.
pub fn hash(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
