use std::time::Duration;

use sqlx::PgPool;
use tokio::sync::watch;

use crate::db;

/// How often expired password reset tokens are purged.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Periodically delete expired reset tokens until shutdown is signaled.
///
/// Lookups already ignore expired rows; this only keeps the table small.
pub async fn run_token_sweeper(pool: PgPool, mut shutdown: watch::Receiver<bool>) {
    tracing::debug!("Reset token sweeper started");

    loop {
        if *shutdown.borrow() {
            break;
        }

        match db::password_reset_tokens::delete_expired(&pool).await {
            Ok(0) => {}
            Ok(n) => tracing::info!("Purged {n} expired password reset tokens"),
            Err(e) => tracing::error!("Reset token sweep failed: {e}"),
        }

        tokio::select! {
            _ = tokio::time::sleep(SWEEP_INTERVAL) => {}
            _ = shutdown.changed() => {}
        }
    }

    tracing::debug!("Reset token sweeper stopped");
}
