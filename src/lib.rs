pub mod config;
pub mod error;
pub mod state;
pub mod auth;
pub mod db;
pub mod models;
pub mod routes;
pub mod email;
pub mod extract;
pub mod upload;
pub mod validation;
pub mod worker;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderName, HeaderValue, Method, StatusCode};
use axum::response::IntoResponse;
use axum::{Json, Router};
use serde_json::json;
use sqlx::PgPool;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::{Config, WILDCARD_ORIGIN};
use crate::email::{Mailer, SmtpMailer};
use crate::state::{AppState, SharedState};
use crate::upload::UPLOADS_PREFIX;

/// Build the router, wiring an SMTP mailer from `config` when one is configured.
pub fn build_app(pool: PgPool, config: Config) -> Router {
    let mailer = config.smtp.as_ref().and_then(|smtp| match SmtpMailer::new(smtp) {
        Ok(mailer) => {
            tracing::info!("SMTP configured");
            Some(Arc::new(mailer) as Arc<dyn Mailer>)
        }
        Err(e) => {
            tracing::warn!("SMTP not available: {e}");
            None
        }
    });

    build_app_with_mailer(pool, config, mailer)
}

pub fn build_app_with_mailer(
    pool: PgPool,
    config: Config,
    mailer: Option<Arc<dyn Mailer>>,
) -> Router {
    if mailer.is_none() {
        tracing::warn!("No mailer configured; password reset and contact emails will fail");
    }

    let cors = cors_layer(&config.cors_origins);
    let uploads = ServeDir::new(&config.upload_dir);
    let max_body_size = config.max_body_size;

    let state: SharedState = Arc::new(AppState {
        pool,
        config,
        mailer,
    });

    Router::new()
        .merge(routes::api_routes())
        .nest_service(UPLOADS_PREFIX, uploads)
        .route("/health", axum::routing::get(health))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .with_state(state)
}

/// Credentialed CORS for the listed frontend origins.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(_) if origin == WILDCARD_ORIGIN => {
                tracing::warn!("Ignoring wildcard CORS origin: credentialed CORS needs explicit origins");
                None
            }
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Ignoring invalid CORS origin '{origin}': {e}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

async fn health() -> &'static str {
    "ok"
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": "Route not found" })),
    )
}
