use std::net::IpAddr;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: IpAddr,
    pub port: u16,
    /// Base URL of the web frontend; password reset links point here.
    pub frontend_url: String,
    pub cors_origins: Vec<String>,
    pub upload_dir: PathBuf,
    pub max_body_size: usize,
    pub log_level: String,
    /// Recipient of contact form messages.
    pub support_email: Option<String>,
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;
        let jwt_secret = env_required("JWT_SECRET")?;

        let host: IpAddr = env_or("STOCKROOM_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid STOCKROOM_HOST: {e}"))?;

        let port: u16 = env_or("STOCKROOM_PORT", "5000")
            .parse()
            .map_err(|e| format!("Invalid STOCKROOM_PORT: {e}"))?;

        let frontend_url = env_or("STOCKROOM_FRONTEND_URL", "http://localhost:3000")
            .trim_end_matches('/')
            .to_string();

        let cors_origins = parse_origins(&env_or("STOCKROOM_CORS_ORIGINS", &frontend_url))?;

        let upload_dir = PathBuf::from(env_or("STOCKROOM_UPLOAD_DIR", "uploads"));

        let max_body_size: usize = env_or("STOCKROOM_MAX_BODY_SIZE", "5242880")
            .parse()
            .map_err(|e| format!("Invalid STOCKROOM_MAX_BODY_SIZE: {e}"))?;

        let log_level = env_or("STOCKROOM_LOG_LEVEL", "info");

        let smtp = match (
            std::env::var("STOCKROOM_SMTP_HOST").ok(),
            std::env::var("STOCKROOM_SMTP_PORT").ok(),
            std::env::var("STOCKROOM_SMTP_USER").ok(),
            std::env::var("STOCKROOM_SMTP_PASS").ok(),
        ) {
            (Some(host), Some(port), Some(user), Some(pass)) => Some(SmtpConfig {
                host,
                port: port
                    .parse()
                    .map_err(|e| format!("Invalid STOCKROOM_SMTP_PORT: {e}"))?,
                from: std::env::var("STOCKROOM_SMTP_FROM").unwrap_or_else(|_| user.clone()),
                user,
                pass,
            }),
            _ => None,
        };

        let support_email = std::env::var("STOCKROOM_SUPPORT_EMAIL")
            .ok()
            .or_else(|| smtp.as_ref().map(|s| s.user.clone()));

        Ok(Config {
            database_url,
            jwt_secret,
            host,
            port,
            frontend_url,
            cors_origins,
            upload_dir,
            max_body_size,
            log_level,
            support_email,
            smtp,
        })
    }
}

/// Matches any origin. Not usable with credentialed cookies.
pub const WILDCARD_ORIGIN: &str = "*";

pub fn parse_origins(raw: &str) -> Result<Vec<String>, String> {
    let origins: Vec<String> = raw
        .split(',')
        .map(|s| s.trim().trim_end_matches('/'))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if origins.iter().any(|origin| origin == WILDCARD_ORIGIN) {
        return Err("STOCKROOM_CORS_ORIGINS cannot be * with credentialed cookies".to_string());
    }

    Ok(origins)
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
