use chrono::{Duration, Utc};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use stockroom::auth::cookie::{expired_session_cookie, session_cookie, SESSION_COOKIE};
use stockroom::auth::{jwt, password, reset_token};
use stockroom::config::{parse_origins, Config};
use stockroom::email::templates;
use stockroom::upload::{format_file_size, sanitize_file_name};
use stockroom::validation;

// ── Passwords ───────────────────────────────────────────────────

#[test]
fn password_hash_verifies_and_is_salted() {
    let first = password::hash("secret1").unwrap();
    let second = password::hash("secret1").unwrap();

    assert_ne!(first, "secret1");
    assert_ne!(first, second);
    assert!(password::verify("secret1", &first).unwrap());
    assert!(!password::verify("secret2", &first).unwrap());
    assert!(password::verify("secret1", "not-a-phc-string").is_err());
}

// ── Session tokens ──────────────────────────────────────────────

#[test]
fn session_token_round_trips_subject() {
    let user_id = Uuid::new_v4();
    let token = jwt::issue_session(user_id, "secret").unwrap();

    let claims = jwt::decode_token(&token, "secret").unwrap();
    assert_eq!(claims.sub, user_id);
    assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
}

#[test]
fn session_token_rejects_wrong_secret_and_expiry() {
    let token = jwt::issue_session(Uuid::new_v4(), "secret").unwrap();
    assert!(jwt::decode_token(&token, "other").is_err());

    let expired = jwt::Claims {
        sub: Uuid::new_v4(),
        iat: (Utc::now() - Duration::days(2)).timestamp(),
        exp: (Utc::now() - Duration::days(1)).timestamp(),
    };
    let token = jwt::encode_token(&expired, "secret").unwrap();
    assert!(jwt::decode_token(&token, "secret").is_err());
}

// ── Reset tokens ────────────────────────────────────────────────

#[test]
fn reset_token_embeds_user_and_hashes_one_way() {
    let user_id = Uuid::new_v4();
    let token = reset_token::generate(user_id);

    assert_eq!(token.len(), 64 + 32);
    assert!(token.ends_with(&user_id.simple().to_string()));
    assert_ne!(token, reset_token::generate(user_id));

    let hashed = reset_token::hash(&token);
    assert_eq!(hashed.len(), 64);
    assert_ne!(hashed, token);
    assert_eq!(hashed, reset_token::hash(&token));
}

#[test]
fn reset_token_expires_after_twenty_minutes() {
    let now = Utc::now();
    assert_eq!(reset_token::expiry_from(now) - now, Duration::minutes(20));
}

// ── Cookies ─────────────────────────────────────────────────────

#[test]
fn session_cookie_attributes() {
    let cookie = session_cookie("abc");
    assert_eq!(cookie.name(), SESSION_COOKIE);
    assert_eq!(cookie.value(), "abc");
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.secure(), Some(true));
    assert_eq!(cookie.path(), Some("/"));
    assert!(cookie.expires_datetime().unwrap() > time::OffsetDateTime::now_utc());

    let cleared = expired_session_cookie();
    assert_eq!(cleared.value(), "");
    assert!(cleared.expires_datetime().unwrap() < time::OffsetDateTime::now_utc());
}

// ── Validation ──────────────────────────────────────────────────

#[test]
fn email_format() {
    for ok in ["a@x.com", "first.last@sub.example.org", "a+tag@x.io"] {
        assert!(validation::validate_email(ok).is_ok(), "{ok} should be valid");
    }
    for bad in ["", "plain", "a@x", "a@@x.com", "a b@x.com", "a@x.c"] {
        assert!(validation::validate_email(bad).is_err(), "{bad} should be invalid");
    }
}

#[test]
fn password_and_bio_limits() {
    assert!(validation::validate_password("password", "12345").is_err());
    assert!(validation::validate_password("password", "123456").is_ok());

    let err = validation::validate_bio(&"x".repeat(251)).unwrap_err();
    assert_eq!(err.field, "bio");
    assert!(validation::validate_bio(&"x".repeat(250)).is_ok());

    assert!(validation::validate_price(-0.01).is_err());
    assert!(validation::validate_price(f64::NAN).is_err());
    assert!(validation::validate_quantity(-1).is_err());
}

#[test]
fn present_and_normalize() {
    assert_eq!(validation::present(Some("  hi ")), Some("hi"));
    assert_eq!(validation::present(Some("   ")), None);
    assert_eq!(validation::present(None), None);
    assert_eq!(validation::normalize_email("  A@X.Com "), "a@x.com");
}

// ── Uploads ─────────────────────────────────────────────────────

#[test]
fn file_sizes_use_decimal_units() {
    assert_eq!(format_file_size(0), "0 Bytes");
    assert_eq!(format_file_size(512), "512 Bytes");
    assert_eq!(format_file_size(1000), "1 KB");
    assert_eq!(format_file_size(1500), "1.5 KB");
    assert_eq!(format_file_size(2_345_678), "2.35 MB");
}

#[test]
fn file_names_are_sanitized() {
    assert_eq!(sanitize_file_name("photo.png"), "photo.png");
    assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
    assert_eq!(sanitize_file_name("C:\\pics\\my cat.jpg"), "my-cat.jpg");
    assert_eq!(sanitize_file_name(".."), "upload");
}

// ── Config & templates ──────────────────────────────────────────

#[test]
fn cors_origins_are_split_and_trimmed() {
    assert_eq!(
        parse_origins("http://localhost:3000/, https://shop.example.com ,,").unwrap(),
        vec!["http://localhost:3000", "https://shop.example.com"]
    );
}

#[test]
fn cors_wildcard_origin_is_rejected() {
    assert!(parse_origins("*").is_err());
    assert!(parse_origins("http://localhost:3000, *").is_err());
}

#[tokio::test]
async fn router_builds_with_wildcard_origin() {
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://localhost/stockroom_unused")
        .unwrap();
    let config = Config {
        database_url: "postgres://localhost/stockroom_unused".to_string(),
        jwt_secret: "secret".to_string(),
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        frontend_url: "http://localhost:3000".to_string(),
        cors_origins: vec!["*".to_string(), "http://localhost:3000".to_string()],
        upload_dir: std::env::temp_dir(),
        max_body_size: 1024,
        log_level: "warn".to_string(),
        support_email: None,
        smtp: None,
    };

    let _app = stockroom::build_app_with_mailer(pool, config, None);
}

#[test]
fn templates_escape_user_text() {
    let html = templates::render_password_reset("<Eve>", "http://f/resetpassword/abc");
    assert!(html.contains("&lt;Eve&gt;"));
    assert!(html.contains("http://f/resetpassword/abc"));
    assert!(html.contains("20 minutes"));
}
