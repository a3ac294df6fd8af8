use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use stockroom::config::Config;
use stockroom::email::{Mailer, OutgoingEmail};

pub const JWT_SECRET: &str = "test-jwt-secret-that-is-long-enough";
pub const SUPPORT_EMAIL: &str = "support@stockroom.test";
pub const FRONTEND_URL: &str = "http://frontend.test";

/// Mailer that keeps every message in memory, or fails on demand.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingEmail>>,
    pub fail: AtomicBool,
}

impl RecordingMailer {
    pub fn messages(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }

    /// Reset token from the most recent password reset email.
    pub fn last_reset_token(&self) -> String {
        let messages = self.messages();
        let body = &messages.last().expect("no email was sent").html_body;
        let marker = "/resetpassword/";
        let start = body.find(marker).expect("reset link missing") + marker.len();
        body[start..]
            .chars()
            .take_while(|c| c.is_ascii_hexdigit())
            .collect()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), String> {
        if self.fail.load(Ordering::SeqCst) {
            return Err("smtp unavailable".to_string());
        }
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

/// A running test server instance with a dedicated test database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub pool: PgPool,
    pub client: Client,
    pub db_name: String,
    pub mailer: Arc<RecordingMailer>,
    pub upload_dir: PathBuf,
}

/// Response status, JSON body (null if not JSON) and the `token` Set-Cookie header.
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Value,
    pub set_cookie: Option<String>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn send(&self, request: RequestBuilder) -> ApiResponse {
        let resp = request.send().await.expect("request failed");
        let status = resp.status();
        let set_cookie = resp
            .headers()
            .get_all("set-cookie")
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with("token="))
            .map(str::to_string);
        let body: Value = resp.json().await.unwrap_or(json!(null));
        ApiResponse {
            status,
            body,
            set_cookie,
        }
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> ApiResponse {
        self.send(
            self.client
                .post(self.url("/api/users/register"))
                .json(&json!({ "name": name, "email": email, "password": password })),
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> ApiResponse {
        self.send(
            self.client
                .post(self.url("/api/users/login"))
                .json(&json!({ "email": email, "password": password })),
        )
        .await
    }

    /// Register a user and return its session token.
    pub async fn signup(&self, name: &str, email: &str) -> String {
        let resp = self.register(name, email, "secret1").await;
        assert_eq!(resp.status, StatusCode::CREATED, "signup failed: {}", resp.body);
        resp.body["token"].as_str().unwrap().to_string()
    }

    pub async fn forgot_password(&self, email: &str) -> ApiResponse {
        self.send(
            self.client
                .post(self.url("/api/users/forgotpassword"))
                .json(&json!({ "email": email })),
        )
        .await
    }

    pub async fn reset_password(&self, token: &str, password: &str) -> ApiResponse {
        self.send(
            self.client
                .put(self.url(&format!("/api/users/resetpassword/{token}")))
                .json(&json!({ "password": password })),
        )
        .await
    }

    /// Attach the session cookie to a request.
    pub fn with_session(&self, request: RequestBuilder, token: &str) -> RequestBuilder {
        request.header("cookie", format!("token={token}"))
    }

    pub async fn get_auth(&self, path: &str, token: &str) -> ApiResponse {
        self.send(self.with_session(self.client.get(self.url(path)), token))
            .await
    }

    pub async fn post_auth(&self, path: &str, token: &str, body: &Value) -> ApiResponse {
        self.send(self.with_session(self.client.post(self.url(path)), token).json(body))
            .await
    }

    pub async fn patch_auth(&self, path: &str, token: &str, body: &Value) -> ApiResponse {
        self.send(self.with_session(self.client.patch(self.url(path)), token).json(body))
            .await
    }

    pub async fn delete_auth(&self, path: &str, token: &str) -> ApiResponse {
        self.send(self.with_session(self.client.delete(self.url(path)), token))
            .await
    }

    pub async fn create_product(&self, token: &str, name: &str) -> Value {
        let resp = self
            .post_auth(
                "/api/products",
                token,
                &json!({
                    "name": name,
                    "category": "Tools",
                    "price": 9.5,
                    "quantity": 3,
                    "description": "A useful thing",
                }),
            )
            .await;
        assert_eq!(resp.status, StatusCode::CREATED, "create product failed: {}", resp.body);
        resp.body
    }

    pub async fn count_users(&self, email: &str) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = $1")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    pub async fn count_reset_tokens(&self, user_id: Uuid) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM password_reset_tokens WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }
}

fn admin_url(base_url: &str) -> String {
    base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.to_string())
}

/// Spawn a test app with a fresh temporary database.
pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

/// Like [`spawn_app`], letting the test adjust the config first.
pub async fn spawn_app_with(configure: impl FnOnce(&mut Config)) -> TestApp {
    let _ = dotenvy::dotenv();

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let db_name = format!("stockroom_test_{}", Uuid::now_v7().simple());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url(&base_url))
        .await
        .expect("Failed to connect to postgres for test DB creation");

    sqlx::query(&format!("CREATE DATABASE \"{db_name}\""))
        .execute(&admin_pool)
        .await
        .expect("Failed to create test database");

    admin_pool.close().await;

    let test_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/{db_name}"))
        .unwrap_or_else(|| base_url.clone());

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&test_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations on test database");

    let upload_dir = std::env::temp_dir().join(&db_name);

    let mut config = Config {
        database_url: test_url,
        jwt_secret: JWT_SECRET.to_string(),
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        frontend_url: FRONTEND_URL.to_string(),
        cors_origins: vec![FRONTEND_URL.to_string()],
        upload_dir: upload_dir.clone(),
        max_body_size: 1_048_576,
        log_level: "warn".to_string(),
        support_email: Some(SUPPORT_EMAIL.to_string()),
        smtp: None,
    };
    configure(&mut config);

    let mailer = Arc::new(RecordingMailer::default());
    let app = stockroom::build_app_with_mailer(
        pool.clone(),
        config,
        Some(mailer.clone() as Arc<dyn Mailer>),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        addr,
        pool,
        client,
        db_name,
        mailer,
        upload_dir,
    }
}

/// Drop the test database and upload directory after a test completes.
pub async fn cleanup(app: TestApp) {
    let db_name = app.db_name.clone();
    app.pool.close().await;
    let _ = tokio::fs::remove_dir_all(&app.upload_dir).await;

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url(&base_url))
        .await
        .expect("Failed to connect for cleanup");

    let _ = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"))
        .execute(&admin_pool)
        .await;

    admin_pool.close().await;
}
