//! Shared harness for HTTP-level tests.
//!
//! Every [`TestApp`] owns a private in-memory SQLite database, an in-process
//! key-value store, a recording mailer and a temporary media directory.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, Response, StatusCode},
    Router,
};
use contactbook::{
    api::{build_router, ApiState},
    config::{AppConfig, DatabaseConfig},
    services::EmailSender,
    startup::assemble_state,
    storage::{create_pool, InMemoryStore, SharedStore},
    Result,
};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

pub const PASSWORD: &str = "correct-horse";

#[derive(Debug, Clone, PartialEq)]
pub struct Mail {
    pub kind: &'static str,
    pub to: String,
    pub link: String,
}

impl Mail {
    /// Token carried in the `token` query parameter of the link
    pub fn token(&self) -> String {
        self.link.split("token=").nth(1).expect("link carries a token").to_string()
    }
}

#[derive(Default)]
pub struct Outbox {
    sent: Mutex<Vec<Mail>>,
}

impl Outbox {
    pub fn sent(&self) -> Vec<Mail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last_for(&self, kind: &str, to: &str) -> Option<Mail> {
        self.sent().into_iter().rev().find(|mail| mail.kind == kind && mail.to == to)
    }

    fn push(&self, kind: &'static str, to: &str, link: &str) {
        self.sent.lock().unwrap().push(Mail { kind, to: to.to_string(), link: link.to_string() });
    }
}

#[async_trait]
impl EmailSender for Outbox {
    async fn send_verification(&self, email: &str, link: &str) -> Result<()> {
        self.push("verification", email, link);
        Ok(())
    }

    async fn send_password_reset(&self, email: &str, link: &str) -> Result<()> {
        self.push("password_reset", email, link);
        Ok(())
    }
}

pub struct TestApp {
    pub state: ApiState,
    pub outbox: Arc<Outbox>,
    pub store: Arc<InMemoryStore>,
    pub config: AppConfig,
    _media_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let media_dir = tempfile::tempdir().expect("media tempdir");

        let mut config = AppConfig::default();
        config.database = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            idle_timeout_seconds: 0,
            auto_migrate: true,
            ..Default::default()
        };
        config.auth.jwt_secret = "integration-test-secret-0123456789abcdef".to_string();
        config.auth.bcrypt_cost = 4;
        config.media.upload_dir = media_dir.path().to_string_lossy().into_owned();
        config.media.public_base_url = "http://testserver/media".to_string();
        config.server.enable_cors = false;

        let pool = create_pool(&config.database).await.expect("in-memory pool");
        let store = Arc::new(InMemoryStore::new());
        let shared: SharedStore = store.clone();
        let outbox = Arc::new(Outbox::default());
        let state = assemble_state(&config, pool, shared, outbox.clone());

        Self { state, outbox, store, config, _media_dir: media_dir }
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone(), &self.config)
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router().oneshot(request).await.expect("request")
    }

    pub async fn json(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.send(request).await;
        let status = response.status();
        (status, read_json(response).await)
    }

    /// Sign up an account and return its id
    pub async fn signup(&self, email: &str) -> i64 {
        let (status, body) = self
            .json(
                Method::POST,
                "/auth/signup",
                None,
                Some(serde_json::json!({
                    "email": email,
                    "username": email.split('@').next().unwrap(),
                    "password": PASSWORD,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "signup failed: {}", body);
        body["id"].as_i64().expect("user id")
    }

    pub async fn login(&self, email: &str, password: &str) -> Response<Body> {
        let form = format!("username={}&password={}", email.replace('@', "%40"), password);
        let request = Request::builder()
            .method(Method::POST)
            .uri("/auth/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form))
            .unwrap();
        self.send(request).await
    }

    /// Sign up, log in and return the bearer token
    pub async fn signup_and_login(&self, email: &str) -> (i64, String) {
        let id = self.signup(email).await;
        let response = self.login(email, PASSWORD).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        (id, body["access_token"].as_str().expect("access token").to_string())
    }

    pub async fn promote_to_admin(&self, id: i64) {
        sqlx::query("UPDATE users SET role = 'admin' WHERE id = ?")
            .bind(id)
            .execute(&self.state.pool)
            .await
            .expect("promote user");
    }
}

pub async fn read_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("read body");
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}
