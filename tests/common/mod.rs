//! Shared fixtures: an in-memory application plus helpers to seed users and
//! drive the router with `oneshot`.
#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, header},
};
use cellemu_site::{
    AppConfig, AppState, InMemoryRepository, MockMailer, MockStorageService, create_router,
    auth::{hash_password, start_session},
    mail::MailerState,
    models::{ActiveStatus, User, UserRole},
    repository::RepositoryState,
    storage::StorageState,
};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

pub const PASSWORD: &str = "battery-emulator-42";

pub struct TestApp {
    pub state: AppState,
    pub storage: Arc<MockStorageService>,
    pub mailer: Arc<MockMailer>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_mailer(MockMailer::new())
    }

    pub fn with_mailer(mailer: MockMailer) -> Self {
        let storage = Arc::new(MockStorageService::new());
        let mailer = Arc::new(mailer);
        let state = AppState {
            repo: Arc::new(InMemoryRepository::new()) as RepositoryState,
            storage: storage.clone() as StorageState,
            mailer: mailer.clone() as MailerState,
            config: AppConfig::default(),
        };
        Self { state, storage, mailer }
    }

    pub fn repo(&self) -> &RepositoryState {
        &self.state.repo
    }

    pub fn router(&self) -> Router {
        create_router(self.state.clone())
    }

    /// Inserts an active user with [`PASSWORD`].
    pub async fn seed_user(&self, email: &str, role: UserRole) -> User {
        let now = Utc::now();
        self.state
            .repo
            .create_user(User {
                id: Uuid::new_v4(),
                email: email.to_string(),
                name: email.split('@').next().unwrap_or("user").to_string(),
                password_hash: hash_password(PASSWORD).unwrap(),
                role,
                status: ActiveStatus::Active,
                last_login_at: None,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap()
    }

    /// A signed session token for `user`, bypassing the login endpoint.
    pub async fn token_for(&self, user: &User) -> String {
        let (token, _) = start_session(&self.state.repo, &self.state.config, user).await.unwrap();
        token
    }

    pub async fn admin_token(&self) -> String {
        let admin = self.seed_user("admin@cellemu.test", UserRole::Admin).await;
        self.token_for(&admin).await
    }

    pub async fn editor_token(&self) -> String {
        let editor = self.seed_user("editor@cellemu.test", UserRole::Editor).await;
        self.token_for(&editor).await
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router().oneshot(request).await.unwrap()
    }

    /// Sends a JSON request, optionally authenticated, and returns status and body.
    pub async fn json(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (u16, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = self.send(request).await;
        let status = response.status().as_u16();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
        (status, value)
    }

    pub async fn get_text(&self, uri: &str) -> (u16, String) {
        let response = self.send(Request::get(uri).body(Body::empty()).unwrap()).await;
        let status = response.status().as_u16();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Builds a `multipart/form-data` body from text fields plus one file.
pub fn multipart_body(boundary: &str, fields: &[(&str, &str)], file: Option<(&str, &str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!("--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n").as_bytes(),
        );
    }
    if let Some((filename, content_type, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}
