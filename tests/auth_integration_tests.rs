mod common;

use axum::{
    extract::FromRequestParts,
    http::{Request, StatusCode, header, request::Parts},
};
use cellemu_site::{
    auth::{AdminUser, AuthUser, issue_token},
    error::AppError,
    models::{ActiveStatus, Session, UserRole},
};
use chrono::{Duration, Utc};
use common::TestApp;
use uuid::Uuid;

// --- Helpers ---

fn parts_with(name: header::HeaderName, value: &str) -> Parts {
    let (parts, _) = Request::builder().uri("/api/pages").header(name, value).body(()).unwrap().into_parts();
    parts
}

fn bearer(token: &str) -> Parts {
    parts_with(header::AUTHORIZATION, &format!("Bearer {token}"))
}

async fn extract(app: &TestApp, mut parts: Parts) -> Result<AuthUser, AppError> {
    AuthUser::from_request_parts(&mut parts, &app.state).await
}

fn assert_unauthorized(result: Result<AuthUser, AppError>) {
    match result {
        Err(err) => assert_eq!(err.status(), StatusCode::UNAUTHORIZED),
        Ok(user) => panic!("expected 401, got user {}", user.email),
    }
}

// --- Token sources ---

#[tokio::test]
async fn test_bearer_token_resolves_user() {
    let app = TestApp::new();
    let user = app.seed_user("ops@cellemu.test", UserRole::Editor).await;
    let token = app.token_for(&user).await;

    let auth = extract(&app, bearer(&token)).await.unwrap();
    assert_eq!(auth.id, user.id);
    assert_eq!(auth.role, UserRole::Editor);
    assert!(!auth.is_admin());
}

#[tokio::test]
async fn test_session_cookie_resolves_user() {
    let app = TestApp::new();
    let user = app.seed_user("ops@cellemu.test", UserRole::Admin).await;
    let token = app.token_for(&user).await;

    let parts = parts_with(header::COOKIE, &format!("theme=dark; admin_token={token}"));
    let auth = extract(&app, parts).await.unwrap();
    assert_eq!(auth.email, "ops@cellemu.test");
}

#[tokio::test]
async fn test_missing_or_garbage_token_is_rejected() {
    let app = TestApp::new();
    let (parts, _) = Request::builder().uri("/api/pages").body(()).unwrap().into_parts();
    assert_unauthorized(extract(&app, parts).await);
    assert_unauthorized(extract(&app, bearer("abc.def.ghi")).await);
    assert_unauthorized(extract(&app, parts_with(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")).await);
}

#[tokio::test]
async fn test_token_signed_with_other_secret_is_rejected() {
    let app = TestApp::new();
    let user = app.seed_user("ops@cellemu.test", UserRole::Admin).await;
    let token = issue_token(user.id, Uuid::new_v4(), user.role, Utc::now() + Duration::hours(1), "another-secret").unwrap();
    assert_unauthorized(extract(&app, bearer(&token)).await);
}

// --- Session lifecycle ---

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let app = TestApp::new();
    let user = app.seed_user("ops@cellemu.test", UserRole::Admin).await;
    let now = Utc::now();
    let session = app
        .repo()
        .create_session(Session { id: Uuid::new_v4(), user_id: user.id, expires_at: now - Duration::hours(1), created_at: now })
        .await
        .unwrap();
    let token = issue_token(user.id, session.id, user.role, session.expires_at, &app.state.config.jwt_secret).unwrap();

    assert_unauthorized(extract(&app, bearer(&token)).await);
}

#[tokio::test]
async fn test_deleted_session_is_rejected() {
    let app = TestApp::new();
    let user = app.seed_user("ops@cellemu.test", UserRole::Admin).await;
    let token = app.token_for(&user).await;
    let auth = extract(&app, bearer(&token)).await.unwrap();

    assert!(app.repo().delete_session(auth.session_id).await.unwrap());
    assert_unauthorized(extract(&app, bearer(&token)).await);
}

#[tokio::test]
async fn test_token_for_foreign_session_is_rejected() {
    let app = TestApp::new();
    let alice = app.seed_user("alice@cellemu.test", UserRole::Editor).await;
    let bob = app.seed_user("bob@cellemu.test", UserRole::Admin).await;
    let alice_token = app.token_for(&alice).await;
    let session_id = extract(&app, bearer(&alice_token)).await.unwrap().session_id;

    // Bob's id on Alice's session.
    let forged = issue_token(bob.id, session_id, UserRole::Admin, Utc::now() + Duration::hours(1), &app.state.config.jwt_secret)
        .unwrap();
    assert_unauthorized(extract(&app, bearer(&forged)).await);
}

#[tokio::test]
async fn test_inactive_user_is_rejected() {
    let app = TestApp::new();
    let mut user = app.seed_user("ops@cellemu.test", UserRole::Admin).await;
    let token = app.token_for(&user).await;

    user.status = ActiveStatus::Inactive;
    app.repo().update_user(user).await.unwrap();

    assert_unauthorized(extract(&app, bearer(&token)).await);
}

// --- Roles ---

#[tokio::test]
async fn test_admin_extractor_requires_admin_role() {
    let app = TestApp::new();
    let editor = app.seed_user("editor@cellemu.test", UserRole::Editor).await;
    let admin = app.seed_user("admin@cellemu.test", UserRole::Admin).await;

    let mut parts = bearer(&app.token_for(&editor).await);
    let err = AdminUser::from_request_parts(&mut parts, &app.state).await.unwrap_err();
    assert_eq!(err.status(), StatusCode::FORBIDDEN);

    let mut parts = bearer(&app.token_for(&admin).await);
    let AdminUser(user) = AdminUser::from_request_parts(&mut parts, &app.state).await.unwrap();
    assert_eq!(user.id, admin.id);

    let (mut parts, _) = Request::builder().uri("/api/users").body(()).unwrap().into_parts();
    let err = AdminUser::from_request_parts(&mut parts, &app.state).await.unwrap_err();
    assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
}
