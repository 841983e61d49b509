use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::{
    config::{AppConfig, SESSION_COOKIE},
    error::{AppError, AppResult},
    models::{ActiveStatus, Session, User, UserRole},
    repository::RepositoryState,
};

pub mod jwt;
pub mod password;

pub use jwt::{Claims, decode_token, issue_token};
pub use password::{hash_password, verify_password};

/// Resolved admin session
///
/// The resolved identity of an authenticated request. Handlers take it as an argument
/// to require a valid session and to check the caller's role.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub session_id: Uuid,
    pub role: UserRole,
    pub email: String,
    pub name: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn require_admin(&self) -> AppResult<()> {
        if self.is_admin() { Ok(()) } else { Err(AppError::admin_only()) }
    }
}

/// Session extraction
///
/// 1. Token extraction: `Authorization: Bearer` header, else the `admin_token` cookie.
/// 2. Token validation: HS256 signature and expiry.
/// 3. Session lookup: the `sid` must still exist and be unexpired (logout deletes it).
/// 4. User lookup: the user must exist and be active.
///
/// Rejection: `AppError::Unauthorized` (401 JSON) on any failure.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);
        authenticate(&parts.headers, &repo, &config).await
    }
}

/// AdminUser
///
/// Like [`AuthUser`] but additionally requires the `admin` role (403 otherwise).
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        user.require_admin()?;
        Ok(AdminUser(user))
    }
}

/// Resolves the caller's identity from request headers.
pub async fn authenticate(headers: &HeaderMap, repo: &RepositoryState, config: &AppConfig) -> AppResult<AuthUser> {
    let token = token_from_headers(headers).ok_or_else(AppError::unauthorized)?;

    let claims = decode_token(&token, &config.jwt_secret).map_err(|e| {
        tracing::debug!(error = %e, "rejected session token");
        AppError::Unauthorized("Invalid or expired session".to_string())
    })?;

    let session = repo
        .get_session(claims.sid)
        .await?
        .filter(|s| s.user_id == claims.sub && s.expires_at > Utc::now())
        .ok_or_else(|| AppError::Unauthorized("Session has ended".to_string()))?;

    let user = repo
        .get_user(session.user_id)
        .await?
        .filter(User::is_active)
        .ok_or_else(|| AppError::Unauthorized("Account is not active".to_string()))?;

    Ok(AuthUser {
        id: user.id,
        session_id: session.id,
        role: user.role,
        email: user.email,
        name: user.name,
    })
}

/// Bearer token if present, otherwise the session cookie.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty());

    bearer.or_else(|| cookie_value(headers, SESSION_COOKIE))
}

/// Reads one cookie from every `Cookie` header on the request.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

/// Creates a session row for `user` and signs a token bound to it.
pub async fn start_session(repo: &RepositoryState, config: &AppConfig, user: &User) -> AppResult<(String, Session)> {
    let now = Utc::now();
    let session = repo
        .create_session(Session {
            id: Uuid::new_v4(),
            user_id: user.id,
            expires_at: now + Duration::hours(config.session_ttl_hours),
            created_at: now,
        })
        .await?;

    let token = issue_token(user.id, session.id, user.role, session.expires_at, &config.jwt_secret)
        .map_err(|e| AppError::Internal(format!("token signing failed: {e}")))?;

    Ok((token, session))
}

/// `Set-Cookie` value carrying a fresh session token.
pub fn session_cookie(token: &str, config: &AppConfig) -> String {
    let max_age = config.session_ttl_hours * 3600;
    let secure = if config.secure_cookies() { "; Secure" } else { "" };
    format!("{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={max_age}{secure}")
}

/// `Set-Cookie` value that expires the session cookie.
pub fn clear_session_cookie(config: &AppConfig) -> String {
    let secure = if config.secure_cookies() { "; Secure" } else { "" };
    format!("{SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0{secure}")
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Creates the first administrator from `ADMIN_EMAIL` / `ADMIN_PASSWORD` when the
/// users table is empty. Returns the created user, if any.
pub async fn ensure_bootstrap_admin(repo: &RepositoryState, config: &AppConfig) -> AppResult<Option<User>> {
    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        return Ok(None);
    };
    if repo.count_users().await? > 0 {
        return Ok(None);
    }

    let password_hash =
        hash_password(password).map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))?;
    let now = Utc::now();
    let user = repo
        .create_user(User {
            id: Uuid::new_v4(),
            email: normalize_email(email),
            name: "Administrator".to_string(),
            password_hash,
            role: UserRole::Admin,
            status: ActiveStatus::Active,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        })
        .await?;

    tracing::info!(email = %user.email, "bootstrap administrator created");
    Ok(Some(user))
}
