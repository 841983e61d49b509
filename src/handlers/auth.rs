use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};

use super::ValidJson;
use crate::{
    AppState,
    auth::{self, AuthUser},
    error::{AppError, AppResult},
    models::{LoginRequest, LoginResponse, User},
};

/// login
///
/// [Public Route] Exchanges e-mail and password for a session. The token is returned
/// in the body and set as the `admin_token` cookie.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let invalid = || AppError::Unauthorized("Invalid email or password".to_string());

    let user = state
        .repo
        .get_user_by_email(&auth::normalize_email(&payload.email))
        .await?
        .ok_or_else(invalid)?;

    let matches = auth::verify_password(&payload.password, &user.password_hash).map_err(|e| {
        tracing::warn!(user_id = %user.id, error = %e, "stored password hash is unreadable");
        invalid()
    })?;
    if !matches || !user.is_active() {
        tracing::info!(user_id = %user.id, "login rejected");
        return Err(invalid());
    }

    let (token, session) = auth::start_session(&state.repo, &state.config, &user).await?;
    state.repo.touch_last_login(user.id).await?;
    tracing::info!(user_id = %user.id, session_id = %session.id, "login succeeded");

    let cookie = auth::session_cookie(&token, &state.config);
    let body = LoginResponse { user, token, expires_at: session.expires_at };
    Ok(([(header::SET_COOKIE, cookie)], Json(body)))
}

/// logout
///
/// [Public Route] Ends the current session, if any, and expires the cookie.
/// Always succeeds so a stale cookie can be cleared.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "auth",
    responses((status = 204, description = "Logged out"))
)]
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<impl IntoResponse> {
    if let Some(claims) = auth::token_from_headers(&headers).and_then(|t| auth::decode_token(&t, &state.config.jwt_secret).ok()) {
        state.repo.delete_session(claims.sid).await?;
        tracing::info!(user_id = %claims.sub, session_id = %claims.sid, "logged out");
    }
    let cookie = auth::clear_session_cookie(&state.config);
    Ok((StatusCode::NO_CONTENT, [(header::SET_COOKIE, cookie)]))
}

/// get_me
///
/// [Authenticated Route] Returns the account behind the current session.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn get_me(auth_user: AuthUser, State(state): State<AppState>) -> AppResult<Json<User>> {
    let user = state
        .repo
        .get_user(auth_user.id)
        .await?
        .ok_or_else(AppError::unauthorized)?;
    Ok(Json(user))
}
