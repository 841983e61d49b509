use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use uuid::Uuid;

use super::ValidJson;
use crate::{
    AppState,
    auth::{AdminUser, hash_password, normalize_email},
    error::{AppError, AppResult},
    models::{ActiveStatus, CreateUserRequest, UpdateUserRequest, User, UserRole},
};

fn hash(password: &str) -> AppResult<String> {
    hash_password(password).map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

fn duplicate_email(email: &str) -> AppError {
    AppError::BadRequest(format!("A user with email '{email}' already exists"))
}

/// list_users
///
/// [Admin Route] Every admin-panel account. Password hashes are never serialized.
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    responses((status = 200, description = "Users", body = [User]), (status = 403, description = "Admin only"))
)]
pub async fn list_users(_admin: AdminUser, State(state): State<AppState>) -> AppResult<Json<Vec<User>>> {
    Ok(Json(state.repo.list_users().await?))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "users",
    responses((status = 200, description = "User", body = User), (status = 404, description = "Not found"))
)]
pub async fn get_user(_admin: AdminUser, State(state): State<AppState>, Path(id): Path<Uuid>) -> AppResult<Json<User>> {
    let user = state.repo.get_user(id).await?.ok_or(AppError::NotFound("User"))?;
    Ok(Json(user))
}

#[utoipa::path(
    post,
    path = "/api/users",
    tag = "users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Created", body = User),
        (status = 400, description = "Validation failed or email taken"),
        (status = 403, description = "Admin only")
    )
)]
pub async fn create_user(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    ValidJson(req): ValidJson<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    let email = normalize_email(&req.email);
    if state.repo.get_user_by_email(&email).await?.is_some() {
        return Err(duplicate_email(&email));
    }

    let now = Utc::now();
    let user = state
        .repo
        .create_user(User {
            id: Uuid::new_v4(),
            email,
            name: req.name.trim().to_string(),
            password_hash: hash(&req.password)?,
            role: req.role,
            status: ActiveStatus::Active,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        })
        .await?;

    tracing::info!(user_id = %user.id, created_by = %admin.id, role = ?user.role, "user created");
    Ok((StatusCode::CREATED, Json(user)))
}

/// update_user
///
/// [Admin Route] Partial update. A new password is re-hashed. Deactivating a user or
/// changing their password ends all of their sessions. Admins can not demote or
/// deactivate themselves.
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "users",
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated", body = User),
        (status = 400, description = "Validation failed, email taken or self-lockout"),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_user(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidJson(req): ValidJson<UpdateUserRequest>,
) -> AppResult<Json<User>> {
    let mut user = state.repo.get_user(id).await?.ok_or(AppError::NotFound("User"))?;

    if id == admin.id
        && (req.role.is_some_and(|r| r != UserRole::Admin) || req.status == Some(ActiveStatus::Inactive))
    {
        return Err(AppError::BadRequest(
            "You can not remove your own administrator access".to_string(),
        ));
    }

    if let Some(email) = &req.email {
        let email = normalize_email(email);
        if state.repo.get_user_by_email(&email).await?.is_some_and(|other| other.id != id) {
            return Err(duplicate_email(&email));
        }
        user.email = email;
    }
    if let Some(name) = &req.name {
        user.name = name.trim().to_string();
    }
    if let Some(role) = req.role {
        user.role = role;
    }
    if let Some(status) = req.status {
        user.status = status;
    }
    let password_changed = match &req.password {
        Some(password) => {
            user.password_hash = hash(password)?;
            true
        }
        None => false,
    };

    let user = state.repo.update_user(user).await?;

    if password_changed || !user.is_active() {
        let ended = state.repo.delete_user_sessions(user.id).await?;
        tracing::info!(user_id = %user.id, sessions = ended, "user sessions revoked");
    }
    Ok(Json(user))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "users",
    responses(
        (status = 204, description = "Deleted"),
        (status = 400, description = "Can not delete yourself"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_user(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if id == admin.id {
        return Err(AppError::BadRequest("You can not delete your own account".to_string()));
    }
    state.repo.delete_user_sessions(id).await?;
    if state.repo.delete_user(id).await? {
        tracing::info!(user_id = %id, deleted_by = %admin.id, "user deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("User"))
    }
}
