use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use uuid::Uuid;

use super::{ValidJson, non_empty};
use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, AppResult},
    models::{CreateFaqRequest, Faq, UpdateFaqRequest},
};

#[utoipa::path(
    get,
    path = "/api/faq",
    tag = "faq",
    responses((status = 200, description = "All FAQ entries, including inactive ones", body = [Faq]))
)]
pub async fn list_faqs(_user: AuthUser, State(state): State<AppState>) -> AppResult<Json<Vec<Faq>>> {
    Ok(Json(state.repo.list_faqs(false).await?))
}

#[utoipa::path(
    post,
    path = "/api/faq",
    tag = "faq",
    request_body = CreateFaqRequest,
    responses((status = 201, description = "Created", body = Faq), (status = 400, description = "Validation failed"))
)]
pub async fn create_faq(
    _user: AuthUser,
    State(state): State<AppState>,
    ValidJson(req): ValidJson<CreateFaqRequest>,
) -> AppResult<(StatusCode, Json<Faq>)> {
    let sort_order = match req.sort_order {
        Some(order) => order,
        None => state.repo.list_faqs(false).await?.iter().map(|f| f.sort_order + 1).max().unwrap_or(0),
    };

    let now = Utc::now();
    let faq = state
        .repo
        .create_faq(Faq {
            id: Uuid::new_v4(),
            question: req.question.trim().to_string(),
            answer: req.answer,
            category: non_empty(req.category),
            sort_order,
            is_active: req.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(faq)))
}

#[utoipa::path(
    put,
    path = "/api/faq/{id}",
    tag = "faq",
    request_body = UpdateFaqRequest,
    responses(
        (status = 200, description = "Updated", body = Faq),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_faq(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidJson(req): ValidJson<UpdateFaqRequest>,
) -> AppResult<Json<Faq>> {
    let mut faq = state.repo.get_faq(id).await?.ok_or(AppError::NotFound("FAQ"))?;
    req.apply_to(&mut faq);
    faq.category = non_empty(faq.category);
    Ok(Json(state.repo.update_faq(faq).await?))
}

#[utoipa::path(
    delete,
    path = "/api/faq/{id}",
    tag = "faq",
    responses((status = 204, description = "Deleted"), (status = 404, description = "Not found"))
)]
pub async fn delete_faq(_user: AuthUser, State(state): State<AppState>, Path(id): Path<Uuid>) -> AppResult<StatusCode> {
    if state.repo.delete_faq(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("FAQ"))
    }
}
