use axum::{Json, extract::State};

use crate::{AppState, auth::AuthUser, error::AppResult, models::DashboardStats};

/// get_stats
///
/// [Authenticated Route] Content counters and the number of unread contact messages.
#[utoipa::path(
    get,
    path = "/api/dashboard/stats",
    tag = "dashboard",
    responses((status = 200, description = "Counters", body = DashboardStats), (status = 401, description = "Not logged in"))
)]
pub async fn get_stats(_user: AuthUser, State(state): State<AppState>) -> AppResult<Json<DashboardStats>> {
    Ok(Json(state.repo.get_stats().await?))
}
