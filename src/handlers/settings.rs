use axum::{Json, extract::State};
use serde::{Serialize, de::DeserializeOwned};

use super::ValidJson;
use crate::{
    AppState,
    auth::{AdminUser, AuthUser},
    error::{AppError, AppResult},
    models::{SEO_SETTINGS_KEY, SITE_SETTINGS_KEY, SeoSettings, SiteSettings},
    repository::RepositoryState,
};

/// Reads a settings document, falling back to defaults when the row is missing or
/// no longer matches the current shape.
async fn load<T: DeserializeOwned + Default>(repo: &RepositoryState, key: &str) -> AppResult<T> {
    let Some(value) = repo.get_setting(key).await? else {
        return Ok(T::default());
    };
    Ok(serde_json::from_value(value).unwrap_or_else(|e| {
        tracing::warn!(key, error = %e, "stored settings are unreadable, using defaults");
        T::default()
    }))
}

async fn store<T: Serialize>(repo: &RepositoryState, key: &str, settings: &T) -> AppResult<()> {
    let value = serde_json::to_value(settings).map_err(|e| AppError::Internal(format!("settings encoding failed: {e}")))?;
    repo.put_setting(key, value).await
}

pub async fn load_site_settings(repo: &RepositoryState) -> AppResult<SiteSettings> {
    load(repo, SITE_SETTINGS_KEY).await
}

pub async fn load_seo_settings(repo: &RepositoryState) -> AppResult<SeoSettings> {
    load(repo, SEO_SETTINGS_KEY).await
}

#[utoipa::path(
    get,
    path = "/api/settings/site",
    tag = "settings",
    responses((status = 200, description = "Site settings", body = SiteSettings))
)]
pub async fn get_site_settings(_user: AuthUser, State(state): State<AppState>) -> AppResult<Json<SiteSettings>> {
    Ok(Json(load_site_settings(&state.repo).await?))
}

/// update_site_settings
///
/// [Admin Route] Replaces the site settings document. Fields left out of the body
/// take their default values.
#[utoipa::path(
    put,
    path = "/api/settings/site",
    tag = "settings",
    request_body = SiteSettings,
    responses(
        (status = 200, description = "Saved", body = SiteSettings),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Admin only")
    )
)]
pub async fn update_site_settings(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    ValidJson(settings): ValidJson<SiteSettings>,
) -> AppResult<Json<SiteSettings>> {
    store(&state.repo, SITE_SETTINGS_KEY, &settings).await?;
    tracing::info!(user_id = %admin.id, "site settings updated");
    Ok(Json(settings))
}

#[utoipa::path(
    get,
    path = "/api/settings/seo",
    tag = "settings",
    responses((status = 200, description = "SEO settings", body = SeoSettings))
)]
pub async fn get_seo_settings(_user: AuthUser, State(state): State<AppState>) -> AppResult<Json<SeoSettings>> {
    Ok(Json(load_seo_settings(&state.repo).await?))
}

#[utoipa::path(
    put,
    path = "/api/settings/seo",
    tag = "settings",
    request_body = SeoSettings,
    responses(
        (status = 200, description = "Saved", body = SeoSettings),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Admin only")
    )
)]
pub async fn update_seo_settings(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    ValidJson(settings): ValidJson<SeoSettings>,
) -> AppResult<Json<SeoSettings>> {
    store(&state.repo, SEO_SETTINGS_KEY, &settings).await?;
    tracing::info!(user_id = %admin.id, "seo settings updated");
    Ok(Json(settings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryRepository;
    use std::sync::Arc;

    #[tokio::test]
    async fn missing_or_stale_settings_fall_back_to_defaults() {
        let repo: RepositoryState = Arc::new(InMemoryRepository::new());
        assert_eq!(load_site_settings(&repo).await.unwrap(), SiteSettings::default());

        repo.put_setting(SEO_SETTINGS_KEY, serde_json::json!({"keywords": "not-a-list"})).await.unwrap();
        assert_eq!(load_seo_settings(&repo).await.unwrap(), SeoSettings::default());

        repo.put_setting(SITE_SETTINGS_KEY, serde_json::json!({"site_name": "Acme Power"})).await.unwrap();
        assert_eq!(load_site_settings(&repo).await.unwrap().site_name, "Acme Power");
    }
}
