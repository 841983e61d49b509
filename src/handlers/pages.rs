use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use uuid::Uuid;

use super::{ValidJson, duplicate_slug, non_empty, resolve_slug, stamp_publication};
use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, AppResult, FieldError},
    models::{
        CreatePageRequest, ListFilter, Page, SectionContent, UpdatePageRequest, UpsertSectionRequest, is_valid_slug,
    },
    repository::api_limit,
};

const DEFAULT_TEMPLATE: &str = "default";

/// First path segments owned by fixed routes. `/{slug}` never sees them.
const RESERVED_SLUGS: &[&str] =
    &["admin", "api", "api-docs", "contact", "faq", "health", "news", "products", "swagger-ui"];

fn ensure_routable(slug: &str, upload_prefix: &str) -> AppResult<()> {
    if RESERVED_SLUGS.contains(&slug) || slug == upload_prefix.trim_matches('/') {
        return Err(AppError::BadRequest(format!(
            "Slug '{slug}' is taken by a built-in route and can not be used for a page"
        )));
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/api/pages",
    tag = "pages",
    params(ListFilter),
    responses((status = 200, description = "Pages", body = [Page]))
)]
pub async fn list_pages(
    _user: AuthUser,
    State(state): State<AppState>,
    Query(mut filter): Query<ListFilter>,
) -> AppResult<Json<Vec<Page>>> {
    filter.limit = api_limit(filter.limit);
    Ok(Json(state.repo.list_pages(&filter).await?))
}

#[utoipa::path(
    get,
    path = "/api/pages/{id}",
    tag = "pages",
    responses((status = 200, description = "Page", body = Page), (status = 404, description = "Not found"))
)]
pub async fn get_page(_user: AuthUser, State(state): State<AppState>, Path(id): Path<Uuid>) -> AppResult<Json<Page>> {
    let page = state.repo.get_page(id).await?.ok_or(AppError::NotFound("Page"))?;
    Ok(Json(page))
}

/// create_page
///
/// [Authenticated Route] Creates a page. The slug is derived from the title when
/// omitted, must be unique among pages and must not collide with a built-in route.
#[utoipa::path(
    post,
    path = "/api/pages",
    tag = "pages",
    request_body = CreatePageRequest,
    responses(
        (status = 201, description = "Created", body = Page),
        (status = 400, description = "Validation failed, duplicate or reserved slug")
    )
)]
pub async fn create_page(
    _user: AuthUser,
    State(state): State<AppState>,
    ValidJson(req): ValidJson<CreatePageRequest>,
) -> AppResult<(StatusCode, Json<Page>)> {
    let slug = resolve_slug(req.slug, &req.title)?;
    ensure_routable(&slug, &state.config.upload_url_prefix)?;
    if state.repo.get_page_by_slug(&slug).await?.is_some() {
        return Err(duplicate_slug("page", &slug));
    }

    let now = Utc::now();
    let mut page = Page {
        id: Uuid::new_v4(),
        title: req.title.trim().to_string(),
        slug,
        content: req.content,
        excerpt: non_empty(req.excerpt),
        template: non_empty(req.template).unwrap_or_else(|| DEFAULT_TEMPLATE.to_string()),
        status: req.status,
        meta_title: non_empty(req.meta_title),
        meta_description: non_empty(req.meta_description),
        published_at: None,
        created_at: now,
        updated_at: now,
    };
    stamp_publication(page.status, &mut page.published_at);

    let page = state.repo.create_page(page).await?;
    tracing::info!(page_id = %page.id, slug = %page.slug, "page created");
    Ok((StatusCode::CREATED, Json(page)))
}

#[utoipa::path(
    put,
    path = "/api/pages/{id}",
    tag = "pages",
    request_body = UpdatePageRequest,
    responses(
        (status = 200, description = "Updated", body = Page),
        (status = 400, description = "Validation failed, duplicate or reserved slug"),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_page(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidJson(req): ValidJson<UpdatePageRequest>,
) -> AppResult<Json<Page>> {
    let mut page = state.repo.get_page(id).await?.ok_or(AppError::NotFound("Page"))?;

    if let Some(slug) = &req.slug {
        ensure_routable(slug, &state.config.upload_url_prefix)?;
        if state.repo.get_page_by_slug(slug).await?.is_some_and(|other| other.id != id) {
            return Err(duplicate_slug("page", slug));
        }
    }

    req.apply_to(&mut page);
    stamp_publication(page.status, &mut page.published_at);

    Ok(Json(state.repo.update_page(page).await?))
}

#[utoipa::path(
    delete,
    path = "/api/pages/{id}",
    tag = "pages",
    responses((status = 204, description = "Deleted"), (status = 404, description = "Not found"))
)]
pub async fn delete_page(_user: AuthUser, State(state): State<AppState>, Path(id): Path<Uuid>) -> AppResult<StatusCode> {
    if state.repo.delete_page(id).await? {
        tracing::info!(page_id = %id, "page deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("Page"))
    }
}

// --- Homepage sections ---

#[utoipa::path(
    get,
    path = "/api/sections",
    tag = "sections",
    responses((status = 200, description = "Homepage sections", body = [SectionContent]))
)]
pub async fn list_sections(_user: AuthUser, State(state): State<AppState>) -> AppResult<Json<Vec<SectionContent>>> {
    Ok(Json(state.repo.list_sections().await?))
}

#[utoipa::path(
    get,
    path = "/api/sections/{name}",
    tag = "sections",
    responses((status = 200, description = "Section", body = SectionContent), (status = 404, description = "Not found"))
)]
pub async fn get_section(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Json<SectionContent>> {
    let section = state.repo.get_section(&name).await?.ok_or(AppError::NotFound("Section"))?;
    Ok(Json(section))
}

/// upsert_section
///
/// [Authenticated Route] Creates or replaces the homepage block called `name`.
/// Section names follow the slug rules ("hero", "why-us").
#[utoipa::path(
    put,
    path = "/api/sections/{name}",
    tag = "sections",
    request_body = UpsertSectionRequest,
    responses((status = 200, description = "Saved", body = SectionContent), (status = 400, description = "Validation failed"))
)]
pub async fn upsert_section(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(name): Path<String>,
    ValidJson(req): ValidJson<UpsertSectionRequest>,
) -> AppResult<Json<SectionContent>> {
    if !is_valid_slug(&name) {
        return Err(AppError::Validation(vec![FieldError {
            field: "name".to_string(),
            message: "section names may only contain lowercase letters, digits and single hyphens".to_string(),
        }]));
    }

    let existing = state.repo.get_section(&name).await?;
    let section = SectionContent {
        id: existing.as_ref().map_or_else(Uuid::new_v4, |s| s.id),
        name,
        title: req.title.trim().to_string(),
        content: req.content,
        sort_order: req
            .sort_order
            .or(existing.as_ref().map(|s| s.sort_order))
            .unwrap_or_default(),
        is_active: req.is_active.or(existing.as_ref().map(|s| s.is_active)).unwrap_or(true),
        updated_at: Utc::now(),
    };

    Ok(Json(state.repo.upsert_section(section).await?))
}
