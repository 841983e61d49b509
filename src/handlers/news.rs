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
    error::{AppError, AppResult},
    models::{CreateNewsRequest, ListFilter, News, UpdateNewsRequest},
    repository::api_limit,
};

#[utoipa::path(
    get,
    path = "/api/news",
    tag = "news",
    params(ListFilter),
    responses((status = 200, description = "News posts, newest first", body = [News]))
)]
pub async fn list_news(
    _user: AuthUser,
    State(state): State<AppState>,
    Query(mut filter): Query<ListFilter>,
) -> AppResult<Json<Vec<News>>> {
    filter.limit = api_limit(filter.limit);
    Ok(Json(state.repo.list_news(&filter).await?))
}

#[utoipa::path(
    get,
    path = "/api/news/{id}",
    tag = "news",
    responses((status = 200, description = "News post", body = News), (status = 404, description = "Not found"))
)]
pub async fn get_news(_user: AuthUser, State(state): State<AppState>, Path(id): Path<Uuid>) -> AppResult<Json<News>> {
    let news = state.repo.get_news(id).await?.ok_or(AppError::NotFound("News"))?;
    Ok(Json(news))
}

/// create_news
///
/// [Authenticated Route] Creates a news post. An explicit `published_at` is kept as
/// given (backdating), otherwise it is stamped on first publication.
#[utoipa::path(
    post,
    path = "/api/news",
    tag = "news",
    request_body = CreateNewsRequest,
    responses(
        (status = 201, description = "Created", body = News),
        (status = 400, description = "Validation failed or duplicate slug")
    )
)]
pub async fn create_news(
    user: AuthUser,
    State(state): State<AppState>,
    ValidJson(req): ValidJson<CreateNewsRequest>,
) -> AppResult<(StatusCode, Json<News>)> {
    let slug = resolve_slug(req.slug, &req.title)?;
    if state.repo.get_news_by_slug(&slug).await?.is_some() {
        return Err(duplicate_slug("news post", &slug));
    }

    let now = Utc::now();
    let mut news = News {
        id: Uuid::new_v4(),
        title: req.title.trim().to_string(),
        slug,
        excerpt: non_empty(req.excerpt),
        content: req.content,
        cover_image: non_empty(req.cover_image),
        author: non_empty(req.author).or(Some(user.name)),
        tags: normalize_tags(req.tags),
        status: req.status,
        is_featured: req.is_featured,
        published_at: req.published_at,
        meta_title: non_empty(req.meta_title),
        meta_description: non_empty(req.meta_description),
        created_at: now,
        updated_at: now,
    };
    stamp_publication(news.status, &mut news.published_at);

    let news = state.repo.create_news(news).await?;
    tracing::info!(news_id = %news.id, slug = %news.slug, "news created");
    Ok((StatusCode::CREATED, Json(news)))
}

#[utoipa::path(
    put,
    path = "/api/news/{id}",
    tag = "news",
    request_body = UpdateNewsRequest,
    responses(
        (status = 200, description = "Updated", body = News),
        (status = 400, description = "Validation failed or duplicate slug"),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_news(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidJson(mut req): ValidJson<UpdateNewsRequest>,
) -> AppResult<Json<News>> {
    let mut news = state.repo.get_news(id).await?.ok_or(AppError::NotFound("News"))?;

    if let Some(slug) = &req.slug {
        if state.repo.get_news_by_slug(slug).await?.is_some_and(|other| other.id != id) {
            return Err(duplicate_slug("news post", slug));
        }
    }

    req.tags = req.tags.map(normalize_tags);
    req.apply_to(&mut news);
    stamp_publication(news.status, &mut news.published_at);

    Ok(Json(state.repo.update_news(news).await?))
}

#[utoipa::path(
    delete,
    path = "/api/news/{id}",
    tag = "news",
    responses((status = 204, description = "Deleted"), (status = 404, description = "Not found"))
)]
pub async fn delete_news(_user: AuthUser, State(state): State<AppState>, Path(id): Path<Uuid>) -> AppResult<StatusCode> {
    if state.repo.delete_news(id).await? {
        tracing::info!(news_id = %id, "news deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("News"))
    }
}

/// Trims tags, drops blanks and duplicates while keeping the author's order.
fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_string();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_trimmed_and_deduplicated() {
        let tags = vec![" bms ".to_string(), "".to_string(), "bms".to_string(), "ev".to_string()];
        assert_eq!(normalize_tags(tags), vec!["bms", "ev"]);
    }
}
