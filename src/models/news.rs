use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::{ContentStatus, double_option, validate_slug};

/// News
///
/// A press release or blog-style announcement.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct News {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub cover_image: Option<String>,
    pub author: Option<String>,
    pub tags: Vec<String>,
    pub status: ContentStatus,
    pub is_featured: bool,
    #[ts(type = "string | null")]
    pub published_at: Option<DateTime<Utc>>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct CreateNewsRequest {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: String,
    #[validate(custom(function = "validate_slug"))]
    pub slug: Option<String>,
    #[validate(length(max = 500))]
    pub excerpt: Option<String>,
    #[validate(length(min = 1, message = "content is required"))]
    pub content: String,
    pub cover_image: Option<String>,
    #[validate(length(max = 120))]
    pub author: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub status: ContentStatus,
    #[serde(default)]
    pub is_featured: bool,
    // Backdating is allowed; defaults to the moment of first publication.
    #[ts(type = "string | null")]
    pub published_at: Option<DateTime<Utc>>,
    #[validate(length(max = 200))]
    pub meta_title: Option<String>,
    #[validate(length(max = 500))]
    pub meta_description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct UpdateNewsRequest {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: Option<String>,
    #[validate(custom(function = "validate_slug"))]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    #[ts(type = "string | null")]
    pub excerpt: Option<Option<String>>,
    #[validate(length(min = 1, message = "content is required"))]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    #[ts(type = "string | null")]
    pub cover_image: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    #[ts(type = "string | null")]
    pub author: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub status: Option<ContentStatus>,
    pub is_featured: Option<bool>,
    #[ts(type = "string | null")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    #[ts(type = "string | null")]
    pub meta_title: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    #[ts(type = "string | null")]
    pub meta_description: Option<Option<String>>,
}

impl UpdateNewsRequest {
    pub fn apply_to(self, news: &mut News) {
        if let Some(title) = self.title {
            news.title = title;
        }
        if let Some(slug) = self.slug {
            news.slug = slug;
        }
        if let Some(excerpt) = self.excerpt {
            news.excerpt = excerpt;
        }
        if let Some(content) = self.content {
            news.content = content;
        }
        if let Some(cover_image) = self.cover_image {
            news.cover_image = cover_image;
        }
        if let Some(author) = self.author {
            news.author = author;
        }
        if let Some(tags) = self.tags {
            news.tags = tags;
        }
        if let Some(status) = self.status {
            news.status = status;
        }
        if let Some(is_featured) = self.is_featured {
            news.is_featured = is_featured;
        }
        if let Some(published_at) = self.published_at {
            news.published_at = Some(published_at);
        }
        if let Some(meta_title) = self.meta_title {
            news.meta_title = meta_title;
        }
        if let Some(meta_description) = self.meta_description {
            news.meta_description = meta_description;
        }
    }
}
