use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::{ContentStatus, double_option, validate_slug};

/// Page
///
/// A free-form content page (solutions, services, legal pages, landing pages).
/// `content` is trusted HTML authored in the admin panel.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct Page {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    // Layout variant picked by the site renderer ("default", "wide", "legal").
    pub template: String,
    pub status: ContentStatus,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    #[ts(type = "string | null")]
    pub published_at: Option<DateTime<Utc>>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// CreatePageRequest
///
/// Input payload for POST /api/pages. The slug is derived from the title when omitted.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct CreatePageRequest {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: String,
    #[validate(custom(function = "validate_slug"))]
    pub slug: Option<String>,
    #[serde(default)]
    pub content: String,
    #[validate(length(max = 500))]
    pub excerpt: Option<String>,
    pub template: Option<String>,
    #[serde(default)]
    pub status: ContentStatus,
    #[validate(length(max = 200))]
    pub meta_title: Option<String>,
    #[validate(length(max = 500))]
    pub meta_description: Option<String>,
}

/// UpdatePageRequest
///
/// Partial update payload for PUT /api/pages/{id}. Absent fields are left untouched;
/// nullable fields accept an explicit `null` to clear them.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct UpdatePageRequest {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: Option<String>,
    #[validate(custom(function = "validate_slug"))]
    pub slug: Option<String>,
    pub content: Option<String>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    #[ts(type = "string | null")]
    pub excerpt: Option<Option<String>>,
    pub template: Option<String>,
    pub status: Option<ContentStatus>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    #[ts(type = "string | null")]
    pub meta_title: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    #[ts(type = "string | null")]
    pub meta_description: Option<Option<String>>,
}

impl UpdatePageRequest {
    /// Applies the present fields onto `page`.
    pub fn apply_to(self, page: &mut Page) {
        if let Some(title) = self.title {
            page.title = title;
        }
        if let Some(slug) = self.slug {
            page.slug = slug;
        }
        if let Some(content) = self.content {
            page.content = content;
        }
        if let Some(excerpt) = self.excerpt {
            page.excerpt = excerpt;
        }
        if let Some(template) = self.template {
            page.template = template;
        }
        if let Some(status) = self.status {
            page.status = status;
        }
        if let Some(meta_title) = self.meta_title {
            page.meta_title = meta_title;
        }
        if let Some(meta_description) = self.meta_description {
            page.meta_description = meta_description;
        }
    }
}

/// SectionContent
///
/// One editable block of the marketing homepage, addressed by its unique `name`
/// ("hero", "about", "features", ...). `content` is a free JSON object whose
/// well-known keys (`subtitle`, `body`, `image`, `cta_label`, `cta_url`) are
/// understood by the site renderer.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct SectionContent {
    pub id: Uuid,
    pub name: String,
    pub title: String,
    #[schema(value_type = Object)]
    pub content: serde_json::Value,
    pub sort_order: i32,
    pub is_active: bool,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// UpsertSectionRequest
///
/// Input payload for PUT /api/sections/{name}; creates the section if it does not exist.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct UpsertSectionRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[schema(value_type = Object)]
    #[validate(custom(function = "validate_json_object"))]
    pub content: serde_json::Value,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

fn validate_json_object(value: &serde_json::Value) -> Result<(), validator::ValidationError> {
    if value.is_object() {
        Ok(())
    } else {
        let mut err = validator::ValidationError::new("object");
        err.message = Some("content must be a JSON object".into());
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_requires_title_and_valid_slug() {
        let req = CreatePageRequest {
            title: String::new(),
            slug: Some("Not A Slug".to_string()),
            ..Default::default()
        };
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("slug"));
    }

    #[test]
    fn update_can_clear_excerpt() {
        let mut page = Page { excerpt: Some("old".into()), title: "Keep".into(), ..Default::default() };
        let patch: UpdatePageRequest = serde_json::from_str(r#"{"excerpt":null}"#).unwrap();
        patch.apply_to(&mut page);
        assert_eq!(page.excerpt, None);
        assert_eq!(page.title, "Keep");
    }

    #[test]
    fn section_content_must_be_object() {
        let req = UpsertSectionRequest {
            title: "Hero".into(),
            content: serde_json::json!(["not", "an", "object"]),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }
}
