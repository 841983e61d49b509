use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::{ActiveStatus, ContentStatus, double_option, validate_slug};

/// Category
///
/// A node of the product category hierarchy. `level` is derived from the parent
/// chain (root = 0) and is maintained by the handlers, never taken from input.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
    pub level: i32,
    pub sort_order: i32,
    pub status: ActiveStatus,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// CategoryNode
///
/// Nested category returned by GET /api/categories/tree.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct CategoryNode {
    #[serde(flatten)]
    pub category: Category,
    #[schema(no_recursion)]
    pub children: Vec<CategoryNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 120, message = "name must be 1-120 characters"))]
    pub name: String,
    #[validate(custom(function = "validate_slug"))]
    pub slug: Option<String>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
    // Appended after the last sibling when omitted.
    #[validate(range(min = 0))]
    pub sort_order: Option<i32>,
    #[serde(default)]
    pub status: ActiveStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 120, message = "name must be 1-120 characters"))]
    pub name: Option<String>,
    #[validate(custom(function = "validate_slug"))]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    #[ts(type = "string | null")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Uuid>)]
    #[ts(type = "string | null")]
    pub parent_id: Option<Option<Uuid>>,
    #[validate(range(min = 0))]
    pub sort_order: Option<i32>,
    pub status: Option<ActiveStatus>,
}

/// Product
///
/// A catalogue entry (battery emulator, cell simulator, accessory...).
/// `specifications` is a free JSON object rendered as a key/value table.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub category_id: Option<Uuid>,
    pub summary: Option<String>,
    pub description: String,
    #[schema(value_type = Object)]
    pub specifications: serde_json::Value,
    pub features: Vec<String>,
    pub images: Vec<String>,
    pub datasheet_url: Option<String>,
    pub status: ContentStatus,
    pub is_featured: bool,
    pub sort_order: i32,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// ProductFilter
///
/// Query parameters for GET /api/products and the public catalogue.
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
pub struct ProductFilter {
    pub status: Option<ContentStatus>,
    pub search: Option<String>,
    pub category_id: Option<Uuid>,
    /// Any of these categories; set by the category pages for a whole subtree.
    #[serde(skip)]
    pub category_ids: Option<Vec<Uuid>>,
    pub featured: Option<bool>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 200, message = "name must be 1-200 characters"))]
    pub name: String,
    #[validate(custom(function = "validate_slug"))]
    pub slug: Option<String>,
    pub category_id: Option<Uuid>,
    #[validate(length(max = 500))]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: String,
    #[schema(value_type = Option<Object>)]
    pub specifications: Option<serde_json::Value>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[validate(length(max = 500))]
    pub datasheet_url: Option<String>,
    #[serde(default)]
    pub status: ContentStatus,
    #[serde(default)]
    pub is_featured: bool,
    pub sort_order: Option<i32>,
    #[validate(length(max = 200))]
    pub meta_title: Option<String>,
    #[validate(length(max = 500))]
    pub meta_description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 200, message = "name must be 1-200 characters"))]
    pub name: Option<String>,
    #[validate(custom(function = "validate_slug"))]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Uuid>)]
    #[ts(type = "string | null")]
    pub category_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    #[ts(type = "string | null")]
    pub summary: Option<Option<String>>,
    pub description: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub specifications: Option<serde_json::Value>,
    pub features: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    #[ts(type = "string | null")]
    pub datasheet_url: Option<Option<String>>,
    pub status: Option<ContentStatus>,
    pub is_featured: Option<bool>,
    pub sort_order: Option<i32>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    #[ts(type = "string | null")]
    pub meta_title: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    #[ts(type = "string | null")]
    pub meta_description: Option<Option<String>>,
}

impl UpdateProductRequest {
    pub fn apply_to(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(slug) = self.slug {
            product.slug = slug;
        }
        if let Some(category_id) = self.category_id {
            product.category_id = category_id;
        }
        if let Some(summary) = self.summary {
            product.summary = summary;
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(specifications) = self.specifications {
            product.specifications = specifications;
        }
        if let Some(features) = self.features {
            product.features = features;
        }
        if let Some(images) = self.images {
            product.images = images;
        }
        if let Some(datasheet_url) = self.datasheet_url {
            product.datasheet_url = datasheet_url;
        }
        if let Some(status) = self.status {
            product.status = status;
        }
        if let Some(is_featured) = self.is_featured {
            product.is_featured = is_featured;
        }
        if let Some(sort_order) = self.sort_order {
            product.sort_order = sort_order;
        }
        if let Some(meta_title) = self.meta_title {
            product.meta_title = meta_title;
        }
        if let Some(meta_description) = self.meta_description {
            product.meta_description = meta_description;
        }
    }
}
