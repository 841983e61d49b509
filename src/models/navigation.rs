use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::double_option;

/// NavLocation
///
/// Which menu a navigation item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[ts(export)]
pub enum NavLocation {
    #[default]
    Header,
    Footer,
}

impl NavLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            NavLocation::Header => "header",
            NavLocation::Footer => "footer",
        }
    }
}

/// NavigationItem
///
/// Flat row of the `navigation_items` table; nesting is expressed through `parent_id`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct NavigationItem {
    pub id: Uuid,
    pub label: String,
    pub url: String,
    pub parent_id: Option<Uuid>,
    pub location: NavLocation,
    pub sort_order: i32,
    pub open_in_new_tab: bool,
    pub is_active: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// NavigationNode
///
/// Nested menu entry produced by the tree builder.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct NavigationNode {
    pub id: Uuid,
    pub label: String,
    pub url: String,
    pub open_in_new_tab: bool,
    pub sort_order: i32,
    #[schema(no_recursion)]
    pub children: Vec<NavigationNode>,
}

/// NavigationQuery
///
/// Query string for navigation listings (`?location=header`).
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
pub struct NavigationQuery {
    pub location: Option<NavLocation>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct CreateNavigationRequest {
    #[validate(length(min = 1, max = 80, message = "label must be 1-80 characters"))]
    pub label: String,
    #[validate(length(min = 1, max = 500, message = "url is required"))]
    pub url: String,
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub location: NavLocation,
    pub sort_order: Option<i32>,
    #[serde(default)]
    pub open_in_new_tab: bool,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct UpdateNavigationRequest {
    #[validate(length(min = 1, max = 80, message = "label must be 1-80 characters"))]
    pub label: Option<String>,
    #[validate(length(min = 1, max = 500, message = "url is required"))]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Uuid>)]
    #[ts(type = "string | null")]
    pub parent_id: Option<Option<Uuid>>,
    pub location: Option<NavLocation>,
    pub sort_order: Option<i32>,
    pub open_in_new_tab: Option<bool>,
    pub is_active: Option<bool>,
}

impl UpdateNavigationRequest {
    pub fn apply_to(self, item: &mut NavigationItem) {
        if let Some(label) = self.label {
            item.label = label;
        }
        if let Some(url) = self.url {
            item.url = url;
        }
        if let Some(parent_id) = self.parent_id {
            item.parent_id = parent_id;
        }
        if let Some(location) = self.location {
            item.location = location;
        }
        if let Some(sort_order) = self.sort_order {
            item.sort_order = sort_order;
        }
        if let Some(open_in_new_tab) = self.open_in_new_tab {
            item.open_in_new_tab = open_in_new_tab;
        }
        if let Some(is_active) = self.is_active {
            item.is_active = is_active;
        }
    }
}

/// ReorderItem
///
/// One entry of a batch reorder: the item's new parent and position.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct ReorderItem {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub sort_order: i32,
}

/// ReorderNavigationRequest
///
/// Payload for PUT /api/navigation/reorder. Applied all-or-nothing.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate)]
#[ts(export)]
pub struct ReorderNavigationRequest {
    #[validate(length(min = 1, message = "at least one item is required"))]
    pub items: Vec<ReorderItem>,
}
