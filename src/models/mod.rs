//! Database rows, request payloads and response shapes.
//!
//! Every type here derives `TS` (exported for the admin client) and `ToSchema`
//! (OpenAPI), following one file per content area.

use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use validator::ValidationError;

pub mod contact;
pub mod faq;
pub mod media;
pub mod navigation;
pub mod news;
pub mod page;
pub mod product;
pub mod settings;
pub mod user;

pub use contact::*;
pub use faq::*;
pub use media::*;
pub use navigation::*;
pub use news::*;
pub use page::*;
pub use product::*;
pub use settings::*;
pub use user::*;

/// ContentStatus
///
/// Publication state shared by pages, products and news.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[ts(export)]
pub enum ContentStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

/// ActiveStatus
///
/// On/off switch for users and categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[ts(export)]
pub enum ActiveStatus {
    #[default]
    Active,
    Inactive,
}

/// ListFilter
///
/// Common query parameters accepted by the admin list endpoints.
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
pub struct ListFilter {
    /// Only rows in this publication state.
    pub status: Option<ContentStatus>,
    /// Case-insensitive substring match on the title or name.
    pub search: Option<String>,
    /// Maximum number of rows to return.
    pub limit: Option<i64>,
}

/// DashboardStats
///
/// Counters for the admin dashboard (GET /api/dashboard/stats).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, TS, ToSchema)]
#[ts(export)]
pub struct DashboardStats {
    pub pages: i64,
    pub products: i64,
    pub categories: i64,
    pub news: i64,
    pub media: i64,
    pub faqs: i64,
    pub users: i64,
    pub unread_contacts: i64,
}

/// Deserializes a field that distinguishes "absent" (`None`) from an explicit
/// `null` (`Some(None)`), so a PUT can clear a nullable column.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Validator hook: slugs are lowercase ASCII words joined by single hyphens.
pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if is_valid_slug(slug) {
        Ok(())
    } else {
        let mut err = ValidationError::new("slug");
        err.message = Some("slug may only contain lowercase letters, digits and single hyphens".into());
        Err(err)
    }
}

pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= 200
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

/// Derives a slug from free text: lowercase ASCII alphanumerics, with every run of
/// other characters collapsed to one hyphen.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug.truncate(200);
    slug.trim_end_matches('-').to_string()
}
