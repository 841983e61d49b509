use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeMap;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::double_option;

/// MediaAsset
///
/// An uploaded file. `storage_key` points at the current version on disk and
/// `url` is the public address it is served from.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct MediaAsset {
    pub id: Uuid,
    pub filename: String,
    pub original_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub storage_key: String,
    pub url: String,
    pub alt_text: Option<String>,
    pub title: Option<String>,
    pub folder: Option<String>,
    pub current_version: i32,
    pub uploaded_by: Option<Uuid>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// MediaVersion
///
/// Every stored revision of an asset. Version 1 is the original upload.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct MediaVersion {
    pub id: Uuid,
    pub asset_id: Uuid,
    pub version: i32,
    pub storage_key: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub note: Option<String>,
    pub created_by: Option<Uuid>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// MediaUsage
///
/// Records that an entity references an asset (e.g. `product` / `images`).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct MediaUsage {
    pub id: Uuid,
    pub asset_id: Uuid,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub field: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct MediaProperty {
    pub asset_id: Uuid,
    pub key: String,
    pub value: String,
}

/// MediaDetail
///
/// Full view of one asset for the media library's detail panel.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct MediaDetail {
    #[serde(flatten)]
    pub asset: MediaAsset,
    pub versions: Vec<MediaVersion>,
    pub usages: Vec<MediaUsage>,
    pub properties: BTreeMap<String, String>,
}

/// MediaFilter
///
/// Query parameters for GET /api/media.
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
pub struct MediaFilter {
    pub folder: Option<String>,
    // e.g. "image/" to list only images.
    pub mime_prefix: Option<String>,
    pub search: Option<String>,
    pub limit: Option<i64>,
}

/// UpdateMediaRequest
///
/// Metadata edit for PATCH /api/media/{id}. File content changes go through versions.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct UpdateMediaRequest {
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    #[ts(type = "string | null")]
    pub alt_text: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    #[ts(type = "string | null")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    #[ts(type = "string | null")]
    pub folder: Option<Option<String>>,
}

impl UpdateMediaRequest {
    pub fn apply_to(self, asset: &mut MediaAsset) {
        if let Some(alt_text) = self.alt_text {
            asset.alt_text = alt_text;
        }
        if let Some(title) = self.title {
            asset.title = title;
        }
        if let Some(folder) = self.folder {
            asset.folder = folder;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate)]
#[ts(export)]
pub struct CreateUsageRequest {
    #[validate(length(min = 1, max = 60))]
    pub entity_type: String,
    pub entity_id: Uuid,
    #[validate(length(min = 1, max = 60))]
    pub field: String,
}

/// SetPropertiesRequest
///
/// Replaces the whole property map of an asset.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate)]
#[ts(export)]
pub struct SetPropertiesRequest {
    #[validate(custom(function = "validate_property_keys"))]
    pub properties: BTreeMap<String, String>,
}

fn validate_property_keys(properties: &BTreeMap<String, String>) -> Result<(), validator::ValidationError> {
    if properties.keys().all(|k| !k.trim().is_empty() && k.len() <= 100) {
        Ok(())
    } else {
        let mut err = validator::ValidationError::new("keys");
        err.message = Some("property keys must be 1-100 characters".into());
        Err(err)
    }
}

/// Builds the date-partitioned storage key `YYYY/MM/<uuid>.<ext>`.
pub fn storage_key(now: DateTime<Utc>, id: Uuid, extension: &str) -> String {
    format!("{}/{}.{}", now.format("%Y/%m"), id, extension)
}

/// MIME types accepted by the upload endpoint, with their canonical extension.
pub const ALLOWED_MIME_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
    ("image/svg+xml", "svg"),
    ("application/pdf", "pdf"),
    ("video/mp4", "mp4"),
    ("video/webm", "webm"),
];

/// Resolves the MIME type of an upload: the declared content type when it is one we
/// accept, otherwise a guess from the file extension.
pub fn resolve_mime(declared: Option<&str>, filename: &str) -> Option<&'static str> {
    if let Some(declared) = declared {
        let declared = declared.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
        if let Some((mime, _)) = ALLOWED_MIME_TYPES.iter().find(|(m, _)| *m == declared) {
            return Some(*mime);
        }
    }
    let ext = std::path::Path::new(filename)
        .extension()
        .and_then(std::ffi::OsStr::to_str)?
        .to_ascii_lowercase();
    let ext = if ext == "jpeg" { "jpg".to_string() } else { ext };
    ALLOWED_MIME_TYPES
        .iter()
        .find(|(_, e)| *e == ext)
        .map(|(m, _)| *m)
}

pub fn extension_for(mime: &str) -> &'static str {
    ALLOWED_MIME_TYPES
        .iter()
        .find(|(m, _)| *m == mime)
        .map(|(_, e)| *e)
        .unwrap_or("bin")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn storage_key_is_date_partitioned() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap();
        let id = Uuid::from_u128(7);
        assert_eq!(storage_key(at, id, "png"), format!("2024/03/{id}.png"));
    }

    #[test]
    fn mime_resolution_prefers_declared_type() {
        assert_eq!(resolve_mime(Some("image/png"), "photo.jpg"), Some("image/png"));
        assert_eq!(resolve_mime(Some("application/octet-stream"), "photo.JPEG"), Some("image/jpeg"));
        assert_eq!(resolve_mime(None, "datasheet.pdf"), Some("application/pdf"));
        assert_eq!(resolve_mime(Some("text/html"), "index.html"), None);
        assert_eq!(resolve_mime(None, "no-extension"), None);
    }
}
