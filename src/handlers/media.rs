use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use std::collections::BTreeMap;
use uuid::Uuid;

use super::{ValidJson, non_empty};
use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, AppResult},
    models::{
        CreateUsageRequest, MediaAsset, MediaDetail, MediaFilter, MediaUsage, MediaVersion, SetPropertiesRequest,
        UpdateMediaRequest, extension_for, resolve_mime, storage_key,
    },
    repository::api_limit,
    storage::StorageState,
};

/// A parsed upload form: the file plus the optional text fields.
#[derive(Debug, Default)]
struct UploadForm {
    file: Option<UploadedFile>,
    alt_text: Option<String>,
    title: Option<String>,
    folder: Option<String>,
    note: Option<String>,
}

#[derive(Debug)]
struct UploadedFile {
    original_name: String,
    mime_type: &'static str,
    bytes: Vec<u8>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart, max_bytes: usize) -> AppResult<Self> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "file" => {
                    let original_name = field.file_name().unwrap_or("upload").to_string();
                    let declared = field.content_type().map(str::to_string);
                    let bytes = field.bytes().await.map_err(|e| AppError::BadRequest(e.body_text()))?;

                    if bytes.is_empty() {
                        return Err(AppError::BadRequest("Uploaded file is empty".to_string()));
                    }
                    if bytes.len() > max_bytes {
                        return Err(AppError::BadRequest(format!(
                            "File exceeds the upload limit of {max_bytes} bytes"
                        )));
                    }
                    let mime_type = resolve_mime(declared.as_deref(), &original_name).ok_or_else(|| {
                        AppError::BadRequest(format!("File type of '{original_name}' is not allowed"))
                    })?;

                    form.file = Some(UploadedFile { original_name, mime_type, bytes: bytes.to_vec() });
                }
                "alt_text" | "title" | "folder" | "note" => {
                    let text = field.text().await.map_err(|e| AppError::BadRequest(e.body_text()))?;
                    let slot = match name.as_str() {
                        "alt_text" => &mut form.alt_text,
                        "title" => &mut form.title,
                        "folder" => &mut form.folder,
                        _ => &mut form.note,
                    };
                    *slot = non_empty(Some(text));
                }
                other => tracing::debug!(field = other, "ignoring unknown multipart field"),
            }
        }

        Ok(form)
    }

    fn take_file(&mut self) -> AppResult<UploadedFile> {
        self.file
            .take()
            .ok_or_else(|| AppError::BadRequest("Multipart field 'file' is required".to_string()))
    }
}

/// Writes `file` to storage under a fresh date-partitioned key and returns the key.
async fn store_file(storage: &StorageState, file: &UploadedFile) -> AppResult<String> {
    let key = storage_key(Utc::now(), Uuid::new_v4(), extension_for(file.mime_type));
    storage.put(&key, &file.bytes, file.mime_type).await?;
    Ok(key)
}

/// Removes an object whose database row could not be written.
async fn discard_file(storage: &StorageState, key: &str) {
    if let Err(e) = storage.delete(key).await {
        tracing::warn!(storage_key = key, error = %e, "could not remove orphaned upload");
    }
}

fn file_name_of(key: &str) -> String {
    key.rsplit('/').next().unwrap_or(key).to_string()
}

/// upload_media
///
/// [Authenticated Route] Multipart upload: a required `file` field plus optional
/// `alt_text`, `title` and `folder`. The MIME type is checked against the allow-list
/// (declared type first, then the file extension) and the upload becomes version 1.
#[utoipa::path(
    post,
    path = "/api/media/upload",
    tag = "media",
    request_body(content_type = "multipart/form-data", description = "file, alt_text, title, folder"),
    responses(
        (status = 201, description = "Uploaded", body = MediaAsset),
        (status = 400, description = "Missing file, disallowed type or too large")
    )
)]
pub async fn upload_media(
    user: AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<MediaAsset>)> {
    let mut form = UploadForm::read(multipart, state.config.max_upload_bytes).await?;
    let file = form.take_file()?;
    let key = store_file(&state.storage, &file).await?;

    let now = Utc::now();
    let asset = MediaAsset {
        id: Uuid::new_v4(),
        filename: file_name_of(&key),
        original_name: file.original_name.clone(),
        mime_type: file.mime_type.to_string(),
        size_bytes: file.bytes.len() as i64,
        url: state.storage.public_url(&key),
        storage_key: key.clone(),
        alt_text: form.alt_text,
        title: form.title,
        folder: form.folder,
        current_version: 1,
        uploaded_by: Some(user.id),
        created_at: now,
        updated_at: now,
    };
    let version = MediaVersion {
        id: Uuid::new_v4(),
        asset_id: asset.id,
        version: 1,
        storage_key: key.clone(),
        mime_type: asset.mime_type.clone(),
        size_bytes: asset.size_bytes,
        note: form.note,
        created_by: Some(user.id),
        created_at: now,
    };

    let asset = match state.repo.create_media(asset, version).await {
        Ok(asset) => asset,
        Err(e) => {
            discard_file(&state.storage, &key).await;
            return Err(e);
        }
    };

    tracing::info!(media_id = %asset.id, mime = %asset.mime_type, size = asset.size_bytes, "media uploaded");
    Ok((StatusCode::CREATED, Json(asset)))
}

#[utoipa::path(
    get,
    path = "/api/media",
    tag = "media",
    params(MediaFilter),
    responses((status = 200, description = "Media library, newest first", body = [MediaAsset]))
)]
pub async fn list_media(
    _user: AuthUser,
    State(state): State<AppState>,
    Query(mut filter): Query<MediaFilter>,
) -> AppResult<Json<Vec<MediaAsset>>> {
    filter.limit = api_limit(filter.limit);
    Ok(Json(state.repo.list_media(&filter).await?))
}

/// get_media
///
/// [Authenticated Route] The asset with its version history, usages and properties.
#[utoipa::path(
    get,
    path = "/api/media/{id}",
    tag = "media",
    responses((status = 200, description = "Media detail", body = MediaDetail), (status = 404, description = "Not found"))
)]
pub async fn get_media(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MediaDetail>> {
    let asset = state.repo.get_media(id).await?.ok_or(AppError::NotFound("Media"))?;
    let versions = state.repo.list_media_versions(id).await?;
    let usages = state.repo.list_media_usages(id).await?;
    let properties = state.repo.get_media_properties(id).await?;
    Ok(Json(MediaDetail { asset, versions, usages, properties }))
}

#[utoipa::path(
    patch,
    path = "/api/media/{id}",
    tag = "media",
    request_body = UpdateMediaRequest,
    responses((status = 200, description = "Updated", body = MediaAsset), (status = 404, description = "Not found"))
)]
pub async fn update_media(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidJson(req): ValidJson<UpdateMediaRequest>,
) -> AppResult<Json<MediaAsset>> {
    let mut asset = state.repo.get_media(id).await?.ok_or(AppError::NotFound("Media"))?;
    req.apply_to(&mut asset);
    asset.alt_text = non_empty(asset.alt_text);
    asset.title = non_empty(asset.title);
    asset.folder = non_empty(asset.folder);
    Ok(Json(state.repo.update_media(asset).await?))
}

/// delete_media
///
/// [Authenticated Route] Refused with 400 while the asset is still referenced.
/// Stored files of every version are removed after the row is gone; a failed file
/// removal is logged, not reported.
#[utoipa::path(
    delete,
    path = "/api/media/{id}",
    tag = "media",
    responses(
        (status = 204, description = "Deleted"),
        (status = 400, description = "Asset is still in use"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_media(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if state.repo.get_media(id).await?.is_none() {
        return Err(AppError::NotFound("Media"));
    }
    let usages = state.repo.count_media_usages(id).await?;
    if usages > 0 {
        return Err(AppError::BadRequest(format!("Media is still used in {usages} places")));
    }

    let versions = state.repo.list_media_versions(id).await?;
    state.repo.delete_media(id).await?;

    for version in &versions {
        if let Err(e) = state.storage.delete(&version.storage_key).await {
            tracing::warn!(media_id = %id, storage_key = %version.storage_key, error = %e, "stored file not removed");
        }
    }

    tracing::info!(media_id = %id, versions = versions.len(), "media deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/media/{id}/versions",
    tag = "media",
    responses((status = 200, description = "Versions, newest first", body = [MediaVersion]), (status = 404, description = "Not found"))
)]
pub async fn list_media_versions(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<MediaVersion>>> {
    if state.repo.get_media(id).await?.is_none() {
        return Err(AppError::NotFound("Media"));
    }
    Ok(Json(state.repo.list_media_versions(id).await?))
}

/// upload_media_version
///
/// [Authenticated Route] Replaces the file behind an asset. The previous file is kept
/// as an older version; the asset's URL moves to the new one.
#[utoipa::path(
    post,
    path = "/api/media/{id}/versions",
    tag = "media",
    request_body(content_type = "multipart/form-data", description = "file, note"),
    responses(
        (status = 201, description = "New version stored", body = MediaAsset),
        (status = 400, description = "Missing file, disallowed type or too large"),
        (status = 404, description = "Not found")
    )
)]
pub async fn upload_media_version(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<MediaAsset>)> {
    let mut asset = state.repo.get_media(id).await?.ok_or(AppError::NotFound("Media"))?;
    let mut form = UploadForm::read(multipart, state.config.max_upload_bytes).await?;
    let file = form.take_file()?;
    let key = store_file(&state.storage, &file).await?;

    let now = Utc::now();
    asset.current_version += 1;
    asset.filename = file_name_of(&key);
    asset.original_name = file.original_name.clone();
    asset.mime_type = file.mime_type.to_string();
    asset.size_bytes = file.bytes.len() as i64;
    asset.url = state.storage.public_url(&key);
    asset.storage_key = key.clone();
    asset.updated_at = now;

    let version = MediaVersion {
        id: Uuid::new_v4(),
        asset_id: id,
        version: asset.current_version,
        storage_key: key.clone(),
        mime_type: asset.mime_type.clone(),
        size_bytes: asset.size_bytes,
        note: form.note,
        created_by: Some(user.id),
        created_at: now,
    };

    let asset = match state.repo.add_media_version(asset, version).await {
        Ok(asset) => asset,
        Err(e) => {
            discard_file(&state.storage, &key).await;
            return Err(e);
        }
    };

    tracing::info!(media_id = %id, version = asset.current_version, "media version added");
    Ok((StatusCode::CREATED, Json(asset)))
}

#[utoipa::path(
    get,
    path = "/api/media/{id}/usages",
    tag = "media",
    responses((status = 200, description = "Usages", body = [MediaUsage]), (status = 404, description = "Not found"))
)]
pub async fn list_media_usages(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<MediaUsage>>> {
    if state.repo.get_media(id).await?.is_none() {
        return Err(AppError::NotFound("Media"));
    }
    Ok(Json(state.repo.list_media_usages(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/media/{id}/usages",
    tag = "media",
    request_body = CreateUsageRequest,
    responses((status = 201, description = "Usage recorded", body = MediaUsage), (status = 404, description = "Not found"))
)]
pub async fn create_media_usage(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidJson(req): ValidJson<CreateUsageRequest>,
) -> AppResult<(StatusCode, Json<MediaUsage>)> {
    if state.repo.get_media(id).await?.is_none() {
        return Err(AppError::NotFound("Media"));
    }
    let usage = state
        .repo
        .create_media_usage(MediaUsage {
            id: Uuid::new_v4(),
            asset_id: id,
            entity_type: req.entity_type.trim().to_string(),
            entity_id: req.entity_id,
            field: req.field.trim().to_string(),
            created_at: Utc::now(),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(usage)))
}

#[utoipa::path(
    delete,
    path = "/api/media/usages/{id}",
    tag = "media",
    responses((status = 204, description = "Usage removed"), (status = 404, description = "Not found"))
)]
pub async fn delete_media_usage(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if state.repo.delete_media_usage(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("Media usage"))
    }
}

/// set_media_properties
///
/// [Authenticated Route] Replaces the asset's free-form key/value properties.
#[utoipa::path(
    put,
    path = "/api/media/{id}/properties",
    tag = "media",
    request_body = SetPropertiesRequest,
    responses(
        (status = 200, description = "Properties saved", body = BTreeMap<String, String>),
        (status = 404, description = "Not found")
    )
)]
pub async fn set_media_properties(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidJson(req): ValidJson<SetPropertiesRequest>,
) -> AppResult<Json<BTreeMap<String, String>>> {
    if state.repo.get_media(id).await?.is_none() {
        return Err(AppError::NotFound("Media"));
    }
    let properties: BTreeMap<String, String> =
        req.properties.into_iter().map(|(k, v)| (k.trim().to_string(), v)).collect();
    state.repo.replace_media_properties(id, &properties).await?;
    Ok(Json(properties))
}
