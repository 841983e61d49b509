mod common;

use axum::{
    body::{Body, to_bytes},
    http::{Request, header},
};
use common::{TestApp, multipart_body};
use serde_json::{Value, json};

const BOUNDARY: &str = "cellemu-boundary-7MA4YWxkTrZu0gW";

// PNG signature only; uploads are never decoded.
const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfake-image-data";

async fn upload(
    app: &TestApp,
    uri: &str,
    token: &str,
    fields: &[(&str, &str)],
    file: Option<(&str, &str, &[u8])>,
) -> (u16, Value) {
    let request = Request::post(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(multipart_body(BOUNDARY, fields, file)))
        .unwrap();
    let response = app.send(request).await;
    let status = response.status().as_u16();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_upload_stores_file_and_first_version() {
    let app = TestApp::new();
    let token = app.editor_token().await;

    let (status, asset) = upload(
        &app,
        "/api/media/upload",
        &token,
        &[("alt_text", "BE-500 front panel"), ("folder", "products"), ("title", " ")],
        Some(("front.PNG", "image/png", PNG_BYTES)),
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(asset["mime_type"], "image/png");
    assert_eq!(asset["original_name"], "front.PNG");
    assert_eq!(asset["current_version"], 1);
    assert_eq!(asset["alt_text"], "BE-500 front panel");
    assert_eq!(asset["folder"], "products");
    assert!(asset["title"].is_null(), "blank form fields are stored as null");
    assert_eq!(asset["size_bytes"], PNG_BYTES.len());

    let key = asset["storage_key"].as_str().unwrap();
    assert!(key.ends_with(".png"));
    assert!(app.storage.contains(key));
    assert_eq!(asset["url"], format!("/uploads/{key}"));

    let id = asset["id"].as_str().unwrap();
    let (status, versions) = app.json("GET", &format!("/api/media/{id}/versions"), Some(&token), None).await;
    assert_eq!(status, 200);
    assert_eq!(versions.as_array().unwrap().len(), 1);
    assert_eq!(versions[0]["version"], 1);
}

#[tokio::test]
async fn test_upload_guesses_type_from_extension() {
    let app = TestApp::new();
    let token = app.editor_token().await;

    let (status, asset) = upload(
        &app,
        "/api/media/upload",
        &token,
        &[],
        Some(("datasheet.pdf", "application/octet-stream", b"%PDF-1.7 fake")),
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(asset["mime_type"], "application/pdf");
}

#[tokio::test]
async fn test_upload_rejects_bad_files() {
    let app = TestApp::new();
    let token = app.editor_token().await;

    let (status, body) =
        upload(&app, "/api/media/upload", &token, &[], Some(("tool.exe", "application/x-msdownload", b"MZ"))).await;
    assert_eq!(status, 400);
    assert!(body["error"].as_str().unwrap().contains("not allowed"));

    let (status, _) = upload(&app, "/api/media/upload", &token, &[], Some(("empty.png", "image/png", b""))).await;
    assert_eq!(status, 400);

    let (status, body) = upload(&app, "/api/media/upload", &token, &[("title", "No file")], None).await;
    assert_eq!(status, 400);
    assert!(body["error"].as_str().unwrap().contains("'file'"));

    assert!(app.storage.is_empty());
}

#[tokio::test]
async fn test_upload_requires_session() {
    let app = TestApp::new();
    let request = Request::post("/api/media/upload")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(multipart_body(BOUNDARY, &[], Some(("a.png", "image/png", PNG_BYTES)))))
        .unwrap();
    assert_eq!(app.send(request).await.status().as_u16(), 401);
    assert!(app.storage.is_empty());
}

#[tokio::test]
async fn test_new_version_moves_current_file() {
    let app = TestApp::new();
    let token = app.editor_token().await;

    let (_, asset) =
        upload(&app, "/api/media/upload", &token, &[], Some(("front.png", "image/png", PNG_BYTES))).await;
    let id = asset["id"].as_str().unwrap().to_string();
    let first_key = asset["storage_key"].as_str().unwrap().to_string();

    let (status, updated) = upload(
        &app,
        &format!("/api/media/{id}/versions"),
        &token,
        &[("note", "Retouched")],
        Some(("front-v2.webp", "image/webp", b"RIFF....WEBP")),
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(updated["current_version"], 2);
    assert_eq!(updated["mime_type"], "image/webp");
    assert_ne!(updated["storage_key"], first_key.as_str());

    // Both files are kept.
    assert!(app.storage.contains(&first_key));
    assert!(app.storage.contains(updated["storage_key"].as_str().unwrap()));

    let (_, detail) = app.json("GET", &format!("/api/media/{id}"), Some(&token), None).await;
    assert_eq!(detail["current_version"], 2);
    let versions = detail["versions"].as_array().unwrap();
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[0]["note"], "Retouched");
    assert_eq!(versions[1]["version"], 1);
}

#[tokio::test]
async fn test_version_upload_for_unknown_asset_is_404() {
    let app = TestApp::new();
    let token = app.editor_token().await;
    let uri = format!("/api/media/{}/versions", uuid::Uuid::new_v4());
    let (status, _) = upload(&app, &uri, &token, &[], Some(("a.png", "image/png", PNG_BYTES))).await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_delete_is_refused_while_in_use_then_removes_files() {
    let app = TestApp::new();
    let token = app.editor_token().await;

    let (_, asset) =
        upload(&app, "/api/media/upload", &token, &[], Some(("front.png", "image/png", PNG_BYTES))).await;
    let id = asset["id"].as_str().unwrap().to_string();
    upload(&app, &format!("/api/media/{id}/versions"), &token, &[], Some(("front.jpg", "image/jpeg", b"jpeg"))).await;
    assert_eq!(app.storage.len(), 2);

    let (status, usage) = app
        .json(
            "POST",
            &format!("/api/media/{id}/usages"),
            Some(&token),
            Some(json!({"entity_type": "product", "entity_id": uuid::Uuid::new_v4(), "field": "images"})),
        )
        .await;
    assert_eq!(status, 201);

    let (status, body) = app.json("DELETE", &format!("/api/media/{id}"), Some(&token), None).await;
    assert_eq!(status, 400);
    assert!(body["error"].as_str().unwrap().contains("still used"));
    assert_eq!(app.storage.len(), 2);

    let usage_id = usage["id"].as_str().unwrap();
    let (status, _) = app.json("DELETE", &format!("/api/media/usages/{usage_id}"), Some(&token), None).await;
    assert_eq!(status, 204);

    let (status, _) = app.json("DELETE", &format!("/api/media/{id}"), Some(&token), None).await;
    assert_eq!(status, 204);
    assert!(app.storage.is_empty());

    let (status, _) = app.json("GET", &format!("/api/media/{id}"), Some(&token), None).await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_metadata_and_properties() {
    let app = TestApp::new();
    let token = app.editor_token().await;

    let (_, asset) = upload(
        &app,
        "/api/media/upload",
        &token,
        &[("alt_text", "Old alt")],
        Some(("front.png", "image/png", PNG_BYTES)),
    )
    .await;
    let id = asset["id"].as_str().unwrap().to_string();

    let (status, updated) = app
        .json("PATCH", &format!("/api/media/{id}"), Some(&token), Some(json!({"alt_text": null, "title": "Front"})))
        .await;
    assert_eq!(status, 200);
    assert!(updated["alt_text"].is_null());
    assert_eq!(updated["title"], "Front");

    let (status, _) = app
        .json(
            "PUT",
            &format!("/api/media/{id}/properties"),
            Some(&token),
            Some(json!({"properties": {"photographer": "R. Weber", "license": "internal"}})),
        )
        .await;
    assert_eq!(status, 200);

    let (_, detail) = app.json("GET", &format!("/api/media/{id}"), Some(&token), None).await;
    assert_eq!(detail["properties"]["photographer"], "R. Weber");
    assert_eq!(detail["properties"].as_object().unwrap().len(), 2);
}
