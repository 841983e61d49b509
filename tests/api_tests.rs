mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use cellemu_site::{
    MockMailer,
    models::{ContactSubmission, ContentStatus, Product},
    repository::DEFAULT_LIST_LIMIT,
};
use chrono::Utc;
use common::{PASSWORD, TestApp};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();
    let (status, body) = app.get_text("/health").await;
    assert_eq!(status, 200);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = TestApp::new();
    let response = app.send(Request::get("/health").body(Body::empty()).unwrap()).await;
    assert!(response.headers().contains_key("x-request-id"));
}

// --- Auth ---

#[tokio::test]
async fn test_login_sets_cookie_and_cookie_authenticates() {
    let app = TestApp::new();
    app.seed_user("ops@cellemu.test", cellemu_site::models::UserRole::Editor).await;

    let login = Request::post("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({"email": "OPS@cellemu.test", "password": PASSWORD}).to_string()))
        .unwrap();
    let response = app.send(login).await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("admin_token="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));

    let pair = cookie.split(';').next().unwrap().to_string();
    let me = Request::get("/api/auth/me").header(header::COOKIE, pair).body(Body::empty()).unwrap();
    assert_eq!(app.send(me).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_rejects_wrong_password() {
    let app = TestApp::new();
    app.seed_user("ops@cellemu.test", cellemu_site::models::UserRole::Editor).await;

    let (status, body) = app
        .json("POST", "/api/auth/login", None, Some(json!({"email": "ops@cellemu.test", "password": "nope-nope"})))
        .await;
    assert_eq!(status, 401);
    assert_eq!(body["error"], "Invalid email or password");
}

#[tokio::test]
async fn test_protected_routes_require_session() {
    let app = TestApp::new();
    for uri in ["/api/pages", "/api/products", "/api/dashboard/stats", "/api/auth/me", "/api/users"] {
        let (status, _) = app.json("GET", uri, None, None).await;
        assert_eq!(status, 401, "{uri} should require a session");
    }
    let (status, _) = app.json("GET", "/api/pages", Some("not-a-jwt"), None).await;
    assert_eq!(status, 401);
}

#[tokio::test]
async fn test_token_is_rejected_after_logout() {
    let app = TestApp::new();
    let token = app.admin_token().await;
    assert_eq!(app.json("GET", "/api/auth/me", Some(&token), None).await.0, 200);

    let (status, _) = app.json("POST", "/api/auth/logout", Some(&token), None).await;
    assert_eq!(status, 204);

    let (status, _) = app.json("GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, 401);
}

#[tokio::test]
async fn test_editor_cannot_manage_users() {
    let app = TestApp::new();
    let token = app.editor_token().await;

    let (status, body) = app.json("GET", "/api/users", Some(&token), None).await;
    assert_eq!(status, 403);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, _) = app
        .json(
            "PUT",
            "/api/settings/site",
            Some(&token),
            Some(json!({"site_name": "Hijacked"})),
        )
        .await;
    assert_eq!(status, 403);

    // Content is fine.
    let (status, _) = app.json("GET", "/api/pages", Some(&token), None).await;
    assert_eq!(status, 200);
}

// --- Content CRUD ---

#[tokio::test]
async fn test_created_page_is_retrievable() {
    let app = TestApp::new();
    let token = app.admin_token().await;

    let (status, created) = app
        .json(
            "POST",
            "/api/pages",
            Some(&token),
            Some(json!({"title": "Battery Emulation Solutions", "content": "<p>Hi</p>", "status": "published"})),
        )
        .await;
    assert_eq!(status, 201);
    assert_eq!(created["slug"], "battery-emulation-solutions");
    assert!(created["published_at"].is_string());

    let id = created["id"].as_str().unwrap();
    let (status, fetched) = app.json("GET", &format!("/api/pages/{id}"), Some(&token), None).await;
    assert_eq!(status, 200);
    assert_eq!(fetched["title"], "Battery Emulation Solutions");
}

#[tokio::test]
async fn test_invalid_payload_is_rejected_and_not_persisted() {
    let app = TestApp::new();
    let token = app.admin_token().await;

    let (status, body) = app
        .json("POST", "/api/products", Some(&token), Some(json!({"name": "", "slug": "Bad Slug"})))
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    let fields: Vec<&str> = body["details"].as_array().unwrap().iter().filter_map(|d| d["field"].as_str()).collect();
    assert!(fields.contains(&"name"));
    assert!(fields.contains(&"slug"));

    let (_, list) = app.json("GET", "/api/products", Some(&token), None).await;
    assert_eq!(list.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_malformed_json_is_a_bad_request() {
    let app = TestApp::new();
    let token = app.admin_token().await;
    let request = Request::post("/api/faq")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"question\": "))
        .unwrap();
    assert_eq!(app.send(request).await.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_duplicate_slug_is_rejected() {
    let app = TestApp::new();
    let token = app.admin_token().await;
    let payload = json!({"title": "Launch", "content": "Body", "slug": "launch"});

    assert_eq!(app.json("POST", "/api/news", Some(&token), Some(payload.clone())).await.0, 201);
    let (status, body) = app.json("POST", "/api/news", Some(&token), Some(payload)).await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "BAD_REQUEST");

    // The same slug is fine for another content type.
    let (status, _) = app.json("POST", "/api/pages", Some(&token), Some(json!({"title": "Launch"}))).await;
    assert_eq!(status, 201);
}

#[tokio::test]
async fn test_page_slug_cannot_shadow_built_in_routes() {
    let app = TestApp::new();
    let token = app.admin_token().await;

    // Derived from the title.
    let (status, body) = app.json("POST", "/api/pages", Some(&token), Some(json!({"title": "Products"}))).await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "BAD_REQUEST");
    let (status, _) =
        app.json("POST", "/api/pages", Some(&token), Some(json!({"title": "Files", "slug": "uploads"}))).await;
    assert_eq!(status, 400);

    let (status, page) = app.json("POST", "/api/pages", Some(&token), Some(json!({"title": "About"}))).await;
    assert_eq!(status, 201);
    let id = page["id"].as_str().unwrap();
    let (status, _) =
        app.json("PUT", &format!("/api/pages/{id}"), Some(&token), Some(json!({"slug": "news"}))).await;
    assert_eq!(status, 400);

    let (_, fetched) = app.json("GET", &format!("/api/pages/{id}"), Some(&token), None).await;
    assert_eq!(fetched["slug"], "about");
}

#[tokio::test]
async fn test_category_delete_is_refused_while_in_use() {
    let app = TestApp::new();
    let token = app.admin_token().await;

    let (_, parent) = app.json("POST", "/api/categories", Some(&token), Some(json!({"name": "Emulators"}))).await;
    let parent_id = parent["id"].as_str().unwrap().to_string();
    let (status, child) = app
        .json("POST", "/api/categories", Some(&token), Some(json!({"name": "High Voltage", "parent_id": parent_id})))
        .await;
    assert_eq!(status, 201);
    assert_eq!(child["level"], 1);

    let (status, _) = app.json("DELETE", &format!("/api/categories/{parent_id}"), Some(&token), None).await;
    assert_eq!(status, 400);

    let child_id = child["id"].as_str().unwrap().to_string();
    let (status, _) = app
        .json("POST", "/api/products", Some(&token), Some(json!({"name": "BE-1500", "category_id": child_id})))
        .await;
    assert_eq!(status, 201);
    let (status, _) = app.json("DELETE", &format!("/api/categories/{child_id}"), Some(&token), None).await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_navigation_reorder_is_all_or_nothing() {
    let app = TestApp::new();
    let token = app.admin_token().await;

    let (_, products) = app
        .json("POST", "/api/navigation", Some(&token), Some(json!({"label": "Products", "url": "/products"})))
        .await;
    let (_, news) = app
        .json("POST", "/api/navigation", Some(&token), Some(json!({"label": "News", "url": "/news"})))
        .await;
    assert_eq!(news["sort_order"], 1);

    let batch = json!({"items": [
        {"id": news["id"], "parent_id": products["id"], "sort_order": 0},
        {"id": uuid::Uuid::new_v4(), "parent_id": null, "sort_order": 3}
    ]});
    let (status, _) = app.json("PUT", "/api/navigation/reorder", Some(&token), Some(batch)).await;
    assert_eq!(status, 400);

    let (_, tree) = app.json("GET", "/api/navigation/tree?location=header", None, None).await;
    assert_eq!(tree.as_array().unwrap().len(), 2, "nothing may have moved");

    let batch = json!({"items": [{"id": news["id"], "parent_id": products["id"], "sort_order": 0}]});
    let (status, _) = app.json("PUT", "/api/navigation/reorder", Some(&token), Some(batch)).await;
    assert_eq!(status, 204);

    let (_, tree) = app.json("GET", "/api/navigation/tree", None, None).await;
    assert_eq!(tree.as_array().unwrap().len(), 1);
    assert_eq!(tree[0]["children"][0]["label"], "News");
}

// --- Contact ---

#[tokio::test]
async fn test_contact_submission_notifies_sales() {
    let app = TestApp::new();
    let (status, body) = app
        .json(
            "POST",
            "/api/contact",
            None,
            Some(json!({"name": "Ada", "email": "ada@example.com", "message": "Please send a quote for the BE-500."})),
        )
        .await;
    assert_eq!(status, 201);
    assert_eq!(body["email_sent"], true);

    let sent = app.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "sales@localhost");
    assert_eq!(sent[0].reply_to.as_deref(), Some("ada@example.com"));
}

#[tokio::test]
async fn test_mail_failure_is_annotated_not_fatal() {
    let app = TestApp::with_mailer(MockMailer::new_failing());
    let (status, body) = app
        .json(
            "POST",
            "/api/contact",
            None,
            Some(json!({"name": "Ada", "email": "ada@example.com", "message": "Please send a quote for the BE-500."})),
        )
        .await;
    assert_eq!(status, 201);

    let stored: ContactSubmission = serde_json::from_value(body).unwrap();
    assert!(!stored.email_sent);
    assert!(stored.email_error.is_some());

    let token = app.admin_token().await;
    let (_, inbox) = app.json("GET", "/api/contact-submissions", Some(&token), None).await;
    assert_eq!(inbox[0]["email_sent"], false);
}

#[tokio::test]
async fn test_contact_validation() {
    let app = TestApp::new();
    let (status, _) = app
        .json("POST", "/api/contact", None, Some(json!({"name": "Ada", "email": "not-an-email", "message": "short"})))
        .await;
    assert_eq!(status, 400);
    assert!(app.mailer.sent().is_empty());
}

// --- Website & SEO ---

#[tokio::test]
async fn test_sitemap_lists_only_published_content() {
    let app = TestApp::new();
    let token = app.admin_token().await;
    app.json("POST", "/api/pages", Some(&token), Some(json!({"title": "Services", "status": "published"}))).await;
    app.json("POST", "/api/pages", Some(&token), Some(json!({"title": "Secret Draft"}))).await;
    app.json("POST", "/api/products", Some(&token), Some(json!({"name": "BE-500", "status": "published"}))).await;

    let (status, xml) = app.get_text("/sitemap.xml").await;
    assert_eq!(status, 200);
    assert!(xml.contains("<loc>http://localhost:3000/services</loc>"));
    assert!(xml.contains("<loc>http://localhost:3000/products/be-500</loc>"));
    assert!(!xml.contains("secret-draft"));
}

#[tokio::test]
async fn test_sitemap_is_not_cut_at_the_api_page_size() {
    let app = TestApp::new();
    let now = Utc::now();
    let total = DEFAULT_LIST_LIMIT + 1;
    for i in 0..total {
        app.repo()
            .create_product(Product {
                id: Uuid::new_v4(),
                name: format!("Cell module {i}"),
                slug: format!("cell-module-{i}"),
                status: ContentStatus::Published,
                created_at: now,
                updated_at: now,
                ..Default::default()
            })
            .await
            .unwrap();
    }

    let (status, xml) = app.get_text("/sitemap.xml").await;
    assert_eq!(status, 200);
    assert_eq!(xml.matches("<loc>http://localhost:3000/products/cell-module-").count() as i64, total);

    // The JSON list endpoint still pages.
    let token = app.editor_token().await;
    let (status, listed) = app.json("GET", "/api/products", Some(&token), None).await;
    assert_eq!(status, 200);
    assert_eq!(listed.as_array().unwrap().len() as i64, DEFAULT_LIST_LIMIT);
    let (_, listed) = app.json("GET", "/api/products?limit=10", Some(&token), None).await;
    assert_eq!(listed.as_array().unwrap().len(), 10);
}

#[tokio::test]
async fn test_category_page_includes_subcategory_products() {
    let app = TestApp::new();
    let token = app.admin_token().await;
    let (_, emulators) = app.json("POST", "/api/categories", Some(&token), Some(json!({"name": "Emulators"}))).await;
    let (_, high_voltage) = app
        .json(
            "POST",
            "/api/categories",
            Some(&token),
            Some(json!({"name": "High Voltage", "parent_id": emulators["id"]})),
        )
        .await;
    for (name, category) in [("BE-1500", &high_voltage["id"]), ("BE-500", &emulators["id"])] {
        let (status, _) = app
            .json(
                "POST",
                "/api/products",
                Some(&token),
                Some(json!({"name": name, "category_id": category, "status": "published"})),
            )
            .await;
        assert_eq!(status, 201);
    }
    app.json("POST", "/api/products", Some(&token), Some(json!({"name": "Cycler", "status": "published"}))).await;

    let (status, html) = app.get_text("/products/category/emulators").await;
    assert_eq!(status, 200);
    assert!(html.contains("href=\"/products/be-1500\""));
    assert!(html.contains("href=\"/products/be-500\""));
    assert!(!html.contains("href=\"/products/cycler\""));

    let (_, html) = app.get_text("/products/category/high-voltage").await;
    assert!(html.contains("href=\"/products/be-1500\""));
    assert!(!html.contains("href=\"/products/be-500\""));
}

#[tokio::test]
async fn test_robots_default_and_override() {
    let app = TestApp::new();
    let (status, robots) = app.get_text("/robots.txt").await;
    assert_eq!(status, 200);
    assert!(robots.contains("Disallow: /admin"));
    assert!(robots.contains("Sitemap: http://localhost:3000/sitemap.xml"));

    let token = app.admin_token().await;
    let (status, _) = app
        .json("PUT", "/api/settings/seo", Some(&token), Some(json!({"robots_txt": "User-agent: *\nDisallow: /"})))
        .await;
    assert_eq!(status, 200);
    let (_, robots) = app.get_text("/robots.txt").await;
    assert_eq!(robots, "User-agent: *\nDisallow: /");
}

#[tokio::test]
async fn test_public_pages_hide_drafts() {
    let app = TestApp::new();
    let token = app.admin_token().await;
    app.json("POST", "/api/pages", Some(&token), Some(json!({"title": "Terms", "content": "<p>Legal</p>", "status": "published"})))
        .await;
    app.json("POST", "/api/pages", Some(&token), Some(json!({"title": "Solutions", "content": "<p>Soon</p>"}))).await;

    let (status, html) = app.get_text("/terms").await;
    assert_eq!(status, 200);
    assert!(html.contains("<p>Legal</p>"));
    assert!(html.contains("<title>Terms | CellEmu</title>"));

    let (status, html) = app.get_text("/solutions").await;
    assert_eq!(status, 404);
    assert!(html.contains("Page not found"));

    let (status, _) = app.get_text("/products/does-not-exist").await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_homepage_renders_sections_and_featured_products() {
    let app = TestApp::new();
    let token = app.admin_token().await;
    app.json(
        "PUT",
        "/api/sections/hero",
        Some(&token),
        Some(json!({"title": "Emulate any battery", "content": {"subtitle": "From cell to pack"}})),
    )
    .await;
    app.json(
        "POST",
        "/api/products",
        Some(&token),
        Some(json!({"name": "BE-500", "summary": "Compact emulator", "status": "published", "is_featured": true})),
    )
    .await;

    let (status, html) = app.get_text("/").await;
    assert_eq!(status, 200);
    assert!(html.contains("Emulate any battery"));
    assert!(html.contains("From cell to pack"));
    assert!(html.contains("href=\"/products/be-500\""));
}

#[tokio::test]
async fn test_admin_shell_redirects_without_session() {
    let app = TestApp::new();
    for uri in ["/admin", "/admin/products"] {
        let response = app.send(Request::get(uri).body(Body::empty()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(response.headers()[header::LOCATION], "/admin/login");
    }
    let (status, html) = app.get_text("/admin/login").await;
    assert_eq!(status, 200);
    assert!(html.contains("login-form"));
}

#[tokio::test]
async fn test_unknown_api_route_is_json_404() {
    let app = TestApp::new();
    let (status, body) = app.json("GET", "/api/does/not/exist", None, None).await;
    assert_eq!(status, 404);
    assert_eq!(body["code"], "NOT_FOUND");
}
