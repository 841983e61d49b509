mod common;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use cellemu_site::{
    auth::{AdminUser, AuthUser},
    error::AppError,
    handlers::{ValidJson, catalog, navigation, news, users},
    models::{ContentStatus, User, UserRole},
};
use chrono::{TimeZone, Utc};
use common::TestApp;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use uuid::Uuid;

// --- Helpers ---

fn as_auth(user: &User) -> AuthUser {
    AuthUser {
        id: user.id,
        session_id: Uuid::new_v4(),
        role: user.role,
        email: user.email.clone(),
        name: user.name.clone(),
    }
}

fn body<T: DeserializeOwned>(value: Value) -> ValidJson<T> {
    ValidJson(serde_json::from_value(value).unwrap())
}

fn bad_request<T: std::fmt::Debug>(result: Result<T, AppError>) -> String {
    match result {
        Err(AppError::BadRequest(message)) => message,
        other => panic!("expected BadRequest, got {other:?}"),
    }
}

// --- Catalogue ---

#[tokio::test]
async fn test_moving_category_recomputes_levels() {
    let app = TestApp::new();
    let editor = as_auth(&app.seed_user("editor@cellemu.test", UserRole::Editor).await);
    let state = State(app.state.clone());

    let create = |name: &str, parent: Option<Uuid>| body(json!({"name": name, "parent_id": parent}));

    let (_, Json(emulators)) =
        catalog::create_category(editor.clone(), state.clone(), create("Emulators", None)).await.unwrap();
    let (_, Json(modules)) =
        catalog::create_category(editor.clone(), state.clone(), create("Modules", None)).await.unwrap();
    let (_, Json(cells)) =
        catalog::create_category(editor.clone(), state.clone(), create("Cell Modules", Some(modules.id))).await.unwrap();
    assert_eq!(cells.level, 1);

    // Emulators > Modules > Cell Modules
    let Json(moved) = catalog::update_category(
        editor.clone(),
        state.clone(),
        Path(modules.id),
        body(json!({"parent_id": emulators.id})),
    )
    .await
    .unwrap();
    assert_eq!(moved.level, 1);
    assert_eq!(moved.parent_id, Some(emulators.id));

    let cells = app.repo().get_category(cells.id).await.unwrap().unwrap();
    assert_eq!(cells.level, 2);

    // Back to the root.
    let Json(moved) =
        catalog::update_category(editor.clone(), state.clone(), Path(modules.id), body(json!({"parent_id": null})))
            .await
            .unwrap();
    assert_eq!(moved.level, 0);
    assert_eq!(app.repo().get_category(cells.id).await.unwrap().unwrap().level, 1);
}

#[tokio::test]
async fn test_category_cannot_move_below_its_descendant() {
    let app = TestApp::new();
    let editor = as_auth(&app.seed_user("editor@cellemu.test", UserRole::Editor).await);
    let state = State(app.state.clone());

    let (_, Json(root)) =
        catalog::create_category(editor.clone(), state.clone(), body(json!({"name": "Emulators"}))).await.unwrap();
    let (_, Json(child)) = catalog::create_category(
        editor.clone(),
        state.clone(),
        body(json!({"name": "Bidirectional", "parent_id": root.id})),
    )
    .await
    .unwrap();

    let message = bad_request(
        catalog::update_category(editor.clone(), state.clone(), Path(root.id), body(json!({"parent_id": child.id})))
            .await,
    );
    assert!(message.contains("descendants"));

    bad_request(
        catalog::update_category(editor.clone(), state.clone(), Path(root.id), body(json!({"parent_id": root.id})))
            .await,
    );
}

#[tokio::test]
async fn test_product_rejects_unknown_category_and_non_object_specs() {
    let app = TestApp::new();
    let editor = as_auth(&app.seed_user("editor@cellemu.test", UserRole::Editor).await);
    let state = State(app.state.clone());

    bad_request(
        catalog::create_product(
            editor.clone(),
            state.clone(),
            body(json!({"name": "BE-500", "category_id": Uuid::new_v4()})),
        )
        .await,
    );
    bad_request(
        catalog::create_product(editor.clone(), state.clone(), body(json!({"name": "BE-500", "specifications": [1, 2]})))
            .await,
    );

    let (status, Json(product)) = catalog::create_product(
        editor.clone(),
        state.clone(),
        body(json!({"name": "BE-500", "specifications": {"voltage": "0-60 V"}})),
    )
    .await
    .unwrap();
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(product.specifications["voltage"], "0-60 V");
}

// --- Navigation ---

#[tokio::test]
async fn test_navigation_parent_rules() {
    let app = TestApp::new();
    let editor = as_auth(&app.seed_user("editor@cellemu.test", UserRole::Editor).await);
    let state = State(app.state.clone());

    let (_, Json(products)) = navigation::create_navigation_item(
        editor.clone(),
        state.clone(),
        body(json!({"label": "Products", "url": "/products"})),
    )
    .await
    .unwrap();
    let (_, Json(emulators)) = navigation::create_navigation_item(
        editor.clone(),
        state.clone(),
        body(json!({"label": "Emulators", "url": "/products/category/emulators", "parent_id": products.id})),
    )
    .await
    .unwrap();

    // A footer entry can not hang below a header entry.
    bad_request(
        navigation::create_navigation_item(
            editor.clone(),
            state.clone(),
            body(json!({"label": "Imprint", "url": "/imprint", "location": "footer", "parent_id": products.id})),
        )
        .await,
    );

    // Cycles are refused.
    bad_request(
        navigation::update_navigation_item(
            editor.clone(),
            state.clone(),
            Path(products.id),
            body(json!({"parent_id": emulators.id})),
        )
        .await,
    );

    // Moves must keep parent and child in the same menu.
    let (_, Json(imprint)) = navigation::create_navigation_item(
        editor.clone(),
        state.clone(),
        body(json!({"label": "Imprint", "url": "/imprint", "location": "footer"})),
    )
    .await
    .unwrap();
    bad_request(
        navigation::update_navigation_item(
            editor.clone(),
            state.clone(),
            Path(imprint.id),
            body(json!({"parent_id": products.id})),
        )
        .await,
    );
    bad_request(
        navigation::update_navigation_item(
            editor.clone(),
            state.clone(),
            Path(emulators.id),
            body(json!({"location": "footer"})),
        )
        .await,
    );
    let message = bad_request(
        navigation::update_navigation_item(
            editor.clone(),
            state.clone(),
            Path(products.id),
            body(json!({"location": "footer"})),
        )
        .await,
    );
    assert!(message.contains("children"));
    bad_request(
        navigation::reorder_navigation(
            editor.clone(),
            state.clone(),
            body(json!({"items": [{"id": imprint.id, "parent_id": products.id, "sort_order": 0}]})),
        )
        .await,
    );
    let unchanged = app.repo().get_navigation_item(imprint.id).await.unwrap().unwrap();
    assert_eq!(unchanged.parent_id, None);

    // Changing menu and parent together is fine.
    let Json(moved) = navigation::update_navigation_item(
        editor.clone(),
        state.clone(),
        Path(imprint.id),
        body(json!({"location": "header", "parent_id": products.id})),
    )
    .await
    .unwrap();
    assert_eq!(moved.parent_id, Some(products.id));
    assert_eq!(app.repo().count_navigation_children(products.id).await.unwrap(), 2);

    // Parents with children stay.
    bad_request(navigation::delete_navigation_item(editor.clone(), state.clone(), Path(products.id)).await);
    assert_eq!(
        navigation::delete_navigation_item(editor.clone(), state.clone(), Path(emulators.id)).await.unwrap(),
        StatusCode::NO_CONTENT
    );
}

// --- News ---

#[tokio::test]
async fn test_news_backdating_and_author_default() {
    let app = TestApp::new();
    let editor = as_auth(&app.seed_user("press@cellemu.test", UserRole::Editor).await);
    let state = State(app.state.clone());
    let launched = Utc.with_ymd_and_hms(2023, 11, 14, 9, 0, 0).unwrap();

    let (_, Json(post)) = news::create_news(
        editor.clone(),
        state.clone(),
        body(json!({
            "title": "BE-500 launch",
            "content": "<p>Now shipping.</p>",
            "status": "published",
            "published_at": launched,
            "tags": [" launch ", "launch", "", "products"]
        })),
    )
    .await
    .unwrap();
    assert_eq!(post.published_at, Some(launched));
    assert_eq!(post.author.as_deref(), Some("press"));
    assert_eq!(post.tags, vec!["launch".to_string(), "products".to_string()]);

    // Republishing keeps the original date.
    let Json(post) = news::update_news(
        editor.clone(),
        state.clone(),
        Path(post.id),
        body(json!({"status": "draft"})),
    )
    .await
    .unwrap();
    assert_eq!(post.status, ContentStatus::Draft);
    let Json(post) =
        news::update_news(editor.clone(), state.clone(), Path(post.id), body(json!({"status": "published"})))
            .await
            .unwrap();
    assert_eq!(post.published_at, Some(launched));
}

#[tokio::test]
async fn test_publishing_without_date_stamps_now() {
    let app = TestApp::new();
    let editor = as_auth(&app.seed_user("press@cellemu.test", UserRole::Editor).await);
    let state = State(app.state.clone());
    let before = Utc::now();

    let (_, Json(post)) = news::create_news(
        editor.clone(),
        state.clone(),
        body(json!({"title": "Trade fair", "content": "See you in Munich."})),
    )
    .await
    .unwrap();
    assert_eq!(post.published_at, None);

    let Json(post) =
        news::update_news(editor, state, Path(post.id), body(json!({"status": "published"}))).await.unwrap();
    assert!(post.published_at.is_some_and(|at| at >= before));
}

// --- Users ---

#[tokio::test]
async fn test_admin_cannot_remove_own_access() {
    let app = TestApp::new();
    let admin = app.seed_user("admin@cellemu.test", UserRole::Admin).await;
    let me = AdminUser(as_auth(&admin));
    let state = State(app.state.clone());

    bad_request(users::delete_user(me.clone(), state.clone(), Path(admin.id)).await);
    bad_request(users::update_user(me.clone(), state.clone(), Path(admin.id), body(json!({"role": "editor"}))).await);
    bad_request(
        users::update_user(me.clone(), state.clone(), Path(admin.id), body(json!({"status": "inactive"}))).await,
    );

    // Renaming yourself is fine.
    let Json(renamed) =
        users::update_user(me, state, Path(admin.id), body(json!({"name": "Site Owner"}))).await.unwrap();
    assert_eq!(renamed.name, "Site Owner");
}

#[tokio::test]
async fn test_password_change_revokes_sessions() {
    let app = TestApp::new();
    let admin = app.seed_user("admin@cellemu.test", UserRole::Admin).await;
    let editor = app.seed_user("editor@cellemu.test", UserRole::Editor).await;
    let token = app.token_for(&editor).await;
    assert_eq!(app.json("GET", "/api/auth/me", Some(&token), None).await.0, 200);

    users::update_user(
        AdminUser(as_auth(&admin)),
        State(app.state.clone()),
        Path(editor.id),
        body(json!({"password": "a-brand-new-password"})),
    )
    .await
    .unwrap();

    assert_eq!(app.json("GET", "/api/auth/me", Some(&token), None).await.0, 401);
}

#[tokio::test]
async fn test_user_emails_are_unique_case_insensitively() {
    let app = TestApp::new();
    let admin = AdminUser(as_auth(&app.seed_user("admin@cellemu.test", UserRole::Admin).await));
    let state = State(app.state.clone());

    let (status, Json(created)) = users::create_user(
        admin.clone(),
        state.clone(),
        body(json!({"email": " Sales@CellEmu.test ", "name": "Sales", "password": "long-enough-pw", "role": "editor"})),
    )
    .await
    .unwrap();
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created.email, "sales@cellemu.test");

    bad_request(
        users::create_user(
            admin,
            state,
            body(json!({"email": "SALES@cellemu.test", "name": "Dup", "password": "long-enough-pw", "role": "editor"})),
        )
        .await,
    );
}
