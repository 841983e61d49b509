use cellemu_site::models::{
    ContactRequest, ContentStatus, CreateNavigationRequest, CreatePageRequest, CreateUserRequest, NavLocation, Page,
    ReorderNavigationRequest, SeoSettings, SetPropertiesRequest, SiteSettings, UpdatePageRequest, UpsertSectionRequest,
    UserRole, is_valid_slug, slugify,
};
use serde_json::json;
use validator::Validate;

// --- Slugs ---

#[test]
fn test_slugify_matches_slug_rules() {
    for title in ["Battery Emulators & Cyclers", "  BE-500 (v2)  ", "Über uns", "100% Li-Ion"] {
        let slug = slugify(title);
        assert!(is_valid_slug(&slug), "{title:?} produced invalid slug {slug:?}");
    }
    assert_eq!(slugify("Battery Emulators & Cyclers"), "battery-emulators-cyclers");
}

#[test]
fn test_invalid_slugs_fail_validation() {
    for slug in ["Upper", "two--dashes", "-lead", "trail-", "white space", ""] {
        let req: CreatePageRequest = serde_json::from_value(json!({"title": "About", "slug": slug})).unwrap();
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("slug"), "{slug:?} should be rejected");
    }
}

// --- Request payloads ---

#[test]
fn test_create_page_defaults() {
    let req: CreatePageRequest = serde_json::from_value(json!({"title": "About"})).unwrap();
    assert!(req.validate().is_ok());
    assert_eq!(req.status, ContentStatus::Draft);
    assert!(req.content.is_empty());
    assert!(req.slug.is_none());
}

#[test]
fn test_update_distinguishes_null_from_absent() {
    let mut page = Page {
        title: "About".into(),
        excerpt: Some("Who we are".into()),
        meta_title: Some("About CellEmu".into()),
        ..Default::default()
    };

    let req: UpdatePageRequest =
        serde_json::from_value(json!({"excerpt": null, "status": "published"})).unwrap();
    req.apply_to(&mut page);

    assert_eq!(page.excerpt, None, "explicit null clears");
    assert_eq!(page.meta_title.as_deref(), Some("About CellEmu"), "absent keeps");
    assert_eq!(page.status, ContentStatus::Published);
    assert_eq!(page.title, "About");
}

#[test]
fn test_contact_request_rules() {
    let ok: ContactRequest = serde_json::from_value(json!({
        "name": "Ada Lovelace",
        "email": "ada@example.com",
        "company": "Analytical Engines Ltd",
        "message": "We need a 1000 V emulator for inverter tests."
    }))
    .unwrap();
    assert!(ok.validate().is_ok());

    let bad: ContactRequest =
        serde_json::from_value(json!({"name": "", "email": "ada", "message": "hi"})).unwrap();
    let errors = bad.validate().unwrap_err();
    let fields = errors.field_errors();
    assert!(fields.contains_key("name"));
    assert!(fields.contains_key("email"));
    assert!(fields.contains_key("message"));
}

#[test]
fn test_user_request_rules() {
    let req: CreateUserRequest = serde_json::from_value(json!({
        "email": "editor@cellemu.test",
        "name": "Editor",
        "password": "short",
        "role": "admin"
    }))
    .unwrap();
    assert_eq!(req.role, UserRole::Admin);
    assert!(req.validate().unwrap_err().field_errors().contains_key("password"));

    let unknown_role = serde_json::from_value::<CreateUserRequest>(json!({
        "email": "editor@cellemu.test",
        "name": "Editor",
        "password": "long-enough",
        "role": "superuser"
    }));
    assert!(unknown_role.is_err());
}

#[test]
fn test_navigation_payloads() {
    let req: CreateNavigationRequest = serde_json::from_value(json!({"label": "News", "url": "/news"})).unwrap();
    assert!(req.validate().is_ok());
    assert_eq!(req.location, NavLocation::Header);

    let empty: ReorderNavigationRequest = serde_json::from_value(json!({"items": []})).unwrap();
    assert!(empty.validate().is_err());
}

#[test]
fn test_section_content_must_be_an_object() {
    let req: UpsertSectionRequest =
        serde_json::from_value(json!({"title": "Hero", "content": ["not", "an", "object"]})).unwrap();
    assert!(req.validate().unwrap_err().field_errors().contains_key("content"));

    let req: UpsertSectionRequest =
        serde_json::from_value(json!({"title": "Hero", "content": {"subtitle": "From cell to pack"}})).unwrap();
    assert!(req.validate().is_ok());
}

#[test]
fn test_property_keys_are_bounded() {
    let req: SetPropertiesRequest = serde_json::from_value(json!({"properties": {"": "blank key"}})).unwrap();
    assert!(req.validate().is_err());

    let req: SetPropertiesRequest = serde_json::from_value(json!({"properties": {"license": "CC-BY"}})).unwrap();
    assert!(req.validate().is_ok());
}

// --- Settings ---

#[test]
fn test_settings_validation() {
    let site: SiteSettings = serde_json::from_value(json!({
        "notification_email": "not-an-email",
        "social_links": [{"platform": "linkedin", "url": "notaurl"}]
    }))
    .unwrap();
    let errors = site.validate().unwrap_err();
    assert!(errors.errors().contains_key("notification_email"));
    assert!(errors.errors().contains_key("social_links"));

    assert!(SiteSettings::default().validate().is_ok());
    assert!(SeoSettings::default().validate().is_ok());
}

#[test]
fn test_seo_settings_round_trip_keeps_defaults() {
    let seo: SeoSettings = serde_json::from_value(json!({"google_analytics_id": "G-TEST123"})).unwrap();
    assert!(seo.sitemap_enabled);
    assert_eq!(seo.title_template, "{title} | CellEmu");
    assert_eq!(seo.google_analytics_id.as_deref(), Some("G-TEST123"));
}
