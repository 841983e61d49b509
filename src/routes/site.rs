use crate::{AppState, site};
use axum::{Router, routing::get};

/// Site Router Module
///
/// Server-rendered HTML. Public pages only ever show published content; unknown
/// slugs render the HTML 404 page. The `/admin` shell redirects to the login page
/// when there is no valid session.
pub fn site_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(site::pages::home))
        .route("/products", get(site::pages::products))
        .route("/products/category/{slug}", get(site::pages::product_category))
        .route("/products/{slug}", get(site::pages::product_detail))
        .route("/news", get(site::pages::news_list))
        .route("/news/{slug}", get(site::pages::news_detail))
        .route("/faq", get(site::pages::faq))
        .route("/contact", get(site::pages::contact))
        // Any published page: /solutions, /services, /privacy-policy, /terms, ...
        .route("/{slug}", get(site::pages::page))
        // --- Admin shell ---
        .route("/admin/login", get(site::admin::login_page))
        .route("/admin", get(site::admin::dashboard))
        .route("/admin/{*path}", get(site::admin::section))
}
