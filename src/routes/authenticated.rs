use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, post, put},
};

/// Authenticated Router Module
///
/// The content-management API used by the admin panel. The router is wrapped in
/// the session middleware (see `create_router`), so every handler here runs for a
/// logged-in, active user; handlers that need the `admin` role additionally take
/// the `AdminUser` extractor.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /api/auth/me
        .route("/api/auth/me", get(handlers::auth::get_me))
        // --- Pages & homepage sections ---
        .route("/api/pages", get(handlers::pages::list_pages).post(handlers::pages::create_page))
        .route(
            "/api/pages/{id}",
            get(handlers::pages::get_page)
                .put(handlers::pages::update_page)
                .delete(handlers::pages::delete_page),
        )
        .route("/api/sections", get(handlers::pages::list_sections))
        // PUT creates the section when the name is new.
        .route(
            "/api/sections/{name}",
            get(handlers::pages::get_section).put(handlers::pages::upsert_section),
        )
        // --- Catalogue ---
        .route(
            "/api/categories",
            get(handlers::catalog::list_categories).post(handlers::catalog::create_category),
        )
        .route("/api/categories/tree", get(handlers::catalog::get_category_tree))
        // DELETE refuses categories that still hold subcategories or products.
        .route(
            "/api/categories/{id}",
            get(handlers::catalog::get_category)
                .put(handlers::catalog::update_category)
                .delete(handlers::catalog::delete_category),
        )
        .route(
            "/api/products",
            get(handlers::catalog::list_products).post(handlers::catalog::create_product),
        )
        .route(
            "/api/products/{id}",
            get(handlers::catalog::get_product)
                .put(handlers::catalog::update_product)
                .delete(handlers::catalog::delete_product),
        )
        // --- News ---
        .route("/api/news", get(handlers::news::list_news).post(handlers::news::create_news))
        .route(
            "/api/news/{id}",
            get(handlers::news::get_news)
                .put(handlers::news::update_news)
                .delete(handlers::news::delete_news),
        )
        // --- Navigation ---
        .route(
            "/api/navigation",
            get(handlers::navigation::list_navigation).post(handlers::navigation::create_navigation_item),
        )
        // PUT /api/navigation/reorder
        // Batch move; runs in one transaction and changes nothing if any entry is invalid.
        .route("/api/navigation/reorder", put(handlers::navigation::reorder_navigation))
        .route(
            "/api/navigation/{id}",
            put(handlers::navigation::update_navigation_item).delete(handlers::navigation::delete_navigation_item),
        )
        // --- Media library ---
        .route("/api/media", get(handlers::media::list_media))
        // POST /api/media/upload
        // Multipart upload; the body limit is raised for this router in `create_router`.
        .route("/api/media/upload", post(handlers::media::upload_media))
        .route("/api/media/usages/{id}", delete(handlers::media::delete_media_usage))
        .route(
            "/api/media/{id}",
            get(handlers::media::get_media)
                .patch(handlers::media::update_media)
                .delete(handlers::media::delete_media),
        )
        .route(
            "/api/media/{id}/versions",
            get(handlers::media::list_media_versions).post(handlers::media::upload_media_version),
        )
        .route(
            "/api/media/{id}/usages",
            get(handlers::media::list_media_usages).post(handlers::media::create_media_usage),
        )
        .route("/api/media/{id}/properties", put(handlers::media::set_media_properties))
        // --- FAQ ---
        .route("/api/faq", get(handlers::faq::list_faqs).post(handlers::faq::create_faq))
        .route("/api/faq/{id}", put(handlers::faq::update_faq).delete(handlers::faq::delete_faq))
        // --- Settings ---
        // Any user may read; PUT requires the admin role (enforced by the handler).
        .route(
            "/api/settings/site",
            get(handlers::settings::get_site_settings).put(handlers::settings::update_site_settings),
        )
        .route(
            "/api/settings/seo",
            get(handlers::settings::get_seo_settings).put(handlers::settings::update_seo_settings),
        )
        // --- Contact inbox ---
        .route("/api/contact-submissions", get(handlers::contact::list_contacts))
        .route(
            "/api/contact-submissions/{id}",
            axum::routing::patch(handlers::contact::update_contact_status).delete(handlers::contact::delete_contact),
        )
        // GET /api/dashboard/stats
        .route("/api/dashboard/stats", get(handlers::dashboard::get_stats))
}
