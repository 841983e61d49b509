use crate::{AppState, handlers, site};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a session. Nothing here exposes unpublished
/// content: the navigation tree only carries active items and the sitemap only
/// published records.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness check for load balancers and container health checks.
        .route("/health", get(|| async { "ok" }))
        // POST /api/auth/login
        // Exchanges credentials for a session token and the `admin_token` cookie.
        .route("/api/auth/login", post(handlers::auth::login))
        // POST /api/auth/logout
        // Ends the session if one is presented; always expires the cookie.
        .route("/api/auth/logout", post(handlers::auth::logout))
        // POST /api/contact
        // Contact form. Stores the message, then notifies sales by e-mail.
        .route("/api/contact", post(handlers::contact::submit_contact))
        // GET /api/navigation/tree?location=header|footer
        // Active menu entries, nested, for client-side rendering.
        .route("/api/navigation/tree", get(handlers::navigation::get_navigation_tree))
        // GET /sitemap.xml, GET /robots.txt
        .route("/sitemap.xml", get(site::seo::sitemap))
        .route("/robots.txt", get(site::seo::robots))
}
