use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Modules ---

// API, persistence and delivery.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod mail;
pub mod models;
pub mod repository;
pub mod storage;
pub mod tree;

// Server-rendered website and admin shell.
pub mod site;

// Module for routing segregation (Public, Authenticated, Admin, Site).
pub mod routes;
use auth::{AdminUser, AuthUser};
use routes::{admin, authenticated, public, site as site_routes};

// --- Re-exports used by main.rs and the tests ---

pub use config::AppConfig;
pub use mail::{LogMailer, MailerState, MockMailer, SmtpMailer};
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};
pub use storage::{LocalDiskStorage, MockStorageService, StorageState};

// Room for multipart framing on top of the largest accepted file.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// ApiDoc
///
/// Aggregates every `#[utoipa::path]` handler and `ToSchema` model into the OpenAPI
/// document served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::login, handlers::auth::logout, handlers::auth::get_me,
        handlers::pages::list_pages, handlers::pages::get_page, handlers::pages::create_page,
        handlers::pages::update_page, handlers::pages::delete_page,
        handlers::pages::list_sections, handlers::pages::get_section, handlers::pages::upsert_section,
        handlers::catalog::list_categories, handlers::catalog::get_category_tree, handlers::catalog::get_category,
        handlers::catalog::create_category, handlers::catalog::update_category, handlers::catalog::delete_category,
        handlers::catalog::list_products, handlers::catalog::get_product, handlers::catalog::create_product,
        handlers::catalog::update_product, handlers::catalog::delete_product,
        handlers::news::list_news, handlers::news::get_news, handlers::news::create_news,
        handlers::news::update_news, handlers::news::delete_news,
        handlers::navigation::get_navigation_tree, handlers::navigation::list_navigation,
        handlers::navigation::create_navigation_item, handlers::navigation::update_navigation_item,
        handlers::navigation::delete_navigation_item, handlers::navigation::reorder_navigation,
        handlers::media::upload_media, handlers::media::list_media, handlers::media::get_media,
        handlers::media::update_media, handlers::media::delete_media, handlers::media::list_media_versions,
        handlers::media::upload_media_version, handlers::media::list_media_usages,
        handlers::media::create_media_usage, handlers::media::delete_media_usage,
        handlers::media::set_media_properties,
        handlers::faq::list_faqs, handlers::faq::create_faq, handlers::faq::update_faq, handlers::faq::delete_faq,
        handlers::users::list_users, handlers::users::get_user, handlers::users::create_user,
        handlers::users::update_user, handlers::users::delete_user,
        handlers::settings::get_site_settings, handlers::settings::update_site_settings,
        handlers::settings::get_seo_settings, handlers::settings::update_seo_settings,
        handlers::contact::submit_contact, handlers::contact::list_contacts,
        handlers::contact::update_contact_status, handlers::contact::delete_contact,
        handlers::dashboard::get_stats,
    ),
    components(
        schemas(
            error::FieldError, models::ContentStatus, models::ActiveStatus, models::DashboardStats,
            models::Page, models::CreatePageRequest, models::UpdatePageRequest,
            models::SectionContent, models::UpsertSectionRequest,
            models::Category, models::CategoryNode, models::CreateCategoryRequest, models::UpdateCategoryRequest,
            models::Product, models::CreateProductRequest, models::UpdateProductRequest,
            models::News, models::CreateNewsRequest, models::UpdateNewsRequest,
            models::NavLocation, models::NavigationItem, models::NavigationNode, models::CreateNavigationRequest,
            models::UpdateNavigationRequest, models::ReorderItem, models::ReorderNavigationRequest,
            models::MediaAsset, models::MediaVersion, models::MediaUsage, models::MediaDetail,
            models::UpdateMediaRequest, models::CreateUsageRequest, models::SetPropertiesRequest,
            models::Faq, models::CreateFaqRequest, models::UpdateFaqRequest,
            models::User, models::UserRole, models::LoginRequest, models::LoginResponse,
            models::CreateUserRequest, models::UpdateUserRequest,
            models::SiteSettings, models::SocialLink, models::SeoSettings,
            models::ContactSubmission, models::ContactRequest, models::ContactStatus,
            models::UpdateContactStatusRequest,
        )
    ),
    tags(
        (name = "auth", description = "Admin sessions"),
        (name = "pages", description = "Content pages"),
        (name = "sections", description = "Homepage blocks"),
        (name = "categories", description = "Product category hierarchy"),
        (name = "products", description = "Product catalogue"),
        (name = "news", description = "News and press releases"),
        (name = "navigation", description = "Header and footer menus"),
        (name = "media", description = "Media library"),
        (name = "faq", description = "Frequently asked questions"),
        (name = "users", description = "Admin accounts"),
        (name = "settings", description = "Site and SEO settings"),
        (name = "contact", description = "Contact form and inbox"),
        (name = "dashboard", description = "Admin dashboard")
    )
)]
pub struct ApiDoc;

/// AppState
///
/// The single shared state handed to every handler: repository, file storage,
/// mail transport and configuration. Cloning is cheap (all `Arc`s plus config).
#[derive(Clone)]
pub struct AppState {
    /// Repository Layer: Postgres in production, in-memory for tests.
    pub repo: RepositoryState,
    /// Storage Layer: where uploaded media files are written.
    pub storage: StorageState,
    /// Outbound notification e-mail.
    pub mailer: MailerState,
    /// Environment settings, loaded once at startup.
    pub config: AppConfig,
}

// --- Sub-state extraction ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for MailerState {
    fn from_ref(app_state: &AppState) -> MailerState {
        app_state.mailer.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Gate for the authenticated router. Extracting `AuthUser` validates the token,
/// the session row and the account; any failure rejects the request with 401
/// before the handler runs.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// admin_middleware
///
/// Gate for the admin router: 401 without a session, 403 for non-admins.
async fn admin_middleware(_admin: AdminUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Builds the full router: JSON API, website, admin shell and uploads, with the
/// per-group auth gates and the global request-id, tracing and CORS layers.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let upload_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD;
    let uploads = ServeDir::new(&state.config.upload_dir);
    let upload_prefix = state.config.upload_url_prefix.clone();

    // 2. Route Groups
    let base_router = Router::new()
        // OpenAPI document and Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public API: contact form, health, public reads.
        .merge(public::public_routes())
        // Authenticated Routes: every request must carry a valid session.
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        // Admin Routes: session plus the `admin` role.
        .merge(
            admin::admin_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), admin_middleware)),
        )
        // Website and admin shell (HTML).
        .merge(site_routes::site_routes())
        // Stored media, served straight from disk.
        .nest_service(&upload_prefix, uploads)
        .fallback(site::pages::fallback)
        .with_state(state);

    // 3. Request Correlation and Tracing
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Stamp a UUID x-request-id unless the client sent one.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request Tracing: one span per request, carrying the request ID.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID Propagation: echo x-request-id back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Builds the per-request tracing span from the method, URI and `x-request-id`,
/// so every log line of one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
