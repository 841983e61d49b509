use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{
    Category, ContactFilter, ContactStatus, ContactSubmission, DashboardStats, Faq, ListFilter,
    MediaAsset, MediaFilter, MediaUsage, MediaVersion, NavLocation, NavigationItem, News, Page,
    Product, ProductFilter, ReorderItem, SectionContent, Session, User,
};

mod memory;
mod postgres;

pub use memory::InMemoryRepository;
pub use postgres::PostgresRepository;

/// Page size of the HTTP list endpoints when the client sends no `limit`, and the
/// largest one they accept. Repository list calls with `limit: None` are unbounded.
pub const DEFAULT_LIST_LIMIT: i64 = 500;

/// Repository Trait
///
/// Abstract contract for all persistence operations. Handlers talk to
/// `Arc<dyn Repository>` and never know whether Postgres or the in-memory store is
/// behind it.
///
/// Write methods take fully-built rows: ids, timestamps, slugs and derived fields
/// (category `level`, `published_at`) are decided by the handlers. `update_*`
/// methods fail with `NotFound` when the row is gone; `delete_*` methods report
/// whether a row was removed.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Pages ---
    async fn list_pages(&self, filter: &ListFilter) -> AppResult<Vec<Page>>;
    async fn get_page(&self, id: Uuid) -> AppResult<Option<Page>>;
    async fn get_page_by_slug(&self, slug: &str) -> AppResult<Option<Page>>;
    async fn create_page(&self, page: Page) -> AppResult<Page>;
    async fn update_page(&self, page: Page) -> AppResult<Page>;
    async fn delete_page(&self, id: Uuid) -> AppResult<bool>;

    // --- Homepage sections ---
    // Ordered by sort_order, then name.
    async fn list_sections(&self) -> AppResult<Vec<SectionContent>>;
    async fn get_section(&self, name: &str) -> AppResult<Option<SectionContent>>;
    // Inserts or replaces the section identified by `section.name`.
    async fn upsert_section(&self, section: SectionContent) -> AppResult<SectionContent>;

    // --- Categories ---
    async fn list_categories(&self) -> AppResult<Vec<Category>>;
    async fn get_category(&self, id: Uuid) -> AppResult<Option<Category>>;
    async fn get_category_by_slug(&self, slug: &str) -> AppResult<Option<Category>>;
    async fn create_category(&self, category: Category) -> AppResult<Category>;
    async fn update_category(&self, category: Category) -> AppResult<Category>;
    /// Rewrites the `level` of several categories at once (after a reparent).
    async fn set_category_levels(&self, levels: &[(Uuid, i32)]) -> AppResult<()>;
    async fn delete_category(&self, id: Uuid) -> AppResult<bool>;
    async fn count_child_categories(&self, id: Uuid) -> AppResult<i64>;
    async fn count_products_in_category(&self, id: Uuid) -> AppResult<i64>;

    // --- Products ---
    async fn list_products(&self, filter: &ProductFilter) -> AppResult<Vec<Product>>;
    async fn get_product(&self, id: Uuid) -> AppResult<Option<Product>>;
    async fn get_product_by_slug(&self, slug: &str) -> AppResult<Option<Product>>;
    async fn create_product(&self, product: Product) -> AppResult<Product>;
    async fn update_product(&self, product: Product) -> AppResult<Product>;
    async fn delete_product(&self, id: Uuid) -> AppResult<bool>;

    // --- News ---
    // Newest first (published_at, then created_at).
    async fn list_news(&self, filter: &ListFilter) -> AppResult<Vec<News>>;
    async fn get_news(&self, id: Uuid) -> AppResult<Option<News>>;
    async fn get_news_by_slug(&self, slug: &str) -> AppResult<Option<News>>;
    async fn create_news(&self, news: News) -> AppResult<News>;
    async fn update_news(&self, news: News) -> AppResult<News>;
    async fn delete_news(&self, id: Uuid) -> AppResult<bool>;

    // --- Navigation ---
    async fn list_navigation(&self, location: Option<NavLocation>) -> AppResult<Vec<NavigationItem>>;
    async fn get_navigation_item(&self, id: Uuid) -> AppResult<Option<NavigationItem>>;
    async fn create_navigation_item(&self, item: NavigationItem) -> AppResult<NavigationItem>;
    async fn update_navigation_item(&self, item: NavigationItem) -> AppResult<NavigationItem>;
    async fn delete_navigation_item(&self, id: Uuid) -> AppResult<bool>;
    async fn count_navigation_children(&self, id: Uuid) -> AppResult<i64>;
    /// Applies every `(parent_id, sort_order)` change in one transaction. Fails with
    /// `BadRequest` and writes nothing if any id or parent is unknown.
    async fn reorder_navigation(&self, items: &[ReorderItem]) -> AppResult<()>;

    // --- Media ---
    async fn list_media(&self, filter: &MediaFilter) -> AppResult<Vec<MediaAsset>>;
    async fn get_media(&self, id: Uuid) -> AppResult<Option<MediaAsset>>;
    /// Inserts the asset together with its first version.
    async fn create_media(&self, asset: MediaAsset, version: MediaVersion) -> AppResult<MediaAsset>;
    /// Inserts `version` and points the asset at it.
    async fn add_media_version(&self, asset: MediaAsset, version: MediaVersion) -> AppResult<MediaAsset>;
    async fn update_media(&self, asset: MediaAsset) -> AppResult<MediaAsset>;
    async fn delete_media(&self, id: Uuid) -> AppResult<bool>;
    async fn list_media_versions(&self, asset_id: Uuid) -> AppResult<Vec<MediaVersion>>;
    async fn list_media_usages(&self, asset_id: Uuid) -> AppResult<Vec<MediaUsage>>;
    async fn create_media_usage(&self, usage: MediaUsage) -> AppResult<MediaUsage>;
    async fn delete_media_usage(&self, id: Uuid) -> AppResult<bool>;
    async fn count_media_usages(&self, asset_id: Uuid) -> AppResult<i64>;
    async fn get_media_properties(&self, asset_id: Uuid) -> AppResult<BTreeMap<String, String>>;
    async fn replace_media_properties(
        &self,
        asset_id: Uuid,
        properties: &BTreeMap<String, String>,
    ) -> AppResult<BTreeMap<String, String>>;

    // --- FAQ ---
    async fn list_faqs(&self, active_only: bool) -> AppResult<Vec<Faq>>;
    async fn get_faq(&self, id: Uuid) -> AppResult<Option<Faq>>;
    async fn create_faq(&self, faq: Faq) -> AppResult<Faq>;
    async fn update_faq(&self, faq: Faq) -> AppResult<Faq>;
    async fn delete_faq(&self, id: Uuid) -> AppResult<bool>;

    // --- Users & sessions ---
    async fn list_users(&self) -> AppResult<Vec<User>>;
    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>>;
    // Emails are stored lower-cased; callers normalise before lookup.
    async fn get_user_by_email(&self, email: &str) -> AppResult<Option<User>>;
    async fn create_user(&self, user: User) -> AppResult<User>;
    async fn update_user(&self, user: User) -> AppResult<User>;
    async fn delete_user(&self, id: Uuid) -> AppResult<bool>;
    async fn count_users(&self) -> AppResult<i64>;
    async fn touch_last_login(&self, id: Uuid) -> AppResult<()>;
    async fn create_session(&self, session: Session) -> AppResult<Session>;
    async fn get_session(&self, id: Uuid) -> AppResult<Option<Session>>;
    async fn delete_session(&self, id: Uuid) -> AppResult<bool>;
    async fn delete_user_sessions(&self, user_id: Uuid) -> AppResult<u64>;
    async fn purge_expired_sessions(&self) -> AppResult<u64>;

    // --- Settings ---
    async fn get_setting(&self, key: &str) -> AppResult<Option<serde_json::Value>>;
    async fn put_setting(&self, key: &str, value: serde_json::Value) -> AppResult<()>;

    // --- Contact submissions ---
    async fn create_contact(&self, submission: ContactSubmission) -> AppResult<ContactSubmission>;
    async fn list_contacts(&self, filter: &ContactFilter) -> AppResult<Vec<ContactSubmission>>;
    async fn get_contact(&self, id: Uuid) -> AppResult<Option<ContactSubmission>>;
    async fn update_contact_status(&self, id: Uuid, status: ContactStatus) -> AppResult<ContactSubmission>;
    /// Annotates the outcome of the notification e-mail onto the stored submission.
    async fn record_contact_email(&self, id: Uuid, sent: bool, error: Option<String>) -> AppResult<ContactSubmission>;
    async fn delete_contact(&self, id: Uuid) -> AppResult<bool>;

    // --- Dashboard ---
    async fn get_stats(&self) -> AppResult<DashboardStats>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// Clamps a client-supplied `limit` for the HTTP list endpoints.
pub fn api_limit(limit: Option<i64>) -> Option<i64> {
    Some(limit.filter(|l| *l > 0).map_or(DEFAULT_LIST_LIMIT, |l| l.min(DEFAULT_LIST_LIMIT)))
}
