use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::Repository;
use crate::error::{AppError, AppResult};
use crate::models::{
    Category, ContactFilter, ContactStatus, ContactSubmission, ContentStatus, DashboardStats, Faq,
    ListFilter, MediaAsset, MediaFilter, MediaUsage, MediaVersion, NavLocation, NavigationItem, News,
    Page, Product, ProductFilter, ReorderItem, SectionContent, Session, User,
};
use crate::tree;

#[derive(Default, Clone)]
struct Store {
    pages: HashMap<Uuid, Page>,
    sections: HashMap<String, SectionContent>,
    categories: HashMap<Uuid, Category>,
    products: HashMap<Uuid, Product>,
    news: HashMap<Uuid, News>,
    navigation: HashMap<Uuid, NavigationItem>,
    media: HashMap<Uuid, MediaAsset>,
    media_versions: Vec<MediaVersion>,
    media_usages: Vec<MediaUsage>,
    media_properties: HashMap<Uuid, BTreeMap<String, String>>,
    faqs: HashMap<Uuid, Faq>,
    users: HashMap<Uuid, User>,
    sessions: HashMap<Uuid, Session>,
    settings: HashMap<String, serde_json::Value>,
    contacts: HashMap<Uuid, ContactSubmission>,
}

/// InMemoryRepository
///
/// A `Repository` kept entirely in process memory. Used by the test-suite and by
/// `DATABASE_URL=memory` local runs. It enforces the same unique keys and
/// foreign-key rules as the Postgres schema so handler behaviour matches.
#[derive(Default)]
pub struct InMemoryRepository {
    store: Mutex<Store>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&self) -> AppResult<MutexGuard<'_, Store>> {
        self.store
            .lock()
            .map_err(|_| AppError::Internal("in-memory store poisoned".to_string()))
    }
}

fn duplicate(constraint: &str) -> AppError {
    AppError::BadRequest(format!("Duplicate value violates {constraint}"))
}

fn matches_search(haystacks: &[Option<&str>], search: Option<&String>) -> bool {
    let Some(term) = search.map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty()) else {
        return true;
    };
    haystacks
        .iter()
        .flatten()
        .any(|h| h.to_lowercase().contains(&term))
}

fn truncate<T>(mut rows: Vec<T>, limit: Option<i64>) -> Vec<T> {
    if let Some(limit) = limit.filter(|l| *l > 0) {
        rows.truncate(limit as usize);
    }
    rows
}

fn check_status(status: ContentStatus, filter: Option<ContentStatus>) -> bool {
    filter.is_none_or(|wanted| wanted == status)
}

#[async_trait]
impl Repository for InMemoryRepository {
    // --- Pages ---

    async fn list_pages(&self, filter: &ListFilter) -> AppResult<Vec<Page>> {
        let store = self.store()?;
        let mut rows: Vec<Page> = store
            .pages
            .values()
            .filter(|p| check_status(p.status, filter.status))
            .filter(|p| matches_search(&[Some(&p.title), Some(&p.slug)], filter.search.as_ref()))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(truncate(rows, filter.limit))
    }

    async fn get_page(&self, id: Uuid) -> AppResult<Option<Page>> {
        Ok(self.store()?.pages.get(&id).cloned())
    }

    async fn get_page_by_slug(&self, slug: &str) -> AppResult<Option<Page>> {
        Ok(self.store()?.pages.values().find(|p| p.slug == slug).cloned())
    }

    async fn create_page(&self, page: Page) -> AppResult<Page> {
        let mut store = self.store()?;
        if store.pages.values().any(|p| p.slug == page.slug) {
            return Err(duplicate("pages_slug_key"));
        }
        store.pages.insert(page.id, page.clone());
        Ok(page)
    }

    async fn update_page(&self, mut page: Page) -> AppResult<Page> {
        let mut store = self.store()?;
        if !store.pages.contains_key(&page.id) {
            return Err(AppError::NotFound("Page"));
        }
        if store.pages.values().any(|p| p.slug == page.slug && p.id != page.id) {
            return Err(duplicate("pages_slug_key"));
        }
        page.updated_at = Utc::now();
        store.pages.insert(page.id, page.clone());
        Ok(page)
    }

    async fn delete_page(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.store()?.pages.remove(&id).is_some())
    }

    // --- Homepage sections ---

    async fn list_sections(&self) -> AppResult<Vec<SectionContent>> {
        let mut rows: Vec<SectionContent> = self.store()?.sections.values().cloned().collect();
        rows.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.name.cmp(&b.name)));
        Ok(rows)
    }

    async fn get_section(&self, name: &str) -> AppResult<Option<SectionContent>> {
        Ok(self.store()?.sections.get(name).cloned())
    }

    async fn upsert_section(&self, mut section: SectionContent) -> AppResult<SectionContent> {
        let mut store = self.store()?;
        if let Some(existing) = store.sections.get(&section.name) {
            section.id = existing.id;
        }
        section.updated_at = Utc::now();
        store.sections.insert(section.name.clone(), section.clone());
        Ok(section)
    }

    // --- Categories ---

    async fn list_categories(&self) -> AppResult<Vec<Category>> {
        let mut rows: Vec<Category> = self.store()?.categories.values().cloned().collect();
        rows.sort_by(|a, b| {
            a.level
                .cmp(&b.level)
                .then_with(|| a.sort_order.cmp(&b.sort_order))
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(rows)
    }

    async fn get_category(&self, id: Uuid) -> AppResult<Option<Category>> {
        Ok(self.store()?.categories.get(&id).cloned())
    }

    async fn get_category_by_slug(&self, slug: &str) -> AppResult<Option<Category>> {
        Ok(self.store()?.categories.values().find(|c| c.slug == slug).cloned())
    }

    async fn create_category(&self, category: Category) -> AppResult<Category> {
        let mut store = self.store()?;
        if store.categories.values().any(|c| c.slug == category.slug) {
            return Err(duplicate("categories_slug_key"));
        }
        if category.parent_id.is_some_and(|pid| !store.categories.contains_key(&pid)) {
            return Err(AppError::BadRequest("Parent category does not exist".to_string()));
        }
        store.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn update_category(&self, mut category: Category) -> AppResult<Category> {
        let mut store = self.store()?;
        if !store.categories.contains_key(&category.id) {
            return Err(AppError::NotFound("Category"));
        }
        if store.categories.values().any(|c| c.slug == category.slug && c.id != category.id) {
            return Err(duplicate("categories_slug_key"));
        }
        category.updated_at = Utc::now();
        store.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn set_category_levels(&self, levels: &[(Uuid, i32)]) -> AppResult<()> {
        let mut store = self.store()?;
        for (id, level) in levels {
            if let Some(category) = store.categories.get_mut(id) {
                category.level = *level;
            }
        }
        Ok(())
    }

    async fn delete_category(&self, id: Uuid) -> AppResult<bool> {
        let mut store = self.store()?;
        let referenced = store.categories.values().any(|c| c.parent_id == Some(id))
            || store.products.values().any(|p| p.category_id == Some(id));
        if referenced {
            return Err(AppError::BadRequest("Category is still referenced".to_string()));
        }
        Ok(store.categories.remove(&id).is_some())
    }

    async fn count_child_categories(&self, id: Uuid) -> AppResult<i64> {
        Ok(self.store()?.categories.values().filter(|c| c.parent_id == Some(id)).count() as i64)
    }

    async fn count_products_in_category(&self, id: Uuid) -> AppResult<i64> {
        Ok(self.store()?.products.values().filter(|p| p.category_id == Some(id)).count() as i64)
    }

    // --- Products ---

    async fn list_products(&self, filter: &ProductFilter) -> AppResult<Vec<Product>> {
        let store = self.store()?;
        let mut rows: Vec<Product> = store
            .products
            .values()
            .filter(|p| check_status(p.status, filter.status))
            .filter(|p| filter.category_id.is_none_or(|c| p.category_id == Some(c)))
            .filter(|p| {
                filter
                    .category_ids
                    .as_ref()
                    .is_none_or(|ids| p.category_id.is_some_and(|c| ids.contains(&c)))
            })
            .filter(|p| filter.featured.is_none_or(|f| p.is_featured == f))
            .filter(|p| {
                matches_search(
                    &[Some(&p.name), p.summary.as_deref(), Some(&p.slug)],
                    filter.search.as_ref(),
                )
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.name.cmp(&b.name)));
        Ok(truncate(rows, filter.limit))
    }

    async fn get_product(&self, id: Uuid) -> AppResult<Option<Product>> {
        Ok(self.store()?.products.get(&id).cloned())
    }

    async fn get_product_by_slug(&self, slug: &str) -> AppResult<Option<Product>> {
        Ok(self.store()?.products.values().find(|p| p.slug == slug).cloned())
    }

    async fn create_product(&self, product: Product) -> AppResult<Product> {
        let mut store = self.store()?;
        if store.products.values().any(|p| p.slug == product.slug) {
            return Err(duplicate("products_slug_key"));
        }
        if product.category_id.is_some_and(|cid| !store.categories.contains_key(&cid)) {
            return Err(AppError::BadRequest("Category does not exist".to_string()));
        }
        store.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn update_product(&self, mut product: Product) -> AppResult<Product> {
        let mut store = self.store()?;
        if !store.products.contains_key(&product.id) {
            return Err(AppError::NotFound("Product"));
        }
        if store.products.values().any(|p| p.slug == product.slug && p.id != product.id) {
            return Err(duplicate("products_slug_key"));
        }
        product.updated_at = Utc::now();
        store.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn delete_product(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.store()?.products.remove(&id).is_some())
    }

    // --- News ---

    async fn list_news(&self, filter: &ListFilter) -> AppResult<Vec<News>> {
        let store = self.store()?;
        let mut rows: Vec<News> = store
            .news
            .values()
            .filter(|n| check_status(n.status, filter.status))
            .filter(|n| matches_search(&[Some(&n.title), n.excerpt.as_deref()], filter.search.as_ref()))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            let a_at = a.published_at.unwrap_or(a.created_at);
            let b_at = b.published_at.unwrap_or(b.created_at);
            b_at.cmp(&a_at).then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(truncate(rows, filter.limit))
    }

    async fn get_news(&self, id: Uuid) -> AppResult<Option<News>> {
        Ok(self.store()?.news.get(&id).cloned())
    }

    async fn get_news_by_slug(&self, slug: &str) -> AppResult<Option<News>> {
        Ok(self.store()?.news.values().find(|n| n.slug == slug).cloned())
    }

    async fn create_news(&self, news: News) -> AppResult<News> {
        let mut store = self.store()?;
        if store.news.values().any(|n| n.slug == news.slug) {
            return Err(duplicate("news_slug_key"));
        }
        store.news.insert(news.id, news.clone());
        Ok(news)
    }

    async fn update_news(&self, mut news: News) -> AppResult<News> {
        let mut store = self.store()?;
        if !store.news.contains_key(&news.id) {
            return Err(AppError::NotFound("News"));
        }
        if store.news.values().any(|n| n.slug == news.slug && n.id != news.id) {
            return Err(duplicate("news_slug_key"));
        }
        news.updated_at = Utc::now();
        store.news.insert(news.id, news.clone());
        Ok(news)
    }

    async fn delete_news(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.store()?.news.remove(&id).is_some())
    }

    // --- Navigation ---

    async fn list_navigation(&self, location: Option<NavLocation>) -> AppResult<Vec<NavigationItem>> {
        let mut rows: Vec<NavigationItem> = self
            .store()?
            .navigation
            .values()
            .filter(|n| location.is_none_or(|l| n.location == l))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.label.cmp(&b.label)));
        Ok(rows)
    }

    async fn get_navigation_item(&self, id: Uuid) -> AppResult<Option<NavigationItem>> {
        Ok(self.store()?.navigation.get(&id).cloned())
    }

    async fn create_navigation_item(&self, item: NavigationItem) -> AppResult<NavigationItem> {
        let mut store = self.store()?;
        if item.parent_id.is_some_and(|pid| !store.navigation.contains_key(&pid)) {
            return Err(AppError::BadRequest("Parent navigation item does not exist".to_string()));
        }
        store.navigation.insert(item.id, item.clone());
        Ok(item)
    }

    async fn update_navigation_item(&self, mut item: NavigationItem) -> AppResult<NavigationItem> {
        let mut store = self.store()?;
        if !store.navigation.contains_key(&item.id) {
            return Err(AppError::NotFound("Navigation item"));
        }
        item.updated_at = Utc::now();
        store.navigation.insert(item.id, item.clone());
        Ok(item)
    }

    async fn delete_navigation_item(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.store()?.navigation.remove(&id).is_some())
    }

    async fn count_navigation_children(&self, id: Uuid) -> AppResult<i64> {
        Ok(self.store()?.navigation.values().filter(|n| n.parent_id == Some(id)).count() as i64)
    }

    /// reorder_navigation
    ///
    /// Applies the batch to a copy of the table and swaps it in only when every entry
    /// succeeded, mirroring the transactional Postgres implementation.
    async fn reorder_navigation(&self, items: &[ReorderItem]) -> AppResult<()> {
        let mut store = self.store()?;
        let mut staged = store.navigation.clone();
        let now = Utc::now();

        for item in items {
            if item.parent_id == Some(item.id) {
                return Err(AppError::BadRequest(format!("Navigation item {} cannot be its own parent", item.id)));
            }
            if let Some(parent_id) = item.parent_id.filter(|pid| !staged.contains_key(pid)) {
                return Err(AppError::BadRequest(format!("Unknown parent navigation item {parent_id}")));
            }
            let parent_location = item.parent_id.and_then(|pid| staged.get(&pid)).map(|parent| parent.location);
            let Some(row) = staged.get_mut(&item.id) else {
                return Err(AppError::BadRequest(format!("Unknown navigation item {}", item.id)));
            };
            if parent_location.is_some_and(|location| location != row.location) {
                return Err(AppError::BadRequest(format!(
                    "Navigation item {} can not move below an item of another menu",
                    item.id
                )));
            }
            row.parent_id = item.parent_id;
            row.sort_order = item.sort_order;
            row.updated_at = now;
        }

        let rows: Vec<NavigationItem> = staged.values().cloned().collect();
        if tree::has_cycle(&rows) {
            return Err(AppError::BadRequest("Reorder would create a navigation cycle".to_string()));
        }

        store.navigation = staged;
        Ok(())
    }

    // --- Media ---

    async fn list_media(&self, filter: &MediaFilter) -> AppResult<Vec<MediaAsset>> {
        let store = self.store()?;
        let mut rows: Vec<MediaAsset> = store
            .media
            .values()
            .filter(|m| filter.folder.as_ref().is_none_or(|f| m.folder.as_ref() == Some(f)))
            .filter(|m| filter.mime_prefix.as_ref().is_none_or(|p| m.mime_type.starts_with(p.as_str())))
            .filter(|m| {
                matches_search(
                    &[Some(&m.original_name), m.title.as_deref(), m.alt_text.as_deref()],
                    filter.search.as_ref(),
                )
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(truncate(rows, filter.limit))
    }

    async fn get_media(&self, id: Uuid) -> AppResult<Option<MediaAsset>> {
        Ok(self.store()?.media.get(&id).cloned())
    }

    async fn create_media(&self, asset: MediaAsset, version: MediaVersion) -> AppResult<MediaAsset> {
        let mut store = self.store()?;
        store.media.insert(asset.id, asset.clone());
        store.media_versions.push(version);
        Ok(asset)
    }

    async fn add_media_version(&self, mut asset: MediaAsset, version: MediaVersion) -> AppResult<MediaAsset> {
        let mut store = self.store()?;
        if !store.media.contains_key(&asset.id) {
            return Err(AppError::NotFound("Media"));
        }
        if store
            .media_versions
            .iter()
            .any(|v| v.asset_id == version.asset_id && v.version == version.version)
        {
            return Err(duplicate("media_versions_asset_id_version_key"));
        }
        asset.updated_at = Utc::now();
        store.media_versions.push(version);
        store.media.insert(asset.id, asset.clone());
        Ok(asset)
    }

    async fn update_media(&self, asset: MediaAsset) -> AppResult<MediaAsset> {
        let mut store = self.store()?;
        let Some(existing) = store.media.get_mut(&asset.id) else {
            return Err(AppError::NotFound("Media"));
        };
        existing.alt_text = asset.alt_text;
        existing.title = asset.title;
        existing.folder = asset.folder;
        existing.updated_at = Utc::now();
        Ok(existing.clone())
    }

    async fn delete_media(&self, id: Uuid) -> AppResult<bool> {
        let mut store = self.store()?;
        let removed = store.media.remove(&id).is_some();
        if removed {
            store.media_versions.retain(|v| v.asset_id != id);
            store.media_usages.retain(|u| u.asset_id != id);
            store.media_properties.remove(&id);
        }
        Ok(removed)
    }

    async fn list_media_versions(&self, asset_id: Uuid) -> AppResult<Vec<MediaVersion>> {
        let mut rows: Vec<MediaVersion> = self
            .store()?
            .media_versions
            .iter()
            .filter(|v| v.asset_id == asset_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.version.cmp(&a.version));
        Ok(rows)
    }

    async fn list_media_usages(&self, asset_id: Uuid) -> AppResult<Vec<MediaUsage>> {
        Ok(self
            .store()?
            .media_usages
            .iter()
            .filter(|u| u.asset_id == asset_id)
            .cloned()
            .collect())
    }

    async fn create_media_usage(&self, usage: MediaUsage) -> AppResult<MediaUsage> {
        let mut store = self.store()?;
        if !store.media.contains_key(&usage.asset_id) {
            return Err(AppError::NotFound("Media"));
        }
        store.media_usages.push(usage.clone());
        Ok(usage)
    }

    async fn delete_media_usage(&self, id: Uuid) -> AppResult<bool> {
        let mut store = self.store()?;
        let before = store.media_usages.len();
        store.media_usages.retain(|u| u.id != id);
        Ok(store.media_usages.len() < before)
    }

    async fn count_media_usages(&self, asset_id: Uuid) -> AppResult<i64> {
        Ok(self.store()?.media_usages.iter().filter(|u| u.asset_id == asset_id).count() as i64)
    }

    async fn get_media_properties(&self, asset_id: Uuid) -> AppResult<BTreeMap<String, String>> {
        Ok(self.store()?.media_properties.get(&asset_id).cloned().unwrap_or_default())
    }

    async fn replace_media_properties(
        &self,
        asset_id: Uuid,
        properties: &BTreeMap<String, String>,
    ) -> AppResult<BTreeMap<String, String>> {
        let mut store = self.store()?;
        if !store.media.contains_key(&asset_id) {
            return Err(AppError::NotFound("Media"));
        }
        store.media_properties.insert(asset_id, properties.clone());
        Ok(properties.clone())
    }

    // --- FAQ ---

    async fn list_faqs(&self, active_only: bool) -> AppResult<Vec<Faq>> {
        let mut rows: Vec<Faq> = self
            .store()?
            .faqs
            .values()
            .filter(|f| !active_only || f.is_active)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            a.category
                .cmp(&b.category)
                .then_with(|| a.sort_order.cmp(&b.sort_order))
                .then_with(|| a.question.cmp(&b.question))
        });
        Ok(rows)
    }

    async fn get_faq(&self, id: Uuid) -> AppResult<Option<Faq>> {
        Ok(self.store()?.faqs.get(&id).cloned())
    }

    async fn create_faq(&self, faq: Faq) -> AppResult<Faq> {
        self.store()?.faqs.insert(faq.id, faq.clone());
        Ok(faq)
    }

    async fn update_faq(&self, mut faq: Faq) -> AppResult<Faq> {
        let mut store = self.store()?;
        if !store.faqs.contains_key(&faq.id) {
            return Err(AppError::NotFound("FAQ"));
        }
        faq.updated_at = Utc::now();
        store.faqs.insert(faq.id, faq.clone());
        Ok(faq)
    }

    async fn delete_faq(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.store()?.faqs.remove(&id).is_some())
    }

    // --- Users & sessions ---

    async fn list_users(&self) -> AppResult<Vec<User>> {
        let mut rows: Vec<User> = self.store()?.users.values().cloned().collect();
        rows.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(rows)
    }

    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.store()?.users.get(&id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self.store()?.users.values().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, user: User) -> AppResult<User> {
        let mut store = self.store()?;
        if store.users.values().any(|u| u.email == user.email) {
            return Err(duplicate("users_email_key"));
        }
        store.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user(&self, mut user: User) -> AppResult<User> {
        let mut store = self.store()?;
        let Some(existing) = store.users.get(&user.id) else {
            return Err(AppError::NotFound("User"));
        };
        user.last_login_at = existing.last_login_at;
        if store.users.values().any(|u| u.email == user.email && u.id != user.id) {
            return Err(duplicate("users_email_key"));
        }
        user.updated_at = Utc::now();
        store.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete_user(&self, id: Uuid) -> AppResult<bool> {
        let mut store = self.store()?;
        let removed = store.users.remove(&id).is_some();
        if removed {
            store.sessions.retain(|_, s| s.user_id != id);
            for asset in store.media.values_mut() {
                if asset.uploaded_by == Some(id) {
                    asset.uploaded_by = None;
                }
            }
        }
        Ok(removed)
    }

    async fn count_users(&self) -> AppResult<i64> {
        Ok(self.store()?.users.len() as i64)
    }

    async fn touch_last_login(&self, id: Uuid) -> AppResult<()> {
        if let Some(user) = self.store()?.users.get_mut(&id) {
            user.last_login_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn create_session(&self, session: Session) -> AppResult<Session> {
        let mut store = self.store()?;
        if !store.users.contains_key(&session.user_id) {
            return Err(AppError::BadRequest("Session user does not exist".to_string()));
        }
        store.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn get_session(&self, id: Uuid) -> AppResult<Option<Session>> {
        Ok(self.store()?.sessions.get(&id).cloned())
    }

    async fn delete_session(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.store()?.sessions.remove(&id).is_some())
    }

    async fn delete_user_sessions(&self, user_id: Uuid) -> AppResult<u64> {
        let mut store = self.store()?;
        let before = store.sessions.len();
        store.sessions.retain(|_, s| s.user_id != user_id);
        Ok((before - store.sessions.len()) as u64)
    }

    async fn purge_expired_sessions(&self) -> AppResult<u64> {
        let mut store = self.store()?;
        let now = Utc::now();
        let before = store.sessions.len();
        store.sessions.retain(|_, s| s.expires_at > now);
        Ok((before - store.sessions.len()) as u64)
    }

    // --- Settings ---

    async fn get_setting(&self, key: &str) -> AppResult<Option<serde_json::Value>> {
        Ok(self.store()?.settings.get(key).cloned())
    }

    async fn put_setting(&self, key: &str, value: serde_json::Value) -> AppResult<()> {
        self.store()?.settings.insert(key.to_string(), value);
        Ok(())
    }

    // --- Contact submissions ---

    async fn create_contact(&self, submission: ContactSubmission) -> AppResult<ContactSubmission> {
        self.store()?.contacts.insert(submission.id, submission.clone());
        Ok(submission)
    }

    async fn list_contacts(&self, filter: &ContactFilter) -> AppResult<Vec<ContactSubmission>> {
        let mut rows: Vec<ContactSubmission> = self
            .store()?
            .contacts
            .values()
            .filter(|c| filter.status.is_none_or(|s| c.status == s))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(truncate(rows, filter.limit))
    }

    async fn get_contact(&self, id: Uuid) -> AppResult<Option<ContactSubmission>> {
        Ok(self.store()?.contacts.get(&id).cloned())
    }

    async fn update_contact_status(&self, id: Uuid, status: ContactStatus) -> AppResult<ContactSubmission> {
        let mut store = self.store()?;
        let contact = store.contacts.get_mut(&id).ok_or(AppError::NotFound("Contact submission"))?;
        contact.status = status;
        contact.updated_at = Utc::now();
        Ok(contact.clone())
    }

    async fn record_contact_email(&self, id: Uuid, sent: bool, error: Option<String>) -> AppResult<ContactSubmission> {
        let mut store = self.store()?;
        let contact = store.contacts.get_mut(&id).ok_or(AppError::NotFound("Contact submission"))?;
        contact.email_sent = sent;
        contact.email_error = error;
        contact.updated_at = Utc::now();
        Ok(contact.clone())
    }

    async fn delete_contact(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.store()?.contacts.remove(&id).is_some())
    }

    // --- Dashboard ---

    async fn get_stats(&self) -> AppResult<DashboardStats> {
        let store = self.store()?;
        Ok(DashboardStats {
            pages: store.pages.len() as i64,
            products: store.products.len() as i64,
            categories: store.categories.len() as i64,
            news: store.news.len() as i64,
            media: store.media.len() as i64,
            faqs: store.faqs.len() as i64,
            users: store.users.len() as i64,
            unread_contacts: store.contacts.values().filter(|c| c.status == ContactStatus::New).count() as i64,
        })
    }
}
