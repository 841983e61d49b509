use async_trait::async_trait;
use sqlx::{PgPool, Postgres, query_builder::QueryBuilder};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::Repository;
use crate::error::{AppError, AppResult};
use crate::models::{
    Category, ContactFilter, ContactStatus, ContactSubmission, DashboardStats, Faq, ListFilter,
    MediaAsset, MediaFilter, MediaProperty, MediaUsage, MediaVersion, NavLocation, NavigationItem,
    News, Page, Product, ProductFilter, ReorderItem, SectionContent, Session, User,
};
use crate::tree;

const PAGE_COLUMNS: &str = "id, title, slug, content, excerpt, template, status, meta_title, \
    meta_description, published_at, created_at, updated_at";
const SECTION_COLUMNS: &str = "id, name, title, content, sort_order, is_active, updated_at";
const CATEGORY_COLUMNS: &str =
    "id, name, slug, description, parent_id, level, sort_order, status, created_at, updated_at";
const PRODUCT_COLUMNS: &str = "id, name, slug, category_id, summary, description, specifications, \
    features, images, datasheet_url, status, is_featured, sort_order, meta_title, meta_description, \
    created_at, updated_at";
const NEWS_COLUMNS: &str = "id, title, slug, excerpt, content, cover_image, author, tags, status, \
    is_featured, published_at, meta_title, meta_description, created_at, updated_at";
const NAVIGATION_COLUMNS: &str = "id, label, url, parent_id, location, sort_order, open_in_new_tab, \
    is_active, created_at, updated_at";
const MEDIA_COLUMNS: &str = "id, filename, original_name, mime_type, size_bytes, storage_key, url, \
    alt_text, title, folder, current_version, uploaded_by, created_at, updated_at";
const FAQ_COLUMNS: &str = "id, question, answer, category, sort_order, is_active, created_at, updated_at";
const USER_COLUMNS: &str =
    "id, email, name, password_hash, role, status, last_login_at, created_at, updated_at";
const CONTACT_COLUMNS: &str = "id, name, email, company, phone, subject, message, status, \
    email_sent, email_error, created_at, updated_at";

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
/// Queries are built at runtime (`query_as` / `QueryBuilder`), so the crate
/// compiles without a live database.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Escapes `%`, `_` and `\` so user input matches literally inside `LIKE ... ESCAPE '\'`.
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

fn push_search(builder: &mut QueryBuilder<'_, Postgres>, columns: &[&str], search: Option<&String>) {
    let Some(term) = search.map(|s| s.trim()).filter(|s| !s.is_empty()) else {
        return;
    };
    let pattern = format!("%{}%", escape_like(term));
    builder.push(" AND (");
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            builder.push(" OR ");
        }
        builder.push(*column).push(" ILIKE ").push_bind(pattern.clone()).push(" ESCAPE '\\'");
    }
    builder.push(")");
}

// `None` means every matching row.
fn push_limit(builder: &mut QueryBuilder<'_, Postgres>, limit: Option<i64>) {
    if let Some(limit) = limit.filter(|l| *l > 0) {
        builder.push(" LIMIT ").push_bind(limit);
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    // --- Pages ---

    async fn list_pages(&self, filter: &ListFilter) -> AppResult<Vec<Page>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {PAGE_COLUMNS} FROM pages WHERE 1 = 1"));
        if let Some(status) = filter.status {
            builder.push(" AND status = ").push_bind(status);
        }
        push_search(&mut builder, &["title", "slug"], filter.search.as_ref());
        builder.push(" ORDER BY title ASC");
        push_limit(&mut builder, filter.limit);
        Ok(builder.build_query_as::<Page>().fetch_all(&self.pool).await?)
    }

    async fn get_page(&self, id: Uuid) -> AppResult<Option<Page>> {
        let sql = format!("SELECT {PAGE_COLUMNS} FROM pages WHERE id = $1");
        Ok(sqlx::query_as::<_, Page>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn get_page_by_slug(&self, slug: &str) -> AppResult<Option<Page>> {
        let sql = format!("SELECT {PAGE_COLUMNS} FROM pages WHERE slug = $1");
        Ok(sqlx::query_as::<_, Page>(&sql).bind(slug).fetch_optional(&self.pool).await?)
    }

    async fn create_page(&self, page: Page) -> AppResult<Page> {
        let sql = format!(
            "INSERT INTO pages ({PAGE_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {PAGE_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Page>(&sql)
            .bind(page.id)
            .bind(&page.title)
            .bind(&page.slug)
            .bind(&page.content)
            .bind(&page.excerpt)
            .bind(&page.template)
            .bind(page.status)
            .bind(&page.meta_title)
            .bind(&page.meta_description)
            .bind(page.published_at)
            .bind(page.created_at)
            .bind(page.updated_at)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_page(&self, page: Page) -> AppResult<Page> {
        let sql = format!(
            "UPDATE pages SET title = $2, slug = $3, content = $4, excerpt = $5, template = $6, status = $7, \
             meta_title = $8, meta_description = $9, published_at = $10, updated_at = NOW() \
             WHERE id = $1 RETURNING {PAGE_COLUMNS}"
        );
        sqlx::query_as::<_, Page>(&sql)
            .bind(page.id)
            .bind(&page.title)
            .bind(&page.slug)
            .bind(&page.content)
            .bind(&page.excerpt)
            .bind(&page.template)
            .bind(page.status)
            .bind(&page.meta_title)
            .bind(&page.meta_description)
            .bind(page.published_at)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound("Page"))
    }

    async fn delete_page(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM pages WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    // --- Homepage sections ---

    async fn list_sections(&self) -> AppResult<Vec<SectionContent>> {
        let sql = format!("SELECT {SECTION_COLUMNS} FROM section_contents ORDER BY sort_order ASC, name ASC");
        Ok(sqlx::query_as::<_, SectionContent>(&sql).fetch_all(&self.pool).await?)
    }

    async fn get_section(&self, name: &str) -> AppResult<Option<SectionContent>> {
        let sql = format!("SELECT {SECTION_COLUMNS} FROM section_contents WHERE name = $1");
        Ok(sqlx::query_as::<_, SectionContent>(&sql).bind(name).fetch_optional(&self.pool).await?)
    }

    async fn upsert_section(&self, section: SectionContent) -> AppResult<SectionContent> {
        let sql = format!(
            "INSERT INTO section_contents ({SECTION_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, NOW()) \
             ON CONFLICT (name) DO UPDATE SET title = EXCLUDED.title, content = EXCLUDED.content, \
             sort_order = EXCLUDED.sort_order, is_active = EXCLUDED.is_active, updated_at = NOW() \
             RETURNING {SECTION_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, SectionContent>(&sql)
            .bind(section.id)
            .bind(&section.name)
            .bind(&section.title)
            .bind(&section.content)
            .bind(section.sort_order)
            .bind(section.is_active)
            .fetch_one(&self.pool)
            .await?)
    }

    // --- Categories ---

    async fn list_categories(&self) -> AppResult<Vec<Category>> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY level ASC, sort_order ASC, name ASC");
        Ok(sqlx::query_as::<_, Category>(&sql).fetch_all(&self.pool).await?)
    }

    async fn get_category(&self, id: Uuid) -> AppResult<Option<Category>> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1");
        Ok(sqlx::query_as::<_, Category>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn get_category_by_slug(&self, slug: &str) -> AppResult<Option<Category>> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE slug = $1");
        Ok(sqlx::query_as::<_, Category>(&sql).bind(slug).fetch_optional(&self.pool).await?)
    }

    async fn create_category(&self, category: Category) -> AppResult<Category> {
        let sql = format!(
            "INSERT INTO categories ({CATEGORY_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {CATEGORY_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Category>(&sql)
            .bind(category.id)
            .bind(&category.name)
            .bind(&category.slug)
            .bind(&category.description)
            .bind(category.parent_id)
            .bind(category.level)
            .bind(category.sort_order)
            .bind(category.status)
            .bind(category.created_at)
            .bind(category.updated_at)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_category(&self, category: Category) -> AppResult<Category> {
        let sql = format!(
            "UPDATE categories SET name = $2, slug = $3, description = $4, parent_id = $5, level = $6, \
             sort_order = $7, status = $8, updated_at = NOW() WHERE id = $1 RETURNING {CATEGORY_COLUMNS}"
        );
        sqlx::query_as::<_, Category>(&sql)
            .bind(category.id)
            .bind(&category.name)
            .bind(&category.slug)
            .bind(&category.description)
            .bind(category.parent_id)
            .bind(category.level)
            .bind(category.sort_order)
            .bind(category.status)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound("Category"))
    }

    async fn set_category_levels(&self, levels: &[(Uuid, i32)]) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        for (id, level) in levels {
            sqlx::query("UPDATE categories SET level = $2, updated_at = NOW() WHERE id = $1 AND level <> $2")
                .bind(*id)
                .bind(*level)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn delete_category(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_child_categories(&self, id: Uuid) -> AppResult<i64> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM categories WHERE parent_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn count_products_in_category(&self, id: Uuid) -> AppResult<i64> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products WHERE category_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?)
    }

    // --- Products ---

    /// list_products
    ///
    /// Filters are appended with `QueryBuilder` so every value is bound, never interpolated.
    async fn list_products(&self, filter: &ProductFilter) -> AppResult<Vec<Product>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE 1 = 1"));
        if let Some(status) = filter.status {
            builder.push(" AND status = ").push_bind(status);
        }
        if let Some(category_id) = filter.category_id {
            builder.push(" AND category_id = ").push_bind(category_id);
        }
        if let Some(ids) = &filter.category_ids {
            builder.push(" AND category_id = ANY(").push_bind(ids.clone()).push(")");
        }
        if let Some(featured) = filter.featured {
            builder.push(" AND is_featured = ").push_bind(featured);
        }
        push_search(&mut builder, &["name", "summary", "slug"], filter.search.as_ref());
        builder.push(" ORDER BY sort_order ASC, name ASC");
        push_limit(&mut builder, filter.limit);
        Ok(builder.build_query_as::<Product>().fetch_all(&self.pool).await?)
    }

    async fn get_product(&self, id: Uuid) -> AppResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        Ok(sqlx::query_as::<_, Product>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn get_product_by_slug(&self, slug: &str) -> AppResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE slug = $1");
        Ok(sqlx::query_as::<_, Product>(&sql).bind(slug).fetch_optional(&self.pool).await?)
    }

    async fn create_product(&self, product: Product) -> AppResult<Product> {
        let sql = format!(
            "INSERT INTO products ({PRODUCT_COLUMNS}) VALUES \
             ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17) \
             RETURNING {PRODUCT_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Product>(&sql)
            .bind(product.id)
            .bind(&product.name)
            .bind(&product.slug)
            .bind(product.category_id)
            .bind(&product.summary)
            .bind(&product.description)
            .bind(&product.specifications)
            .bind(&product.features)
            .bind(&product.images)
            .bind(&product.datasheet_url)
            .bind(product.status)
            .bind(product.is_featured)
            .bind(product.sort_order)
            .bind(&product.meta_title)
            .bind(&product.meta_description)
            .bind(product.created_at)
            .bind(product.updated_at)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_product(&self, product: Product) -> AppResult<Product> {
        let sql = format!(
            "UPDATE products SET name = $2, slug = $3, category_id = $4, summary = $5, description = $6, \
             specifications = $7, features = $8, images = $9, datasheet_url = $10, status = $11, \
             is_featured = $12, sort_order = $13, meta_title = $14, meta_description = $15, updated_at = NOW() \
             WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&sql)
            .bind(product.id)
            .bind(&product.name)
            .bind(&product.slug)
            .bind(product.category_id)
            .bind(&product.summary)
            .bind(&product.description)
            .bind(&product.specifications)
            .bind(&product.features)
            .bind(&product.images)
            .bind(&product.datasheet_url)
            .bind(product.status)
            .bind(product.is_featured)
            .bind(product.sort_order)
            .bind(&product.meta_title)
            .bind(&product.meta_description)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound("Product"))
    }

    async fn delete_product(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    // --- News ---

    async fn list_news(&self, filter: &ListFilter) -> AppResult<Vec<News>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {NEWS_COLUMNS} FROM news WHERE 1 = 1"));
        if let Some(status) = filter.status {
            builder.push(" AND status = ").push_bind(status);
        }
        push_search(&mut builder, &["title", "excerpt"], filter.search.as_ref());
        builder.push(" ORDER BY COALESCE(published_at, created_at) DESC, created_at DESC");
        push_limit(&mut builder, filter.limit);
        Ok(builder.build_query_as::<News>().fetch_all(&self.pool).await?)
    }

    async fn get_news(&self, id: Uuid) -> AppResult<Option<News>> {
        let sql = format!("SELECT {NEWS_COLUMNS} FROM news WHERE id = $1");
        Ok(sqlx::query_as::<_, News>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn get_news_by_slug(&self, slug: &str) -> AppResult<Option<News>> {
        let sql = format!("SELECT {NEWS_COLUMNS} FROM news WHERE slug = $1");
        Ok(sqlx::query_as::<_, News>(&sql).bind(slug).fetch_optional(&self.pool).await?)
    }

    async fn create_news(&self, news: News) -> AppResult<News> {
        let sql = format!(
            "INSERT INTO news ({NEWS_COLUMNS}) VALUES \
             ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) RETURNING {NEWS_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, News>(&sql)
            .bind(news.id)
            .bind(&news.title)
            .bind(&news.slug)
            .bind(&news.excerpt)
            .bind(&news.content)
            .bind(&news.cover_image)
            .bind(&news.author)
            .bind(&news.tags)
            .bind(news.status)
            .bind(news.is_featured)
            .bind(news.published_at)
            .bind(&news.meta_title)
            .bind(&news.meta_description)
            .bind(news.created_at)
            .bind(news.updated_at)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_news(&self, news: News) -> AppResult<News> {
        let sql = format!(
            "UPDATE news SET title = $2, slug = $3, excerpt = $4, content = $5, cover_image = $6, author = $7, \
             tags = $8, status = $9, is_featured = $10, published_at = $11, meta_title = $12, \
             meta_description = $13, updated_at = NOW() WHERE id = $1 RETURNING {NEWS_COLUMNS}"
        );
        sqlx::query_as::<_, News>(&sql)
            .bind(news.id)
            .bind(&news.title)
            .bind(&news.slug)
            .bind(&news.excerpt)
            .bind(&news.content)
            .bind(&news.cover_image)
            .bind(&news.author)
            .bind(&news.tags)
            .bind(news.status)
            .bind(news.is_featured)
            .bind(news.published_at)
            .bind(&news.meta_title)
            .bind(&news.meta_description)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound("News"))
    }

    async fn delete_news(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM news WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    // --- Navigation ---

    async fn list_navigation(&self, location: Option<NavLocation>) -> AppResult<Vec<NavigationItem>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {NAVIGATION_COLUMNS} FROM navigation_items WHERE 1 = 1"));
        if let Some(location) = location {
            builder.push(" AND location = ").push_bind(location);
        }
        builder.push(" ORDER BY sort_order ASC, label ASC");
        Ok(builder.build_query_as::<NavigationItem>().fetch_all(&self.pool).await?)
    }

    async fn get_navigation_item(&self, id: Uuid) -> AppResult<Option<NavigationItem>> {
        let sql = format!("SELECT {NAVIGATION_COLUMNS} FROM navigation_items WHERE id = $1");
        Ok(sqlx::query_as::<_, NavigationItem>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn create_navigation_item(&self, item: NavigationItem) -> AppResult<NavigationItem> {
        let sql = format!(
            "INSERT INTO navigation_items ({NAVIGATION_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {NAVIGATION_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, NavigationItem>(&sql)
            .bind(item.id)
            .bind(&item.label)
            .bind(&item.url)
            .bind(item.parent_id)
            .bind(item.location)
            .bind(item.sort_order)
            .bind(item.open_in_new_tab)
            .bind(item.is_active)
            .bind(item.created_at)
            .bind(item.updated_at)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_navigation_item(&self, item: NavigationItem) -> AppResult<NavigationItem> {
        let sql = format!(
            "UPDATE navigation_items SET label = $2, url = $3, parent_id = $4, location = $5, sort_order = $6, \
             open_in_new_tab = $7, is_active = $8, updated_at = NOW() WHERE id = $1 RETURNING {NAVIGATION_COLUMNS}"
        );
        sqlx::query_as::<_, NavigationItem>(&sql)
            .bind(item.id)
            .bind(&item.label)
            .bind(&item.url)
            .bind(item.parent_id)
            .bind(item.location)
            .bind(item.sort_order)
            .bind(item.open_in_new_tab)
            .bind(item.is_active)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound("Navigation item"))
    }

    async fn delete_navigation_item(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM navigation_items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_navigation_children(&self, id: Uuid) -> AppResult<i64> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM navigation_items WHERE parent_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?)
    }

    /// reorder_navigation
    ///
    /// All updates run inside one transaction. Any early return drops `tx`, which
    /// rolls back everything written so far.
    async fn reorder_navigation(&self, items: &[ReorderItem]) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        for item in items {
            if item.parent_id == Some(item.id) {
                return Err(AppError::BadRequest(format!("Navigation item {} cannot be its own parent", item.id)));
            }
            let parent_location = match item.parent_id {
                Some(parent_id) => Some(
                    sqlx::query_scalar::<_, NavLocation>("SELECT location FROM navigation_items WHERE id = $1")
                        .bind(parent_id)
                        .fetch_optional(&mut *tx)
                        .await?
                        .ok_or_else(|| AppError::BadRequest(format!("Unknown parent navigation item {parent_id}")))?,
                ),
                None => None,
            };
            let location = sqlx::query_scalar::<_, NavLocation>(
                "UPDATE navigation_items SET parent_id = $2, sort_order = $3, updated_at = NOW() \
                 WHERE id = $1 RETURNING location",
            )
            .bind(item.id)
            .bind(item.parent_id)
            .bind(item.sort_order)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::BadRequest(format!("Unknown navigation item {}", item.id)))?;
            if parent_location.is_some_and(|parent| parent != location) {
                return Err(AppError::BadRequest(format!(
                    "Navigation item {} can not move below an item of another menu",
                    item.id
                )));
            }
        }

        let after = sqlx::query_as::<_, NavigationItem>(&format!("SELECT {NAVIGATION_COLUMNS} FROM navigation_items"))
            .fetch_all(&mut *tx)
            .await?;
        if tree::has_cycle(&after) {
            return Err(AppError::BadRequest("Reorder would create a navigation cycle".to_string()));
        }

        tx.commit().await?;
        Ok(())
    }

    // --- Media ---

    async fn list_media(&self, filter: &MediaFilter) -> AppResult<Vec<MediaAsset>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {MEDIA_COLUMNS} FROM media WHERE 1 = 1"));
        if let Some(folder) = &filter.folder {
            builder.push(" AND folder = ").push_bind(folder.clone());
        }
        if let Some(prefix) = &filter.mime_prefix {
            builder
                .push(" AND mime_type LIKE ")
                .push_bind(format!("{}%", escape_like(prefix)))
                .push(" ESCAPE '\\'");
        }
        push_search(&mut builder, &["original_name", "title", "alt_text"], filter.search.as_ref());
        builder.push(" ORDER BY created_at DESC");
        push_limit(&mut builder, filter.limit);
        Ok(builder.build_query_as::<MediaAsset>().fetch_all(&self.pool).await?)
    }

    async fn get_media(&self, id: Uuid) -> AppResult<Option<MediaAsset>> {
        let sql = format!("SELECT {MEDIA_COLUMNS} FROM media WHERE id = $1");
        Ok(sqlx::query_as::<_, MediaAsset>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn create_media(&self, asset: MediaAsset, version: MediaVersion) -> AppResult<MediaAsset> {
        let mut tx = self.pool.begin().await?;
        let sql = format!(
            "INSERT INTO media ({MEDIA_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             RETURNING {MEDIA_COLUMNS}"
        );
        let created = sqlx::query_as::<_, MediaAsset>(&sql)
            .bind(asset.id)
            .bind(&asset.filename)
            .bind(&asset.original_name)
            .bind(&asset.mime_type)
            .bind(asset.size_bytes)
            .bind(&asset.storage_key)
            .bind(&asset.url)
            .bind(&asset.alt_text)
            .bind(&asset.title)
            .bind(&asset.folder)
            .bind(asset.current_version)
            .bind(asset.uploaded_by)
            .bind(asset.created_at)
            .bind(asset.updated_at)
            .fetch_one(&mut *tx)
            .await?;
        insert_version(&mut tx, &version).await?;
        tx.commit().await?;
        Ok(created)
    }

    async fn add_media_version(&self, asset: MediaAsset, version: MediaVersion) -> AppResult<MediaAsset> {
        let mut tx = self.pool.begin().await?;
        insert_version(&mut tx, &version).await?;
        let sql = format!(
            "UPDATE media SET filename = $2, mime_type = $3, size_bytes = $4, storage_key = $5, url = $6, \
             current_version = $7, updated_at = NOW() WHERE id = $1 RETURNING {MEDIA_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, MediaAsset>(&sql)
            .bind(asset.id)
            .bind(&asset.filename)
            .bind(&asset.mime_type)
            .bind(asset.size_bytes)
            .bind(&asset.storage_key)
            .bind(&asset.url)
            .bind(asset.current_version)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(AppError::NotFound("Media"))?;
        tx.commit().await?;
        Ok(updated)
    }

    async fn update_media(&self, asset: MediaAsset) -> AppResult<MediaAsset> {
        let sql = format!(
            "UPDATE media SET alt_text = $2, title = $3, folder = $4, updated_at = NOW() \
             WHERE id = $1 RETURNING {MEDIA_COLUMNS}"
        );
        sqlx::query_as::<_, MediaAsset>(&sql)
            .bind(asset.id)
            .bind(&asset.alt_text)
            .bind(&asset.title)
            .bind(&asset.folder)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound("Media"))
    }

    async fn delete_media(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM media WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_media_versions(&self, asset_id: Uuid) -> AppResult<Vec<MediaVersion>> {
        Ok(sqlx::query_as::<_, MediaVersion>(
            "SELECT id, asset_id, version, storage_key, mime_type, size_bytes, note, created_by, created_at \
             FROM media_versions WHERE asset_id = $1 ORDER BY version DESC",
        )
        .bind(asset_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn list_media_usages(&self, asset_id: Uuid) -> AppResult<Vec<MediaUsage>> {
        Ok(sqlx::query_as::<_, MediaUsage>(
            "SELECT id, asset_id, entity_type, entity_id, field, created_at \
             FROM media_usages WHERE asset_id = $1 ORDER BY created_at ASC",
        )
        .bind(asset_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn create_media_usage(&self, usage: MediaUsage) -> AppResult<MediaUsage> {
        Ok(sqlx::query_as::<_, MediaUsage>(
            "INSERT INTO media_usages (id, asset_id, entity_type, entity_id, field, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING id, asset_id, entity_type, entity_id, field, created_at",
        )
        .bind(usage.id)
        .bind(usage.asset_id)
        .bind(&usage.entity_type)
        .bind(usage.entity_id)
        .bind(&usage.field)
        .bind(usage.created_at)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn delete_media_usage(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM media_usages WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_media_usages(&self, asset_id: Uuid) -> AppResult<i64> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM media_usages WHERE asset_id = $1")
            .bind(asset_id)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn get_media_properties(&self, asset_id: Uuid) -> AppResult<BTreeMap<String, String>> {
        let rows = sqlx::query_as::<_, MediaProperty>(
            "SELECT asset_id, key, value FROM media_properties WHERE asset_id = $1",
        )
        .bind(asset_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|p| (p.key, p.value)).collect())
    }

    async fn replace_media_properties(
        &self,
        asset_id: Uuid,
        properties: &BTreeMap<String, String>,
    ) -> AppResult<BTreeMap<String, String>> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM media_properties WHERE asset_id = $1")
            .bind(asset_id)
            .execute(&mut *tx)
            .await?;
        for (key, value) in properties {
            sqlx::query("INSERT INTO media_properties (asset_id, key, value) VALUES ($1, $2, $3)")
                .bind(asset_id)
                .bind(key)
                .bind(value)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(properties.clone())
    }

    // --- FAQ ---

    async fn list_faqs(&self, active_only: bool) -> AppResult<Vec<Faq>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!("SELECT {FAQ_COLUMNS} FROM faqs"));
        if active_only {
            builder.push(" WHERE is_active = true");
        }
        builder.push(" ORDER BY category ASC NULLS FIRST, sort_order ASC, question ASC");
        Ok(builder.build_query_as::<Faq>().fetch_all(&self.pool).await?)
    }

    async fn get_faq(&self, id: Uuid) -> AppResult<Option<Faq>> {
        let sql = format!("SELECT {FAQ_COLUMNS} FROM faqs WHERE id = $1");
        Ok(sqlx::query_as::<_, Faq>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn create_faq(&self, faq: Faq) -> AppResult<Faq> {
        let sql = format!(
            "INSERT INTO faqs ({FAQ_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {FAQ_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Faq>(&sql)
            .bind(faq.id)
            .bind(&faq.question)
            .bind(&faq.answer)
            .bind(&faq.category)
            .bind(faq.sort_order)
            .bind(faq.is_active)
            .bind(faq.created_at)
            .bind(faq.updated_at)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_faq(&self, faq: Faq) -> AppResult<Faq> {
        let sql = format!(
            "UPDATE faqs SET question = $2, answer = $3, category = $4, sort_order = $5, is_active = $6, \
             updated_at = NOW() WHERE id = $1 RETURNING {FAQ_COLUMNS}"
        );
        sqlx::query_as::<_, Faq>(&sql)
            .bind(faq.id)
            .bind(&faq.question)
            .bind(&faq.answer)
            .bind(&faq.category)
            .bind(faq.sort_order)
            .bind(faq.is_active)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound("FAQ"))
    }

    async fn delete_faq(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM faqs WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    // --- Users & sessions ---

    async fn list_users(&self) -> AppResult<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY email ASC");
        Ok(sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool).await?)
    }

    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        Ok(sqlx::query_as::<_, User>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn get_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        Ok(sqlx::query_as::<_, User>(&sql).bind(email).fetch_optional(&self.pool).await?)
    }

    async fn create_user(&self, user: User) -> AppResult<User> {
        let sql = format!(
            "INSERT INTO users ({USER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {USER_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(user.id)
            .bind(&user.email)
            .bind(&user.name)
            .bind(&user.password_hash)
            .bind(user.role)
            .bind(user.status)
            .bind(user.last_login_at)
            .bind(user.created_at)
            .bind(user.updated_at)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_user(&self, user: User) -> AppResult<User> {
        let sql = format!(
            "UPDATE users SET email = $2, name = $3, password_hash = $4, role = $5, status = $6, \
             updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(user.id)
            .bind(&user.email)
            .bind(&user.name)
            .bind(&user.password_hash)
            .bind(user.role)
            .bind(user.status)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound("User"))
    }

    async fn delete_user(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_users(&self) -> AppResult<i64> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users").fetch_one(&self.pool).await?)
    }

    async fn touch_last_login(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn create_session(&self, session: Session) -> AppResult<Session> {
        Ok(sqlx::query_as::<_, Session>(
            "INSERT INTO sessions (id, user_id, expires_at, created_at) VALUES ($1, $2, $3, $4) \
             RETURNING id, user_id, expires_at, created_at",
        )
        .bind(session.id)
        .bind(session.user_id)
        .bind(session.expires_at)
        .bind(session.created_at)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn get_session(&self, id: Uuid) -> AppResult<Option<Session>> {
        Ok(sqlx::query_as::<_, Session>("SELECT id, user_id, expires_at, created_at FROM sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_session(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_user_sessions(&self, user_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn purge_expired_sessions(&self) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= NOW()").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    // --- Settings ---

    async fn get_setting(&self, key: &str) -> AppResult<Option<serde_json::Value>> {
        Ok(sqlx::query_scalar::<_, serde_json::Value>("SELECT value FROM settings WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn put_setting(&self, key: &str, value: serde_json::Value) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO settings (key, value, updated_at) VALUES ($1, $2, NOW()) \
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // --- Contact submissions ---

    async fn create_contact(&self, submission: ContactSubmission) -> AppResult<ContactSubmission> {
        let sql = format!(
            "INSERT INTO contact_submissions ({CONTACT_COLUMNS}) VALUES \
             ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING {CONTACT_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, ContactSubmission>(&sql)
            .bind(submission.id)
            .bind(&submission.name)
            .bind(&submission.email)
            .bind(&submission.company)
            .bind(&submission.phone)
            .bind(&submission.subject)
            .bind(&submission.message)
            .bind(submission.status)
            .bind(submission.email_sent)
            .bind(&submission.email_error)
            .bind(submission.created_at)
            .bind(submission.updated_at)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn list_contacts(&self, filter: &ContactFilter) -> AppResult<Vec<ContactSubmission>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {CONTACT_COLUMNS} FROM contact_submissions WHERE 1 = 1"));
        if let Some(status) = filter.status {
            builder.push(" AND status = ").push_bind(status);
        }
        builder.push(" ORDER BY created_at DESC");
        push_limit(&mut builder, filter.limit);
        Ok(builder.build_query_as::<ContactSubmission>().fetch_all(&self.pool).await?)
    }

    async fn get_contact(&self, id: Uuid) -> AppResult<Option<ContactSubmission>> {
        let sql = format!("SELECT {CONTACT_COLUMNS} FROM contact_submissions WHERE id = $1");
        Ok(sqlx::query_as::<_, ContactSubmission>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn update_contact_status(&self, id: Uuid, status: ContactStatus) -> AppResult<ContactSubmission> {
        let sql = format!(
            "UPDATE contact_submissions SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {CONTACT_COLUMNS}"
        );
        sqlx::query_as::<_, ContactSubmission>(&sql)
            .bind(id)
            .bind(status)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound("Contact submission"))
    }

    async fn record_contact_email(&self, id: Uuid, sent: bool, error: Option<String>) -> AppResult<ContactSubmission> {
        let sql = format!(
            "UPDATE contact_submissions SET email_sent = $2, email_error = $3, updated_at = NOW() \
             WHERE id = $1 RETURNING {CONTACT_COLUMNS}"
        );
        sqlx::query_as::<_, ContactSubmission>(&sql)
            .bind(id)
            .bind(sent)
            .bind(error)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound("Contact submission"))
    }

    async fn delete_contact(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM contact_submissions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- Dashboard ---

    async fn get_stats(&self) -> AppResult<DashboardStats> {
        let (pages, products, categories, news, media, faqs, users, unread_contacts) =
            sqlx::query_as::<_, (i64, i64, i64, i64, i64, i64, i64, i64)>(
                r#"
                SELECT
                    (SELECT COUNT(*) FROM pages),
                    (SELECT COUNT(*) FROM products),
                    (SELECT COUNT(*) FROM categories),
                    (SELECT COUNT(*) FROM news),
                    (SELECT COUNT(*) FROM media),
                    (SELECT COUNT(*) FROM faqs),
                    (SELECT COUNT(*) FROM users),
                    (SELECT COUNT(*) FROM contact_submissions WHERE status = 'new')
                "#,
            )
            .fetch_one(&self.pool)
            .await?;

        Ok(DashboardStats { pages, products, categories, news, media, faqs, users, unread_contacts })
    }
}

async fn insert_version(tx: &mut sqlx::Transaction<'_, Postgres>, version: &MediaVersion) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO media_versions (id, asset_id, version, storage_key, mime_type, size_bytes, note, created_by, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(version.id)
    .bind(version.asset_id)
    .bind(version.version)
    .bind(&version.storage_key)
    .bind(&version.mime_type)
    .bind(version.size_bytes)
    .bind(&version.note)
    .bind(version.created_by)
    .bind(version.created_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
