use axum::{
    extract::{Path, State},
    http::Uri,
    response::Response,
};
use maud::{Markup, PreEscaped, html};
use std::collections::HashSet;

use super::{PageMeta, SiteContext, not_found, respond};
use crate::{
    AppState,
    error::{AppError, AppResult},
    models::{
        ActiveStatus, CategoryNode, ContentStatus, Faq, ListFilter, News, Product, ProductFilter, SectionContent,
    },
    tree,
};

const FEATURED_PRODUCTS: i64 = 6;
const LATEST_NEWS: i64 = 3;

fn published_products() -> ProductFilter {
    ProductFilter { status: Some(ContentStatus::Published), ..Default::default() }
}

fn published_news(limit: Option<i64>) -> ListFilter {
    ListFilter { status: Some(ContentStatus::Published), limit, ..Default::default() }
}

fn date(at: Option<chrono::DateTime<chrono::Utc>>) -> String {
    at.map(|at| at.format("%Y-%m-%d").to_string()).unwrap_or_default()
}

fn product_card(product: &Product) -> Markup {
    html! {
        article.product-card {
            @if let Some(src) = product.images.first() {
                img src=(src) alt=(product.name) loading="lazy";
            }
            h3 { a href={ "/products/" (product.slug) } { (product.name) } }
            @if let Some(summary) = &product.summary {
                p { (summary) }
            }
        }
    }
}

fn news_card(news: &News) -> Markup {
    let date = date(news.published_at);
    html! {
        article.news-card {
            time datetime=(date) { (date) }
            h3 { a href={ "/news/" (news.slug) } { (news.title) } }
            @if let Some(excerpt) = &news.excerpt {
                p { (excerpt) }
            }
        }
    }
}

fn product_grid(products: &[Product]) -> Markup {
    html! {
        div.product-grid {
            @for product in products {
                (product_card(product))
            }
        }
    }
}

fn section_block(section: &SectionContent) -> Markup {
    let field = |key: &str| section.content.get(key).and_then(|v| v.as_str()).filter(|v| !v.is_empty());

    html! {
        section class={ "section section-" (section.name) } {
            h2 { (section.title) }
            @if let Some(subtitle) = field("subtitle") {
                p class="subtitle" { (subtitle) }
            }
            @if let Some(image) = field("image") {
                img src=(image) alt=(section.title);
            }
            @if let Some(body) = field("body") {
                div class="body" { (PreEscaped(body)) }
            }
            @if let (Some(label), Some(url)) = (field("cta_label"), field("cta_url")) {
                a class="cta" href=(url) { (label) }
            }
        }
    }
}

fn category_menu(nodes: &[CategoryNode]) -> Markup {
    html! {
        @if !nodes.is_empty() {
            ul.categories {
                @for node in nodes {
                    li {
                        a href={ "/products/category/" (node.category.slug) } { (node.category.name) }
                        (category_menu(&node.children))
                    }
                }
            }
        }
    }
}

/// GET /
pub async fn home(State(state): State<AppState>) -> AppResult<Response> {
    let ctx = SiteContext::load(&state).await?;

    let sections: Vec<SectionContent> = state.repo.list_sections().await?.into_iter().filter(|s| s.is_active).collect();
    let featured = state
        .repo
        .list_products(&ProductFilter { featured: Some(true), limit: Some(FEATURED_PRODUCTS), ..published_products() })
        .await?;
    let latest = state.repo.list_news(&published_news(Some(LATEST_NEWS))).await?;

    let body = html! {
        @for section in &sections {
            (section_block(section))
        }
        @if !featured.is_empty() {
            section.featured-products {
                h2 { "Featured products" }
                (product_grid(&featured))
            }
        }
        @if !latest.is_empty() {
            section.latest-news {
                h2 { "Latest news" }
                @for news in &latest {
                    (news_card(news))
                }
            }
        }
    };

    let meta = PageMeta { path: "/".to_string(), ..Default::default() };
    Ok(respond(&ctx, &meta, body))
}

/// GET /products
pub async fn products(State(state): State<AppState>) -> AppResult<Response> {
    let ctx = SiteContext::load(&state).await?;
    let categories = active_categories(&state).await?;
    let products = state.repo.list_products(&published_products()).await?;

    let body = html! {
        h1 { "Products" }
        aside { (category_menu(&tree::category_tree(categories))) }
        (product_grid(&products))
    };
    Ok(respond(&ctx, &PageMeta::new("Products", "/products"), body))
}

/// GET /products/category/{slug}
///
/// Lists the published products of the category and all of its subcategories.
pub async fn product_category(State(state): State<AppState>, Path(slug): Path<String>) -> AppResult<Response> {
    let ctx = SiteContext::load(&state).await?;
    let path = format!("/products/category/{slug}");

    let categories = active_categories(&state).await?;
    let Some(category) = categories.iter().find(|c| c.slug == slug).cloned() else {
        return Ok(not_found(&ctx, &path));
    };

    let mut ids: HashSet<uuid::Uuid> = tree::descendants(&categories, category.id);
    ids.insert(category.id);
    let products = state
        .repo
        .list_products(&ProductFilter { category_ids: Some(ids.iter().copied().collect()), ..published_products() })
        .await?;

    let subcategories: Vec<_> = categories.into_iter().filter(|c| ids.contains(&c.id) && c.id != category.id).collect();
    let body = html! {
        h1 { (category.name) }
        @if let Some(description) = &category.description {
            p { (description) }
        }
        aside { (category_menu(&tree::category_tree(subcategories))) }
        (product_grid(&products))
    };
    let meta = PageMeta::new(category.name.clone(), path).describe(category.description.as_deref());
    Ok(respond(&ctx, &meta, body))
}

fn spec_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// GET /products/{slug}
pub async fn product_detail(State(state): State<AppState>, Path(slug): Path<String>) -> AppResult<Response> {
    let ctx = SiteContext::load(&state).await?;
    let path = format!("/products/{slug}");

    let Some(product) = state
        .repo
        .get_product_by_slug(&slug)
        .await?
        .filter(|p| p.status == ContentStatus::Published)
    else {
        return Ok(not_found(&ctx, &path));
    };

    let specs: Vec<(&String, String)> = product
        .specifications
        .as_object()
        .into_iter()
        .flatten()
        .map(|(key, value)| (key, spec_value(value)))
        .collect();

    let body = html! {
        article.product {
            h1 { (product.name) }
            div.gallery {
                @for src in &product.images {
                    img src=(src) alt=(product.name);
                }
            }
            div.description { (PreEscaped(&product.description)) }
            @if !product.features.is_empty() {
                h2 { "Features" }
                ul {
                    @for feature in &product.features {
                        li { (feature) }
                    }
                }
            }
            @if !specs.is_empty() {
                h2 { "Specifications" }
                table.specs {
                    @for (key, value) in &specs {
                        tr { th { (key) } td { (value) } }
                    }
                }
            }
            @if let Some(datasheet) = &product.datasheet_url {
                p { a.datasheet href=(datasheet) { "Download datasheet" } }
            }
            p { a.cta href="/contact" { "Request a quote" } }
        }
    };

    let meta = PageMeta {
        title: Some(product.meta_title.clone().unwrap_or_else(|| product.name.clone())),
        description: product.meta_description.clone().or_else(|| product.summary.clone()),
        image: product.images.first().cloned(),
        path,
    };
    Ok(respond(&ctx, &meta, body))
}

/// GET /news
pub async fn news_list(State(state): State<AppState>) -> AppResult<Response> {
    let ctx = SiteContext::load(&state).await?;
    let news = state.repo.list_news(&published_news(None)).await?;
    let body = html! {
        h1 { "News" }
        div.news-list {
            @for item in &news {
                (news_card(item))
            }
        }
    };
    Ok(respond(&ctx, &PageMeta::new("News", "/news"), body))
}

/// GET /news/{slug}
pub async fn news_detail(State(state): State<AppState>, Path(slug): Path<String>) -> AppResult<Response> {
    let ctx = SiteContext::load(&state).await?;
    let path = format!("/news/{slug}");

    let Some(news) = state
        .repo
        .get_news_by_slug(&slug)
        .await?
        .filter(|n| n.status == ContentStatus::Published)
    else {
        return Ok(not_found(&ctx, &path));
    };

    let published = date(news.published_at);
    let body = html! {
        article.news {
            h1 { (news.title) }
            p.meta {
                time datetime=(published) { (published) }
                @if let Some(author) = &news.author {
                    " by " (author)
                }
            }
            @if let Some(src) = &news.cover_image {
                img.cover src=(src) alt=(news.title);
            }
            div.content { (PreEscaped(&news.content)) }
            @if !news.tags.is_empty() {
                p.tags {
                    @for tag in &news.tags {
                        span.tag { (tag) }
                    }
                }
            }
        }
    };

    let meta = PageMeta {
        title: Some(news.meta_title.clone().unwrap_or_else(|| news.title.clone())),
        description: news.meta_description.clone().or_else(|| news.excerpt.clone()),
        image: news.cover_image.clone(),
        path,
    };
    Ok(respond(&ctx, &meta, body))
}

/// GET /faq
pub async fn faq(State(state): State<AppState>) -> AppResult<Response> {
    let ctx = SiteContext::load(&state).await?;
    let faqs = state.repo.list_faqs(true).await?;
    let body = html! {
        h1 { "Frequently asked questions" }
        (faq_groups(&faqs))
    };
    Ok(respond(&ctx, &PageMeta::new("FAQ", "/faq"), body))
}

/// Groups consecutive entries by category; rows arrive ordered by category.
fn faq_groups(faqs: &[Faq]) -> Markup {
    let mut groups: Vec<(Option<&str>, Vec<&Faq>)> = Vec::new();
    for faq in faqs {
        let category = faq.category.as_deref();
        match groups.last_mut() {
            Some((current, entries)) if *current == category => entries.push(faq),
            _ => groups.push((category, vec![faq])),
        }
    }

    html! {
        @for (category, entries) in &groups {
            section.faq-group {
                @if let Some(name) = category {
                    h2 { (name) }
                }
                @for faq in entries {
                    details {
                        summary { (faq.question) }
                        div { (PreEscaped(&faq.answer)) }
                    }
                }
            }
        }
    }
}

const CONTACT_SCRIPT: &str = r#"
document.getElementById('contact-form').addEventListener('submit', async (event) => {
  event.preventDefault();
  const form = event.target;
  const data = Object.fromEntries(new FormData(form).entries());
  for (const key of Object.keys(data)) { if (data[key] === '') delete data[key]; }
  const status = document.getElementById('contact-status');
  const res = await fetch('/api/contact', {method: 'POST', headers: {'Content-Type': 'application/json'}, body: JSON.stringify(data)});
  if (res.ok) { form.reset(); status.textContent = 'Thank you, we will get back to you shortly.'; }
  else { const err = await res.json(); status.textContent = (err.details || []).map(d => d.message).join(', ') || err.error; }
});
"#;

/// GET /contact
pub async fn contact(State(state): State<AppState>) -> AppResult<Response> {
    let ctx = SiteContext::load(&state).await?;
    let site = &ctx.site;

    let body = html! {
        h1 { "Contact us" }
        div.contact-details {
            @if let Some(email) = &site.contact_email {
                p { "Email: " a href={ "mailto:" (email) } { (email) } }
            }
            @if let Some(phone) = &site.phone {
                p { "Phone: " (phone) }
            }
            @if let Some(address) = &site.address {
                p { (address) }
            }
        }
        form id="contact-form" {
            label { "Name " input name="name" maxlength="120" required; }
            label { "Email " input name="email" type="email" required; }
            label { "Company " input name="company" maxlength="120"; }
            label { "Phone " input name="phone" maxlength="40"; }
            label { "Subject " input name="subject" maxlength="200"; }
            label { "Message " textarea name="message" minlength="10" maxlength="5000" required {} }
            button type="submit" { "Send" }
        }
        p id="contact-status" role="status" {}
        script { (PreEscaped(CONTACT_SCRIPT)) }
    };
    Ok(respond(&ctx, &PageMeta::new("Contact", "/contact"), body))
}

/// GET /{slug}
///
/// Any published page, including the standard ones (`solutions`, `services`,
/// `privacy-policy`, `terms`).
pub async fn page(State(state): State<AppState>, Path(slug): Path<String>) -> AppResult<Response> {
    let ctx = SiteContext::load(&state).await?;
    let path = format!("/{slug}");

    let Some(page) = state
        .repo
        .get_page_by_slug(&slug)
        .await?
        .filter(|p| p.status == ContentStatus::Published)
    else {
        return Ok(not_found(&ctx, &path));
    };

    let body = html! {
        article class={ "page page-" (page.template) } {
            h1 { (page.title) }
            div.content { (PreEscaped(&page.content)) }
        }
    };
    let meta = PageMeta {
        title: Some(page.meta_title.clone().unwrap_or_else(|| page.title.clone())),
        description: page.meta_description.clone().or_else(|| page.excerpt.clone()),
        image: None,
        path,
    };
    Ok(respond(&ctx, &meta, body))
}

/// Router fallback: JSON 404 under `/api`, the HTML 404 page everywhere else.
pub async fn fallback(State(state): State<AppState>, uri: Uri) -> AppResult<Response> {
    if uri.path().starts_with("/api/") {
        return Err(AppError::NotFound("Route"));
    }
    let ctx = SiteContext::load(&state).await?;
    Ok(not_found(&ctx, uri.path()))
}

async fn active_categories(state: &AppState) -> AppResult<Vec<crate::models::Category>> {
    Ok(state
        .repo
        .list_categories()
        .await?
        .into_iter()
        .filter(|c| c.status == ActiveStatus::Active)
        .collect())
}
