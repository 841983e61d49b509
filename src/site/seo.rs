use axum::{
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use maud::html;

use crate::{
    AppState,
    error::AppResult,
    handlers::settings::load_seo_settings,
    models::{ContentStatus, ListFilter, ProductFilter},
};

const STATIC_ROUTES: &[&str] = &["/", "/products", "/news", "/faq", "/contact"];

/// One `<url>` entry of the sitemap.
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    pub path: String,
    pub lastmod: Option<DateTime<Utc>>,
}

pub fn render_sitemap(base_url: &str, entries: &[SitemapEntry]) -> String {
    let base_url = base_url.trim_end_matches('/');
    let urlset = html! {
        urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9" {
            @for entry in entries {
                url {
                    loc { (base_url) (entry.path) }
                    @if let Some(at) = entry.lastmod {
                        lastmod { (at.format("%Y-%m-%d").to_string()) }
                    }
                }
            }
        }
    };
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{}\n", urlset.into_string())
}

pub fn default_robots(base_url: &str) -> String {
    format!(
        "User-agent: *\nAllow: /\nDisallow: /admin\nDisallow: /api\n\nSitemap: {}/sitemap.xml\n",
        base_url.trim_end_matches('/')
    )
}

/// GET /sitemap.xml
///
/// Static routes plus every published page, product and news post.
pub async fn sitemap(State(state): State<AppState>) -> AppResult<Response> {
    let seo = load_seo_settings(&state.repo).await?;
    if !seo.sitemap_enabled {
        return Ok(StatusCode::NOT_FOUND.into_response());
    }

    let published = ListFilter { status: Some(ContentStatus::Published), ..Default::default() };
    let mut entries: Vec<SitemapEntry> = STATIC_ROUTES
        .iter()
        .map(|path| SitemapEntry { path: path.to_string(), lastmod: None })
        .collect();

    entries.extend(state.repo.list_pages(&published).await?.into_iter().map(|page| SitemapEntry {
        path: format!("/{}", page.slug),
        lastmod: Some(page.updated_at),
    }));
    entries.extend(
        state
            .repo
            .list_products(&ProductFilter { status: Some(ContentStatus::Published), ..Default::default() })
            .await?
            .into_iter()
            .map(|product| SitemapEntry {
                path: format!("/products/{}", product.slug),
                lastmod: Some(product.updated_at),
            }),
    );
    entries.extend(state.repo.list_news(&published).await?.into_iter().map(|news| SitemapEntry {
        path: format!("/news/{}", news.slug),
        lastmod: Some(news.updated_at),
    }));

    let xml = render_sitemap(&state.config.base_url, &entries);
    Ok(([(header::CONTENT_TYPE, "application/xml; charset=utf-8")], xml).into_response())
}

/// GET /robots.txt
pub async fn robots(State(state): State<AppState>) -> AppResult<Response> {
    let seo = load_seo_settings(&state.repo).await?;
    let body = seo
        .robots_txt
        .filter(|text| !text.trim().is_empty())
        .unwrap_or_else(|| default_robots(&state.config.base_url));
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response())
}
