//! Server-rendered public website and the admin HTML shell.
//!
//! Markup is built with `maud::html!`, which escapes every interpolated value.
//! Rich-text fields authored in the admin panel (`Page::content`,
//! `Product::description`, `News::content`, `Faq::answer` and a section's `body`)
//! are trusted HTML and go in through `PreEscaped`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::{DOCTYPE, Markup, PreEscaped, html};

use crate::{
    AppState,
    error::AppResult,
    handlers::{
        navigation::active_tree,
        settings::{load_seo_settings, load_site_settings},
    },
    models::{NavLocation, NavigationNode, SeoSettings, SiteSettings},
};

pub mod admin;
pub mod pages;
pub mod seo;

/// PageMeta
///
/// Per-document SEO input. Empty fields fall back to the site-wide SEO settings.
#[derive(Debug, Default, Clone)]
pub struct PageMeta {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    // Path part of the canonical URL, e.g. "/products/be-500".
    pub path: String,
}

impl PageMeta {
    pub fn new(title: impl Into<String>, path: impl Into<String>) -> Self {
        Self { title: Some(title.into()), path: path.into(), ..Default::default() }
    }

    pub fn describe(mut self, description: Option<&str>) -> Self {
        self.description = description.filter(|d| !d.trim().is_empty()).map(str::to_string);
        self
    }
}

/// SiteContext
///
/// Everything the shared layout needs: settings and both menus.
#[derive(Debug, Clone)]
pub struct SiteContext {
    pub site: SiteSettings,
    pub seo: SeoSettings,
    pub header: Vec<NavigationNode>,
    pub footer: Vec<NavigationNode>,
    pub base_url: String,
}

impl SiteContext {
    pub async fn load(state: &AppState) -> AppResult<Self> {
        let site = load_site_settings(&state.repo).await?;
        let seo = load_seo_settings(&state.repo).await?;
        let header = active_tree(state.repo.list_navigation(Some(NavLocation::Header)).await?);
        let footer = active_tree(state.repo.list_navigation(Some(NavLocation::Footer)).await?);
        Ok(Self {
            site,
            seo,
            header,
            footer,
            base_url: state.config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Wraps `body` in the full document: head with SEO tags, header menu, footer.
    pub fn render(&self, meta: &PageMeta, body: Markup) -> Markup {
        let title = self.seo.title_for(meta.title.as_deref());
        let description = meta
            .description
            .as_deref()
            .or(self.seo.default_description.as_deref())
            .filter(|d| !d.is_empty());
        let canonical = format!("{}{}", self.base_url, meta.path);
        let image = meta.image.as_deref().or(self.seo.og_image.as_deref());

        html! {
            (DOCTYPE)
            html lang="en" {
                head {
                    meta charset="utf-8";
                    meta name="viewport" content="width=device-width, initial-scale=1";
                    title { (title) }
                    link rel="canonical" href=(canonical);
                    meta property="og:title" content=(title);
                    meta property="og:url" content=(canonical);
                    @if let Some(description) = description {
                        meta name="description" content=(description);
                        meta property="og:description" content=(description);
                    }
                    @if !self.seo.keywords.is_empty() {
                        meta name="keywords" content=(self.seo.keywords.join(", "));
                    }
                    @if let Some(image) = image {
                        meta property="og:image" content=(image);
                    }
                    @if let Some(id) = analytics_id(&self.seo) {
                        script defer src={ "https://www.googletagmanager.com/gtag/js?id=" (id) } {}
                        script {
                            (PreEscaped(format!(
                                "window.dataLayer=window.dataLayer||[];function gtag(){{dataLayer.push(arguments);}}\
                                 gtag('js',new Date());gtag('config','{id}');"
                            )))
                        }
                    }
                }
                body {
                    (self.header())
                    main { (body) }
                    (self.footer())
                }
            }
        }
    }

    fn header(&self) -> Markup {
        html! {
            header.site-header {
                a.brand href="/" {
                    @if let Some(logo) = &self.site.logo_url {
                        img src=(logo) alt=(self.site.site_name);
                    } @else {
                        (self.site.site_name)
                    }
                }
                nav { (menu(&self.header)) }
            }
        }
    }

    fn footer(&self) -> Markup {
        let site = &self.site;
        html! {
            footer.site-footer {
                nav { (menu(&self.footer)) }
                address {
                    @if let Some(email) = &site.contact_email {
                        a href={ "mailto:" (email) } { (email) }
                        br;
                    }
                    @if let Some(phone) = &site.phone {
                        (phone)
                        br;
                    }
                    @if let Some(address) = &site.address {
                        (address)
                    }
                }
                div.social {
                    @for link in &site.social_links {
                        a href=(link.url) rel="noopener" { (link.platform) }
                        " "
                    }
                }
                @if let Some(text) = &site.footer_text {
                    p { (text) }
                }
            }
        }
    }
}

/// The Google Analytics id ends up inside an inline script, so only tag-shaped ids
/// (`G-XXXX`, `UA-1234-5`) are emitted.
fn analytics_id(seo: &SeoSettings) -> Option<&str> {
    seo.google_analytics_id
        .as_deref()
        .filter(|id| !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'))
}

fn menu(nodes: &[NavigationNode]) -> Markup {
    html! {
        @if !nodes.is_empty() {
            ul {
                @for node in nodes {
                    li {
                        @if node.open_in_new_tab {
                            a href=(node.url) target="_blank" rel="noopener" { (node.label) }
                        } @else {
                            a href=(node.url) { (node.label) }
                        }
                        (menu(&node.children))
                    }
                }
            }
        }
    }
}

/// The HTML 404 page for unknown or unpublished content.
pub fn not_found(ctx: &SiteContext, path: &str) -> Response {
    let body = html! {
        h1 { "Page not found" }
        p { "The page you are looking for does not exist or is no longer available." }
        p { a href="/" { "Back to the homepage" } }
    };
    let meta = PageMeta::new("Page not found", path);
    (StatusCode::NOT_FOUND, ctx.render(&meta, body)).into_response()
}

pub fn respond(ctx: &SiteContext, meta: &PageMeta, body: Markup) -> Response {
    ctx.render(meta, body).into_response()
}
