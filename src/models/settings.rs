use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use validator::Validate;

/// Row key under which [`SiteSettings`] is stored in the `settings` table.
pub const SITE_SETTINGS_KEY: &str = "site";
/// Row key under which [`SeoSettings`] is stored in the `settings` table.
pub const SEO_SETTINGS_KEY: &str = "seo";

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, PartialEq)]
#[ts(export)]
pub struct SocialLink {
    #[validate(length(min = 1, max = 40))]
    pub platform: String,
    #[validate(url)]
    pub url: String,
}

/// SiteSettings
///
/// Company-wide configuration edited from the admin panel (GET/PUT /api/settings/site).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, PartialEq)]
#[serde(default)]
#[ts(export)]
pub struct SiteSettings {
    #[validate(length(min = 1, max = 120))]
    pub site_name: String,
    #[validate(length(max = 200))]
    pub tagline: Option<String>,
    #[validate(email)]
    pub contact_email: Option<String>,
    // Recipient of contact-form notifications; falls back to CONTACT_RECIPIENT.
    #[validate(email)]
    pub notification_email: Option<String>,
    #[validate(length(max = 40))]
    pub phone: Option<String>,
    #[validate(length(max = 300))]
    pub address: Option<String>,
    #[validate(nested)]
    pub social_links: Vec<SocialLink>,
    #[validate(length(max = 500))]
    pub footer_text: Option<String>,
    pub logo_url: Option<String>,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            site_name: "CellEmu".to_string(),
            tagline: Some("Battery emulation for power electronics testing".to_string()),
            contact_email: None,
            notification_email: None,
            phone: None,
            address: None,
            social_links: vec![],
            footer_text: None,
            logo_url: None,
        }
    }
}

/// SeoSettings
///
/// Site-wide SEO defaults (GET/PUT /api/settings/seo). Per-record meta fields win
/// over these when present.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, PartialEq)]
#[serde(default)]
#[ts(export)]
pub struct SeoSettings {
    #[validate(length(min = 1, max = 200))]
    pub default_title: String,
    // `{title}` is replaced with the page title, e.g. "{title} | CellEmu".
    #[validate(length(max = 200))]
    pub title_template: String,
    #[validate(length(max = 500))]
    pub default_description: Option<String>,
    pub keywords: Vec<String>,
    pub og_image: Option<String>,
    #[validate(length(max = 40))]
    pub google_analytics_id: Option<String>,
    // Full robots.txt override; the generated default is used when unset.
    #[validate(length(max = 5000))]
    pub robots_txt: Option<String>,
    pub sitemap_enabled: bool,
}

impl Default for SeoSettings {
    fn default() -> Self {
        Self {
            default_title: "CellEmu Battery Emulators".to_string(),
            title_template: "{title} | CellEmu".to_string(),
            default_description: None,
            keywords: vec![],
            og_image: None,
            google_analytics_id: None,
            robots_txt: None,
            sitemap_enabled: true,
        }
    }
}

impl SeoSettings {
    /// Formats a document title through the configured template.
    pub fn title_for(&self, title: Option<&str>) -> String {
        match title {
            Some(t) if !t.is_empty() && self.title_template.contains("{title}") => {
                self.title_template.replace("{title}", t)
            }
            Some(t) if !t.is_empty() => t.to_string(),
            _ => self.default_title.clone(),
        }
    }
}
