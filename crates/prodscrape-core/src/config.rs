//! Site configuration: one JSON file per target site.
//!
//! The shape mirrors what site operators actually maintain: a list of start
//! URLs, optional fixed values for attributes that never change within a site
//! (brand, vendor, currency, gender), one extraction selector per record
//! field, and fetch tuning (pagination, anti-bot, scroll, headers).
//!
//! Selectors may be CSS (`div.price::text`) or XPath (`//div[@class='price']`);
//! the engine infers the kind from the expression's shape, so the config does
//! not declare it.

use std::collections::HashSet;
use std::path::Path;

use rand::seq::IndexedRandom;
use serde::Deserialize;

use crate::ConfigError;

/// User-Agent pool rotated across requests. One entry is picked at random
/// per request so repeated fetches from the same crawl do not present a
/// single fingerprint.
const USER_AGENTS: [&str; 8] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/113.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:102.0) Gecko/20100101 Firefox/102.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Edge/100.0.1185.39",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 15_0 like Mac OS X) AppleWebKit/537.36 (KHTML, like Gecko) Version/15.0 Mobile/15E148 Safari/537.36",
    "Mozilla/5.0 (Android 11; Mobile; rv:89.0) Gecko/89.0 Firefox/89.0",
    "Mozilla/5.0 (iPad; CPU OS 14_0 like Mac OS X) AppleWebKit/537.36 (KHTML, like Gecko) Version/14.0 Mobile/15E148 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Brave/1.36.109 Chrome/99.0.4844.51 Safari/537.36",
];

#[derive(Debug, Clone, Deserialize)]
pub struct ScrapeConfig {
    /// Listing or detail pages the crawl starts from.
    pub base_urls: Vec<String>,

    /// Fixed brand name, used when no `brand_name` selector is configured.
    #[serde(default)]
    pub brand_name: Option<String>,
    #[serde(default)]
    pub brand_url: Option<String>,
    #[serde(default)]
    pub vendor_name: Option<String>,
    #[serde(default)]
    pub vendor_url: Option<String>,

    /// ISO currency label. Sites in scope price in euros, hence the default.
    #[serde(default = "default_currency")]
    pub currency: Option<String>,

    /// Fixed gender for single-gender sites. When absent the engine derives
    /// gender from the page URL.
    #[serde(default)]
    pub gender: Option<String>,

    pub selectors: SelectorsConfig,

    #[serde(default)]
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub anti_bot: AntiBotConfig,
    #[serde(default)]
    pub headers: HeadersConfig,
    #[serde(default)]
    pub scroll: ScrollConfig,
}

/// Extraction expressions, one per record field. The three required fields
/// are the minimum a product page must yield; everything else is optional
/// and falls back to derivation or JSON-LD backfill.
#[derive(Debug, Clone, Deserialize)]
pub struct SelectorsConfig {
    pub product_name: String,
    pub offer_price: String,
    pub offer_image_url: String,

    #[serde(default)]
    pub discount_price: Option<String>,
    #[serde(default)]
    pub discount_percentage: Option<String>,
    #[serde(default)]
    pub product_description: Option<String>,
    #[serde(default)]
    pub vendor_icon_url: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub brand_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationConfig {
    #[serde(default)]
    pub enabled: bool,
    /// CSS selector whose first match is the next-page link.
    #[serde(default)]
    pub selector: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AntiBotConfig {
    /// Request browser rendering from the fetch collaborator. The built-in
    /// HTTP fetcher cannot render; it logs the request and serves raw HTML.
    #[serde(default)]
    pub use_playwright: bool,
    /// Delay in seconds between page requests.
    #[serde(default)]
    pub delay: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HeadersConfig {
    #[serde(default = "default_accept_language", rename = "Accept_Language")]
    pub accept_language: String,
    #[serde(default, rename = "Referer")]
    pub referer: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScrollConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_scroll_times")]
    pub times: u32,
    #[serde(default = "default_scroll_delay")]
    pub delay: u64,
}

fn default_currency() -> Option<String> {
    Some("EUR".to_string())
}

fn default_accept_language() -> String {
    "fr-FR,fr;q=0.9".to_string()
}

fn default_scroll_times() -> u32 {
    3
}

fn default_scroll_delay() -> u64 {
    2
}

impl Default for HeadersConfig {
    fn default() -> Self {
        Self {
            accept_language: default_accept_language(),
            referer: None,
        }
    }
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            times: default_scroll_times(),
            delay: default_scroll_delay(),
        }
    }
}

impl HeadersConfig {
    /// Picks a User-Agent from the rotation pool.
    #[must_use]
    pub fn random_user_agent(&self) -> &'static str {
        USER_AGENTS
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or(USER_AGENTS[0])
    }
}

/// Load and validate a site configuration from a JSON file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails
/// validation.
pub fn load_config(path: &Path) -> Result<ScrapeConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        source: e,
    })?;

    let config: ScrapeConfig = serde_json::from_str(&content)?;
    validate_config(&config)?;

    Ok(config)
}

fn validate_config(config: &ScrapeConfig) -> Result<(), ConfigError> {
    if config.base_urls.is_empty() {
        return Err(ConfigError::Validation(
            "base_urls must contain at least one URL".to_string(),
        ));
    }

    let mut seen_urls = HashSet::new();
    for url in &config.base_urls {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::Validation(format!(
                "base URL '{url}' must start with http:// or https://"
            )));
        }
        if !seen_urls.insert(url.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate base URL '{url}'"
            )));
        }
    }

    for (name, selector) in [
        ("product_name", &config.selectors.product_name),
        ("offer_price", &config.selectors.offer_price),
        ("offer_image_url", &config.selectors.offer_image_url),
    ] {
        if selector.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "selector '{name}' must be non-empty"
            )));
        }
    }

    if config.pagination.enabled
        && config
            .pagination
            .selector
            .as_deref()
            .is_none_or(|s| s.trim().is_empty())
    {
        return Err(ConfigError::Validation(
            "pagination is enabled but no pagination selector is configured".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
