//! The rendered-page object handed to the extraction pipeline.
//!
//! A [`FetchedPage`] carries the final URL, the HTTP status, and the raw HTML
//! body, and exposes the three helpers the pipeline needs: CSS selector
//! evaluation, XPath evaluation, and relative-to-absolute URL resolution
//! against the page's own URL.
//!
//! ## Selector dialects
//!
//! CSS selectors support the `::text` and `::attr(name)` value endings that
//! site configs are written with; a selector without an ending yields the
//! matched element's outer HTML (useful for description fields that are
//! tag-stripped downstream).
//!
//! XPath is supported as a subset translated onto the CSS engine:
//! absolute (`//div/a`) and context-relative (`./span`, `.//img`) paths,
//! `[@attr]` / `[@attr='value']` / `[contains(@class,'x')]` predicates,
//! numeric position predicates, and trailing `/text()` or `/@attr` value
//! endings. Expressions outside the subset evaluate to no matches and are
//! logged at debug level; they are never an error.

use scraper::{Html, Selector};

/// The two selector dialects a config expression can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorKind {
    Css,
    XPath,
}

/// Infers the selector dialect from the expression's shape. A leading `/`,
/// `./`, or `.//` marks a path expression; everything else is CSS.
#[must_use]
pub fn selector_kind(selector: &str) -> SelectorKind {
    let trimmed = selector.trim();
    if trimmed.starts_with('/') || trimmed.starts_with("./") || trimmed.starts_with(".//") {
        SelectorKind::XPath
    } else {
        SelectorKind::Css
    }
}

/// What part of a matched element the expression asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ExtractMode {
    /// Concatenated text content.
    Text,
    /// A named attribute's value.
    Attr(String),
    /// The element's outer HTML.
    Html,
}

/// A fetched, rendered page. The body is parsed per selector call; pages are
/// processed once and dropped, so there is no cached DOM to invalidate.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    url: String,
    status: u16,
    body: String,
}

impl FetchedPage {
    #[must_use]
    pub fn new(url: String, status: u16, body: String) -> Self {
        Self { url, status, body }
    }

    /// The final URL after redirects.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Evaluates `selector` in whichever dialect its shape indicates and
    /// returns the extracted raw values in document order.
    #[must_use]
    pub fn select(&self, selector: &str) -> Vec<String> {
        match selector_kind(selector) {
            SelectorKind::Css => self.select_css(selector),
            SelectorKind::XPath => self.select_xpath(selector),
        }
    }

    /// Evaluates a CSS selector with an optional `::text` / `::attr(name)`
    /// ending. An unparseable selector yields no matches.
    #[must_use]
    pub fn select_css(&self, selector: &str) -> Vec<String> {
        let (bare, mode) = split_css_value_ending(selector.trim());

        let Ok(parsed) = Selector::parse(bare) else {
            tracing::debug!(selector, "CSS selector failed to parse; no matches");
            return Vec::new();
        };

        let document = Html::parse_document(&self.body);
        document
            .select(&parsed)
            .filter_map(|element| match &mode {
                ExtractMode::Text => Some(element.text().collect::<String>()),
                ExtractMode::Attr(name) => {
                    element.value().attr(name).map(std::string::ToString::to_string)
                }
                ExtractMode::Html => Some(element.html()),
            })
            .collect()
    }

    /// Evaluates an XPath expression from the supported subset by
    /// translating it to CSS. Expressions outside the subset yield no
    /// matches.
    #[must_use]
    pub fn select_xpath(&self, expr: &str) -> Vec<String> {
        let Some((css, mode)) = xpath_to_css(expr) else {
            tracing::debug!(expr, "XPath expression outside the supported subset; no matches");
            return Vec::new();
        };

        let Ok(parsed) = Selector::parse(&css) else {
            tracing::debug!(expr, css, "translated XPath failed to parse as CSS; no matches");
            return Vec::new();
        };

        let document = Html::parse_document(&self.body);
        document
            .select(&parsed)
            .filter_map(|element| match &mode {
                ExtractMode::Text => Some(element.text().collect::<String>()),
                ExtractMode::Attr(name) => {
                    element.value().attr(name).map(std::string::ToString::to_string)
                }
                ExtractMode::Html => Some(element.html()),
            })
            .collect()
    }

    /// Resolves a possibly-relative URL against the page's own URL. Returns
    /// the candidate unchanged when resolution is impossible (unparseable
    /// base); downstream URL validation rejects anything non-absolute.
    #[must_use]
    pub fn urljoin(&self, candidate: &str) -> String {
        resolve_url(&self.url, candidate)
    }
}

/// Joins `candidate` against `base`. Absolute candidates pass through
/// untouched.
#[must_use]
pub fn resolve_url(base: &str, candidate: &str) -> String {
    if candidate.starts_with("http://") || candidate.starts_with("https://") {
        return candidate.to_string();
    }
    match reqwest::Url::parse(base).and_then(|b| b.join(candidate)) {
        Ok(joined) => joined.to_string(),
        Err(_) => candidate.to_string(),
    }
}

/// Splits a CSS expression into the bare selector and its value ending.
fn split_css_value_ending(selector: &str) -> (&str, ExtractMode) {
    if let Some(bare) = selector.strip_suffix("::text") {
        return (bare, ExtractMode::Text);
    }
    if let Some(open) = selector.rfind("::attr(") {
        if let Some(stripped) = selector[open..].strip_prefix("::attr(") {
            if let Some(name) = stripped.strip_suffix(')') {
                return (&selector[..open], ExtractMode::Attr(name.to_string()));
            }
        }
    }
    (selector, ExtractMode::Html)
}

/// Translates an XPath expression from the supported subset into a CSS
/// selector plus extraction mode. Returns `None` for anything the subset
/// does not cover.
fn xpath_to_css(expr: &str) -> Option<(String, ExtractMode)> {
    let mut rest = expr.trim();

    let mut mode = ExtractMode::Html;
    if let Some(stripped) = rest.strip_suffix("/text()") {
        rest = stripped;
        mode = ExtractMode::Text;
    } else if let Some(at) = rest.rfind("/@") {
        let name = &rest[at + 2..];
        if !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            mode = ExtractMode::Attr(name.to_string());
            rest = &rest[..at];
        }
    }

    // Context-relative paths behave like absolute ones here: the page root
    // is the only context the pipeline evaluates against.
    let rest = rest.strip_prefix('.').unwrap_or(rest);
    if rest.is_empty() {
        return None;
    }

    let mut css = String::new();
    let mut remaining = rest;

    while !remaining.is_empty() {
        let descendant = if let Some(r) = remaining.strip_prefix("//") {
            remaining = r;
            true
        } else if let Some(r) = remaining.strip_prefix('/') {
            remaining = r;
            false
        } else {
            return None;
        };

        let (segment, tail) = take_path_segment(remaining);
        if segment.is_empty() {
            return None;
        }
        remaining = tail;

        let converted = convert_segment(segment)?;
        if css.is_empty() {
            css.push_str(&converted);
        } else if descendant {
            css.push(' ');
            css.push_str(&converted);
        } else {
            css.push_str(" > ");
            css.push_str(&converted);
        }
    }

    if css.is_empty() {
        return None;
    }
    Some((css, mode))
}

/// Reads one path segment (node test plus predicates) from the front of
/// `path`, stopping at the next `/` that is not inside a predicate.
fn take_path_segment(path: &str) -> (&str, &str) {
    let mut depth = 0usize;
    for (idx, c) in path.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            '/' if depth == 0 => return (&path[..idx], &path[idx..]),
            _ => {}
        }
    }
    (path, "")
}

/// Converts one segment (`div[@class='price'][2]`) to its CSS equivalent.
fn convert_segment(segment: &str) -> Option<String> {
    let name_end = segment.find('[').unwrap_or(segment.len());
    let name = &segment[..name_end];
    if name.is_empty() || !(name == "*" || name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')) {
        return None;
    }

    let mut css = name.to_string();
    let mut predicates = &segment[name_end..];

    while !predicates.is_empty() {
        let inner_start = predicates.strip_prefix('[')?;
        let close = inner_start.find(']')?;
        let predicate = &inner_start[..close];
        predicates = &inner_start[close + 1..];

        css.push_str(&convert_predicate(predicate)?);
    }

    Some(css)
}

/// Converts one predicate to CSS: `@attr`, `@attr='value'`,
/// `contains(@attr,'value')`, or a 1-based position.
fn convert_predicate(predicate: &str) -> Option<String> {
    let predicate = predicate.trim();

    if let Ok(position) = predicate.parse::<usize>() {
        return Some(format!(":nth-of-type({position})"));
    }

    if let Some(inner) = predicate
        .strip_prefix("contains(@")
        .and_then(|p| p.strip_suffix(')'))
    {
        let (attr, value) = inner.split_once(',')?;
        let value = strip_quotes(value.trim())?;
        return Some(format!("[{}*=\"{}\"]", attr.trim(), value));
    }

    if let Some(inner) = predicate.strip_prefix('@') {
        if let Some((attr, value)) = inner.split_once('=') {
            let value = strip_quotes(value.trim())?;
            return Some(format!("[{}=\"{}\"]", attr.trim(), value));
        }
        return Some(format!("[{inner}]"));
    }

    None
}

fn strip_quotes(value: &str) -> Option<&str> {
    value
        .strip_prefix('\'')
        .and_then(|v| v.strip_suffix('\''))
        .or_else(|| value.strip_prefix('"').and_then(|v| v.strip_suffix('"')))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(body: &str) -> FetchedPage {
        FetchedPage::new(
            "https://shop.example.com/fr/femmes/robe-123".to_string(),
            200,
            body.to_string(),
        )
    }

    // -----------------------------------------------------------------------
    // selector_kind
    // -----------------------------------------------------------------------

    #[test]
    fn kind_absolute_path_is_xpath() {
        assert_eq!(selector_kind("//div/a"), SelectorKind::XPath);
    }

    #[test]
    fn kind_relative_path_is_xpath() {
        assert_eq!(selector_kind("./span"), SelectorKind::XPath);
        assert_eq!(selector_kind(".//img"), SelectorKind::XPath);
    }

    #[test]
    fn kind_css_expressions_are_css() {
        assert_eq!(selector_kind("div.price"), SelectorKind::Css);
        assert_eq!(selector_kind("h1::text"), SelectorKind::Css);
    }

    // -----------------------------------------------------------------------
    // CSS evaluation
    // -----------------------------------------------------------------------

    #[test]
    fn css_text_ending_returns_element_text() {
        let p = page("<h1 class=\"title\">Robe <em>longue</em></h1>");
        assert_eq!(p.select("h1.title::text"), vec!["Robe longue"]);
    }

    #[test]
    fn css_attr_ending_returns_attribute_values() {
        let p = page(r#"<img class="photo" src="/img/a.jpg"><img class="photo" src="/img/b.jpg">"#);
        assert_eq!(
            p.select("img.photo::attr(src)"),
            vec!["/img/a.jpg", "/img/b.jpg"]
        );
    }

    #[test]
    fn css_without_ending_returns_outer_html() {
        let p = page("<div class=\"desc\"><p>Nice</p></div>");
        let got = p.select("div.desc");
        assert_eq!(got.len(), 1);
        assert!(got[0].contains("<p>Nice</p>"));
    }

    #[test]
    fn css_no_match_returns_empty() {
        let p = page("<div>x</div>");
        assert!(p.select("span.missing::text").is_empty());
    }

    #[test]
    fn css_unparseable_selector_returns_empty() {
        let p = page("<div>x</div>");
        assert!(p.select("div..[broken").is_empty());
    }

    #[test]
    fn css_attr_missing_on_element_is_skipped() {
        let p = page(r#"<img src="/a.jpg"><img alt="no src">"#);
        assert_eq!(p.select("img::attr(src)"), vec!["/a.jpg"]);
    }

    // -----------------------------------------------------------------------
    // XPath subset evaluation
    // -----------------------------------------------------------------------

    #[test]
    fn xpath_descendant_with_attribute_predicate() {
        let p = page(r#"<div class="product"><span class="price">59,99 €</span></div>"#);
        assert_eq!(
            p.select("//span[@class='price']/text()"),
            vec!["59,99 €"]
        );
    }

    #[test]
    fn xpath_attribute_value_ending() {
        let p = page(r#"<a class="next" href="/page/2">next</a>"#);
        assert_eq!(p.select("//a[@class='next']/@href"), vec!["/page/2"]);
    }

    #[test]
    fn xpath_child_axis_translates_to_child_combinator() {
        let p = page("<div><h2>direct</h2><section><h2>nested</h2></section></div>");
        assert_eq!(p.select("//div/h2/text()"), vec!["direct"]);
    }

    #[test]
    fn xpath_relative_prefix_is_accepted() {
        let p = page(r#"<img class="hero" src="/img/hero.jpg">"#);
        assert_eq!(p.select(".//img[@class='hero']/@src"), vec!["/img/hero.jpg"]);
    }

    #[test]
    fn xpath_contains_predicate_on_class() {
        let p = page(r#"<div class="card product-card">x</div>"#);
        assert_eq!(p.select("//div[contains(@class,'product')]/text()"), vec!["x"]);
    }

    #[test]
    fn xpath_outside_subset_returns_empty() {
        let p = page("<div>x</div>");
        assert!(p.select("//div[position() > 1]").is_empty());
        assert!(p.select("//div/following-sibling::span").is_empty());
    }

    // -----------------------------------------------------------------------
    // xpath_to_css translation
    // -----------------------------------------------------------------------

    #[test]
    fn translation_descendant_and_child() {
        let (css, mode) = xpath_to_css("//div[@id='main']//a/img").expect("in subset");
        assert_eq!(css, "div[id=\"main\"] a > img");
        assert_eq!(mode, ExtractMode::Html);
    }

    #[test]
    fn translation_text_ending() {
        let (css, mode) = xpath_to_css("//h1/text()").expect("in subset");
        assert_eq!(css, "h1");
        assert_eq!(mode, ExtractMode::Text);
    }

    #[test]
    fn translation_numeric_position() {
        let (css, _) = xpath_to_css("//ul/li[2]").expect("in subset");
        assert_eq!(css, "ul > li:nth-of-type(2)");
    }

    #[test]
    fn translation_wildcard_node_test() {
        let (css, _) = xpath_to_css("//*[@data-price]").expect("in subset");
        assert_eq!(css, "*[data-price]");
    }

    // -----------------------------------------------------------------------
    // URL resolution
    // -----------------------------------------------------------------------

    #[test]
    fn urljoin_resolves_relative_paths() {
        let p = page("");
        assert_eq!(
            p.urljoin("/img/a.jpg"),
            "https://shop.example.com/img/a.jpg"
        );
    }

    #[test]
    fn urljoin_passes_absolute_urls_through() {
        let p = page("");
        assert_eq!(
            p.urljoin("https://cdn.example.com/a.jpg"),
            "https://cdn.example.com/a.jpg"
        );
    }

    #[test]
    fn resolve_url_with_unparseable_base_returns_candidate() {
        assert_eq!(resolve_url("not a url", "/img/a.jpg"), "/img/a.jpg");
    }
}
