use crate::canonical::canonicalize;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use url::Url;

const EMAIL_PATTERN: &str = r"[A-Za-z0-9_.+-]+@[A-Za-z0-9-]+\.[A-Za-z0-9-.]+";

/// Class/data-attribute tokens that suggest an element is part of a product
/// listing. Best-effort heuristic, not authoritative.
const DEFAULT_PRODUCT_TOKENS: &[&str] = &["price", "product", "sku", "cart", "add-to-cart"];

const SKIP_SCHEMES: &[&str] = &["mailto:", "javascript:", "tel:"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub level: u8,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub src: String,
    pub alt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormInfo {
    pub method: String,
    pub action: String,
    /// `name` attributes of input/select/textarea descendants that have one.
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductGuess {
    pub label: String,
    /// The product-signal token that matched.
    pub signal: String,
}

/// One anchor as it appeared in the markup, any scheme. This is the raw link
/// list; crawlable targets live in `PageContent::links`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorInfo {
    pub href: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aria_label: Option<String>,
    pub icon_classes: Vec<String>,
}

/// Structured content of one page. Sequences mirror document order; maps and
/// sets are ordered, so extraction of the same markup is field-for-field
/// reproducible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageContent {
    pub title: Option<String>,
    pub meta_tags: BTreeMap<String, String>,
    pub headings: Vec<Heading>,
    pub paragraphs: Vec<String>,
    pub images: Vec<ImageRef>,
    pub emails: BTreeSet<String>,
    pub forms: Vec<FormInfo>,
    pub products: Vec<ProductGuess>,
    /// Resolved absolute http/https anchor targets, deduplicated by canonical
    /// form, first-seen order preserved.
    pub links: Vec<String>,
    /// Every `id` attribute value in document order, duplicates retained.
    pub element_ids: Vec<String>,
    pub anchors: Vec<AnchorInfo>,
    /// script `src` and link `href` values, resolved, document order.
    pub asset_urls: Vec<String>,
    /// All class tokens seen anywhere on the page.
    pub class_names: BTreeSet<String>,
    /// Non-fatal parse notes; a malformed subtree degrades, never aborts.
    pub notes: Vec<String>,
}

/// Pure HTML-to-`PageContent` transform. Holds the compiled email pattern and
/// the configured product-signal tokens so extraction itself stays allocation
/// light and deterministic.
pub struct Extractor {
    product_tokens: Vec<String>,
    email_re: Regex,
}

impl Extractor {
    pub fn new() -> Self {
        Self {
            product_tokens: DEFAULT_PRODUCT_TOKENS.iter().map(|t| t.to_string()).collect(),
            email_re: Regex::new(EMAIL_PATTERN).expect("email pattern is valid"),
        }
    }

    pub fn with_product_tokens(mut self, tokens: Vec<String>) -> Self {
        self.product_tokens = tokens.into_iter().map(|t| t.to_lowercase()).collect();
        self
    }

    pub fn extract(&self, html: &str, base_url: &Url) -> PageContent {
        let document = Html::parse_document(html);
        let mut notes = Vec::new();

        let title = self.extract_title(&document);
        let meta_tags = self.extract_meta_tags(&document);
        let headings = self.extract_headings(&document);
        let paragraphs = self.extract_paragraphs(&document);
        let images = self.extract_images(&document, base_url, &mut notes);
        let forms = self.extract_forms(&document);
        let products = self.extract_products(&document);
        let (links, anchors, mut emails) = self.extract_anchors(&document, base_url, &mut notes);
        let asset_urls = self.extract_asset_urls(&document, base_url, &mut notes);

        // Text-scanned addresses join the mailto: ones, lower-cased for dedup.
        let text = document.root_element().text().collect::<String>();
        for m in self.email_re.find_iter(&text) {
            emails.insert(m.as_str().to_lowercase());
        }

        let mut element_ids = Vec::new();
        let mut class_names = BTreeSet::new();
        let any = Selector::parse("*").unwrap();
        for element in document.select(&any) {
            if let Some(id) = element.value().attr("id") {
                element_ids.push(id.to_string());
            }
            for class in element.value().classes() {
                class_names.insert(class.to_string());
            }
        }

        PageContent {
            title,
            meta_tags,
            headings,
            paragraphs,
            images,
            emails,
            forms,
            products,
            links,
            element_ids,
            anchors,
            asset_urls,
            class_names,
            notes,
        }
    }

    fn extract_title(&self, document: &Html) -> Option<String> {
        let selector = Selector::parse("title").unwrap();
        document
            .select(&selector)
            .next()
            .map(|t| collapse_whitespace(&t.text().collect::<String>()))
    }

    fn extract_meta_tags(&self, document: &Html) -> BTreeMap<String, String> {
        let selector = Selector::parse("meta").unwrap();
        let mut meta_tags = BTreeMap::new();

        for meta in document.select(&selector) {
            let key = meta
                .value()
                .attr("name")
                .or_else(|| meta.value().attr("property"));
            if let Some(key) = key {
                let content = meta.value().attr("content").unwrap_or("");
                // Later duplicates overwrite earlier ones.
                meta_tags.insert(key.to_lowercase(), content.to_string());
            }
        }

        meta_tags
    }

    fn extract_headings(&self, document: &Html) -> Vec<Heading> {
        let selector = Selector::parse("h1, h2, h3, h4, h5, h6").unwrap();
        document
            .select(&selector)
            .filter_map(|h| {
                let level = h.value().name().strip_prefix('h')?.parse().ok()?;
                Some(Heading {
                    level,
                    text: collapse_whitespace(&h.text().collect::<String>()),
                })
            })
            .collect()
    }

    fn extract_paragraphs(&self, document: &Html) -> Vec<String> {
        let selector = Selector::parse("p").unwrap();
        document
            .select(&selector)
            .map(|p| collapse_whitespace(&p.text().collect::<String>()))
            .filter(|text| !text.is_empty())
            .collect()
    }

    fn extract_images(
        &self,
        document: &Html,
        base_url: &Url,
        notes: &mut Vec<String>,
    ) -> Vec<ImageRef> {
        let selector = Selector::parse("img").unwrap();
        let mut images = Vec::new();

        for img in document.select(&selector) {
            let src = img.value().attr("src").unwrap_or("");
            let alt = img.value().attr("alt").unwrap_or("");
            match base_url.join(src) {
                Ok(resolved) => images.push(ImageRef {
                    src: resolved.to_string(),
                    alt: alt.to_string(),
                }),
                Err(_) => notes.push(format!("unresolvable image src: {}", src)),
            }
        }

        images
    }

    fn extract_forms(&self, document: &Html) -> Vec<FormInfo> {
        let form_selector = Selector::parse("form").unwrap();
        let field_selector = Selector::parse("input, select, textarea").unwrap();

        document
            .select(&form_selector)
            .map(|form| {
                let fields = form
                    .select(&field_selector)
                    .filter_map(|f| f.value().attr("name"))
                    .map(String::from)
                    .collect();
                FormInfo {
                    method: form.value().attr("method").unwrap_or("GET").to_uppercase(),
                    action: form.value().attr("action").unwrap_or("").trim().to_string(),
                    fields,
                }
            })
            .collect()
    }

    fn extract_products(&self, document: &Html) -> Vec<ProductGuess> {
        let any = Selector::parse("*").unwrap();
        let mut products = Vec::new();
        let mut seen = HashSet::new();

        for element in document.select(&any) {
            let Some(signal) = self.product_signal(&element) else {
                continue;
            };
            let label = truncate(&collapse_whitespace(&element.text().collect::<String>()), 120);
            if seen.insert((signal.clone(), label.clone())) {
                products.push(ProductGuess { label, signal });
            }
        }

        products
    }

    fn product_signal(&self, element: &ElementRef) -> Option<String> {
        for class in element.value().classes() {
            let class = class.to_lowercase();
            for token in &self.product_tokens {
                if class.contains(token.as_str()) {
                    return Some(token.clone());
                }
            }
        }
        for (name, value) in element.value().attrs() {
            if !name.starts_with("data-") {
                continue;
            }
            let name = name.to_lowercase();
            let value = value.to_lowercase();
            for token in &self.product_tokens {
                if name.contains(token.as_str()) || value.contains(token.as_str()) {
                    return Some(token.clone());
                }
            }
        }
        None
    }

    fn extract_anchors(
        &self,
        document: &Html,
        base_url: &Url,
        notes: &mut Vec<String>,
    ) -> (Vec<String>, Vec<AnchorInfo>, BTreeSet<String>) {
        let selector = Selector::parse("a[href]").unwrap();
        let any = Selector::parse("*").unwrap();

        let mut links = Vec::new();
        let mut seen_links = HashSet::new();
        let mut anchors = Vec::new();
        let mut emails = BTreeSet::new();

        for anchor in document.select(&selector) {
            let href = anchor.value().attr("href").unwrap_or("").trim();
            let text = collapse_whitespace(&anchor.text().collect::<String>());
            let aria_label = anchor.value().attr("aria-label").map(String::from);

            let mut icon_classes: Vec<String> = Vec::new();
            for class in anchor.value().classes() {
                icon_classes.push(class.to_string());
            }
            for descendant in anchor.select(&any) {
                for class in descendant.value().classes() {
                    if !icon_classes.iter().any(|c| c == class) {
                        icon_classes.push(class.to_string());
                    }
                }
            }

            if let Some(address) = href.strip_prefix("mailto:") {
                for part in address.split('?').next().unwrap_or("").split(',') {
                    let part = part.trim();
                    if !part.is_empty() {
                        emails.insert(part.to_lowercase());
                    }
                }
            }

            // Non-navigational schemes and bare fragments are kept in the raw
            // anchor list but are never crawl candidates.
            let skip = href.is_empty()
                || href.starts_with('#')
                || SKIP_SCHEMES.iter().any(|s| href.starts_with(s));

            let mut resolved_href = href.to_string();
            if !skip {
                match base_url.join(href) {
                    Ok(resolved) => {
                        resolved_href = resolved.to_string();
                        if resolved.scheme() == "http" || resolved.scheme() == "https" {
                            let key = canonicalize(&resolved);
                            if seen_links.insert(key.clone()) {
                                links.push(key);
                            }
                        }
                    }
                    Err(_) => notes.push(format!("unresolvable href: {}", href)),
                }
            }

            anchors.push(AnchorInfo {
                href: resolved_href,
                text,
                aria_label,
                icon_classes,
            });
        }

        (links, anchors, emails)
    }

    fn extract_asset_urls(
        &self,
        document: &Html,
        base_url: &Url,
        notes: &mut Vec<String>,
    ) -> Vec<String> {
        let selector = Selector::parse("script[src], link[href]").unwrap();
        let mut asset_urls = Vec::new();

        for element in document.select(&selector) {
            let raw = element
                .value()
                .attr("src")
                .or_else(|| element.value().attr("href"))
                .unwrap_or("");
            match base_url.join(raw) {
                Ok(resolved) => asset_urls.push(resolved.to_string()),
                Err(_) => notes.push(format!("unresolvable asset url: {}", raw)),
            }
        }

        asset_urls
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars).collect()
    }
}
