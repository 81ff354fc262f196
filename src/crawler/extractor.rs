//! Content extraction
//!
//! This module turns a fetched HTML document into a `PageRecord`:
//! - Locates the main content region via the prioritized content selectors
//! - Strips navigation chrome from inside the region
//! - Removes images or rewrites their `src` to absolute URLs
//! - Picks a display title and a plain-text projection

use crate::crawler::PageSelectors;
use crate::storage::PageRecord;
use lol_html::{element, HtmlRewriter, Settings};
use scraper::{ElementRef, Html};
use thiserror::Error;
use url::Url;

/// Errors that can occur while extracting a page
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("No content found for {0}")]
    NoContent(String),

    #[error("Failed to rewrite content of {url}: {message}")]
    Rewrite { url: String, message: String },
}

/// Extracts the readable content of a documentation page
///
/// # Algorithm
///
/// 1. Try each content selector in order; the first match is the region
/// 2. Fall back to `<body>`; an empty document has no content
/// 3. Remove descendants of the region whose tag is a strip tag or whose
///    class list contains a strip class
/// 4. Remove `<img>` elements, or rewrite their `src` against the page URL
/// 5. Title: first non-empty `<h1>` left in the document, else `<title>`,
///    else the URL
///
/// # Arguments
///
/// * `html` - The fetched document
/// * `url` - The page URL (record key and base for image URLs)
/// * `selectors` - Compiled selector configuration
/// * `strip_images` - Remove images instead of absolutizing them
///
/// # Example
///
/// ```
/// use doc_harvest::config::SelectorConfig;
/// use doc_harvest::crawler::{extract_page, PageSelectors};
///
/// let selectors = PageSelectors::from_config(&SelectorConfig::default()).unwrap();
/// let html = "<html><body><main><h1>Intro</h1><nav>menu</nav><p>Hello</p></main></body></html>";
/// let page = extract_page(html, "https://docs.example.com/intro", &selectors, false).unwrap();
/// assert_eq!(page.title, "Intro");
/// assert!(!page.content.contains("menu"));
/// ```
pub fn extract_page(
    html: &str,
    url: &str,
    selectors: &PageSelectors,
    strip_images: bool,
) -> Result<PageRecord, ExtractError> {
    let document = Html::parse_document(html);

    let region = find_content_region(&document, selectors)
        .ok_or_else(|| ExtractError::NoContent(url.to_string()))?;

    let title = extract_title(&document, region, selectors).unwrap_or_else(|| url.to_string());

    let base = Url::parse(url).ok();
    let content = clean_region(&region.html(), base.as_ref(), selectors, strip_images).map_err(
        |message| ExtractError::Rewrite {
            url: url.to_string(),
            message,
        },
    )?;

    let text = Html::parse_fragment(&content)
        .root_element()
        .text()
        .collect::<String>()
        .trim()
        .to_string();

    Ok(PageRecord {
        url: url.to_string(),
        title,
        content,
        text,
    })
}

/// Finds the first content-selector match, falling back to a non-empty `<body>`
fn find_content_region<'a>(document: &'a Html, selectors: &PageSelectors) -> Option<ElementRef<'a>> {
    for selector in &selectors.content {
        if let Some(region) = document.select(selector).next() {
            return Some(region);
        }
    }

    // The HTML parser always synthesizes a body, so an empty one means no content
    document.select(&selectors.body).next().filter(|body| {
        body.children().any(|child| match child.value() {
            scraper::Node::Element(_) => true,
            scraper::Node::Text(text) => !text.trim().is_empty(),
            _ => false,
        })
    })
}

/// Picks the page title
///
/// Headings inside chrome that extraction strips from the region are skipped.
fn extract_title(document: &Html, region: ElementRef<'_>, selectors: &PageSelectors) -> Option<String> {
    let heading = document
        .select(&selectors.heading)
        .filter(|h1| !is_stripped_from(*h1, region, selectors))
        .map(|h1| h1.text().collect::<String>().trim().to_string())
        .find(|text| !text.is_empty());

    heading.or_else(|| {
        document
            .select(&selectors.title)
            .next()
            .map(|title| title.text().collect::<String>().trim().to_string())
            .filter(|text| !text.is_empty())
    })
}

/// Returns true if `element` sits inside chrome that is stripped from `region`
fn is_stripped_from(element: ElementRef<'_>, region: ElementRef<'_>, selectors: &PageSelectors) -> bool {
    let mut inside_chrome = false;

    for node in std::iter::once(*element).chain(element.ancestors()) {
        if node.id() == region.id() {
            return inside_chrome;
        }
        if let Some(el) = ElementRef::wrap(node) {
            if selectors.is_chrome(el.value().name(), el.value().attr("class")) {
                inside_chrome = true;
            }
        }
    }

    false
}

/// Removes chrome and normalizes images inside a region fragment
///
/// The first element of the fragment is the region itself and is never removed.
fn clean_region(
    region_html: &str,
    base: Option<&Url>,
    selectors: &PageSelectors,
    strip_images: bool,
) -> Result<String, String> {
    let mut output = Vec::with_capacity(region_html.len());
    let mut at_region_root = true;

    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![element!("*", |el| {
                if std::mem::take(&mut at_region_root) {
                    return Ok(());
                }

                let tag = el.tag_name();
                if selectors.is_chrome(&tag, el.get_attribute("class").as_deref()) {
                    el.remove();
                    return Ok(());
                }

                if tag == "img" {
                    if strip_images {
                        el.remove();
                    } else if let (Some(base), Some(src)) = (base, el.get_attribute("src")) {
                        let src = src.trim();
                        if src.is_empty() {
                            return Ok(());
                        }
                        if let Ok(absolute) = base.join(src) {
                            el.set_attribute("src", absolute.as_str())?;
                        }
                    }
                }

                Ok(())
            })],
            ..Settings::default()
        },
        |c: &[u8]| output.extend_from_slice(c),
    );

    rewriter
        .write(region_html.as_bytes())
        .map_err(|e| e.to_string())?;
    rewriter.end().map_err(|e| e.to_string())?;

    String::from_utf8(output).map_err(|e| e.to_string())
}
