//! Link discovery
//!
//! Navigation regions are searched first; only when they yield nothing is the
//! whole document scanned for anchors.

use crate::crawler::PageSelectors;
use crate::url::{is_valid_doc_url, SiteContext};
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use url::Url;

/// Finds documentation links on a page
///
/// Every `href` matched by the navigation selectors is resolved against the
/// page URL and kept if the classifier accepts it. If that produces nothing,
/// every `a[href]` in the document goes through the same filter.
///
/// # Arguments
///
/// * `html` - The fetched document
/// * `url` - The page URL, used to resolve relative links
/// * `site` - Site context for the classifier
/// * `selectors` - Compiled selector configuration
///
/// # Returns
///
/// The accepted absolute URLs; empty if `url` itself does not parse
pub fn discover_links(
    html: &str,
    url: &str,
    site: &SiteContext,
    selectors: &PageSelectors,
) -> BTreeSet<String> {
    let Ok(base) = Url::parse(url) else {
        return BTreeSet::new();
    };

    let document = Html::parse_document(html);

    let links = collect_links(&document, &base, site, &selectors.navigation);
    if !links.is_empty() {
        return links;
    }

    collect_links(
        &document,
        &base,
        site,
        std::slice::from_ref(&selectors.any_link),
    )
}

fn collect_links(
    document: &Html,
    base: &Url,
    site: &SiteContext,
    selectors: &[Selector],
) -> BTreeSet<String> {
    selectors
        .iter()
        .flat_map(|selector| document.select(selector))
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| base.join(href.trim()).ok())
        .map(String::from)
        .filter(|link| is_valid_doc_url(link, site))
        .collect()
}
