//! Markdown to HTML conversion

use pulldown_cmark::{html, Options, Parser};
use scraper::{Html, Selector};

/// Converts markdown to an HTML fragment
///
/// Tables, footnotes, strikethrough and task lists are enabled.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(markdown, options);
    let mut output = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut output, parser);
    output
}

/// Text of the first non-empty `<h1>` in converted markdown
pub fn markdown_title(html: &str) -> Option<String> {
    let heading = Selector::parse("h1").ok()?;
    Html::parse_fragment(html)
        .select(&heading)
        .map(|h1| h1.text().collect::<String>().trim().to_string())
        .find(|text| !text.is_empty())
}

/// Plain-text projection of an HTML fragment
pub(crate) fn fragment_text(html: &str) -> String {
    Html::parse_fragment(html)
        .root_element()
        .text()
        .collect::<String>()
        .trim()
        .to_string()
}
