//! Single-document HTML rendering of a page collection

use crate::storage::PageRecord;
use chrono::{DateTime, Local};
use html_escape::encode_text;

const STYLES: &str = r#"
        body { font-family: Arial, sans-serif; margin: 2cm; }
        h1, h2, h3 { color: #333; page-break-after: avoid; }
        .page-break { page-break-before: always; margin-top: 3em; padding-top: 2em; border-top: 2px solid #ddd; }
        .url { color: #666; font-size: 0.8em; margin-bottom: 1em; }
        pre { background: #f5f5f5; padding: 1em; overflow: auto; }
        code { background: #f0f0f0; padding: 0.2em; }
        img { max-width: 100%; height: auto; }
"#;

/// Renders pages into one printable HTML document
///
/// Pages are sorted by URL. Each page gets a source line and an `<h2>`
/// title followed by its content fragment; pages after the first are
/// preceded by a page break.
///
/// # Arguments
///
/// * `pages` - The harvested pages, in any order
/// * `title` - Document title and top-level heading
/// * `generated_at` - Timestamp printed under the heading
pub fn render_html(pages: &[PageRecord], title: &str, generated_at: DateTime<Local>) -> String {
    let mut sorted: Vec<&PageRecord> = pages.iter().collect();
    sorted.sort_by(|a, b| a.url.cmp(&b.url));

    let title = encode_text(title);
    let mut html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{title}</title>
    <style>{STYLES}    </style>
</head>
<body>
    <h1>{title}</h1>
    <p>Generated on {}</p>
    <hr>
"#,
        generated_at.format("%Y-%m-%d %H:%M:%S")
    );

    for (i, page) in sorted.iter().enumerate() {
        if i > 0 {
            html.push_str("    <div class=\"page-break\"></div>\n");
        }
        html.push_str(&format!(
            "    <div class=\"url\">Source: {}</div>\n    <h2>{}</h2>\n    {}\n    <hr>\n",
            encode_text(&page.url),
            encode_text(&page.title),
            page.content
        ));
    }

    html.push_str("</body>\n</html>\n");
    html
}
