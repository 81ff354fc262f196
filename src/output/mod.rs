//! Output module for writing harvest artifacts
//!
//! This module handles:
//! - The on-disk layout of a project's artifacts
//! - Rendering the page collection into a single HTML document
//! - Converting that HTML into PDF through an external program
//! - Writing JSON, HTML and PDF according to the requested format

mod html;
mod layout;
mod pdf;

pub use html::render_html;
pub use layout::ArtifactLayout;
pub use pdf::CommandRenderer;

use crate::config::OutputConfig;
use crate::storage::{write_atomic, JsonPageStore, PageRecord, PageStore, StorageError};
use chrono::Local;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("PDF generation failed: {0}")]
    Pdf(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Paths of the artifacts written by `write_outputs`
#[derive(Debug, Clone, Default)]
pub struct OutputReport {
    pub json: Option<PathBuf>,
    pub html: Option<PathBuf>,
    pub pdf: Option<PathBuf>,

    /// Why the PDF is missing when one was requested
    pub pdf_error: Option<String>,
}

/// Writes the requested artifacts for a page collection
///
/// JSON keeps harvest order; HTML and PDF are sorted by URL. When PDF
/// rendering fails the error is logged and recorded in the report, and the
/// HTML file remains as the fallback artifact.
///
/// # Arguments
///
/// * `pages` - The harvested pages
/// * `layout` - Where the artifacts go
/// * `config` - Requested format and PDF command
/// * `title` - Document title for HTML and PDF, e.g. `docs.example.com Documentation`
///
/// # Returns
///
/// * `Ok(OutputReport)` - Artifacts written (PDF failure is not an error)
/// * `Err(OutputError)` - The output directory, JSON or HTML could not be written
pub async fn write_outputs(
    pages: &[PageRecord],
    layout: &ArtifactLayout,
    config: &OutputConfig,
    title: &str,
) -> OutputResult<OutputReport> {
    layout.ensure_dir()?;

    if pages.is_empty() {
        tracing::warn!("No pages were harvested; writing empty artifacts");
    }

    let mut report = OutputReport::default();

    if config.format.writes_json() {
        let path = layout.json_path();
        JsonPageStore::new(&path).save_pages(pages)?;
        tracing::info!("JSON saved: {}", path.display());
        report.json = Some(path);
    }

    if !config.format.writes_html() {
        return Ok(report);
    }

    let html = render_html(pages, title, Local::now());
    let html_path = layout.html_path();
    write_atomic(&html_path, html.as_bytes())?;
    tracing::info!("HTML saved: {}", html_path.display());
    report.html = Some(html_path.clone());

    if config.format.writes_pdf() {
        let renderer = CommandRenderer::new(config.pdf_command.clone());
        match renderer.render(&html).await {
            Ok(bytes) => {
                let pdf_path = layout.pdf_path();
                write_atomic(&pdf_path, &bytes)?;
                tracing::info!("PDF generated: {}", pdf_path.display());
                report.pdf = Some(pdf_path);
            }
            Err(e) => {
                tracing::error!("{}", e);
                tracing::info!("HTML saved to: {}", html_path.display());
                report.pdf_error = Some(e.to_string());
            }
        }
    }

    Ok(report)
}
