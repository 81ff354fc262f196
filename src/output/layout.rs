//! Artifact paths for a harvest project

use crate::url::{GitHubRepo, SiteContext};
use std::path::{Path, PathBuf};

/// Directory and file stem shared by a project's artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    dir: PathBuf,
    stem: String,
}

impl ArtifactLayout {
    pub fn new(dir: impl Into<PathBuf>, stem: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            stem: stem.into(),
        }
    }

    /// `<output_dir>/<site>_site_docs/<domain_>_docs.*`
    pub fn for_site(output_dir: &Path, site: &SiteContext) -> Self {
        Self::new(output_dir.join(site.project_dir_name()), site.artifact_stem())
    }

    /// `<output_dir>/github_docs_<owner>_<repo>/<owner>_<repo>_docs.*`
    pub fn for_repo(output_dir: &Path, repo: &GitHubRepo) -> Self {
        Self::new(output_dir.join(repo.project_dir_name()), repo.artifact_stem())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn json_path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", self.stem))
    }

    pub fn html_path(&self) -> PathBuf {
        self.dir.join(format!("{}.html", self.stem))
    }

    pub fn pdf_path(&self) -> PathBuf {
        self.dir.join(format!("{}.pdf", self.stem))
    }

    /// Where raw markdown downloads are kept
    pub fn markdown_dir(&self) -> PathBuf {
        self.dir.join("markdown")
    }

    /// Creates the project directory if needed
    pub fn ensure_dir(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.dir)
    }
}
