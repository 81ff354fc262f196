//! Site context derived from the seed URL

use crate::url::{authority, is_github_domain};
use crate::{UrlError, UrlResult};
use url::Url;

/// Read-only context shared by the classifier, extractor and link discoverer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteContext {
    /// The seed URL with trailing slashes removed; the first frontier entry
    pub base_url: String,

    /// Authority used for same-origin checks (host plus explicit port)
    pub domain: String,

    /// Branch and subpath (e.g. `main/docs`) scoping a GitHub `tree` crawl
    pub github_path_restriction: Option<String>,
}

impl SiteContext {
    /// Derives the site context from a seed URL
    ///
    /// # Arguments
    ///
    /// * `seed` - The site root, or a GitHub `tree` URL
    ///
    /// # Returns
    ///
    /// * `Ok(SiteContext)` - The derived context
    /// * `Err(UrlError)` - The seed is not an absolute HTTP(S) URL with a host
    ///
    /// # Examples
    ///
    /// ```
    /// use doc_harvest::url::SiteContext;
    ///
    /// let site = SiteContext::from_seed("https://github.com/o/r/tree/main/docs").unwrap();
    /// assert_eq!(site.domain, "github.com");
    /// assert_eq!(site.github_path_restriction.as_deref(), Some("main/docs"));
    /// ```
    pub fn from_seed(seed: &str) -> UrlResult<Self> {
        let seed = seed.trim();
        let url = Url::parse(seed).map_err(|e| UrlError::Parse(format!("{}: {}", seed, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(UrlError::InvalidScheme(format!(
                "Only HTTP and HTTPS schemes are supported, got: {}",
                url.scheme()
            )));
        }

        if url.host_str().is_none() {
            return Err(UrlError::MissingHost);
        }

        let domain = authority(&url);

        let github_path_restriction = if is_github_domain(&domain) && seed.contains("/tree/") {
            seed.split("/tree/")
                .nth(1)
                .filter(|restriction| !restriction.is_empty())
                .map(str::to_string)
        } else {
            None
        };

        Ok(Self {
            base_url: seed.trim_end_matches('/').to_string(),
            domain,
            github_path_restriction,
        })
    }

    /// Returns true if this context targets the GitHub web host
    pub fn is_github(&self) -> bool {
        is_github_domain(&self.domain)
    }

    /// Name of the per-site output directory, e.g. `example_com_site_docs`
    pub fn project_dir_name(&self) -> String {
        let site_name = self.domain.replace(['.', ':'], "_").replace("docs_", "");
        format!("{}_site_docs", site_name)
    }

    /// File stem shared by the JSON, HTML and PDF artifacts
    pub fn artifact_stem(&self) -> String {
        format!("{}_docs", self.domain.replace(['.', ':'], "_"))
    }
}
