//! Compiled selector set shared by the extractor and the link discoverer

use crate::config::{parse_selector, SelectorConfig};
use crate::ConfigError;
use scraper::Selector;
use std::collections::HashSet;

/// CSS selectors and strip rules compiled once per run
#[derive(Debug, Clone)]
pub struct PageSelectors {
    pub(crate) content: Vec<Selector>,
    pub(crate) navigation: Vec<Selector>,
    pub(crate) body: Selector,
    pub(crate) heading: Selector,
    pub(crate) title: Selector,
    pub(crate) any_link: Selector,
    pub(crate) strip_tags: HashSet<String>,
    pub(crate) strip_classes: HashSet<String>,
}

impl PageSelectors {
    /// Compiles the selector configuration
    ///
    /// # Returns
    ///
    /// * `Ok(PageSelectors)` - All selectors compiled
    /// * `Err(ConfigError::InvalidSelector)` - A selector failed to parse
    pub fn from_config(config: &SelectorConfig) -> Result<Self, ConfigError> {
        let compile_all = |selectors: &[String]| -> Result<Vec<Selector>, ConfigError> {
            selectors.iter().map(|s| parse_selector(s)).collect()
        };

        Ok(Self {
            content: compile_all(&config.content)?,
            navigation: compile_all(&config.navigation)?,
            body: parse_selector("body")?,
            heading: parse_selector("h1")?,
            title: parse_selector("title")?,
            any_link: parse_selector("a[href]")?,
            strip_tags: config
                .strip_tags
                .iter()
                .map(|tag| tag.to_ascii_lowercase())
                .collect(),
            strip_classes: config.strip_classes.iter().cloned().collect(),
        })
    }

    /// Returns true if an element with this tag and class attribute is chrome
    pub(crate) fn is_chrome(&self, tag: &str, class_attr: Option<&str>) -> bool {
        if self.strip_tags.contains(&tag.to_ascii_lowercase()) {
            return true;
        }

        class_attr.is_some_and(|classes| {
            classes
                .split_whitespace()
                .any(|class| self.strip_classes.contains(class))
        })
    }
}
