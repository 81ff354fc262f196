use crate::config::types::{
    Config, CrawlerConfig, GitHubConfig, HttpConfig, OutputConfig, SelectorConfig,
};
use crate::{ConfigError, ConfigResult};
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_crawler_config(&config.crawler)?;
    validate_http_config(&config.http)?;
    validate_output_config(&config.output)?;
    validate_selector_config(&config.selectors)?;
    validate_github_config(&config.github)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> ConfigResult<()> {
    if config.delay_ms > 60_000 {
        return Err(ConfigError::Validation(format!(
            "delay_ms must be <= 60000ms, got {}ms",
            config.delay_ms
        )));
    }

    Ok(())
}

/// Validates HTTP client configuration
fn validate_http_config(config: &HttpConfig) -> ConfigResult<()> {
    if config.timeout_secs < 1 || config.timeout_secs > 300 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be between 1 and 300, got {}",
            config.timeout_secs
        )));
    }

    if config.retries > 10 {
        return Err(ConfigError::Validation(format!(
            "retries must be <= 10, got {}",
            config.retries
        )));
    }

    if config.cache_ttl_secs == Some(0) {
        return Err(ConfigError::Validation(
            "cache_ttl_secs must be > 0 when set".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> ConfigResult<()> {
    if config.dir.is_empty() {
        return Err(ConfigError::Validation(
            "output dir cannot be empty".to_string(),
        ));
    }

    if config.format.writes_pdf() && config.pdf_command.is_empty() {
        return Err(ConfigError::Validation(
            "pdf_command cannot be empty when PDF output is requested".to_string(),
        ));
    }

    Ok(())
}

/// Validates selector lists
///
/// Every content and navigation entry must be a CSS selector the HTML parser
/// accepts; strip entries are bare tag and class names.
fn validate_selector_config(config: &SelectorConfig) -> ConfigResult<()> {
    if config.content.is_empty() {
        return Err(ConfigError::Validation(
            "selectors.content must contain at least one selector".to_string(),
        ));
    }

    for selector in config.content.iter().chain(config.navigation.iter()) {
        parse_selector(selector)?;
    }

    for name in config.strip_tags.iter().chain(config.strip_classes.iter()) {
        if !is_plain_name(name) {
            return Err(ConfigError::Validation(format!(
                "strip entries must be bare tag or class names, got '{}'",
                name
            )));
        }
    }

    Ok(())
}

/// Validates GitHub configuration
fn validate_github_config(config: &GitHubConfig) -> ConfigResult<()> {
    let url = Url::parse(&config.api_base)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid api_base: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "api_base must use HTTP or HTTPS, got '{}'",
            config.api_base
        )));
    }

    Ok(())
}

/// Parses a CSS selector, mapping parse failures into `ConfigError`
pub(crate) fn parse_selector(selector: &str) -> ConfigResult<Selector> {
    Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
