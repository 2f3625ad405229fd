use crate::config::types::{Config, CrawlerConfig, RenderConfig, SiteConfig, UserAgentConfig};
use crate::url::{canonical_lang, site_root};
use crate::ConfigError;
use url::Url;

/// Upper bound on the page budget of a single run
pub const MAX_PAGES_LIMIT: usize = 10_000;

/// Canonicalizes fields that have several accepted spellings
///
/// Language codes collapse to their canonical form (`en-US` -> `en`,
/// `zh_Hans` -> `zh-cn`), duplicates are dropped and order is kept.
pub fn canonicalize(config: &mut Config) {
    let mut langs: Vec<String> = Vec::new();
    for code in &config.crawler.allowed_languages {
        let c = canonical_lang(code);
        if !c.is_empty() && !langs.contains(&c) {
            langs.push(c);
        }
    }
    config.crawler.allowed_languages = langs;

    config.site.slug = config.site.slug.trim().to_string();
    config.site.name = config.site.name.trim().to_string();
    config.site.website = config.site.website.trim().to_string();
}

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_crawler_config(&config.crawler)?;
    validate_render_config(&config.render)?;
    validate_user_agent_config(&config.user_agent)?;

    if config.output.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the site identity; these are the only fatal invocation errors
fn validate_site_config(site: &SiteConfig) -> Result<(), ConfigError> {
    if site.slug.is_empty() {
        return Err(ConfigError::Validation("slug cannot be empty".to_string()));
    }

    if site.slug != site.slug.to_lowercase() || site.slug.chars().any(char::is_whitespace) {
        return Err(ConfigError::Validation(format!(
            "slug must be lowercase without whitespace, got '{}'",
            site.slug
        )));
    }

    if site.slug.contains('/') || site.slug.contains('\\') || site.slug.starts_with('.') {
        return Err(ConfigError::Validation(format!(
            "slug must be a plain directory name, got '{}'",
            site.slug
        )));
    }

    if site.name.is_empty() {
        return Err(ConfigError::Validation("name cannot be empty".to_string()));
    }

    site_root(&site.website)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid website '{}': {}", site.website, e)))?;

    if site.seeds.is_empty() {
        return Err(ConfigError::Validation(
            "at least one seed URL is required".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 || config.max_pages > MAX_PAGES_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max_pages must be between 1 and {}, got {}",
            MAX_PAGES_LIMIT, config.max_pages
        )));
    }

    if config.allowed_languages.is_empty() {
        return Err(ConfigError::Validation(
            "allowed_languages must name at least one language".to_string(),
        ));
    }

    Ok(())
}

fn validate_render_config(config: &RenderConfig) -> Result<(), ConfigError> {
    if config.timeout_ms < 1000 {
        return Err(ConfigError::Validation(format!(
            "render timeout must be >= 1000ms, got {}ms",
            config.timeout_ms
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if let Some(contact) = &config.contact_url {
        Url::parse(contact)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(slug: &str, website: &str) -> SiteConfig {
        SiteConfig {
            slug: slug.to_string(),
            name: "Acme".to_string(),
            website: website.to_string(),
            seeds: vec!["https://acme.com/".to_string()],
        }
    }

    #[test]
    fn test_validate_site() {
        assert!(validate_site_config(&site("acme", "https://acme.com")).is_ok());
        assert!(validate_site_config(&site("acme", "acme.com")).is_ok());

        assert!(validate_site_config(&site("", "https://acme.com")).is_err());
        assert!(validate_site_config(&site("Acme", "https://acme.com")).is_err());
        assert!(validate_site_config(&site("ac me", "https://acme.com")).is_err());
        assert!(validate_site_config(&site("../etc", "https://acme.com")).is_err());
        assert!(validate_site_config(&site("acme", "")).is_err());
        assert!(validate_site_config(&site("acme", "ftp://acme.com")).is_err());
    }

    #[test]
    fn test_validate_requires_seed() {
        let mut s = site("acme", "https://acme.com");
        s.seeds.clear();
        assert!(validate_site_config(&s).is_err());
    }

    #[test]
    fn test_validate_max_pages_bounds() {
        let mut crawler = CrawlerConfig::default();
        crawler.max_pages = 0;
        assert!(validate_crawler_config(&crawler).is_err());

        crawler.max_pages = MAX_PAGES_LIMIT + 1;
        assert!(validate_crawler_config(&crawler).is_err());

        crawler.max_pages = 1;
        assert!(validate_crawler_config(&crawler).is_ok());
    }

    #[test]
    fn test_validate_crawler_name() {
        let mut ua = UserAgentConfig::default();
        assert!(validate_user_agent_config(&ua).is_ok());

        ua.crawler_name = "Bad Bot!".to_string();
        assert!(validate_user_agent_config(&ua).is_err());

        ua.crawler_name = "GoodBot".to_string();
        ua.contact_url = Some("not a url".to_string());
        assert!(matches!(
            validate_user_agent_config(&ua),
            Err(ConfigError::InvalidUrl(_))
        ));
    }
}
