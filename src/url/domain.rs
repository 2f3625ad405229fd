use crate::url::normalize::parse_normalized;
use crate::UrlError;
use url::Url;

/// Returns the host (lowercase) plus an explicit port, if any
///
/// # Examples
///
/// ```
/// use url::Url;
/// use site_ingest::url::netloc;
///
/// let url = Url::parse("https://EXAMPLE.com/path").unwrap();
/// assert_eq!(netloc(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/").unwrap();
/// assert_eq!(netloc(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn netloc(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    })
}

/// Resolves the site root (`scheme://host[:port]/`) of a configured website
///
/// This is the only URL check that is fatal: a crawl cannot start without
/// a site root.
pub fn site_root(website: &str) -> Result<Url, UrlError> {
    let url = parse_normalized(website).ok_or_else(|| UrlError::Parse(website.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    let netloc = netloc(&url).ok_or(UrlError::MissingDomain)?;
    Url::parse(&format!("{}://{}/", url.scheme(), netloc))
        .map_err(|e| UrlError::Parse(e.to_string()))
}

/// Checks whether `url` belongs to the site whose netloc is `allowed`
///
/// Subdomains of the site are accepted; a leading `www.` on the site's own
/// netloc is ignored so `acme.com` links count for a `www.acme.com` site.
/// An empty `allowed` accepts everything.
pub fn is_same_domain(url: &str, allowed: &str) -> bool {
    if allowed.is_empty() {
        return true;
    }

    let Some(candidate) = Url::parse(url).ok().as_ref().and_then(netloc) else {
        return false;
    };

    let allowed = allowed.to_lowercase();
    let base = allowed.strip_prefix("www.").unwrap_or(&allowed);

    candidate == allowed || candidate == base || candidate.ends_with(&format!(".{}", base))
}
