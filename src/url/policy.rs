use crate::url::language::infer_language;
use std::fmt;
use url::Url;

/// Path suffixes of non-page assets
pub const EXCLUDED_EXTENSIONS: &[&str] = &[
    ".pdf", ".jpg", ".jpeg", ".png", ".gif", ".webp", ".svg", ".ico", ".css", ".js", ".map",
    ".json", ".xml", ".zip", ".rar", ".7z", ".gz", ".mp4", ".mp3", ".mov", ".avi", ".woff",
    ".woff2", ".ttf", ".eot",
];

/// Path substrings of auth, commerce, legal, archive and admin pages
pub const EXCLUDED_PATH_SUBSTRINGS: &[&str] = &[
    "/wp-admin",
    "/wp-login",
    "/login",
    "/signin",
    "/signup",
    "/logout",
    "/account",
    "/cart",
    "/checkout",
    "/privacy",
    "/terms",
    "/cookie",
    "/legal",
    "/policies",
    "/search",
    "/tag/",
    "/category/",
    "/author/",
    "/cdn-cgi/",
];

/// Why a URL was kept out of the frontier
///
/// These are policy outcomes, not errors. `Display` renders the reason code
/// used in the diagnostic report (`lang_not_allowed:fr`, `excluded_ext:.pdf`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SkipReason {
    BadUrl,
    BadScheme,
    LangNotAllowed(String),
    ExcludedExt(&'static str),
    ExcludedPath(&'static str),
    CrossDomain,
    Duplicate,
    BucketCap,
    RobotsDisallowed,
}

impl SkipReason {
    /// Whether this reason comes from the URL policy filter itself
    pub fn is_policy(&self) -> bool {
        matches!(
            self,
            Self::BadUrl
                | Self::BadScheme
                | Self::LangNotAllowed(_)
                | Self::ExcludedExt(_)
                | Self::ExcludedPath(_)
                | Self::RobotsDisallowed
        )
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadUrl => write!(f, "bad_url"),
            Self::BadScheme => write!(f, "bad_scheme"),
            Self::LangNotAllowed(lang) => write!(f, "lang_not_allowed:{}", lang),
            Self::ExcludedExt(ext) => write!(f, "excluded_ext:{}", ext),
            Self::ExcludedPath(sub) => write!(f, "excluded_path:{}", sub),
            Self::CrossDomain => write!(f, "cross_domain"),
            Self::Duplicate => write!(f, "duplicate"),
            Self::BucketCap => write!(f, "bucket_cap"),
            Self::RobotsDisallowed => write!(f, "robots_disallowed"),
        }
    }
}

/// Decides whether a canonical URL may be crawled
///
/// Checks run in a fixed order and the first failing one is reported:
/// scheme, inferred language, asset extension, excluded path substring.
/// Extension and path checks compare against the lowercased path.
///
/// # Examples
///
/// ```
/// use site_ingest::url::{eligible, SkipReason};
///
/// let allowed = vec!["en".to_string()];
/// assert!(eligible("https://acme.com/pricing", &allowed).is_ok());
/// assert_eq!(
///     eligible("https://acme.com/fr/about", &allowed),
///     Err(SkipReason::LangNotAllowed("fr".to_string()))
/// );
/// ```
pub fn eligible(url: &str, allowed_languages: &[String]) -> Result<(), SkipReason> {
    let parsed = Url::parse(url).map_err(|_| SkipReason::BadUrl)?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(SkipReason::BadScheme);
    }

    if let Some(lang) = infer_language(&parsed) {
        if !allowed_languages.iter().any(|a| a == &lang) {
            return Err(SkipReason::LangNotAllowed(lang));
        }
    }

    let path = parsed.path().to_lowercase();

    if let Some(ext) = EXCLUDED_EXTENSIONS
        .iter()
        .copied()
        .find(|ext| path.ends_with(ext))
    {
        return Err(SkipReason::ExcludedExt(ext));
    }

    if let Some(sub) = EXCLUDED_PATH_SUBSTRINGS
        .iter()
        .copied()
        .find(|sub| path.contains(sub))
    {
        return Err(SkipReason::ExcludedPath(sub));
    }

    Ok(())
}
