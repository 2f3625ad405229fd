use url::Url;

/// Language tokens recognized in a host label or first path segment
pub const KNOWN_LANG_CODES: &[&str] = &[
    "en", "en-us", "en-gb", "en-au", "en-ca", "en-sg", "zh", "zh-cn", "zh-hans", "zh-hant",
    "zh-tw", "zh-hk", "ja", "ko", "fr", "de", "es", "it", "pt", "pt-br", "ru", "nl", "sv", "no",
    "da", "fi", "pl", "tr", "ar", "he", "id", "th", "vi",
];

/// Bases accepted for `xx-yyyy` variants not listed in [`KNOWN_LANG_CODES`]
const LANG_BASES: &[&str] = &[
    "en", "zh", "fr", "de", "es", "it", "pt", "ru", "ja", "ko", "nl", "sv", "no", "da", "fi", "pl",
    "tr", "ar", "he", "id", "th", "vi",
];

/// Country/region path prefixes (`/us/pricing`, `/uk/about`)
pub const REGION_PREFIXES: &[&str] = &[
    "us", "uk", "au", "ca", "sg", "in", "de", "fr", "jp", "kr", "cn", "tw", "hk",
];

/// Collapses a language code to its canonical spelling
///
/// Regional English collapses to `en`, simplified Chinese spellings to
/// `zh-cn`. Anything else is lowercased with `_` turned into `-`.
///
/// # Examples
///
/// ```
/// use site_ingest::url::canonical_lang;
///
/// assert_eq!(canonical_lang("en-US"), "en");
/// assert_eq!(canonical_lang("zh_Hans"), "zh-cn");
/// assert_eq!(canonical_lang("pt-BR"), "pt-br");
/// ```
pub fn canonical_lang(code: &str) -> String {
    let c = code.trim().to_lowercase().replace('_', "-");
    match c.as_str() {
        "en-us" | "en-gb" | "en-au" | "en-ca" | "en-sg" => "en".to_string(),
        "zh" | "zh-cn" | "zh-hans" => "zh-cn".to_string(),
        _ => c,
    }
}

/// Checks whether a host label or path segment reads as a language code
pub fn is_lang_token(token: &str) -> bool {
    let t = token.trim().to_lowercase().replace('_', "-");
    if t.is_empty() {
        return false;
    }
    if KNOWN_LANG_CODES.contains(&t.as_str()) {
        return true;
    }

    let (base, variant) = match t.split_once('-') {
        Some((base, variant)) => (base, Some(variant)),
        None => (t.as_str(), None),
    };
    let is_alpha = |s: &str| s.chars().all(|c| c.is_ascii_lowercase());

    if base.len() != 2 || !is_alpha(base) {
        return false;
    }
    if let Some(v) = variant {
        if !(2..=4).contains(&v.len()) || !is_alpha(v) {
            return false;
        }
    }
    LANG_BASES.contains(&base)
}

/// Checks whether a path segment is a country/region prefix
pub fn is_region_prefix(segment: &str) -> bool {
    REGION_PREFIXES.contains(&segment.to_lowercase().as_str())
}

/// Infers the language a URL is served in, from its host or path
///
/// The first host label is consulted when the host has at least three
/// labels and does not start with `www`; otherwise the first path segment.
/// A segment that is a region code and not also a language code (`/us/`,
/// `/uk/`) carries no language signal. Returns `None` when nothing matched.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use site_ingest::url::infer_language;
///
/// let url = Url::parse("https://fr.acme.com/about").unwrap();
/// assert_eq!(infer_language(&url).as_deref(), Some("fr"));
///
/// let url = Url::parse("https://acme.com/us/pricing").unwrap();
/// assert_eq!(infer_language(&url), None);
/// ```
pub fn infer_language(url: &Url) -> Option<String> {
    if let Some(host) = url.host_str() {
        let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
        if labels.len() >= 3 && labels[0] != "www" && is_lang_token(labels[0]) {
            return Some(canonical_lang(labels[0]));
        }
    }

    let first = url
        .path()
        .trim_matches('/')
        .split('/')
        .next()
        .unwrap_or("")
        .to_lowercase();
    if first.is_empty() {
        return None;
    }

    if is_lang_token(&first) {
        Some(canonical_lang(&first))
    } else {
        None
    }
}

/// Drops a leading region segment from a path and returns a `/`-rooted path
///
/// `/us/blog/post` becomes `/blog/post`; paths without a region segment are
/// returned with empty segments collapsed.
pub fn strip_region_prefix(path: &str) -> String {
    let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.first().is_some_and(|s| is_region_prefix(s)) {
        segments.remove(0);
    }
    format!("/{}", segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lang(url: &str) -> Option<String> {
        infer_language(&Url::parse(url).unwrap())
    }

    #[test]
    fn test_canonical_lang_aliases() {
        assert_eq!(canonical_lang("en"), "en");
        assert_eq!(canonical_lang("EN-gb"), "en");
        assert_eq!(canonical_lang(" en_sg "), "en");
        assert_eq!(canonical_lang("zh"), "zh-cn");
        assert_eq!(canonical_lang("zh-Hans"), "zh-cn");
        assert_eq!(canonical_lang("zh-tw"), "zh-tw");
        assert_eq!(canonical_lang("ja"), "ja");
    }

    #[test]
    fn test_is_lang_token() {
        assert!(is_lang_token("fr"));
        assert!(is_lang_token("zh-hant"));
        assert!(is_lang_token("es-mx"));
        assert!(is_lang_token("pt_PT"));
        assert!(!is_lang_token("us"));
        assert!(!is_lang_token("uk"));
        assert!(!is_lang_token("xx"));
        assert!(!is_lang_token("blog"));
        assert!(!is_lang_token("en-toolong"));
        assert!(!is_lang_token(""));
    }

    #[test]
    fn test_language_from_subdomain() {
        assert_eq!(lang("https://fr.acme.com/about"), Some("fr".to_string()));
        assert_eq!(lang("https://zh-cn.acme.com/"), Some("zh-cn".to_string()));
        assert_eq!(lang("https://www.acme.com/about"), None);
        // Two labels: the first one is the domain itself
        assert_eq!(lang("https://de.com/about"), None);
    }

    #[test]
    fn test_language_from_path() {
        assert_eq!(lang("https://acme.com/fr/about"), Some("fr".to_string()));
        assert_eq!(lang("https://acme.com/en-us/about"), Some("en".to_string()));
        assert_eq!(lang("https://acme.com/ZH_Hans/"), Some("zh-cn".to_string()));
        assert_eq!(lang("https://acme.com/about"), None);
        assert_eq!(lang("https://acme.com/"), None);
    }

    #[test]
    fn test_region_is_not_language() {
        assert_eq!(lang("https://acme.com/us/pricing"), None);
        assert_eq!(lang("https://acme.com/uk/about"), None);
        assert_eq!(lang("https://acme.com/jp/about"), None);
    }

    #[test]
    fn test_strip_region_prefix() {
        assert_eq!(strip_region_prefix("/us/blog/post"), "/blog/post");
        assert_eq!(strip_region_prefix("/UK/pricing"), "/pricing");
        assert_eq!(strip_region_prefix("/blog//post/"), "/blog/post");
        assert_eq!(strip_region_prefix("/us"), "/");
        assert_eq!(strip_region_prefix(""), "/");
        assert_eq!(strip_region_prefix("/usa/x"), "/usa/x");
    }
}
