use url::{form_urlencoded, ParseError, Url};

/// Query keys dropped during normalization (compared case-insensitively)
const TRACKING_PARAMS: &[&str] = &[
    "gclid",
    "fbclid",
    "msclkid",
    "igshid",
    "mc_cid",
    "mc_eid",
    "mkt_tok",
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "_hsenc",
    "_hsmi",
    "hsctatracking",
    "ref",
    "ref_src",
    "source",
];

/// Any key starting with one of these is a tracking key
const TRACKING_PREFIXES: &[&str] = &["utm_"];

/// Normalizes a URL string into its canonical form
///
/// # Normalization Steps
///
/// 1. Protocol-relative `//host/...` is promoted to `https://`
/// 2. A scheme-less string is promoted to `https://`
/// 3. Fragment is dropped
/// 4. Host is lowercased
/// 5. Tracking query parameters are removed; remaining parameters keep
///    their relative order, and an empty query is removed
///
/// Returns an empty string when the input cannot be parsed. No network
/// access happens here.
///
/// # Examples
///
/// ```
/// use site_ingest::url::normalize_url;
///
/// let url = normalize_url("//WWW.Acme.com/about?utm_source=x&page=2#team");
/// assert_eq!(url, "https://www.acme.com/about?page=2");
///
/// assert_eq!(normalize_url("acme.com/pricing"), "https://acme.com/pricing");
/// assert_eq!(normalize_url(""), "");
/// ```
pub fn normalize_url(raw: &str) -> String {
    parse_normalized(raw)
        .map(|url| url.to_string())
        .unwrap_or_default()
}

/// Resolves `raw` against `base` (for relative links) and normalizes the result
pub fn normalize_with_base(raw: &str, base: &Url) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }
    match base.join(raw) {
        Ok(joined) => normalize_url(joined.as_str()),
        Err(_) => String::new(),
    }
}

/// Same as [`normalize_url`] but keeps the parsed form
pub fn parse_normalized(raw: &str) -> Option<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let candidate = if trimmed.starts_with("//") {
        format!("https:{}", trimmed)
    } else {
        trimmed.to_string()
    };

    let mut url = match Url::parse(&candidate) {
        Ok(url) => url,
        Err(ParseError::RelativeUrlWithoutBase) => {
            Url::parse(&format!("https://{}", candidate)).ok()?
        }
        Err(_) => return None,
    };

    url.set_fragment(None);

    // Special schemes are lowercased by the parser already
    if let Some(host) = url.host_str() {
        let lower = host.to_lowercase();
        if lower != host {
            url.set_host(Some(&lower)).ok()?;
        }
    }

    strip_tracking_params(&mut url);

    Some(url)
}

/// Removes tracking parameters in place, preserving the order of the rest
///
/// Kept segments are copied byte for byte, so the canonical form never
/// depends on whether a tracking parameter was present.
fn strip_tracking_params(url: &mut Url) {
    let Some(query) = url.query() else {
        return;
    };

    let kept: Vec<&str> = query
        .split('&')
        .filter(|segment| !segment.is_empty() && !is_tracking_segment(segment))
        .collect();

    if kept.is_empty() {
        url.set_query(None);
    } else {
        let joined = kept.join("&");
        if joined != query {
            url.set_query(Some(&joined));
        }
    }
}

/// Whether a raw `key=value` query segment carries a tracking key
fn is_tracking_segment(segment: &str) -> bool {
    form_urlencoded::parse(segment.as_bytes())
        .next()
        .is_some_and(|(key, _)| is_tracking_param(&key))
}

/// Checks if a query parameter is a tracking parameter
fn is_tracking_param(key: &str) -> bool {
    let key = key.to_lowercase();
    TRACKING_PARAMS.contains(&key.as_str())
        || TRACKING_PREFIXES.iter().any(|p| key.starts_with(p))
}
