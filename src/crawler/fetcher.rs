//! HTTP fetcher implementation
//!
//! This module handles all plain HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent and language headers
//! - Raw GET requests used by discovery (robots.txt, sitemaps, feeds)
//! - Page fetches with content-type and status classification
//! - Charset detection so non-UTF-8 pages are not mangled

use crate::config::UserAgentConfig;
use crate::crawler::parser::decode_cf_emails;
use encoding_rs::{Encoding, UTF_8};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, CONTENT_TYPE};
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use thiserror::Error;

/// Timeout for a page fetch
pub const PAGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Why a fetch produced no HTML
///
/// The coordinator treats every variant as "no result" for the URL; none of
/// them abort the crawl.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("not HTML (content-type: {0})")]
    NotHtml(String),

    #[error("server error status {0}")]
    ServerError(u16),

    #[error("empty body")]
    EmptyBody,

    #[error("rendering unavailable")]
    RenderUnavailable,

    #[error("render failed: {0}")]
    Render(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_connect() {
            FetchError::Transport(format!("connection failed: {}", e))
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}

/// A fully-read HTTP response
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,
    /// Content-Type header value, lowercased (empty when absent)
    pub content_type: String,
    /// Body bytes after transfer decoding
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Body decoded with the best available charset
    pub fn text(&self) -> String {
        decode_body(&self.body, &self.content_type)
    }

    /// Whether the content type is HTML, or absent
    pub fn is_html(&self) -> bool {
        self.content_type.is_empty()
            || self.content_type.contains("text/html")
            || self.content_type.contains("application/xhtml+xml")
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `accept_language` - Value for the `Accept-Language` header sent with
///   every request (see [`accept_language`])
///
/// # Example
///
/// ```no_run
/// use site_ingest::config::UserAgentConfig;
/// use site_ingest::crawler::{accept_language, build_http_client};
///
/// let langs = vec!["en".to_string(), "zh-cn".to_string()];
/// let client = build_http_client(&UserAgentConfig::default(), &accept_language(&langs)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    accept_language: &str,
) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(accept_language) {
        headers.insert(ACCEPT_LANGUAGE, value);
    }

    Client::builder()
        .user_agent(config.header_value())
        .default_headers(headers)
        .timeout(PAGE_TIMEOUT)
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Builds an `Accept-Language` value from canonical language codes
///
/// The first language is preferred; each following one gets a q-value
/// 0.1 lower, bottoming out at 0.1.
///
/// # Examples
///
/// ```
/// use site_ingest::crawler::accept_language;
///
/// let langs = vec!["en".to_string(), "zh-cn".to_string()];
/// assert_eq!(accept_language(&langs), "en,zh-CN;q=0.9");
/// ```
pub fn accept_language(languages: &[String]) -> String {
    languages
        .iter()
        .enumerate()
        .map(|(i, lang)| {
            let tag = language_tag(lang);
            if i == 0 {
                tag
            } else {
                let q = 10usize.saturating_sub(i).max(1);
                format!("{};q=0.{}", tag, q)
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// `zh-cn` -> `zh-CN`; longer subtags are left as-is
fn language_tag(code: &str) -> String {
    match code.split_once('-') {
        Some((base, region)) if region.len() == 2 => {
            format!("{}-{}", base, region.to_uppercase())
        }
        _ => code.to_string(),
    }
}

/// GETs a URL and reads the whole body
///
/// Any status is returned as-is; only transport failures are errors.
pub async fn fetch_raw(
    client: &Client,
    url: &str,
    timeout: Duration,
) -> Result<RawResponse, FetchError> {
    let response = client.get(url).timeout(timeout).send().await?;

    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_lowercase();

    let body = response.bytes().await?.to_vec();

    Ok(RawResponse {
        status,
        content_type,
        body,
    })
}

/// Fetches a page over plain HTTP
///
/// # Classification
///
/// | Condition | Result |
/// |-----------|--------|
/// | Transport error / timeout | `Transport` / `Timeout` |
/// | Content-Type present and not HTML | `NotHtml` |
/// | Empty body | `EmptyBody` |
/// | Status >= 500 | `ServerError` |
/// | 2xx-4xx with an HTML body | `Ok(html)` |
///
/// Client errors are accepted because some sites serve full-content pages
/// with a 404 status. Obfuscated email links are decoded before returning.
pub async fn fetch_plain(client: &Client, url: &str) -> Result<String, FetchError> {
    let response = fetch_raw(client, url, PAGE_TIMEOUT).await?;

    if !response.is_html() {
        return Err(FetchError::NotHtml(response.content_type));
    }

    let html = decode_cf_emails(&response.text());

    if html.trim().is_empty() {
        return Err(FetchError::EmptyBody);
    }

    if response.status >= 500 {
        return Err(FetchError::ServerError(response.status));
    }

    Ok(html)
}

/// Decodes a body using the declared or sniffed charset
///
/// Order: `charset=` from the Content-Type header (unless it is the
/// ISO-8859-1 default many servers send blindly), then a `<meta charset>`
/// in the first 2 KiB, then UTF-8. A byte-order mark always wins.
pub fn decode_body(body: &[u8], content_type: &str) -> String {
    let declared = charset_param(content_type).and_then(|l| Encoding::for_label(l.as_bytes()));
    let latin1_default = declared.is_some_and(|e| e.name() == "windows-1252");

    let encoding = match declared {
        Some(enc) if !latin1_default => enc,
        _ => sniff_meta_charset(body).or(declared).unwrap_or(UTF_8),
    };

    let (text, _, _) = encoding.decode(body);
    text.into_owned()
}

/// Extracts the `charset=` parameter from a Content-Type value
fn charset_param(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("charset") {
            Some(value.trim().trim_matches(|c| c == '"' || c == '\'').to_string())
        } else {
            None
        }
    })
}

/// Looks for `charset=` inside a `<meta>` tag near the top of the document
fn sniff_meta_charset(body: &[u8]) -> Option<&'static Encoding> {
    let head = &body[..body.len().min(2048)];
    let head = String::from_utf8_lossy(head).to_lowercase();

    let mut rest = head.as_str();
    while let Some(start) = rest.find("<meta") {
        let tag_body = &rest[start..];
        let end = tag_body.find('>').unwrap_or(tag_body.len());
        let tag = &tag_body[..end];

        if let Some(pos) = tag.find("charset=") {
            let value: String = tag[pos + "charset=".len()..]
                .trim_start_matches(|c| c == '"' || c == '\'')
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
                .collect();
            if let Some(enc) = Encoding::for_label(value.as_bytes()) {
                return Some(enc);
            }
        }

        rest = &tag_body[end..];
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&UserAgentConfig::default(), "en");
        assert!(client.is_ok());
    }

    #[test]
    fn test_accept_language() {
        let langs = vec!["en".to_string(), "zh-cn".to_string(), "ja".to_string()];
        assert_eq!(accept_language(&langs), "en,zh-CN;q=0.9,ja;q=0.8");
        assert_eq!(accept_language(&["zh-hant".to_string()]), "zh-hant");
        assert_eq!(accept_language(&[]), "");
    }

    #[test]
    fn test_accept_language_q_floor() {
        let langs: Vec<String> = (0..12).map(|_| "en".to_string()).collect();
        let header = accept_language(&langs);
        assert!(header.ends_with("en;q=0.1"));
        assert!(!header.contains("q=0.0"));
    }

    #[test]
    fn test_charset_param() {
        assert_eq!(
            charset_param("text/html; charset=Shift_JIS"),
            Some("Shift_JIS".to_string())
        );
        assert_eq!(
            charset_param("text/html;charset=\"utf-8\""),
            Some("utf-8".to_string())
        );
        assert_eq!(charset_param("text/html"), None);
    }

    #[test]
    fn test_decode_header_charset() {
        let (bytes, _, _) = encoding_rs::GBK.encode("你好，世界");
        let text = decode_body(&bytes, "text/html; charset=gbk");
        assert_eq!(text, "你好，世界");
    }

    #[test]
    fn test_decode_meta_charset_overrides_latin1_default() {
        let (body, _, _) = encoding_rs::GBK.encode("<html><head><meta charset=\"gbk\"></head><body>中文</body></html>");
        let text = decode_body(&body, "text/html; charset=iso-8859-1");
        assert!(text.contains("中文"));
    }

    #[test]
    fn test_decode_defaults_to_utf8() {
        let text = decode_body("héllo".as_bytes(), "");
        assert_eq!(text, "héllo");
    }

    #[test]
    fn test_raw_response_is_html() {
        let mut response = RawResponse {
            status: 200,
            content_type: String::new(),
            body: Vec::new(),
        };
        assert!(response.is_html());

        response.content_type = "text/html; charset=utf-8".to_string();
        assert!(response.is_html());

        response.content_type = "application/xhtml+xml".to_string();
        assert!(response.is_html());

        response.content_type = "application/pdf".to_string();
        assert!(!response.is_html());
    }
}
