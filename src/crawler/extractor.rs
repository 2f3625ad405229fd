//! Main-content text extraction
//!
//! Readability picks the content block; when it yields nothing the visible
//! body text is used instead. A Unicode-range gate drops text written in a
//! script the run does not keep.

use readability::extractor;
use scraper::{Html, Node, Selector};
use url::Url;

/// Elements whose text is never visible content
const INVISIBLE_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Extracts main-content text from a page
///
/// Never fails: extractor errors fall back to the body text, and an
/// unparseable document yields an empty string.
pub fn extract_text(html: &str, url: &Url) -> String {
    let readable = match extractor::extract(&mut html.as_bytes(), url) {
        Ok(product) => clean_text(&product.text),
        Err(e) => {
            tracing::debug!("readability failed for {}: {:?}", url, e);
            String::new()
        }
    };

    if !readable.is_empty() {
        return readable;
    }

    clean_text(&body_text(html))
}

/// Visible text of `<body>`, skipping script-like elements
fn body_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("body") else {
        return String::new();
    };
    let Some(body) = document.select(&selector).next() else {
        return String::new();
    };

    let mut out = String::new();
    for node in body.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| INVISIBLE_ELEMENTS.contains(&el.name()))
        });
        if !hidden {
            out.push_str(text);
            out.push('\n');
        }
    }
    out
}

/// Trims every line, collapses inner whitespace runs and drops blank lines
fn clean_text(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Checks for Japanese kana or Korean Hangul that the allowed set does not cover
///
/// Kana (U+3040..=U+30FF) is accepted only when `ja` is allowed and Hangul
/// syllables (U+AC00..=U+D7AF) only when `ko` is allowed. Chinese text
/// passes: Han characters are shared and not inspected.
pub fn has_foreign_script(text: &str, allowed_languages: &[String]) -> bool {
    let allows = |code: &str| allowed_languages.iter().any(|l| l == code);
    let block_kana = !allows("ja");
    let block_hangul = !allows("ko");

    text.chars().any(|c| {
        (block_kana && ('\u{3040}'..='\u{30FF}').contains(&c))
            || (block_hangul && ('\u{AC00}'..='\u{D7AF}').contains(&c))
    })
}
