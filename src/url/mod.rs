//! URL handling module for Site-Ingest
//!
//! This module provides URL normalization, same-domain checks, language
//! inference and the crawl policy filter.

mod domain;
mod language;
mod normalize;
mod policy;

// Re-export main functions
pub use domain::{is_same_domain, netloc, site_root};
pub use language::{
    canonical_lang, infer_language, is_lang_token, is_region_prefix, strip_region_prefix,
    KNOWN_LANG_CODES, REGION_PREFIXES,
};
pub use normalize::{normalize_url, normalize_with_base, parse_normalized};
pub use policy::{eligible, SkipReason, EXCLUDED_EXTENSIONS, EXCLUDED_PATH_SUBSTRINGS};
