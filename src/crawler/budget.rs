//! Content buckets and per-bucket crawl caps
//!
//! High-volume sections (blogs, news, resources) are capped so they cannot
//! consume the whole page budget. `other` is never capped.

use crate::url::strip_region_prefix;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

/// Coarse content category of a URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Blog,
    Resources,
    News,
    Press,
    Events,
    Customers,
    Cases,
    Other,
}

impl Bucket {
    /// Every bucket, in classification order
    pub const ALL: [Bucket; 8] = [
        Bucket::Blog,
        Bucket::Resources,
        Bucket::News,
        Bucket::Press,
        Bucket::Events,
        Bucket::Customers,
        Bucket::Cases,
        Bucket::Other,
    ];

    /// Classifies a URL by its path
    ///
    /// A leading region segment is stripped first, so `/us/blog/x` is a
    /// blog page. Unparseable URLs are `Other`.
    ///
    /// # Examples
    ///
    /// ```
    /// use site_ingest::Bucket;
    ///
    /// assert_eq!(Bucket::of("https://acme.com/blog/launch"), Bucket::Blog);
    /// assert_eq!(Bucket::of("https://acme.com/uk/customer-stories"), Bucket::Customers);
    /// assert_eq!(Bucket::of("https://acme.com/pricing"), Bucket::Other);
    /// ```
    pub fn of(url: &str) -> Bucket {
        match Url::parse(url) {
            Ok(parsed) => Self::of_path(parsed.path()),
            Err(_) => Bucket::Other,
        }
    }

    /// Classifies a URL path; first matching rule wins
    pub fn of_path(path: &str) -> Bucket {
        let path = strip_region_prefix(&path.to_lowercase());
        let p = path.as_str();
        let section = |name: &str| p.starts_with(name) || p.contains(&format!("{}/", name));

        if section("/blog") {
            Bucket::Blog
        } else if section("/resources") || p.starts_with("/resource") {
            Bucket::Resources
        } else if section("/news") {
            Bucket::News
        } else if section("/press") {
            Bucket::Press
        } else if section("/events") || p.starts_with("/event") {
            Bucket::Events
        } else if section("/customers") || p.starts_with("/customer") {
            Bucket::Customers
        } else if p.starts_with("/case") || p.contains("/case/") || section("/stories") {
            Bucket::Cases
        } else {
            Bucket::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Blog => "blog",
            Bucket::Resources => "resources",
            Bucket::News => "news",
            Bucket::Press => "press",
            Bucket::Events => "events",
            Bucket::Customers => "customers",
            Bucket::Cases => "cases",
            Bucket::Other => "other",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-bucket page caps for a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BucketCaps(BTreeMap<Bucket, usize>);

impl BucketCaps {
    /// Derives caps from the page budget
    ///
    /// | Bucket | Cap |
    /// |--------|-----|
    /// | blog, resources | max(20, 15%) |
    /// | news, press, events | max(10, 8%) |
    /// | customers, cases | max(20, 20%) |
    /// | other | max_pages |
    ///
    /// Percentages are of `max(1, max_pages)`, rounded down.
    pub fn for_budget(max_pages: usize) -> Self {
        let mp = max_pages.max(1);
        let share = |percent: usize, floor: usize| floor.max(mp * percent / 100);

        let caps = Bucket::ALL
            .iter()
            .map(|&bucket| {
                let cap = match bucket {
                    Bucket::Blog | Bucket::Resources => share(15, 20),
                    Bucket::News | Bucket::Press | Bucket::Events => share(8, 10),
                    Bucket::Customers | Bucket::Cases => share(20, 20),
                    Bucket::Other => mp,
                };
                (bucket, cap)
            })
            .collect();

        Self(caps)
    }

    pub fn cap(&self, bucket: Bucket) -> usize {
        self.0.get(&bucket).copied().unwrap_or(usize::MAX)
    }

    /// Whether a bucket holding `count` pages refuses another one
    ///
    /// `Other` never refuses.
    pub fn is_full(&self, bucket: Bucket, count: usize) -> bool {
        bucket != Bucket::Other && count >= self.cap(bucket)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Bucket, usize)> + '_ {
        self.0.iter().map(|(b, c)| (*b, *c))
    }
}

/// Running page count per bucket
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BucketCounts(BTreeMap<Bucket, usize>);

impl BucketCounts {
    pub fn new() -> Self {
        Self(Bucket::ALL.iter().map(|&b| (b, 0)).collect())
    }

    pub fn get(&self, bucket: Bucket) -> usize {
        self.0.get(&bucket).copied().unwrap_or(0)
    }

    pub fn increment(&mut self, bucket: Bucket) {
        *self.0.entry(bucket).or_insert(0) += 1;
    }
}
