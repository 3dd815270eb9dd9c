use std::collections::BTreeSet;

use crate::Coordinate;

/// Stable identifier the content index assigns to an article (its page id).
pub type ArticleId = u64;

/// A single geosearch hit, before enrichment.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoHit {
    pub id: ArticleId,
    pub title: String,
    pub coordinate: Coordinate,
    /// Distance reported by the index. Informational only.
    pub reported_distance: Option<f64>,
}

/// Descriptive metadata fetched per article after the geosearch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enrichment {
    pub title: Option<String>,
    pub extract: Option<String>,
    pub categories: BTreeSet<String>,
    pub thumbnail_url: Option<String>,
}

/// One free-text search suggestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub title: String,
    pub description: Option<String>,
}
