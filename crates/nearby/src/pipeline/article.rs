use std::{collections::BTreeSet, ops::Deref};

use nearby_content::{ArticleId, CategoryGroup, Coordinate};

use super::SearchParameters;
use crate::geometry::Octant;

/// A nearby article, enriched and measured against the search centre.
///
/// Built by the result pipeline once per fetch cycle and never patched
/// afterwards; the next cycle replaces it wholesale.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    pub extract: Option<String>,
    pub thumbnail_url: Option<String>,
    pub categories: BTreeSet<String>,
    pub coordinate: Coordinate,
    /// Great-circle distance from the search centre, in metres.
    pub distance_meters: f64,
    pub direction: Octant,
    pub search_radius_meters: u32,
    pub url: String,
    /// `false` when the detail lookup failed and only geosearch data is known.
    pub enriched: bool,
}

impl Article {
    pub fn group(&self) -> CategoryGroup {
        CategoryGroup::classify(self.categories.iter().map(String::as_str))
    }

    /// The extract cut to at most `max_chars` characters, with an ellipsis
    /// when something was cut.
    pub fn preview(&self, max_chars: usize) -> Option<String> {
        let extract = self.extract.as_deref()?;
        match extract.char_indices().nth(max_chars) {
            None => Some(extract.to_string()),
            Some((cut, _)) => Some(format!("{}…", extract[..cut].trim_end())),
        }
    }

    /// Case-insensitive substring match on title or extract. `needle` must
    /// already be lower-cased.
    pub(crate) fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self
                .extract
                .as_deref()
                .is_some_and(|e| e.to_lowercase().contains(needle))
    }
}

/// The articles of one search cycle, nearest first.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    params: SearchParameters,
    articles: Vec<Article>,
}

impl ResultSet {
    pub(crate) fn new(params: SearchParameters, articles: Vec<Article>) -> Self {
        debug_assert!(
            articles
                .windows(2)
                .all(|w| w[0].distance_meters <= w[1].distance_meters)
        );
        debug_assert!(articles.len() <= params.result_limit());
        Self { params, articles }
    }

    /// A result set with nothing in it, used when the location is cleared.
    pub fn empty(params: SearchParameters) -> Self {
        Self {
            params,
            articles: Vec::new(),
        }
    }

    /// The parameters this set was produced for.
    pub fn params(&self) -> &SearchParameters {
        &self.params
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn get(&self, id: ArticleId) -> Option<&Article> {
        self.articles.iter().find(|a| a.id == id)
    }

    pub fn contains(&self, id: ArticleId) -> bool {
        self.get(id).is_some()
    }

    /// Articles whose enrichment failed.
    pub fn degraded(&self) -> usize {
        self.articles.iter().filter(|a| !a.enriched).count()
    }
}

impl Deref for ResultSet {
    type Target = [Article];

    fn deref(&self) -> &Self::Target {
        &self.articles
    }
}
