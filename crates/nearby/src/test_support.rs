//! Scripted collaborators for unit tests.

use std::{
    sync::{
        Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use ahash::{AHashMap as HashMap, AHashSet as HashSet};
use async_trait::async_trait;
use nearby_content::{
    ArticleId, Category, ContentError, ContentSource, Coordinate, Enrichment, GeoHit, Suggestion,
};

use crate::{
    bridge::MapSurface,
    config::DiscoveryConfig,
    coordinator::GeolocationProvider,
    geometry::{self, Octant},
    pipeline::{Article, ResultSet, SearchParameters},
};

pub(crate) fn c(latitude: f64, longitude: f64) -> Coordinate {
    Coordinate::new(latitude, longitude).unwrap()
}

pub(crate) fn hit(id: ArticleId, title: &str, coordinate: Coordinate) -> GeoHit {
    GeoHit {
        id,
        title: title.to_string(),
        coordinate,
        reported_distance: None,
    }
}

/// A result set around the origin, in the given order, 10 m apart.
pub(crate) fn result_set(entries: &[(ArticleId, &str)]) -> ResultSet {
    let params = SearchParameters::new(c(0.0, 0.0), &DiscoveryConfig::default()).with_limit(50);
    let articles = entries
        .iter()
        .zip(1..)
        .map(|(&(id, title), step)| Article {
            id,
            title: title.to_string(),
            extract: None,
            thumbnail_url: None,
            categories: Default::default(),
            coordinate: c(0.0, 0.0001 * f64::from(step)),
            distance_meters: 10.0 * f64::from(step),
            direction: Octant::E,
            search_radius_meters: params.radius_meters(),
            url: format!("https://example.test/?curid={id}"),
            enriched: true,
        })
        .collect();
    ResultSet::new(params, articles)
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GeosearchCall {
    pub center: Coordinate,
    pub radius_meters: u32,
    pub category: Category,
    pub limit: usize,
}

/// In-memory content index with scripted failures and latencies.
#[derive(Default)]
pub(crate) struct ScriptedContent {
    hits: Vec<GeoHit>,
    enrichments: HashMap<ArticleId, Enrichment>,
    failing_enrichments: HashSet<ArticleId>,
    geosearch_failing: AtomicBool,
    delays: HashMap<u32, Duration>,
    places: HashMap<String, Coordinate>,
    articles: HashMap<String, Coordinate>,
    suggestions: Vec<Suggestion>,

    geosearch_calls: Mutex<Vec<GeosearchCall>>,
    enrich_calls: AtomicUsize,
    text_search_calls: Mutex<Vec<String>>,
}

impl ScriptedContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hits(mut self, hits: Vec<GeoHit>) -> Self {
        self.hits = hits;
        self
    }

    pub fn with_extract(mut self, id: ArticleId, extract: &str) -> Self {
        self.enrichments.entry(id).or_default().extract = Some(extract.to_string());
        self
    }

    pub fn with_enrichment(mut self, id: ArticleId, enrichment: Enrichment) -> Self {
        self.enrichments.insert(id, enrichment);
        self
    }

    pub fn failing_enrichment(mut self, id: ArticleId) -> Self {
        self.failing_enrichments.insert(id);
        self
    }

    pub fn failing_geosearch(self) -> Self {
        self.set_geosearch_failing(true);
        self
    }

    pub fn set_geosearch_failing(&self, failing: bool) {
        self.geosearch_failing.store(failing, Ordering::SeqCst);
    }

    /// Geosearches with this radius answer after `delay`.
    pub fn with_delay(mut self, radius_meters: u32, delay: Duration) -> Self {
        self.delays.insert(radius_meters, delay);
        self
    }

    pub fn with_place(mut self, name: &str, coordinate: Coordinate) -> Self {
        self.places.insert(name.to_string(), coordinate);
        self
    }

    pub fn with_article(mut self, title: &str, coordinate: Coordinate) -> Self {
        self.articles.insert(title.to_string(), coordinate);
        self
    }

    pub fn with_suggestions(mut self, titles: &[&str]) -> Self {
        self.suggestions = titles
            .iter()
            .map(|t| Suggestion {
                title: t.to_string(),
                description: None,
            })
            .collect();
        self
    }

    pub fn geosearch_calls(&self) -> Vec<GeosearchCall> {
        self.geosearch_calls.lock().unwrap().clone()
    }

    pub fn enrich_calls(&self) -> usize {
        self.enrich_calls.load(Ordering::SeqCst)
    }

    pub fn text_search_calls(&self) -> Vec<String> {
        self.text_search_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentSource for ScriptedContent {
    async fn geosearch(
        &self,
        center: Coordinate,
        radius_meters: u32,
        category: Category,
        limit: usize,
    ) -> nearby_content::Result<Vec<GeoHit>> {
        self.geosearch_calls.lock().unwrap().push(GeosearchCall {
            center,
            radius_meters,
            category,
            limit,
        });
        if let Some(delay) = self.delays.get(&radius_meters) {
            tokio::time::sleep(*delay).await;
        }
        if self.geosearch_failing.load(Ordering::SeqCst) {
            return Err(ContentError::Status {
                endpoint: "geosearch",
                status: 503,
            });
        }
        Ok(self
            .hits
            .iter()
            .filter(|h| geometry::distance(center, h.coordinate) <= f64::from(radius_meters))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn enrich(&self, id: ArticleId) -> nearby_content::Result<Enrichment> {
        self.enrich_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_enrichments.contains(&id) {
            return Err(ContentError::Status {
                endpoint: "enrich",
                status: 500,
            });
        }
        Ok(self.enrichments.get(&id).cloned().unwrap_or_default())
    }

    async fn text_search(&self, query: &str, limit: usize) -> nearby_content::Result<Vec<Suggestion>> {
        self.text_search_calls
            .lock()
            .unwrap()
            .push(query.to_string());
        Ok(self.suggestions.iter().take(limit).cloned().collect())
    }

    async fn geocode(&self, query: &str) -> nearby_content::Result<Option<Coordinate>> {
        Ok(self.places.get(query).copied())
    }

    async fn locate_article(&self, title: &str) -> nearby_content::Result<Option<Coordinate>> {
        Ok(self.articles.get(title).copied())
    }

    fn article_url(&self, id: ArticleId) -> String {
        format!("https://example.test/?curid={id}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SurfaceCall {
    Center(Coordinate, u8),
    Render(Vec<ArticleId>),
    Focus(ArticleId),
}

#[derive(Default)]
pub(crate) struct RecordingSurface {
    calls: Mutex<Vec<SurfaceCall>>,
}

impl RecordingSurface {
    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn renders(&self) -> Vec<Vec<ArticleId>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SurfaceCall::Render(ids) => Some(ids),
                _ => None,
            })
            .collect()
    }
}

impl MapSurface for RecordingSurface {
    fn set_center(&self, center: Coordinate, zoom: u8) {
        self.calls
            .lock()
            .unwrap()
            .push(SurfaceCall::Center(center, zoom));
    }

    fn render_markers(&self, results: &ResultSet) {
        let ids = results.iter().map(|a| a.id).collect();
        self.calls.lock().unwrap().push(SurfaceCall::Render(ids));
    }

    fn focus_marker(&self, id: ArticleId) {
        self.calls.lock().unwrap().push(SurfaceCall::Focus(id));
    }
}

/// Geolocation that answers with a fixed position, or refuses.
pub(crate) struct FixedPosition(pub Option<Coordinate>);

#[async_trait]
impl GeolocationProvider for FixedPosition {
    async fn current_position(&self) -> anyhow::Result<Coordinate> {
        self.0
            .ok_or_else(|| anyhow::anyhow!("location permission denied"))
    }
}
