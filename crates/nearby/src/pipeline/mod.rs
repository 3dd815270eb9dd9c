//! Fetch, enrich, measure and rank the articles around a search centre.
//!
//! A run is a pure function of its [`SearchParameters`] and the external
//! data: the same parameters against the same index give the same
//! [`ResultSet`], in the same order.

use std::sync::Arc;

use futures::{StreamExt, stream};
use itertools::Itertools;
use nearby_content::{ContentError, ContentSource, Enrichment, GeoHit};
use tracing::{debug, info, instrument, warn};

use crate::{config::DiscoveryConfig, geometry};

mod article;
mod params;

pub use article::{Article, ResultSet};
pub use params::{LIMIT_RANGE, RADIUS_RANGE, SearchParameters};

/// Runs searches against a [`ContentSource`].
///
/// Cheap to clone; clones share the content source.
pub struct ResultPipeline<C: ?Sized> {
    content: Arc<C>,
    overfetch_limit: usize,
    concurrency: usize,
}

impl<C: ?Sized> Clone for ResultPipeline<C> {
    fn clone(&self) -> Self {
        Self {
            content: Arc::clone(&self.content),
            overfetch_limit: self.overfetch_limit,
            concurrency: self.concurrency,
        }
    }
}

impl<C: ContentSource + ?Sized> ResultPipeline<C> {
    pub fn new(content: Arc<C>, config: &DiscoveryConfig) -> Self {
        Self {
            content,
            overfetch_limit: config.overfetch_limit,
            concurrency: config.enrichment_concurrency.max(1),
        }
    }

    pub fn content(&self) -> &Arc<C> {
        &self.content
    }

    /// Produce the result set for `params`.
    ///
    /// Fails only when the geosearch itself fails. A failed enrichment leaves
    /// that one article without extract, thumbnail and categories.
    ///
    /// Distance and direction are always recomputed from the coordinates;
    /// whatever distance the index reports is ignored. Ranking only depends on
    /// geometry, so articles are ranked and truncated first and enrichment is
    /// spent on the survivors alone. The output is identical to enriching
    /// every hit before ranking. The text filter runs last, over the already
    /// limited set.
    #[instrument(
        name = "Pipeline run",
        skip(self, params),
        fields(radius = params.radius_meters(), category = %params.category(), limit = params.result_limit()),
        level = "info"
    )]
    pub async fn run(&self, params: &SearchParameters) -> Result<ResultSet, ContentError> {
        let t_run = std::time::Instant::now();
        let center = params.center();

        let hits = self
            .content
            .geosearch(
                center,
                params.radius_meters(),
                params.category(),
                self.overfetch_limit.max(params.result_limit()),
            )
            .await?;
        let total_hits = hits.len();

        let nearest = hits
            .into_iter()
            .map(|hit| {
                let distance = geometry::distance(center, hit.coordinate);
                (hit, distance)
            })
            .sorted_by(|(a, da), (b, db)| da.total_cmp(db).then(a.id.cmp(&b.id)))
            .take(params.result_limit())
            .collect_vec();

        let content = &self.content;
        let enriched: Vec<(GeoHit, f64, Result<Enrichment, ContentError>)> = stream::iter(nearest)
            .map(|(hit, distance)| async move {
                let outcome = content.enrich(hit.id).await;
                (hit, distance, outcome)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut articles = enriched
            .into_iter()
            .map(|(hit, distance, outcome)| self.build_article(params, hit, distance, outcome))
            .collect_vec();

        if let Some(needle) = params.filter_needle() {
            let before = articles.len();
            articles.retain(|a| a.matches(&needle));
            debug!(needle, before, after = articles.len(), "Applied text filter");
        }

        let results = ResultSet::new(params.clone(), articles);
        info!(
            hits = total_hits,
            kept = results.len(),
            degraded = results.degraded(),
            elapsed = ?t_run.elapsed(),
            "Pipeline run complete"
        );
        Ok(results)
    }

    fn build_article(
        &self,
        params: &SearchParameters,
        hit: GeoHit,
        distance_meters: f64,
        outcome: Result<Enrichment, ContentError>,
    ) -> Article {
        let (details, enriched) = match outcome {
            Ok(details) => (details, true),
            Err(e) => {
                warn!(id = hit.id, title = %hit.title, error = %e, "Enrichment failed, keeping bare article");
                (Enrichment::default(), false)
            }
        };

        Article {
            id: hit.id,
            url: self.content.article_url(hit.id),
            title: details.title.unwrap_or(hit.title),
            extract: details.extract,
            thumbnail_url: details.thumbnail_url,
            categories: details.categories,
            coordinate: hit.coordinate,
            distance_meters,
            direction: geometry::direction(params.center(), hit.coordinate),
            search_radius_meters: params.radius_meters(),
            enriched,
        }
    }
}
