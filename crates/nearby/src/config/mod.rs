use std::{str::FromStr, time::Duration};

use nearby_content::{Category, ContentEndpoints, Coordinate, MAX_GEOSEARCH_LIMIT};

use crate::{
    error::NearbyError,
    pipeline::{LIMIT_RANGE, RADIUS_RANGE},
};

/// Where the map opens before any location is chosen.
const INITIAL_CENTER: (f64, f64) = (37.7749, -122.4194);

/// Engine-wide settings: endpoints, search defaults and timing.
///
/// Use [`DiscoveryConfigBuilder`] for an ergonomic way to override the
/// defaults, or [`DiscoveryConfig::from_env`] to pick them up from the
/// environment.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryConfig {
    pub endpoints: ContentEndpoints,
    /// Radius of the first search, in metres.
    pub default_radius_meters: u32,
    pub default_category: Category,
    /// Number of articles a search keeps.
    pub default_result_limit: usize,
    /// How many hits a geosearch asks for so that the nearest
    /// `result_limit` survive truncation.
    pub overfetch_limit: usize,
    /// Enrichment requests in flight per run.
    pub enrichment_concurrency: usize,
    /// Quiet window of the free-text article lookup.
    pub lookup_debounce: Duration,
    pub lookup_limit: usize,
    pub map_zoom: u8,
    pub initial_center: Coordinate,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            endpoints: ContentEndpoints::default(),
            default_radius_meters: *RADIUS_RANGE.end(),
            default_category: Category::All,
            default_result_limit: 20,
            overfetch_limit: MAX_GEOSEARCH_LIMIT,
            enrichment_concurrency: 8,
            lookup_debounce: Duration::from_millis(300),
            lookup_limit: nearby_content::DEFAULT_TEXT_SEARCH_LIMIT,
            map_zoom: 13,
            initial_center: Coordinate::new(INITIAL_CENTER.0, INITIAL_CENTER.1)
                .expect("initial centre is a valid coordinate"),
        }
    }
}

impl DiscoveryConfig {
    pub fn builder() -> DiscoveryConfigBuilder {
        DiscoveryConfigBuilder::new()
    }

    /// Defaults overridden by `NEARBY_*` environment variables.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `NEARBY_WIKI_API_URL` | `endpoints.wiki_api_url` |
    /// | `NEARBY_GEOCODER_URL` | `endpoints.geocoder_url` |
    /// | `NEARBY_USER_AGENT` | `endpoints.user_agent` |
    /// | `NEARBY_TIMEOUT_SECS` | `endpoints.timeout` |
    /// | `NEARBY_RADIUS` | `default_radius_meters` (clamped) |
    /// | `NEARBY_LIMIT` | `default_result_limit` (clamped) |
    pub fn from_env() -> Result<Self, NearbyError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, NearbyError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = DiscoveryConfigBuilder::new();
        if let Some(url) = lookup("NEARBY_WIKI_API_URL") {
            builder.config.endpoints.wiki_api_url = url;
        }
        if let Some(url) = lookup("NEARBY_GEOCODER_URL") {
            builder.config.endpoints.geocoder_url = url;
        }
        if let Some(agent) = lookup("NEARBY_USER_AGENT") {
            builder.config.endpoints.user_agent = agent;
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "NEARBY_TIMEOUT_SECS")? {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if let Some(radius) = parse_var::<u32>(&lookup, "NEARBY_RADIUS")? {
            builder = builder.radius(radius);
        }
        if let Some(limit) = parse_var::<usize>(&lookup, "NEARBY_LIMIT")? {
            builder = builder.limit(limit);
        }
        Ok(builder.build())
    }
}

fn parse_var<T>(lookup: impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, NearbyError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| NearbyError::ConfigError(format!("{key}={raw:?}: {e}")))
        })
        .transpose()
}

/// Builder for creating discovery configurations with ergonomic defaults
#[derive(Debug, Clone, Default)]
pub struct DiscoveryConfigBuilder {
    config: DiscoveryConfig,
}

impl DiscoveryConfigBuilder {
    /// Create a new builder with sensible defaults
    pub fn new() -> Self {
        Self {
            config: DiscoveryConfig::default(),
        }
    }

    /// Walking distance: a small radius and a short list
    pub fn neighbourhood() -> Self {
        Self::new().radius(1_000).limit(10)
    }

    /// Widest radius the index allows, longest list
    pub fn wide_area() -> Self {
        Self::new().radius(*RADIUS_RANGE.end()).limit(*LIMIT_RANGE.end())
    }

    /// Search radius in metres, clamped to the supported range
    pub fn radius(mut self, meters: u32) -> Self {
        self.config.default_radius_meters = meters.clamp(*RADIUS_RANGE.start(), *RADIUS_RANGE.end());
        self
    }

    /// Number of articles kept per search, clamped to the supported range
    pub fn limit(mut self, limit: usize) -> Self {
        self.config.default_result_limit = limit.clamp(*LIMIT_RANGE.start(), *LIMIT_RANGE.end());
        self
    }

    pub fn category(mut self, category: Category) -> Self {
        self.config.default_category = category;
        self
    }

    /// Geosearch over-fetch; never below the largest result limit
    pub fn overfetch(mut self, limit: usize) -> Self {
        self.config.overfetch_limit = limit.clamp(*LIMIT_RANGE.end(), MAX_GEOSEARCH_LIMIT);
        self
    }

    /// Enrichment requests in flight per run (at least one)
    pub fn enrichment_concurrency(mut self, concurrency: usize) -> Self {
        self.config.enrichment_concurrency = concurrency.max(1);
        self
    }

    pub fn lookup_debounce(mut self, quiet: Duration) -> Self {
        self.config.lookup_debounce = quiet;
        self
    }

    pub fn lookup_limit(mut self, limit: usize) -> Self {
        self.config.lookup_limit = limit.max(1);
        self
    }

    pub fn map_zoom(mut self, zoom: u8) -> Self {
        self.config.map_zoom = zoom.min(19);
        self
    }

    pub fn initial_center(mut self, center: Coordinate) -> Self {
        self.config.initial_center = center;
        self
    }

    pub fn endpoints(mut self, endpoints: ContentEndpoints) -> Self {
        self.config.endpoints = endpoints;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.endpoints.timeout = timeout;
        self
    }

    /// Build the final configuration
    pub fn build(self) -> DiscoveryConfig {
        self.config
    }
}
