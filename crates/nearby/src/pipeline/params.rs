use std::ops::RangeInclusive;

use nearby_content::{Category, Coordinate};

use crate::config::DiscoveryConfig;

/// Accepted search radius, in metres.
pub const RADIUS_RANGE: RangeInclusive<u32> = 100..=10_000;
/// Accepted number of articles per search.
pub const LIMIT_RANGE: RangeInclusive<usize> = 5..=50;

/// Everything that identifies one search.
///
/// Two searches with equal parameters are the same search; changing any field
/// invalidates the previous result set. Radius and limit are clamped on the
/// way in, so a value of this type is always within range.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SearchParameters {
    center: Coordinate,
    radius_meters: u32,
    category: Category,
    result_limit: usize,
    text_filter: String,
}

impl SearchParameters {
    /// Parameters around `center` with the defaults of `config`.
    pub fn new(center: Coordinate, config: &DiscoveryConfig) -> Self {
        Self {
            center,
            radius_meters: clamp_radius(config.default_radius_meters),
            category: config.default_category,
            result_limit: clamp_limit(config.default_result_limit),
            text_filter: String::new(),
        }
    }

    pub fn with_center(mut self, center: Coordinate) -> Self {
        self.center = center;
        self
    }

    pub fn with_radius(mut self, meters: u32) -> Self {
        self.radius_meters = clamp_radius(meters);
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.result_limit = clamp_limit(limit);
        self
    }

    /// Stored trimmed, so filters differing only in surrounding whitespace
    /// are the same search.
    pub fn with_text_filter(mut self, filter: impl Into<String>) -> Self {
        let filter = filter.into();
        self.text_filter = match filter.trim() {
            trimmed if trimmed.len() == filter.len() => filter,
            trimmed => trimmed.to_string(),
        };
        self
    }

    pub fn center(&self) -> Coordinate {
        self.center
    }

    pub fn radius_meters(&self) -> u32 {
        self.radius_meters
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn result_limit(&self) -> usize {
        self.result_limit
    }

    pub fn text_filter(&self) -> &str {
        &self.text_filter
    }

    /// Lower-cased filter, `None` when blank.
    pub(crate) fn filter_needle(&self) -> Option<String> {
        (!self.text_filter.is_empty()).then(|| self.text_filter.to_lowercase())
    }
}

pub(crate) fn clamp_radius(meters: u32) -> u32 {
    meters.clamp(*RADIUS_RANGE.start(), *RADIUS_RANGE.end())
}

pub(crate) fn clamp_limit(limit: usize) -> usize {
    limit.clamp(*LIMIT_RANGE.start(), *LIMIT_RANGE.end())
}
