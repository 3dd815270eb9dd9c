//! Nearby - Location-aware Article Discovery
//!
//! Nearby finds encyclopedia articles around a point on the map, ranks them
//! by distance, enriches them with a summary, thumbnail and categories, and
//! keeps a map and a list view of them in sync.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use nearby::{
//!     ArticleId, Coordinate, DiscoveryConfig, HttpContentClient, MapSurface, ResultSet,
//!     SearchCoordinator,
//! };
//!
//! struct Terminal;
//!
//! impl MapSurface for Terminal {
//!     fn set_center(&self, center: Coordinate, zoom: u8) {
//!         println!("map at {center} (zoom {zoom})");
//!     }
//!     fn render_markers(&self, results: &ResultSet) {
//!         for article in results.iter() {
//!             println!("{:>6.0} m {:<2} {}", article.distance_meters, article.direction, article.title);
//!         }
//!     }
//!     fn focus_marker(&self, _id: ArticleId) {}
//! }
//!
//! # async fn demo() -> nearby::error::Result<()> {
//! let config = DiscoveryConfig::from_env()?;
//! let content = Arc::new(HttpContentClient::new(config.endpoints.clone())?);
//! let mut coordinator = SearchCoordinator::new(content, Terminal, config);
//!
//! coordinator.set_location_by_place_name("Trafalgar Square").await?;
//! coordinator.settle().await;
//! # Ok(())
//! # }
//! ```
//!
//! # Pieces
//!
//! - [`ResultPipeline`]: geosearch, measure, rank, truncate, enrich, filter.
//!   A pure function of [`SearchParameters`] and the external data.
//! - [`SearchCoordinator`]: owns the session, starts runs when the location
//!   or filters change and applies only the latest one.
//! - [`SyncBridge`]: pushes results and selection to the map surface and the
//!   list view, and routes marker activations back.
//! - [`content`]: the HTTP client for the external endpoints.
use once_cell::sync::OnceCell;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

mod bridge;
mod config;
mod coordinator;
pub mod error;
pub mod geometry;
mod pipeline;
#[cfg(test)]
mod test_support;

pub use bridge::{
    ActivationPort, ListOrder, ListView, MapSurface, Notice, SelectionOrigin, Subscription,
    SyncBridge,
};
pub use config::{DiscoveryConfig, DiscoveryConfigBuilder};
pub use coordinator::{
    Debouncer, GeolocationProvider, SearchCoordinator, SelectionState, SessionState, Update,
};
pub use error::{ErrorKind, NearbyError};
pub use geometry::Octant;
pub use nearby_content as content;
pub use nearby_content::{
    ArticleId, Category, CategoryGroup, ContentEndpoints, ContentSource, Coordinate,
    HttpContentClient, Suggestion,
};
pub use pipeline::{Article, LIMIT_RANGE, RADIUS_RANGE, ResultPipeline, ResultSet, SearchParameters};

static LOGGER_INIT: OnceCell<()> = OnceCell::new();

/// Initialize logging for the Nearby library.
///
/// `RUST_LOG` takes precedence over `level` when set. Span close events are
/// logged, so every pipeline run reports its duration.
///
/// # Examples
///
/// ```rust
/// use nearby::init_logging;
/// use tracing::Level;
///
/// init_logging(Level::INFO)?;
/// # Ok::<(), nearby::error::NearbyError>(())
/// ```
pub fn init_logging(level: impl Into<LevelFilter>) -> Result<&'static (), error::NearbyError> {
    LOGGER_INIT.get_or_try_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level.into().to_string()))?
            .add_directive("hyper_util=warn".parse()?)
            .add_directive("reqwest=warn".parse()?);

        tracing_subscriber::fmt::fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .init();
        Ok(())
    })
}
