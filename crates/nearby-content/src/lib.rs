//! Content client for the nearby discovery engine.
//!
//! Wraps the external endpoints the engine depends on: the encyclopedia
//! geosearch index, per-article detail enrichment, free-text article search,
//! article coordinate lookup and place-name geocoding. Nothing in here knows
//! about maps or lists; every call is an idempotent read that either yields a
//! parsed value or a [`ContentError`].
//!
//! ```rust,no_run
//! use nearby_content::{Category, ContentEndpoints, ContentSource, Coordinate, HttpContentClient};
//!
//! # async fn demo() -> nearby_content::Result<()> {
//! let client = HttpContentClient::new(ContentEndpoints::default())?;
//! let center = Coordinate::new(51.5007, -0.1246).expect("valid coordinate");
//! let hits = client.geosearch(center, 1_000, Category::All, 50).await?;
//! for hit in &hits {
//!     let details = client.enrich(hit.id).await?;
//!     println!("{} - {:?}", hit.title, details.extract);
//! }
//! # Ok(())
//! # }
//! ```
use async_trait::async_trait;

mod category;
mod coordinate;
pub mod raw;
mod types;

pub use category::{Category, CategoryGroup};
pub use coordinate::{Coordinate, CoordinateError};
pub use raw::fetch::{ContentEndpoints, HttpContentClient};
pub use types::{ArticleId, Enrichment, GeoHit, Suggestion};

/// Number of suggestions requested from the free-text search when the caller
/// has no preference.
pub const DEFAULT_TEXT_SEARCH_LIMIT: usize = 10;

/// Hard cap the geosearch endpoint accepts for a single request.
pub const MAX_GEOSEARCH_LIMIT: usize = 500;

mod error {
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum ContentError {
        #[error("HTTP error: {0}")]
        Http(#[from] reqwest::Error),
        #[error("{endpoint} request failed with status {status}")]
        Status { endpoint: &'static str, status: u16 },
        #[error("Unexpected {endpoint} response: {message}")]
        Parse {
            endpoint: &'static str,
            message: String,
        },
        #[error("Query is empty")]
        EmptyQuery,
    }

    impl ContentError {
        pub(crate) fn parse(endpoint: &'static str, message: impl ToString) -> Self {
            Self::Parse {
                endpoint,
                message: message.to_string(),
            }
        }

        /// Network, timeout or HTTP status failure.
        pub fn is_fetch(&self) -> bool {
            matches!(self, Self::Http(_) | Self::Status { .. })
        }

        pub fn is_timeout(&self) -> bool {
            matches!(self, Self::Http(e) if e.is_timeout())
        }

        pub fn is_parse(&self) -> bool {
            matches!(self, Self::Parse { .. })
        }
    }

    pub type Result<T> = std::result::Result<T, ContentError>;
}

pub use error::{ContentError, Result};

/// The external content index, seen from the engine.
///
/// [`HttpContentClient`] talks to the real endpoints; tests substitute their
/// own implementation.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Articles with a coordinate inside `radius_meters` of `center`.
    ///
    /// `Category::All` applies no filter. Other categories keep only hits
    /// whose coordinate type tag is on the category's allow-list.
    async fn geosearch(
        &self,
        center: Coordinate,
        radius_meters: u32,
        category: Category,
        limit: usize,
    ) -> Result<Vec<GeoHit>>;

    /// Summary text, categories and thumbnail for a single article.
    async fn enrich(&self, id: ArticleId) -> Result<Enrichment>;

    /// Title suggestions for a free-text query. A blank query yields an empty
    /// list without touching the network.
    async fn text_search(&self, query: &str, limit: usize) -> Result<Vec<Suggestion>>;

    /// Best matching coordinate for a place name, `None` when nothing matches.
    async fn geocode(&self, query: &str) -> Result<Option<Coordinate>>;

    /// Primary coordinate of an article, `None` when the article is missing or
    /// has no coordinates.
    async fn locate_article(&self, title: &str) -> Result<Option<Coordinate>>;

    /// Canonical link to an article.
    fn article_url(&self, id: ArticleId) -> String;
}
