//! Encyclopedia API responses: geosearch, page details, coordinates and
//! opensearch.

use std::collections::BTreeSet;

use itertools::{EitherOrBoth, Itertools};
use serde::Deserialize;
use tracing::debug;

use super::{Result, plain_text};
use crate::{ArticleId, Category, ContentError, Coordinate, Enrichment, GeoHit, Suggestion};

pub(crate) const GEOSEARCH: &str = "geosearch";
pub(crate) const ENRICH: &str = "enrich";
pub(crate) const COORDINATES: &str = "coordinates";
pub(crate) const OPENSEARCH: &str = "opensearch";

const CATEGORY_NAMESPACE: &str = "Category:";

#[derive(Deserialize)]
struct Envelope<Q> {
    query: Option<Q>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct ApiError {
    code: String,
    info: String,
}

impl<Q> Envelope<Q> {
    fn into_query(self, endpoint: &'static str) -> Result<Q> {
        if let Some(err) = self.error {
            return Err(ContentError::parse(
                endpoint,
                format!("{}: {}", err.code, err.info),
            ));
        }
        self.query
            .ok_or_else(|| ContentError::parse(endpoint, "missing `query` object"))
    }
}

fn decode<T: for<'de> Deserialize<'de>>(endpoint: &'static str, body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| ContentError::parse(endpoint, e))
}

// Geosearch

#[derive(Deserialize)]
struct GeosearchQuery {
    geosearch: Vec<RawHit>,
}

#[derive(Deserialize)]
struct RawHit {
    pageid: ArticleId,
    title: String,
    lat: f64,
    lon: f64,
    dist: Option<f64>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

pub(crate) fn parse_geosearch(body: &[u8], category: Category) -> Result<Vec<GeoHit>> {
    let query = decode::<Envelope<GeosearchQuery>>(GEOSEARCH, body)?.into_query(GEOSEARCH)?;
    let total = query.geosearch.len();

    let hits = query
        .geosearch
        .into_iter()
        .filter(|hit| category.admits(hit.kind.as_deref()))
        .map(|hit| {
            let coordinate = Coordinate::new(hit.lat, hit.lon)
                .map_err(|e| ContentError::parse(GEOSEARCH, e))?;
            Ok(GeoHit {
                id: hit.pageid,
                title: hit.title,
                coordinate,
                reported_distance: hit.dist,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(total, kept = hits.len(), %category, "Parsed geosearch response");
    Ok(hits)
}

// Page details

#[derive(Deserialize)]
struct PagesQuery<P> {
    #[serde(default = "Vec::new")]
    pages: Vec<P>,
}

#[derive(Deserialize)]
struct RawPage {
    pageid: Option<ArticleId>,
    title: Option<String>,
    #[serde(default)]
    missing: bool,
    extract: Option<String>,
    #[serde(default)]
    categories: Vec<RawCategory>,
    thumbnail: Option<RawThumbnail>,
}

#[derive(Deserialize)]
struct RawCategory {
    title: String,
}

#[derive(Deserialize)]
struct RawThumbnail {
    source: String,
}

pub(crate) fn parse_enrichment(body: &[u8], id: ArticleId) -> Result<Enrichment> {
    let query = decode::<Envelope<PagesQuery<RawPage>>>(ENRICH, body)?.into_query(ENRICH)?;
    let page = query
        .pages
        .into_iter()
        .find(|p| p.pageid == Some(id))
        .ok_or_else(|| ContentError::parse(ENRICH, format!("page {id} not in response")))?;
    if page.missing {
        return Err(ContentError::parse(ENRICH, format!("page {id} is missing")));
    }

    let categories: BTreeSet<String> = page
        .categories
        .into_iter()
        .map(|c| {
            c.title
                .strip_prefix(CATEGORY_NAMESPACE)
                .map_or_else(|| c.title.clone(), str::to_owned)
        })
        .collect();

    Ok(Enrichment {
        title: page.title,
        extract: page.extract.as_deref().and_then(plain_text),
        categories,
        thumbnail_url: page.thumbnail.map(|t| t.source),
    })
}

// Coordinates of a titled article

#[derive(Deserialize)]
struct CoordinatePage {
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    coordinates: Vec<RawCoordinate>,
}

#[derive(Deserialize)]
struct RawCoordinate {
    lat: f64,
    lon: f64,
    #[serde(default)]
    primary: bool,
}

pub(crate) fn parse_article_coordinate(body: &[u8]) -> Result<Option<Coordinate>> {
    let query = decode::<Envelope<PagesQuery<CoordinatePage>>>(COORDINATES, body)?
        .into_query(COORDINATES)?;

    let Some(page) = query.pages.into_iter().find(|p| !p.missing) else {
        return Ok(None);
    };
    let chosen = page
        .coordinates
        .iter()
        .find(|c| c.primary)
        .or_else(|| page.coordinates.first());

    chosen
        .map(|c| Coordinate::new(c.lat, c.lon).map_err(|e| ContentError::parse(COORDINATES, e)))
        .transpose()
}

// Opensearch

/// `[term, titles, descriptions, urls]`
#[derive(Deserialize)]
struct OpenSearchResponse(String, Vec<String>, Vec<String>, Vec<String>);

pub(crate) fn parse_text_search(body: &[u8]) -> Result<Vec<Suggestion>> {
    let OpenSearchResponse(_term, titles, descriptions, _urls) =
        decode::<OpenSearchResponse>(OPENSEARCH, body)?;

    let suggestions = titles
        .into_iter()
        .zip_longest(descriptions)
        .filter_map(|pair| match pair {
            EitherOrBoth::Both(title, description) => Some(Suggestion {
                title,
                description: Some(description).filter(|d| !d.trim().is_empty()),
            }),
            EitherOrBoth::Left(title) => Some(Suggestion {
                title,
                description: None,
            }),
            EitherOrBoth::Right(_) => None,
        })
        .collect();
    Ok(suggestions)
}
