use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, instrument};

use super::{
    Result,
    nominatim::{GEOCODE, parse_geocode},
    wiki::{
        COORDINATES, ENRICH, GEOSEARCH, OPENSEARCH, parse_article_coordinate, parse_enrichment,
        parse_geosearch, parse_text_search,
    },
};
use crate::{
    ArticleId, Category, ContentError, ContentSource, Coordinate, Enrichment, GeoHit,
    MAX_GEOSEARCH_LIMIT, Suggestion,
};

const WIKI_API_URL: &str = "https://en.wikipedia.org/w/api.php";
const GEOCODER_URL: &str = "https://nominatim.openstreetmap.org/search";
const ARTICLE_URL_BASE: &str = "https://en.wikipedia.org/?curid=";
const USER_AGENT: &str = concat!("nearby/", env!("CARGO_PKG_VERSION"));
/// The geosearch endpoint rejects radii above this.
const MAX_RADIUS_METERS: u32 = 10_000;

/// Where the external endpoints live and how to talk to them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentEndpoints {
    /// Encyclopedia action API (geosearch, details, coordinates, opensearch).
    pub wiki_api_url: String,
    /// Place-name geocoder search endpoint.
    pub geocoder_url: String,
    /// Prefix an article id is appended to for a canonical link.
    pub article_url_base: String,
    /// Sent with every request; the geocoder refuses anonymous clients.
    pub user_agent: String,
    pub timeout: Duration,
    /// Thumbnail width requested during enrichment, in pixels.
    pub thumbnail_size: u32,
}

impl Default for ContentEndpoints {
    fn default() -> Self {
        Self {
            wiki_api_url: WIKI_API_URL.to_string(),
            geocoder_url: GEOCODER_URL.to_string(),
            article_url_base: ARTICLE_URL_BASE.to_string(),
            user_agent: USER_AGENT.to_string(),
            timeout: Duration::from_secs(10),
            thumbnail_size: 200,
        }
    }
}

/// [`ContentSource`] backed by the public encyclopedia API and geocoder.
#[derive(Debug, Clone)]
pub struct HttpContentClient {
    http: Client,
    endpoints: ContentEndpoints,
}

impl HttpContentClient {
    pub fn new(endpoints: ContentEndpoints) -> Result<Self> {
        let http = Client::builder()
            .user_agent(endpoints.user_agent.clone())
            .timeout(endpoints.timeout)
            .build()?;
        info!(wiki = %endpoints.wiki_api_url, geocoder = %endpoints.geocoder_url, "Content client ready");
        Ok(Self { http, endpoints })
    }

    pub fn endpoints(&self) -> &ContentEndpoints {
        &self.endpoints
    }

    async fn get(
        &self,
        endpoint: &'static str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<u8>> {
        let response = self.http.get(url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ContentError::Status {
                endpoint,
                status: status.as_u16(),
            });
        }
        let body = response.bytes().await?;
        debug!(endpoint, bytes = body.len(), "Response received");
        Ok(body.to_vec())
    }

    async fn wiki(&self, endpoint: &'static str, params: Query) -> Result<Vec<u8>> {
        let mut query = vec![("format", "json".to_string())];
        query.extend(params);
        self.get(endpoint, &self.endpoints.wiki_api_url, &query)
            .await
    }
}

type Query = Vec<(&'static str, String)>;

pub(crate) fn geosearch_query(center: Coordinate, radius_meters: u32, limit: usize) -> Query {
    vec![
        ("action", "query".to_string()),
        ("list", "geosearch".to_string()),
        ("gscoord", center.pipe_pair()),
        (
            "gsradius",
            radius_meters.clamp(10, MAX_RADIUS_METERS).to_string(),
        ),
        ("gslimit", limit.clamp(1, MAX_GEOSEARCH_LIMIT).to_string()),
        ("gsprop", "type".to_string()),
    ]
}

pub(crate) fn enrich_query(id: ArticleId, thumbnail_size: u32) -> Query {
    vec![
        ("action", "query".to_string()),
        ("formatversion", "2".to_string()),
        ("pageids", id.to_string()),
        ("prop", "extracts|categories|pageimages".to_string()),
        ("exintro", "1".to_string()),
        ("explaintext", "1".to_string()),
        ("cllimit", "max".to_string()),
        ("clshow", "!hidden".to_string()),
        ("piprop", "thumbnail".to_string()),
        ("pithumbsize", thumbnail_size.to_string()),
    ]
}

pub(crate) fn text_search_query(query: &str, limit: usize) -> Query {
    vec![
        ("action", "opensearch".to_string()),
        ("search", query.to_string()),
        ("limit", limit.max(1).to_string()),
        ("namespace", "0".to_string()),
    ]
}

/// Geocoder parameters; unlike the wiki calls this carries its own `format`.
pub(crate) fn geocode_query(query: &str) -> Query {
    vec![
        ("q", query.to_string()),
        ("format", "json".to_string()),
        ("limit", "1".to_string()),
    ]
}

pub(crate) fn coordinates_query(title: &str) -> Query {
    vec![
        ("action", "query".to_string()),
        ("formatversion", "2".to_string()),
        ("prop", "coordinates".to_string()),
        ("titles", title.to_string()),
        ("redirects", "1".to_string()),
    ]
}

#[async_trait]
impl ContentSource for HttpContentClient {
    #[instrument(name = "Geosearch", skip(self), level = "debug")]
    async fn geosearch(
        &self,
        center: Coordinate,
        radius_meters: u32,
        category: Category,
        limit: usize,
    ) -> Result<Vec<GeoHit>> {
        let body = self
            .wiki(GEOSEARCH, geosearch_query(center, radius_meters, limit))
            .await?;
        parse_geosearch(&body, category)
    }

    #[instrument(name = "Enrich article", skip(self), level = "debug")]
    async fn enrich(&self, id: ArticleId) -> Result<Enrichment> {
        let body = self
            .wiki(ENRICH, enrich_query(id, self.endpoints.thumbnail_size))
            .await?;
        parse_enrichment(&body, id)
    }

    #[instrument(name = "Text search", skip(self), level = "debug")]
    async fn text_search(&self, query: &str, limit: usize) -> Result<Vec<Suggestion>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let body = self
            .wiki(OPENSEARCH, text_search_query(query, limit))
            .await?;
        parse_text_search(&body)
    }

    #[instrument(name = "Geocode", skip(self), level = "debug")]
    async fn geocode(&self, query: &str) -> Result<Option<Coordinate>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ContentError::EmptyQuery);
        }
        let body = self
            .get(GEOCODE, &self.endpoints.geocoder_url, &geocode_query(query))
            .await?;
        parse_geocode(&body)
    }

    #[instrument(name = "Locate article", skip(self), level = "debug")]
    async fn locate_article(&self, title: &str) -> Result<Option<Coordinate>> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ContentError::EmptyQuery);
        }
        let body = self.wiki(COORDINATES, coordinates_query(title)).await?;
        parse_article_coordinate(&body)
    }

    fn article_url(&self, id: ArticleId) -> String {
        format!("{}{id}", self.endpoints.article_url_base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> HttpContentClient {
        // Nothing listens here; the tests below must never reach the network.
        HttpContentClient::new(ContentEndpoints {
            wiki_api_url: "http://127.0.0.1:9/w/api.php".into(),
            geocoder_url: "http://127.0.0.1:9/search".into(),
            ..ContentEndpoints::default()
        })
        .unwrap()
    }

    fn value<'a>(query: &'a [(&'static str, String)], key: &str) -> Option<&'a str> {
        query
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_geosearch_query() {
        let center = Coordinate::new(1.0, 2.0).unwrap();
        let query = geosearch_query(center, 1_500, 20);
        assert_eq!(
            query,
            vec![
                ("action", "query".to_string()),
                ("list", "geosearch".to_string()),
                ("gscoord", "1|2".to_string()),
                ("gsradius", "1500".to_string()),
                ("gslimit", "20".to_string()),
                ("gsprop", "type".to_string()),
            ]
        );
    }

    #[test]
    fn test_geosearch_query_clamps() {
        let center = Coordinate::new(1.0, 2.0).unwrap();
        let query = geosearch_query(center, 50_000, 10_000);
        assert_eq!(value(&query, "gsradius"), Some("10000"));
        assert_eq!(value(&query, "gslimit"), Some("500"));

        let query = geosearch_query(center, 0, 0);
        assert_eq!(value(&query, "gsradius"), Some("10"));
        assert_eq!(value(&query, "gslimit"), Some("1"));
    }

    #[test]
    fn test_enrich_query() {
        let query = enrich_query(5, ContentEndpoints::default().thumbnail_size);
        assert_eq!(value(&query, "action"), Some("query"));
        assert_eq!(value(&query, "formatversion"), Some("2"));
        assert_eq!(value(&query, "pageids"), Some("5"));
        assert_eq!(
            value(&query, "prop"),
            Some("extracts|categories|pageimages")
        );
        assert_eq!(value(&query, "exintro"), Some("1"));
        assert_eq!(value(&query, "explaintext"), Some("1"));
        assert_eq!(value(&query, "cllimit"), Some("max"));
        assert_eq!(value(&query, "piprop"), Some("thumbnail"));
        assert_eq!(value(&query, "pithumbsize"), Some("200"));
    }

    #[test]
    fn test_text_search_query() {
        let query = text_search_query("coit tower", crate::DEFAULT_TEXT_SEARCH_LIMIT);
        assert_eq!(
            query,
            vec![
                ("action", "opensearch".to_string()),
                ("search", "coit tower".to_string()),
                ("limit", "10".to_string()),
                ("namespace", "0".to_string()),
            ]
        );
        assert_eq!(value(&text_search_query("x", 0), "limit"), Some("1"));
    }

    #[test]
    fn test_geocode_query() {
        assert_eq!(
            geocode_query("Trafalgar Square"),
            vec![
                ("q", "Trafalgar Square".to_string()),
                ("format", "json".to_string()),
                ("limit", "1".to_string()),
            ]
        );
    }

    #[test]
    fn test_coordinates_query() {
        let query = coordinates_query("Coit Tower");
        assert_eq!(value(&query, "prop"), Some("coordinates"));
        assert_eq!(value(&query, "titles"), Some("Coit Tower"));
        assert_eq!(value(&query, "redirects"), Some("1"));
        assert_eq!(value(&query, "formatversion"), Some("2"));
    }

    #[tokio::test]
    async fn test_blank_text_search_skips_network() {
        let results = client().text_search("   ", 10).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_blank_geocode_is_empty_query() {
        let err = client().geocode("\t").await.unwrap_err();
        assert!(matches!(err, ContentError::EmptyQuery));
    }

    #[tokio::test]
    async fn test_blank_article_title_is_empty_query() {
        let err = client().locate_article("").await.unwrap_err();
        assert!(matches!(err, ContentError::EmptyQuery));
    }

    #[test]
    fn test_article_url() {
        assert_eq!(
            client().article_url(18618509),
            "https://en.wikipedia.org/?curid=18618509"
        );
    }

    #[test]
    fn test_default_endpoints() {
        let endpoints = ContentEndpoints::default();
        assert_eq!(endpoints.thumbnail_size, 200);
        assert!(endpoints.user_agent.starts_with("nearby/"));
    }
}
