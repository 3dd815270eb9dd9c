//! Place-name geocoder responses.

use serde::Deserialize;

use super::Result;
use crate::{ContentError, Coordinate};

pub(crate) const GEOCODE: &str = "geocode";

#[derive(Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

pub(crate) fn parse_geocode(body: &[u8]) -> Result<Option<Coordinate>> {
    let places: Vec<Place> =
        serde_json::from_slice(body).map_err(|e| ContentError::parse(GEOCODE, e))?;
    let Some(best) = places.into_iter().next() else {
        return Ok(None);
    };

    let lat = best
        .lat
        .parse::<f64>()
        .map_err(|e| ContentError::parse(GEOCODE, format!("latitude {:?}: {e}", best.lat)))?;
    let lon = best
        .lon
        .parse::<f64>()
        .map_err(|e| ContentError::parse(GEOCODE, format!("longitude {:?}: {e}", best.lon)))?;

    Coordinate::new(lat, lon)
        .map(Some)
        .map_err(|e| ContentError::parse(GEOCODE, e))
}
