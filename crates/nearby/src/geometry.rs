//! Great-circle distance and compass direction between two coordinates.

use std::fmt;

use nearby_content::Coordinate;

/// Mean Earth radius used by the haversine formula, in metres.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// One of the eight compass directions.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Octant {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl Octant {
    /// Clockwise from North; index `i` covers the sector centred on `i * 45°`.
    pub const CLOCKWISE: [Self; 8] = [
        Self::N,
        Self::NE,
        Self::E,
        Self::SE,
        Self::S,
        Self::SW,
        Self::W,
        Self::NW,
    ];

    /// Octant for a bearing in degrees (any range; normalised first).
    pub fn from_bearing(degrees: f64) -> Self {
        let normalised = degrees.rem_euclid(360.0);
        // `round` goes half away from zero, so a boundary bearing lands in the
        // upper sector. 337.5..360 rounds to 8 and wraps back to N.
        let index = (normalised / 45.0).round() as usize % 8;
        Self::CLOCKWISE[index]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::N => "N",
            Self::NE => "NE",
            Self::E => "E",
            Self::SE => "SE",
            Self::S => "S",
            Self::SW => "SW",
            Self::W => "W",
            Self::NW => "NW",
        }
    }
}

impl fmt::Display for Octant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Haversine distance between `a` and `b`, in metres.
pub fn distance(a: Coordinate, b: Coordinate) -> f64 {
    let (lat1, lat2) = (a.latitude().to_radians(), b.latitude().to_radians());
    let d_lat = lat2 - lat1;
    let d_lon = (b.longitude() - a.longitude()).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push `h` a hair past 1 for antipodal points.
    2.0 * EARTH_RADIUS_METERS * h.sqrt().min(1.0).asin()
}

/// Compass octant of `to` as seen from `from`.
///
/// Uses the planar angle `atan2(Δlon, Δlat)`; identical points give `N`.
pub fn direction(from: Coordinate, to: Coordinate) -> Octant {
    let d_lat = to.latitude() - from.latitude();
    let d_lon = to.longitude() - from.longitude();
    Octant::from_bearing(d_lon.atan2(d_lat).to_degrees())
}
