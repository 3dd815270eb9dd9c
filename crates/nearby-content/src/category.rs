use std::{convert::Infallible, fmt, str::FromStr};

use serde::Serialize;

/// Category filter applied to a geosearch.
///
/// Parsing never fails: any string that is not one of the known names maps to
/// [`Category::All`], so an unrecognised category behaves exactly like no
/// filter at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    All,
    Landmarks,
    Culture,
    History,
    Nature,
}

impl Category {
    pub const ALL: [Self; 5] = [
        Self::All,
        Self::Landmarks,
        Self::Culture,
        Self::History,
        Self::Nature,
    ];

    /// Coordinate type tags (the `type:` parameter of article coordinates)
    /// admitted by this category. `None` means unfiltered.
    pub fn coordinate_types(self) -> Option<&'static [&'static str]> {
        match self {
            Self::All => None,
            Self::Landmarks => Some(&["landmark", "railwaystation", "airport", "pass"]),
            Self::Culture => Some(&["edu", "event"]),
            Self::History => Some(&["event", "landmark"]),
            Self::Nature => Some(&[
                "mountain",
                "isle",
                "waterbody",
                "forest",
                "river",
                "glacier",
            ]),
        }
    }

    /// Whether a hit carrying `coordinate_type` passes this filter.
    ///
    /// Hits without a type tag only pass the unfiltered category.
    pub fn admits(self, coordinate_type: Option<&str>) -> bool {
        match self.coordinate_types() {
            None => true,
            Some(allowed) => coordinate_type.is_some_and(|t| {
                let t = t.to_ascii_lowercase();
                allowed.iter().any(|a| t.starts_with(a))
            }),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Landmarks => "landmarks",
            Self::Culture => "culture",
            Self::History => "history",
            Self::Nature => "nature",
        }
    }
}

impl FromStr for Category {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl From<&str> for Category {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "landmarks" => Self::Landmarks,
            "culture" => Self::Culture,
            "history" => Self::History,
            "nature" => Self::Nature,
            _ => Self::All,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse grouping of an article by the names of its categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryGroup {
    Landmarks,
    Culture,
    History,
    Nature,
    Other,
}

impl CategoryGroup {
    const KEYWORDS: [(Self, &'static [&'static str]); 4] = [
        (
            Self::Landmarks,
            &[
                "Buildings",
                "Architecture",
                "Monuments",
                "Streets",
                "Infrastructure",
            ],
        ),
        (
            Self::Culture,
            &["Museums", "Arts", "Culture", "Entertainment", "Education"],
        ),
        (
            Self::History,
            &["History", "Heritage", "Historical", "Archaeological"],
        ),
        (
            Self::Nature,
            &["Parks", "Gardens", "Nature", "Geography", "Landscape"],
        ),
    ];

    /// First group (in landmarks, culture, history, nature order) with a
    /// keyword contained in any of the category names.
    pub fn classify<'a, I>(categories: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
        I::IntoIter: Clone,
    {
        let categories = categories.into_iter();
        Self::KEYWORDS
            .iter()
            .find(|(_, keywords)| {
                categories
                    .clone()
                    .any(|c| keywords.iter().any(|k| c.contains(k)))
            })
            .map_or(Self::Other, |(group, _)| *group)
    }
}
