//! Wire formats of the external endpoints and their parsing.
//!
//! Every parser takes the raw response body and either yields engine types or
//! a [`ContentError::Parse`](crate::ContentError::Parse) naming the endpoint.

use once_cell::sync::Lazy;
use regex::Regex;

pub mod fetch;
pub(super) mod nominatim;
pub(super) mod wiki;

pub use super::error::Result;

static MARKUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("markup pattern"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

/// Strip residual markup and collapse whitespace. Empty text becomes `None`.
pub(crate) fn plain_text(text: &str) -> Option<String> {
    let stripped = MARKUP.replace_all(text, " ");
    let collapsed = WHITESPACE.replace_all(stripped.trim(), " ");
    (!collapsed.is_empty()).then(|| collapsed.into_owned())
}
