//! Street-pair labels parsed from camera image URLs.
//!
//! SDOT camera URLs name the intersection they watch, e.g.
//! `.../images/15th_Market_NS.jpg` for 15th Ave and Market St. The two
//! leading tokens are taken verbatim; the trailing letters (a direction
//! code) are required for a match but otherwise ignored.

use std::sync::LazyLock;

use rain_map_camera_models::StreetLabel;
use regex::Regex;

static STREET_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"images/([^_]+)_([^_]+)_([A-Za-z]+)").unwrap_or_else(|_| unreachable!())
});

/// Bare image ids such as `.../images/ABC123` name no intersection.
static BARE_IMAGE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/images/\w+$").unwrap_or_else(|_| unreachable!()));

/// Extracts the street pair from a camera identifier, or
/// [`StreetLabel::unknown`] when the identifier does not match.
#[must_use]
pub fn extract(identifier: &str) -> StreetLabel {
    STREET_PAIR
        .captures(identifier)
        .map_or_else(StreetLabel::unknown, |caps| {
            StreetLabel::new(&caps[1], &caps[2])
        })
}

/// Whether a camera should be left out of a run entirely.
#[must_use]
pub fn is_excluded(identifier: &str) -> bool {
    BARE_IMAGE_ID.is_match(identifier)
}
