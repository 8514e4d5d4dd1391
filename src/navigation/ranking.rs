//! Location matching and ranking
//!
//! Free-text location matching plus the display ordering used for choice
//! lists: names starting with the filter first, then names containing it,
//! then the rest, alphabetical within each band.

use std::cmp::Ordering;

use crate::locale::{same_location, Location};

/// Minimum Jaro-Winkler similarity for a "did you mean" suggestion
pub const SUGGESTION_THRESHOLD: f64 = 0.8;

/// First location in declaration order whose name equals or contains `text`.
///
/// Matching is case-insensitive; `exclude` (the current origin) is skipped.
pub fn find_matching_location<'a>(
    locations: &'a [Location],
    text: &str,
    exclude: Option<&str>,
) -> Option<&'a Location> {
    let needle = text.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    locations
        .iter()
        .filter(|loc| exclude.map(|ex| !same_location(loc, ex)).unwrap_or(true))
        .find(|loc| {
            let name = loc.to_lowercase();
            name == needle || name.contains(&needle)
        })
}

/// Closest location name by Jaro-Winkler similarity, if close enough
pub fn suggest_location<'a>(
    locations: &'a [Location],
    text: &str,
    exclude: Option<&str>,
) -> Option<&'a Location> {
    let needle = text.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    locations
        .iter()
        .filter(|loc| exclude.map(|ex| !same_location(loc, ex)).unwrap_or(true))
        .map(|loc| (loc, strsim::jaro_winkler(&loc.to_lowercase(), &needle)))
        .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
        .map(|(loc, _)| loc)
}

fn band(name: &str, filter: &str) -> u8 {
    if name.starts_with(filter) {
        0
    } else if name.contains(filter) {
        1
    } else {
        2
    }
}

/// Order locations for display against a filter string
pub fn rank_locations(locations: &[Location], filter: &str) -> Vec<Location> {
    let filter = filter.trim().to_lowercase();
    let mut ranked = locations.to_vec();
    ranked.sort_by(|a, b| {
        let (la, lb) = (a.to_lowercase(), b.to_lowercase());
        band(&la, &filter)
            .cmp(&band(&lb, &filter))
            .then_with(|| la.cmp(&lb))
            .then_with(|| a.cmp(b))
    });
    ranked
}

/// Destination choices: every location except the origin, ranked
pub fn destination_choices(
    locations: &[Location],
    origin: Option<&str>,
    filter: &str,
) -> Vec<Location> {
    let available: Vec<Location> = locations
        .iter()
        .filter(|loc| origin.map(|o| !same_location(loc, o)).unwrap_or(true))
        .cloned()
        .collect();
    rank_locations(&available, filter)
}
