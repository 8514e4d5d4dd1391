//! Navigation: path resolution and location matching

pub mod ranking;
pub mod resolver;

pub use ranking::{
    destination_choices, find_matching_location, rank_locations, suggest_location,
    SUGGESTION_THRESHOLD,
};
pub use resolver::{
    reverse_and_mirror, EdgeOrientation, ParsePolicyError, PathResolver, ResolvedRoute,
    ReversePolicy,
};
