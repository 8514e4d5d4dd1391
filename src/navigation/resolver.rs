//! Path Resolver
//!
//! Matches an origin/destination pair to an authored direction sequence.
//! Only direct edges are considered: a record authored `from -> to`, or
//! failing that one authored `to -> from`. There is no multi-hop search.
//!
//! What happens to a reverse edge's directions is decided once, by
//! [`ReversePolicy`]:
//!
//! | Policy              | Step order | Left/right tokens |
//! |---------------------|------------|-------------------|
//! | `ReuseAsIs`         | unchanged  | unchanged         |
//! | `ReverseAndMirror`  | reversed   | swapped per locale|

use std::collections::HashMap;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::NavError;
use crate::locale::{DirectionStep, LocaleDataset, PathRecord};

/// How directions of a reverse-only edge are presented
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReversePolicy {
    /// Pass the stored directions through untouched
    #[default]
    ReuseAsIs,
    /// Reverse step order and swap each locale's mirror token pairs
    ReverseAndMirror,
}

/// A reverse policy name that matches no variant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown reverse policy '{0}' (expected reuse-as-is or reverse-and-mirror)")]
pub struct ParsePolicyError(pub String);

impl std::str::FromStr for ReversePolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "reuse_as_is" | "reuse" => Ok(ReversePolicy::ReuseAsIs),
            "reverse_and_mirror" | "mirror" => Ok(ReversePolicy::ReverseAndMirror),
            _ => Err(ParsePolicyError(s.trim().to_string())),
        }
    }
}

/// Which stored edge satisfied the query
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EdgeOrientation {
    Direct,
    Reversed,
}

/// A resolved path plus how it was found
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedRoute {
    pub record: PathRecord,
    pub orientation: EdgeOrientation,
}

/// Stateless path lookup configured with a reverse-edge policy
#[derive(Debug, Clone, Copy, Default)]
pub struct PathResolver {
    policy: ReversePolicy,
}

impl PathResolver {
    pub fn new(policy: ReversePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ReversePolicy {
        self.policy
    }

    /// Resolve against a locale dataset (uses its mirror pairs)
    pub fn resolve_in(
        &self,
        dataset: &LocaleDataset,
        from: &str,
        to: &str,
    ) -> Result<ResolvedRoute, NavError> {
        self.resolve(&dataset.paths, &dataset.mirror_pairs, from, to)
    }

    /// Resolve `(from, to)` against a path list.
    ///
    /// The first record in exact orientation wins and is returned unmodified.
    /// Otherwise the first reverse record is re-labelled `from -> to` with its
    /// directions treated per the policy.
    pub fn resolve(
        &self,
        paths: &[PathRecord],
        mirror_pairs: &[(String, String)],
        from: &str,
        to: &str,
    ) -> Result<ResolvedRoute, NavError> {
        if let Some(record) = paths.iter().find(|p| p.connects(from, to)) {
            debug!(from, to, "Resolved direct path");
            return Ok(ResolvedRoute {
                record: record.clone(),
                orientation: EdgeOrientation::Direct,
            });
        }

        if let Some(record) = paths.iter().find(|p| p.connects(to, from)) {
            debug!(from, to, policy = ?self.policy, "Resolved via reverse edge");
            let directions = match self.policy {
                ReversePolicy::ReuseAsIs => record.directions.clone(),
                ReversePolicy::ReverseAndMirror => {
                    reverse_and_mirror(&record.directions, mirror_pairs)
                }
            };
            return Ok(ResolvedRoute {
                record: PathRecord::new(from, to, directions),
                orientation: EdgeOrientation::Reversed,
            });
        }

        Err(NavError::NoPathFound {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

/// Reverse step order and swap mirror tokens in every step
pub fn reverse_and_mirror(
    directions: &[DirectionStep],
    mirror_pairs: &[(String, String)],
) -> Vec<DirectionStep> {
    let mirror = MirrorTable::new(mirror_pairs);
    directions
        .iter()
        .rev()
        .map(|step| mirror.apply(step))
        .collect()
}

/// Single-pass token swapper built from a locale's mirror pairs
struct MirrorTable {
    pattern: Option<Regex>,
    partners: HashMap<String, String>,
}

impl MirrorTable {
    fn new(pairs: &[(String, String)]) -> Self {
        let mut partners = HashMap::new();
        for (a, b) in pairs {
            if a.is_empty() || b.is_empty() {
                continue;
            }
            partners.insert(a.clone(), b.clone());
            partners.insert(b.clone(), a.clone());
        }

        if partners.is_empty() {
            return Self {
                pattern: None,
                partners,
            };
        }

        // Longest first so multi-word tokens win over their prefixes
        let mut tokens: Vec<&String> = partners.keys().collect();
        tokens.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        let alternation = tokens
            .iter()
            .map(|token| {
                let escaped = regex::escape(token);
                if token.is_ascii() {
                    format!(r"\b{}\b", escaped)
                } else {
                    escaped
                }
            })
            .collect::<Vec<_>>()
            .join("|");

        let pattern = match Regex::new(&alternation) {
            Ok(re) => Some(re),
            Err(e) => {
                warn!("Invalid mirror token pattern, directions left unmirrored: {}", e);
                None
            }
        };

        Self { pattern, partners }
    }

    fn apply(&self, step: &str) -> String {
        match &self.pattern {
            Some(re) => re
                .replace_all(step, |caps: &Captures| {
                    let token = &caps[0];
                    self.partners
                        .get(token)
                        .cloned()
                        .unwrap_or_else(|| token.to_string())
                })
                .into_owned(),
            None => step.to_string(),
        }
    }
}
