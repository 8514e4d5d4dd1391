//! Locale Dataset
//!
//! One display language's campus: its named locations, the directed paths
//! between them, the milestone marker its directions use, and its message
//! catalog. Datasets are authored as YAML and are independent of each other;
//! nothing requires two locales to list corresponding locations.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::catalog::MessageCatalog;

/// A location is identified by its display name
pub type Location = String;

/// A single textual instruction, possibly carrying the milestone marker
pub type DirectionStep = String;

/// Normalized identity of a location name (trimmed, case-folded)
pub fn normalize_location(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Case-insensitive location identity
pub fn same_location(a: &str, b: &str) -> bool {
    normalize_location(a) == normalize_location(b)
}

/// A directed, authored route between two locations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PathRecord {
    pub from: Location,
    pub to: Location,
    pub directions: Vec<DirectionStep>,
}

impl PathRecord {
    pub fn new(
        from: impl Into<Location>,
        to: impl Into<Location>,
        directions: Vec<DirectionStep>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            directions,
        }
    }

    /// Exact orientation match (case-insensitive)
    pub fn connects(&self, from: &str, to: &str) -> bool {
        same_location(&self.from, from) && same_location(&self.to, to)
    }

    pub fn step_count(&self) -> usize {
        self.directions.len()
    }
}

/// The locale-specific annotation flagging a step for confirmation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct MilestoneMarker(String);

impl MilestoneMarker {
    pub fn new(marker: impl Into<String>) -> Self {
        Self(marker.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Presence of the marker controls the pause, not its removal.
    pub fn is_milestone(&self, step: &str) -> bool {
        !self.0.is_empty() && step.contains(&self.0)
    }

    /// Display variant of a step with the marker text stripped
    pub fn clean(&self, step: &str) -> String {
        if self.0.is_empty() {
            return step.to_string();
        }
        step.replace(&format!(" {}", self.0), "")
            .replace(&self.0, "")
            .trim_end()
            .to_string()
    }

    /// Cleaned text of every milestone step in a route
    pub fn milestones(&self, directions: &[DirectionStep]) -> Vec<String> {
        directions
            .iter()
            .filter(|step| self.is_milestone(step))
            .map(|step| self.clean(step))
            .collect()
    }
}

/// The complete authored data for one display language
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocaleDataset {
    pub code: String,
    #[serde(default)]
    pub name: String,
    pub milestone_marker: MilestoneMarker,
    /// Token pairs swapped when mirroring reversed directions (e.g. left/right)
    #[serde(default)]
    pub mirror_pairs: Vec<(String, String)>,
    pub locations: Vec<Location>,
    #[serde(default)]
    pub paths: Vec<PathRecord>,
    #[serde(default)]
    pub messages: MessageCatalog,
}

impl LocaleDataset {
    /// Load from a YAML file
    pub fn load_from_file(path: &Path) -> Result<Self, LocaleLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| LocaleLoadError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::load_from_str(&content)
    }

    /// Load from a YAML string, rejecting datasets that cannot drive a conversation
    pub fn load_from_str(yaml: &str) -> Result<Self, LocaleLoadError> {
        let dataset: LocaleDataset =
            serde_yaml::from_str(yaml).map_err(|e| LocaleLoadError::ParseError(e.to_string()))?;
        dataset.validate()?;
        Ok(dataset)
    }

    /// Hard validation. Content inconsistencies are reported by `warnings()` instead.
    pub fn validate(&self) -> Result<(), LocaleLoadError> {
        if self.locations.is_empty() {
            return Err(LocaleLoadError::EmptyLocations {
                code: self.code.clone(),
            });
        }
        if let Some(path) = self.paths.iter().find(|p| p.directions.is_empty()) {
            return Err(LocaleLoadError::EmptyDirections {
                code: self.code.clone(),
                from: path.from.clone(),
                to: path.to.clone(),
            });
        }
        Ok(())
    }

    /// Authoring problems that are tolerated but worth logging
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        let mut seen: Vec<String> = Vec::new();
        for location in &self.locations {
            let key = normalize_location(location);
            if seen.contains(&key) {
                warnings.push(format!(
                    "[{}] location '{}' duplicates another entry case-insensitively",
                    self.code, location
                ));
            } else {
                seen.push(key);
            }
        }

        for path in &self.paths {
            for endpoint in [&path.from, &path.to] {
                if self.find_location(endpoint).is_none() {
                    warnings.push(format!(
                        "[{}] path {} -> {} references unknown location '{}'",
                        self.code, path.from, path.to, endpoint
                    ));
                } else if !self.locations.iter().any(|l| l == endpoint) {
                    warnings.push(format!(
                        "[{}] path {} -> {} spells '{}' differently from the location list",
                        self.code, path.from, path.to, endpoint
                    ));
                }
            }
        }

        warnings
    }

    /// Case-insensitive lookup returning the declared spelling
    pub fn find_location(&self, name: &str) -> Option<&Location> {
        self.locations.iter().find(|l| same_location(l, name))
    }

    /// Declaration index of a location (case-insensitive)
    pub fn location_index(&self, name: &str) -> Option<usize> {
        self.locations.iter().position(|l| same_location(l, name))
    }

    /// Cleaned milestone texts of a route in this locale
    pub fn milestones(&self, directions: &[DirectionStep]) -> Vec<String> {
        self.milestone_marker.milestones(directions)
    }
}

/// Errors that can occur when loading locale datasets
#[derive(Debug, thiserror::Error)]
pub enum LocaleLoadError {
    #[error("Failed to read file {path}: {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML: {0}")]
    ParseError(String),

    #[error("Locale '{code}' declares no locations")]
    EmptyLocations { code: String },

    #[error("Locale '{code}' has a path {from} -> {to} without directions")]
    EmptyDirections {
        code: String,
        from: String,
        to: String,
    },

    #[error("No locale datasets found in {0}")]
    NoDatasets(String),

    #[error("Default locale '{code}' has no dataset")]
    MissingDefault { code: String },

    #[error("Locale '{code}' is declared by more than one dataset")]
    DuplicateCode { code: String },

    #[error("{path} declares locale '{code}' but is named '{stem}'")]
    CodeMismatch {
        path: String,
        stem: String,
        code: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
code: en
name: English
milestone_marker: "(milestone)"
mirror_pairs:
  - [left, right]
locations:
  - Main Gate
  - Library
  - Pharmacy Block
  - Pharmacy block
paths:
  - from: Main Gate
    to: Library
    directions:
      - Walk straight 20m
      - you will see a junction in Y shape(milestone)
      - Pass by the fountain (milestone)
  - from: Library
    to: Main gate
    directions:
      - Take the stairs
messages:
  welcomeMessage: Hello
"#;

    #[test]
    fn test_parse_dataset() {
        let dataset = LocaleDataset::load_from_str(SAMPLE).unwrap();
        assert_eq!(dataset.code, "en");
        assert_eq!(dataset.locations.len(), 4);
        assert_eq!(dataset.paths.len(), 2);
        assert_eq!(
            dataset.mirror_pairs,
            vec![("left".to_string(), "right".to_string())]
        );
        assert_eq!(dataset.messages.template("welcomeMessage"), Some("Hello"));
    }

    #[test]
    fn test_milestone_detection_and_cleaning() {
        let marker = MilestoneMarker::new("(milestone)");
        assert!(marker.is_milestone("you will see a junction in Y shape(milestone)"));
        assert!(!marker.is_milestone("Walk straight 20m"));
        assert_eq!(
            marker.clean("you will see a junction in Y shape(milestone)"),
            "you will see a junction in Y shape"
        );
        assert_eq!(
            marker.clean("Pass by the fountain (milestone)"),
            "Pass by the fountain"
        );
    }

    #[test]
    fn test_milestones_lists_cleaned_steps() {
        let dataset = LocaleDataset::load_from_str(SAMPLE).unwrap();
        let milestones = dataset.milestones(&dataset.paths[0].directions);
        assert_eq!(
            milestones,
            vec![
                "you will see a junction in Y shape".to_string(),
                "Pass by the fountain".to_string()
            ]
        );
    }

    #[test]
    fn test_find_location_is_case_insensitive() {
        let dataset = LocaleDataset::load_from_str(SAMPLE).unwrap();
        assert_eq!(
            dataset.find_location("  main GATE "),
            Some(&"Main Gate".to_string())
        );
        assert_eq!(dataset.location_index("library"), Some(1));
        assert!(dataset.find_location("Canteen").is_none());
    }

    #[test]
    fn test_warnings_report_content_bugs() {
        let dataset = LocaleDataset::load_from_str(SAMPLE).unwrap();
        let warnings = dataset.warnings();
        assert!(warnings.iter().any(|w| w.contains("Pharmacy block")));
        assert!(warnings.iter().any(|w| w.contains("'Main gate'")));
    }

    #[test]
    fn test_empty_locations_rejected() {
        let yaml = "code: xx\nmilestone_marker: \"(m)\"\nlocations: []\n";
        let err = LocaleDataset::load_from_str(yaml).unwrap_err();
        assert!(matches!(err, LocaleLoadError::EmptyLocations { .. }));
    }

    #[test]
    fn test_empty_directions_rejected() {
        let yaml = r#"
code: xx
milestone_marker: "(m)"
locations: [A, B]
paths:
  - from: A
    to: B
    directions: []
"#;
        let err = LocaleDataset::load_from_str(yaml).unwrap_err();
        assert!(matches!(err, LocaleLoadError::EmptyDirections { .. }));
    }

    #[test]
    fn test_parse_error() {
        let err = LocaleDataset::load_from_str("code: [").unwrap_err();
        assert!(matches!(err, LocaleLoadError::ParseError(_)));
    }
}
