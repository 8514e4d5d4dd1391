//! Message catalog
//!
//! Keyed bot-message templates for one locale. Templates carry `{name}`
//! placeholders which are substituted at render time.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Message keys used by the conversation state machine
pub mod keys {
    pub const WELCOME: &str = "welcomeMessage";
    pub const SELECT_LOCATION: &str = "selectLocation";
    pub const GREAT_LOCATION: &str = "greatLocation";
    pub const ALREADY_THERE: &str = "alreadyThere";
    pub const SELECT_DESTINATION: &str = "selectDestination";
    pub const NO_PATH_FOUND: &str = "noPathFound";
    pub const HELP_GET_FROM: &str = "helpGetFrom";
    pub const REACHED_LANDMARK: &str = "reachedLandmark";
    pub const COMPLETED_STEP: &str = "completedStep";
    pub const CONTINUE_DIRECTION: &str = "continueDirection";
    pub const REACHED_DESTINATION: &str = "reachedDestination";
    pub const THANK_YOU: &str = "thankYou";
    pub const REACHED_LANDMARK_BTN: &str = "reachedLandmarkBtn";
    pub const END_NAVIGATION: &str = "endNavigation";
    pub const LOCATION_NOT_FOUND: &str = "locationNotFound";
    pub const DESTINATION_NOT_FOUND: &str = "destinationNotFound";
    pub const DID_YOU_MEAN: &str = "didYouMean";
    pub const USE_NAVIGATION_CONTROLS: &str = "useNavigationControls";
    pub const POST_ARRIVAL_CHOICE: &str = "postArrivalChoice";
    pub const PROGRESS: &str = "progress";
    pub const OF_STEPS: &str = "ofSteps";
}

/// Keyed message templates for a single locale
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct MessageCatalog {
    templates: HashMap<String, String>,
}

impl MessageCatalog {
    pub fn new(templates: HashMap<String, String>) -> Self {
        Self { templates }
    }

    /// Raw template for a key
    pub fn template(&self, key: &str) -> Option<&str> {
        self.templates.get(key).map(|s| s.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.templates.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Render a template, substituting `{name}` placeholders.
    ///
    /// Returns `None` when the key is missing so callers can fall back to
    /// another catalog.
    pub fn render(&self, key: &str, replacements: &[(&str, &str)]) -> Option<String> {
        self.template(key)
            .map(|template| substitute(template, replacements))
    }
}

/// Replace every `{name}` in `template` with its value
pub fn substitute(template: &str, replacements: &[(&str, &str)]) -> String {
    let mut text = template.to_string();
    for (name, value) in replacements {
        text = text.replace(&format!("{{{}}}", name), value);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> MessageCatalog {
        let mut templates = HashMap::new();
        templates.insert(
            keys::GREAT_LOCATION.to_string(),
            "Great! You're at {location}. Where would you like to go?".to_string(),
        );
        templates.insert(
            keys::NO_PATH_FOUND.to_string(),
            "No way from {from} to {to}".to_string(),
        );
        MessageCatalog::new(templates)
    }

    #[test]
    fn test_render_substitutes_placeholders() {
        let text = catalog()
            .render(keys::GREAT_LOCATION, &[("location", "Library")])
            .unwrap();
        assert_eq!(text, "Great! You're at Library. Where would you like to go?");
    }

    #[test]
    fn test_render_multiple_placeholders() {
        let text = catalog()
            .render(keys::NO_PATH_FOUND, &[("from", "A"), ("to", "B")])
            .unwrap();
        assert_eq!(text, "No way from A to B");
    }

    #[test]
    fn test_missing_key() {
        assert!(catalog().render(keys::THANK_YOU, &[]).is_none());
    }

    #[test]
    fn test_unused_placeholder_left_intact() {
        assert_eq!(substitute("of {total} steps", &[]), "of {total} steps");
    }
}
