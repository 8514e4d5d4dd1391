//! Intent Classifier
//!
//! Maps free text to an [`Intent`] using the current phase. Matching is
//! case-insensitive containment against fixed phrase lists and the active
//! locale's location names. Rules are applied in a fixed priority order:
//!
//! 1. Greeting (exact, or the phrase followed by a space)
//! 2. `CollectingOrigin`: any location equal to / containing the text
//! 3. `CollectingDestination`: same, excluding the current origin
//! 4. `Navigating`: advance phrases (only when not waiting on a milestone),
//!    then arrival phrases (only when waiting on a milestone)
//! 5. `AwaitingPostArrivalChoice`: new-route phrases, then end phrases
//!
//! Anything else is `Unrecognized`.

use serde::{Deserialize, Serialize};

use super::types::{ConversationPhase, Intent};
use crate::locale::Location;
use crate::navigation::find_matching_location;

/// Phrase lists driving classification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct IntentPhrases {
    pub greetings: Vec<String>,
    pub advance: Vec<String>,
    pub arrived: Vec<String>,
    pub new_route: Vec<String>,
    pub end: Vec<String>,
}

fn phrases(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for IntentPhrases {
    fn default() -> Self {
        Self {
            greetings: phrases(&["hi", "hello", "hey", "greetings", "howdy"]),
            advance: phrases(&["next", "continue", "next step", "next direction"]),
            arrived: phrases(&[
                "reached",
                "i reached",
                "arrived",
                "i arrived",
                "i am here",
                "i'm here",
            ]),
            new_route: phrases(&["new", "another", "different", "somewhere else"]),
            end: phrases(&["end", "finish", "stop", "quit", "exit", "bye", "goodbye"]),
        }
    }
}

/// What the classifier needs to know about the session
#[derive(Debug, Clone, Copy)]
pub struct ClassifierContext<'a> {
    pub phase: ConversationPhase,
    pub waiting_for_milestone: bool,
    pub origin: Option<&'a str>,
    /// Active locale's locations in declaration order
    pub locations: &'a [Location],
}

/// Rule-based free-text classifier
#[derive(Debug, Clone, Default)]
pub struct IntentClassifier {
    phrases: IntentPhrases,
}

impl IntentClassifier {
    pub fn new(phrases: IntentPhrases) -> Self {
        let lower = |list: Vec<String>| -> Vec<String> {
            list.into_iter()
                .map(|p| p.trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect()
        };
        Self {
            phrases: IntentPhrases {
                greetings: lower(phrases.greetings),
                advance: lower(phrases.advance),
                arrived: lower(phrases.arrived),
                new_route: lower(phrases.new_route),
                end: lower(phrases.end),
            },
        }
    }

    pub fn phrases(&self) -> &IntentPhrases {
        &self.phrases
    }

    /// Classify a user utterance against the session context
    pub fn classify(&self, raw: &str, context: &ClassifierContext<'_>) -> Intent {
        let text = raw.trim().to_lowercase();
        if text.is_empty() {
            return Intent::Unrecognized;
        }

        if self.is_greeting(&text) {
            return Intent::Greeting;
        }

        match context.phase {
            ConversationPhase::CollectingOrigin => {
                match find_matching_location(context.locations, &text, None) {
                    Some(location) => Intent::SelectOrigin(location.clone()),
                    None => Intent::Unrecognized,
                }
            }
            ConversationPhase::CollectingDestination => {
                match find_matching_location(context.locations, &text, context.origin) {
                    Some(location) => Intent::SelectDestination(location.clone()),
                    None => Intent::Unrecognized,
                }
            }
            ConversationPhase::Navigating => {
                if !context.waiting_for_milestone && contains_any(&text, &self.phrases.advance) {
                    Intent::Advance
                } else if context.waiting_for_milestone
                    && contains_any(&text, &self.phrases.arrived)
                {
                    Intent::MilestoneConfirm
                } else {
                    Intent::Unrecognized
                }
            }
            ConversationPhase::AwaitingPostArrivalChoice => {
                if contains_any(&text, &self.phrases.new_route) {
                    Intent::RequestNewRoute
                } else if contains_any(&text, &self.phrases.end) {
                    Intent::EndSession
                } else {
                    Intent::Unrecognized
                }
            }
            ConversationPhase::Arrived => Intent::Unrecognized,
        }
    }

    fn is_greeting(&self, text: &str) -> bool {
        self.phrases
            .greetings
            .iter()
            .any(|g| text == g || text.starts_with(&format!("{} ", g)))
    }
}

fn contains_any(text: &str, phrases: &[String]) -> bool {
    phrases.iter().any(|p| text.contains(p.as_str()))
}
