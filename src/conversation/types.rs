//! Core types for the conversation state machine
//!
//! All types in this module are serializable so the UI layer can exchange
//! them as JSON.

use serde::{Deserialize, Serialize};

use crate::locale::Location;

// ============================================================================
// Conversation Phase
// ============================================================================

/// Conversation phases
///
/// ```text
/// COLLECTING_ORIGIN ── origin ──► COLLECTING_DESTINATION ── path found ──► NAVIGATING
///   ▲                                 ▲      │ no path / same place          │  │
///   │                                 │      └──────────────┘                │  │ next / landmark
///   │                                 │                                      │◄─┘
///   │                                 │ new route                            │ past last step
///   │                                 │                                      ▼
///   └──────── end ─────────── AWAITING_POST_ARRIVAL_CHOICE ◄──────────── ARRIVED
/// ```
///
/// `Arrived` is transient: arrival is processed within a single turn and the
/// session rests in `AwaitingPostArrivalChoice`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ConversationPhase {
    /// Waiting for the user's current location
    #[default]
    CollectingOrigin,

    /// Waiting for a destination different from the origin
    CollectingDestination,

    /// Playing back a resolved path step by step
    Navigating,

    /// Final step passed; arrival being processed
    Arrived,

    /// Waiting for "new route" or "end"
    AwaitingPostArrivalChoice,
}

impl ConversationPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationPhase::CollectingOrigin => "collecting_origin",
            ConversationPhase::CollectingDestination => "collecting_destination",
            ConversationPhase::Navigating => "navigating",
            ConversationPhase::Arrived => "arrived",
            ConversationPhase::AwaitingPostArrivalChoice => "awaiting_post_arrival_choice",
        }
    }

    /// Phases in which a location choice list is shown
    pub fn is_selecting(&self) -> bool {
        matches!(
            self,
            ConversationPhase::CollectingOrigin | ConversationPhase::CollectingDestination
        )
    }
}

impl std::fmt::Display for ConversationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Inbound Events
// ============================================================================

/// Events the UI layer sends into a session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConversationInput {
    /// Origin picked from the choice list
    SelectOrigin { name: String },

    /// Destination picked from the choice list
    SelectDestination { name: String },

    /// Free text typed by the user
    SubmitText { text: String },

    /// "Next direction" control
    RequestAdvance,

    /// "I've reached this landmark" control
    ConfirmMilestone,

    /// "Get new directions" control
    RequestNewRoute,

    /// "End navigation" control
    EndSession,

    /// Language switch
    SetLocale { code: String },
}

impl ConversationInput {
    pub fn name(&self) -> &'static str {
        match self {
            ConversationInput::SelectOrigin { .. } => "select_origin",
            ConversationInput::SelectDestination { .. } => "select_destination",
            ConversationInput::SubmitText { .. } => "submit_text",
            ConversationInput::RequestAdvance => "request_advance",
            ConversationInput::ConfirmMilestone => "confirm_milestone",
            ConversationInput::RequestNewRoute => "request_new_route",
            ConversationInput::EndSession => "end_session",
            ConversationInput::SetLocale { .. } => "set_locale",
        }
    }
}

// ============================================================================
// Intents
// ============================================================================

/// What a piece of free text was understood to mean
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "intent", content = "location", rename_all = "snake_case")]
pub enum Intent {
    Greeting,
    SelectOrigin(Location),
    SelectDestination(Location),
    Advance,
    MilestoneConfirm,
    RequestNewRoute,
    EndSession,
    Unrecognized,
}

// ============================================================================
// Progress
// ============================================================================

/// Progress through the active route
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RouteProgress {
    /// 1-based number of the step currently shown
    pub current_step: usize,
    pub total_steps: usize,
    /// Rounded to the nearest whole percent
    pub percent: u8,
}

impl RouteProgress {
    pub fn new(step_index: usize, total_steps: usize) -> Self {
        let current_step = (step_index + 1).min(total_steps.max(1));
        let percent = if total_steps == 0 {
            0
        } else {
            ((current_step as f64 / total_steps as f64) * 100.0).round() as u8
        };
        Self {
            current_step,
            total_steps,
            percent,
        }
    }
}
