//! Response types for a conversational turn
//!
//! Every turn returns the phase the session rests in, a kind describing what
//! happened (drives UI rendering), and the bot messages appended during the
//! turn. The full transcript stays on the session.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::session::{ChatMessage, ConversationSession};
use super::types::{ConversationPhase, RouteProgress};
use crate::error::NavError;
use crate::locale::Location;
use crate::navigation::EdgeOrientation;

// ---------------------------------------------------------------------------
// NavResponse
// ---------------------------------------------------------------------------

/// The outcome of one inbound event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavResponse {
    pub session_id: Uuid,

    /// Phase after processing the event
    pub phase: ConversationPhase,

    pub kind: NavResponseKind,

    /// Messages (user echo included) appended during this turn
    pub messages: Vec<ChatMessage>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<RouteProgress>,

    pub waiting_for_milestone: bool,

    /// Active locale of the session
    pub locale: String,

    /// Recoverable outcome, when the turn did not go the happy way
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<NavError>,

    /// Deferred reset the caller must arm
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_reset: Option<ScheduledReset>,
}

impl NavResponse {
    /// Snapshot the session after a turn. `first_new` is the transcript
    /// length before the turn began.
    pub fn from_session(
        session: &ConversationSession,
        kind: NavResponseKind,
        first_new: usize,
    ) -> Self {
        let messages = session
            .messages
            .get(first_new..)
            .map(|slice| slice.to_vec())
            .unwrap_or_default();
        Self {
            session_id: session.id,
            phase: session.phase,
            kind,
            messages,
            progress: session.progress(),
            waiting_for_milestone: session.waiting_for_milestone,
            locale: session.locale.clone(),
            error: None,
            scheduled_reset: None,
        }
    }

    pub fn with_error(mut self, error: NavError) -> Self {
        self.error = Some(error);
        self
    }

    pub fn with_reset(mut self, reset: ScheduledReset) -> Self {
        self.scheduled_reset = Some(reset);
        self
    }

    /// Bot messages of this turn, in order
    pub fn bot_messages(&self) -> impl Iterator<Item = &str> {
        self.messages
            .iter()
            .filter(|m| m.is_bot())
            .map(|m| m.content.as_str())
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, NavResponseKind::Error { .. })
    }
}

// ---------------------------------------------------------------------------
// NavResponseKind
// ---------------------------------------------------------------------------

/// What happened during the turn
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NavResponseKind {
    /// Phase prompt (welcome, destination prompt, post-arrival choice)
    Prompt { text: String },

    /// Origin accepted; destination choices follow
    OriginSelected { location: Location },

    /// Destination equals the current location
    AlreadyThere { location: Location },

    /// No direct or reverse edge between the two locations
    NoPathFound { from: Location, to: Location },

    /// A route was resolved and its first step shown
    RouteStarted {
        from: Location,
        to: Location,
        total_steps: usize,
        orientation: EdgeOrientation,
        step: StepView,
    },

    /// A later step is shown
    Step { step: StepView },

    /// Past the final step
    Arrived { destination: Location },

    /// Farewell emitted; the session resets after the delay
    SessionEnded { reset_after_ms: u64 },

    LocaleChanged {
        requested: String,
        locale: String,
        fell_back: bool,
    },

    /// Free text was not understood; a clarifying message was emitted
    Clarification {
        detail: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        suggestion: Option<Location>,
    },

    /// Event not valid in the current phase
    Error { error: String, recoverable: bool },
}

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

/// A direction step as shown to the user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StepView {
    /// 0-based index into the route
    pub index: usize,
    pub total: usize,
    /// Authored text, marker included
    pub direction: String,
    /// Text with the milestone marker stripped
    pub display: String,
    pub milestone: bool,
}

/// A deferred session reset
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduledReset {
    pub token: u64,
    pub delay_ms: u64,
}
