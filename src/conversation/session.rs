//! Conversation Session Model
//!
//! One user's pass through the state machine. The session is a plain value:
//! every transition is an in-place mutation made by `ConversationMachine`
//! while the orchestrator holds the only write handle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::types::{ConversationPhase, RouteProgress};
use crate::locale::{Location, PathRecord};
use crate::navigation::EdgeOrientation;

// ============================================================================
// ConversationSession
// ============================================================================

/// Mutable state of a single conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSession {
    /// Unique session ID
    pub id: Uuid,

    /// Active locale code (already resolved against the store)
    pub locale: String,

    pub phase: ConversationPhase,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_location: Option<Location>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<Location>,

    /// Present only while navigating
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_path: Option<ActiveRoute>,

    /// Index of the step currently shown; 0 whenever no route is active
    pub step_index: usize,

    pub waiting_for_milestone: bool,

    /// Append-only transcript
    pub messages: Vec<ChatMessage>,

    /// Token of the auto-reset scheduled by "end navigation", if still live
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_reset: Option<u64>,

    #[serde(default)]
    reset_counter: u64,

    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
}

/// A resolved path being played back
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActiveRoute {
    pub path: PathRecord,
    pub orientation: EdgeOrientation,
    /// Locale the path was resolved in; its milestone marker applies
    pub locale: String,
}

impl ActiveRoute {
    pub fn total_steps(&self) -> usize {
        self.path.directions.len()
    }

    pub fn step(&self, index: usize) -> Option<&str> {
        self.path.directions.get(index).map(|s| s.as_str())
    }
}

impl ConversationSession {
    /// Create a new session collecting an origin
    pub fn new(locale: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            locale: locale.into(),
            phase: ConversationPhase::CollectingOrigin,
            current_location: None,
            destination: None,
            resolved_path: None,
            step_index: 0,
            waiting_for_milestone: false,
            messages: Vec::new(),
            pending_reset: None,
            reset_counter: 0,
            created_at: now,
            last_active_at: now,
        }
    }

    /// Create a session with a specific ID
    pub fn with_id(id: Uuid, locale: impl Into<String>) -> Self {
        let mut session = Self::new(locale);
        session.id = id;
        session
    }

    pub fn touch(&mut self) {
        self.last_active_at = Utc::now();
    }

    /// Append a user message
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::user(content, Utc::now()));
    }

    /// Append a bot message
    pub fn push_bot(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::bot(content, Utc::now()));
    }

    pub fn last_message(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Progress through the active route
    pub fn progress(&self) -> Option<RouteProgress> {
        self.resolved_path
            .as_ref()
            .map(|route| RouteProgress::new(self.step_index, route.total_steps()))
    }

    /// Drop the active route and its playback cursor
    pub fn clear_route(&mut self) {
        self.resolved_path = None;
        self.step_index = 0;
        self.waiting_for_milestone = false;
    }

    /// Arm a deferred reset, superseding any earlier one; returns its token.
    pub fn schedule_reset(&mut self) -> u64 {
        self.reset_counter += 1;
        self.pending_reset = Some(self.reset_counter);
        self.reset_counter
    }

    /// Disarm the pending reset. Returns true when one was pending.
    pub fn cancel_pending_reset(&mut self) -> bool {
        self.pending_reset.take().is_some()
    }

    /// Whether `token` still names the armed reset
    pub fn reset_is_current(&self, token: u64) -> bool {
        self.pending_reset == Some(token)
    }

    /// Return to the initial state with a fresh transcript.
    ///
    /// Identity, locale and the reset counter survive.
    pub fn reset(&mut self, welcome: impl Into<String>) {
        self.phase = ConversationPhase::CollectingOrigin;
        self.current_location = None;
        self.destination = None;
        self.clear_route();
        self.pending_reset = None;
        self.messages = vec![ChatMessage::bot(welcome, Utc::now())];
        self.touch();
    }
}

// ============================================================================
// Chat Message
// ============================================================================

/// A transcript entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Bot,
}

impl ChatMessage {
    /// Create a user message
    pub fn user(content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            timestamp,
        }
    }

    /// Create a bot message
    pub fn bot(content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            role: MessageRole::Bot,
            content: content.into(),
            timestamp,
        }
    }

    pub fn is_bot(&self) -> bool {
        self.role == MessageRole::Bot
    }
}

// ============================================================================
// Tests
// ============================================================================
