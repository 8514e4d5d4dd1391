//! Navigation Orchestrator
//!
//! Owns every live session, keyed by UUID. Each call to [`process`] takes the
//! write lock, applies one event through the [`ConversationMachine`] and
//! releases it, so events for a session are handled strictly one at a time.
//!
//! "End navigation" arms a deferred reset. The orchestrator spawns a timer
//! task that re-takes the lock after the delay and only resets the session if
//! the reset token is still current; accepting a new origin in between
//! disarms it.
//!
//! [`process`]: NavigationOrchestrator::process

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use super::machine::ConversationMachine;
use super::response::{NavResponse, ScheduledReset};
use super::session::ConversationSession;
use super::types::ConversationInput;
use crate::locale::Location;

type SessionMap = Arc<RwLock<HashMap<Uuid, ConversationSession>>>;

/// Multi-session front door to the state machine
#[derive(Clone)]
pub struct NavigationOrchestrator {
    machine: Arc<ConversationMachine>,
    sessions: SessionMap,
}

impl NavigationOrchestrator {
    pub fn new(machine: ConversationMachine) -> Self {
        Self {
            machine: Arc::new(machine),
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn machine(&self) -> &ConversationMachine {
        &self.machine
    }

    /// Create a new session and return its ID.
    pub async fn create_session(&self, locale: &str) -> Uuid {
        let session = self.machine.new_session(locale);
        let id = session.id;
        self.sessions.write().await.insert(id, session);
        id
    }

    /// Get a snapshot of session state.
    pub async fn get_session(&self, session_id: Uuid) -> Option<ConversationSession> {
        self.sessions.read().await.get(&session_id).cloned()
    }

    /// Delete a session. Any pending reset timer becomes a no-op.
    pub async fn delete_session(&self, session_id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&session_id).is_some();
        if removed {
            info!(session_id = %session_id, "Session deleted");
        }
        removed
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Process one event and return the response.
    pub async fn process(
        &self,
        session_id: Uuid,
        input: ConversationInput,
    ) -> Result<NavResponse, OrchestratorError> {
        let response = {
            let mut sessions = self.sessions.write().await;
            let session = sessions
                .get_mut(&session_id)
                .ok_or(OrchestratorError::SessionNotFound(session_id))?;
            self.machine.handle(session, input)
        };

        if let Some(reset) = response.scheduled_reset {
            self.spawn_reset(session_id, reset);
        }

        Ok(response)
    }

    /// Ranked choice list for the session's current phase
    pub async fn choices(
        &self,
        session_id: Uuid,
        filter: &str,
    ) -> Result<Vec<Location>, OrchestratorError> {
        let sessions = self.sessions.read().await;
        let session = sessions
            .get(&session_id)
            .ok_or(OrchestratorError::SessionNotFound(session_id))?;
        Ok(self.machine.choices(session, filter))
    }

    fn spawn_reset(&self, session_id: Uuid, reset: ScheduledReset) {
        let sessions = Arc::clone(&self.sessions);
        let machine = Arc::clone(&self.machine);
        debug!(session_id = %session_id, token = reset.token, "Arming reset timer");

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(reset.delay_ms)).await;
            let mut sessions = sessions.write().await;
            match sessions.get_mut(&session_id) {
                Some(session) => {
                    machine.apply_reset(session, reset.token);
                }
                None => debug!(session_id = %session_id, "Reset timer fired for a deleted session"),
            }
        });
    }

    // ========================================================================
    // Event shorthands
    // ========================================================================

    pub async fn select_origin(
        &self,
        session_id: Uuid,
        name: &str,
    ) -> Result<NavResponse, OrchestratorError> {
        self.process(
            session_id,
            ConversationInput::SelectOrigin {
                name: name.to_string(),
            },
        )
        .await
    }

    pub async fn select_destination(
        &self,
        session_id: Uuid,
        name: &str,
    ) -> Result<NavResponse, OrchestratorError> {
        self.process(
            session_id,
            ConversationInput::SelectDestination {
                name: name.to_string(),
            },
        )
        .await
    }

    pub async fn submit_text(
        &self,
        session_id: Uuid,
        text: &str,
    ) -> Result<NavResponse, OrchestratorError> {
        self.process(
            session_id,
            ConversationInput::SubmitText {
                text: text.to_string(),
            },
        )
        .await
    }

    pub async fn request_advance(
        &self,
        session_id: Uuid,
    ) -> Result<NavResponse, OrchestratorError> {
        self.process(session_id, ConversationInput::RequestAdvance)
            .await
    }

    pub async fn confirm_milestone(
        &self,
        session_id: Uuid,
    ) -> Result<NavResponse, OrchestratorError> {
        self.process(session_id, ConversationInput::ConfirmMilestone)
            .await
    }

    pub async fn request_new_route(
        &self,
        session_id: Uuid,
    ) -> Result<NavResponse, OrchestratorError> {
        self.process(session_id, ConversationInput::RequestNewRoute)
            .await
    }

    pub async fn end_session(&self, session_id: Uuid) -> Result<NavResponse, OrchestratorError> {
        self.process(session_id, ConversationInput::EndSession).await
    }

    pub async fn set_locale(
        &self,
        session_id: Uuid,
        code: &str,
    ) -> Result<NavResponse, OrchestratorError> {
        self.process(
            session_id,
            ConversationInput::SetLocale {
                code: code.to_string(),
            },
        )
        .await
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrchestratorError {
    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::types::ConversationPhase;
    use crate::locale::LocaleStore;

    fn make_orchestrator() -> NavigationOrchestrator {
        let store = Arc::new(LocaleStore::builtin().unwrap());
        NavigationOrchestrator::new(ConversationMachine::new(store))
    }

    #[tokio::test]
    async fn test_create_session() {
        let orch = make_orchestrator();
        let id = orch.create_session("te").await;
        let session = orch.get_session(id).await.unwrap();
        assert_eq!(session.phase, ConversationPhase::CollectingOrigin);
        assert_eq!(session.locale, "te");
        assert_eq!(orch.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let orch = make_orchestrator();
        let missing = Uuid::new_v4();
        let err = orch.request_advance(missing).await.unwrap_err();
        assert_eq!(err, OrchestratorError::SessionNotFound(missing));
        assert!(orch.choices(missing, "").await.is_err());
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let orch = make_orchestrator();
        let a = orch.create_session("en").await;
        let b = orch.create_session("en").await;

        orch.select_origin(a, "Library").await.unwrap();

        let a = orch.get_session(a).await.unwrap();
        let b = orch.get_session(b).await.unwrap();
        assert_eq!(a.phase, ConversationPhase::CollectingDestination);
        assert_eq!(b.phase, ConversationPhase::CollectingOrigin);
    }

    #[tokio::test]
    async fn test_delete_session() {
        let orch = make_orchestrator();
        let id = orch.create_session("en").await;
        assert!(orch.delete_session(id).await);
        assert!(!orch.delete_session(id).await);
        assert!(orch.get_session(id).await.is_none());
    }

    #[tokio::test]
    async fn test_choices_for_destination() {
        let orch = make_orchestrator();
        let id = orch.create_session("en").await;
        orch.select_origin(id, "Main Gate").await.unwrap();
        let choices = orch.choices(id, "").await.unwrap();
        assert_eq!(choices.len(), 10);
    }
}
