//! Conversation: phases, sessions, intent classification and the state machine
//!
//! ```text
//! UI event ──► NavigationOrchestrator::process
//!                 │  (write lock on the session map)
//!                 ▼
//!              ConversationMachine::handle ──► IntentClassifier (free text)
//!                 │                        └──► PathResolver (destination)
//!                 ▼
//!              NavResponse (+ deferred reset timer)
//! ```

pub mod intent_classifier;
pub mod machine;
pub mod orchestrator;
pub mod response;
pub mod session;
pub mod types;

pub use intent_classifier::{ClassifierContext, IntentClassifier, IntentPhrases};
pub use machine::{ConversationMachine, DEFAULT_RESET_DELAY};
pub use orchestrator::{NavigationOrchestrator, OrchestratorError};
pub use response::{NavResponse, NavResponseKind, ScheduledReset, StepView};
pub use session::{ActiveRoute, ChatMessage, ConversationSession, MessageRole};
pub use types::{ConversationInput, ConversationPhase, Intent, RouteProgress};
