//! Campus navigation assistant
//!
//! A conversational core that walks a user from "where are you?" to a
//! destination, one authored direction at a time.
//!
//! - [`locale`]: per-language campus datasets (locations, paths, messages)
//! - [`navigation`]: direct-edge path resolution and location matching
//! - [`conversation`]: sessions, intent classification, the state machine
//!   and the multi-session orchestrator
//! - [`config`]: YAML configuration and store loading
//!
//! ```no_run
//! use std::sync::Arc;
//! use campus_nav::conversation::{ConversationInput, ConversationMachine};
//! use campus_nav::locale::LocaleStore;
//!
//! let store = Arc::new(LocaleStore::builtin().unwrap());
//! let machine = ConversationMachine::new(store);
//! let mut session = machine.new_session("en");
//! let response = machine.handle(
//!     &mut session,
//!     ConversationInput::SelectOrigin { name: "Main Gate".into() },
//! );
//! println!("{:?}", response.kind);
//! ```

pub mod config;
pub mod conversation;
pub mod error;
pub mod locale;
pub mod navigation;

pub use config::{ConfigLoader, NavConfig};
pub use conversation::{
    ConversationInput, ConversationMachine, ConversationPhase, ConversationSession, NavResponse,
    NavResponseKind, NavigationOrchestrator, OrchestratorError,
};
pub use error::NavError;
pub use locale::{LocaleStore, DEFAULT_LOCALE};
pub use navigation::{PathResolver, ReversePolicy};
