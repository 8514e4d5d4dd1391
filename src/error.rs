//! Error handling for campus navigation
//!
//! None of the conversational errors are fatal. The state machine turns each
//! of them into a bot message and keeps the session in an already-valid
//! phase; they exist as types so callers and tests can tell the outcomes apart.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Recoverable outcomes of a conversational turn
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "error_kind", rename_all = "snake_case")]
pub enum NavError {
    /// The requested locale has no dataset; the default locale was used instead.
    #[error("Unknown locale '{code}', falling back to '{fallback}'")]
    UnknownLocale { code: String, fallback: String },

    /// No direct or reverse edge connects the two locations.
    #[error("No path from '{from}' to '{to}'")]
    NoPathFound { from: String, to: String },

    /// The chosen destination is the current location.
    #[error("Destination '{location}' is the current location")]
    #[serde(rename = "destination_equals_origin")]
    InvalidDestinationEqualsOrigin { location: String },

    /// Free text matched nothing the current phase accepts.
    #[error("Unrecognized input: '{input}'")]
    UnrecognizedInput { input: String },
}

impl NavError {
    /// Stable machine-readable code for API responses and logs
    pub fn code(&self) -> &'static str {
        match self {
            NavError::UnknownLocale { .. } => "unknown_locale",
            NavError::NoPathFound { .. } => "no_path_found",
            NavError::InvalidDestinationEqualsOrigin { .. } => "destination_equals_origin",
            NavError::UnrecognizedInput { .. } => "unrecognized_input",
        }
    }
}
