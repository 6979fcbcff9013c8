// flowpilot Core - Error types
//
// A single error enum shared by the catalog, the router and the classifiers.
// Absence (unknown flow name, no in-progress session) is modelled with
// `Option`, never with an error.

use std::time::Duration;

use thiserror::Error;

/// Result alias used throughout flowpilot
pub type FlowResult<T> = Result<T, FlowError>;

/// Errors raised by flow catalog construction, session tracking and
/// intent classification
#[derive(Debug, Error)]
pub enum FlowError {
    /// Missing or malformed flow content or router configuration
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A flow with this name is already registered
    #[error("Flow '{0}' is already registered")]
    DuplicateName(String),

    /// A flow references a name that is not in the catalog
    #[error("Flow '{flow}' references unknown flow '{reference}'")]
    UnresolvedReference { flow: String, reference: String },

    #[error("Conversation '{0}' not found")]
    ConversationNotFound(String),

    #[error("Session '{session_id}' not found in conversation '{conversation_id}'")]
    SessionNotFound {
        conversation_id: String,
        session_id: String,
    },

    /// The classifier selected a flow that the catalog does not know
    #[error("Classifier selected unknown flow '{0}'")]
    UnknownFlow(String),

    /// The external intent classifier failed
    #[error("Intent classifier error: {0}")]
    Classifier(String),

    #[error("Intent classification was cancelled")]
    Cancelled,

    #[error("Intent classification timed out after {0:?}")]
    Timeout(Duration),
}

impl FlowError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn classifier(msg: impl Into<String>) -> Self {
        Self::Classifier(msg.into())
    }

    /// True for the NotFound family reported by `complete_flow`
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ConversationNotFound(_) | Self::SessionNotFound { .. }
        )
    }

    /// True for errors that should abort startup
    pub fn is_startup(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::Io(_) | Self::UnresolvedReference { .. }
        )
    }
}
