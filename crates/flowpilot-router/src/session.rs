//! FlowSession - One running instance of a Flow within a conversation

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use flowpilot_core::Flow;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique session identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generate a fresh random id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    InProgress,
    /// Terminal; a session is never reopened
    Completed,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InProgress => write!(f, "in_progress"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// A running instance of a flow.
///
/// Sessions share the catalog's `Flow`; many sessions may point at the same one.
#[derive(Debug, Clone)]
pub struct FlowSession {
    /// Session identifier
    pub id: SessionId,

    /// The flow this session runs
    pub flow: Arc<Flow>,

    /// Lifecycle state
    pub state: SessionState,

    /// When the session was started
    pub started_at: DateTime<Utc>,

    /// When the session was completed
    pub completed_at: Option<DateTime<Utc>>,
}

impl FlowSession {
    /// Start a new in-progress session for a flow
    pub fn new(flow: Arc<Flow>) -> Self {
        Self {
            id: SessionId::new(),
            flow,
            state: SessionState::InProgress,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn flow_name(&self) -> &str {
        self.flow.name()
    }

    pub fn is_completed(&self) -> bool {
        self.state.is_terminal()
    }

    /// Move to `Completed`. Returns false if the session was already completed.
    pub fn complete(&mut self) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.state = SessionState::Completed;
        self.completed_at = Some(Utc::now());
        true
    }
}
