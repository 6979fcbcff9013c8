//! FlowRouter - Tracks flow sessions per conversation and picks flows for new turns
//!
//! The FlowRouter handles:
//! - The session registry (conversation id → sessions, in start order)
//! - Starting and completing flow sessions
//! - Assembling intent requests and calling the IntentClassifier
//! - Turn routing: continue the in-progress session or classify and start one
//!
//! Each conversation's sessions live in a single `DashMap` entry, so all
//! mutations for one conversation are serialized by that entry's shard lock
//! while independent conversations proceed concurrently.
//!
//! When a conversation has several sessions in progress, the most recently
//! started one is reported as the in-progress session.

use std::sync::Arc;

use dashmap::DashMap;
use flowpilot_core::{
    Flow, FlowError, FlowResult, IntentClassifier, IntentRequest, RouterConfig,
};
use indexmap::IndexMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::catalog::FlowCatalog;
use crate::session::{FlowSession, SessionId};

/// Sessions of one conversation, in start order
#[derive(Debug, Default)]
struct ConversationSessions {
    sessions: IndexMap<SessionId, FlowSession>,
}

impl ConversationSessions {
    fn insert(&mut self, session: FlowSession) {
        self.sessions.insert(session.id, session);
    }

    fn latest_in_progress(&self) -> Option<&FlowSession> {
        self.sessions.values().rev().find(|s| !s.is_completed())
    }
}

/// Outcome of routing one conversation turn
#[derive(Debug, Clone)]
pub enum RouteDecision {
    /// An in-progress session handles the turn
    Continue(FlowSession),

    /// The classifier picked a flow and a new session was started
    Started(FlowSession),
}

impl RouteDecision {
    pub fn session(&self) -> &FlowSession {
        match self {
            Self::Continue(session) | Self::Started(session) => session,
        }
    }

    pub fn into_session(self) -> FlowSession {
        match self {
            Self::Continue(session) | Self::Started(session) => session,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Self::Started(_))
    }
}

/// FlowRouter owns per-conversation flow sessions and drives intent classification
pub struct FlowRouter {
    /// Fully built flow catalog
    catalog: Arc<FlowCatalog>,

    /// External intent classifier
    classifier: Arc<dyn IntentClassifier>,

    /// Classification settings
    config: RouterConfig,

    /// conversation id → sessions
    sessions: DashMap<String, ConversationSessions>,
}

impl FlowRouter {
    /// Create a router over a built catalog.
    ///
    /// Fails if the configuration is invalid or names flows the catalog lacks.
    pub fn new(
        catalog: Arc<FlowCatalog>,
        classifier: Arc<dyn IntentClassifier>,
        config: RouterConfig,
    ) -> FlowResult<Self> {
        config.validate().map_err(FlowError::Config)?;
        config
            .validate_flow_names(|name| catalog.contains(name))
            .map_err(FlowError::Config)?;

        info!(
            "Flow router ready: {} flows, classifier={}, default flow={}",
            catalog.len(),
            classifier.name(),
            config.default_flow
        );

        Ok(Self {
            catalog,
            classifier,
            config,
            sessions: DashMap::new(),
        })
    }

    pub fn catalog(&self) -> &Arc<FlowCatalog> {
        &self.catalog
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// The most recently started session of this conversation that is not
    /// completed, if any
    pub fn get_in_progress_flow_session(&self, conversation_id: &str) -> Option<FlowSession> {
        let conversation = self.sessions.get(conversation_id)?;
        let session = conversation.latest_in_progress().cloned();
        debug!(
            "In-progress session for {}: {:?}",
            conversation_id,
            session.as_ref().map(|s| s.id)
        );
        session
    }

    /// Start a new session of `flow` in this conversation
    pub fn start_flow(&self, conversation_id: &str, flow: Arc<Flow>) -> FlowSession {
        let session = FlowSession::new(flow);
        self.sessions
            .entry(conversation_id.to_string())
            .or_default()
            .insert(session.clone());

        info!(
            "Started flow {} (session {}) in conversation {}",
            session.flow_name(),
            session.id,
            conversation_id
        );
        session
    }

    /// Mark a session completed.
    ///
    /// Completing an already completed session succeeds without changes.
    /// Unknown conversations and sessions are reported, never created.
    pub fn complete_flow(
        &self,
        conversation_id: &str,
        session_id: &SessionId,
    ) -> FlowResult<FlowSession> {
        let mut conversation = self
            .sessions
            .get_mut(conversation_id)
            .ok_or_else(|| FlowError::ConversationNotFound(conversation_id.to_string()))?;

        let session = conversation
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| FlowError::SessionNotFound {
                conversation_id: conversation_id.to_string(),
                session_id: session_id.to_string(),
            })?;

        if session.complete() {
            info!(
                "Completed flow {} (session {}) in conversation {}",
                session.flow_name(),
                session_id,
                conversation_id
            );
        } else {
            debug!("Session {} was already completed", session_id);
        }

        Ok(session.clone())
    }

    /// All sessions of a conversation, in start order
    pub fn sessions(&self, conversation_id: &str) -> Vec<FlowSession> {
        self.sessions
            .get(conversation_id)
            .map(|c| c.sessions.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of conversations with at least one session
    pub fn conversation_count(&self) -> usize {
        self.sessions.len()
    }

    /// Build the classification request for a message
    pub fn intent_request(&self, message: &str) -> IntentRequest {
        IntentRequest {
            message: message.to_string(),
            delimiter: self.config.delimiter.clone(),
            examples: self.config.examples.clone(),
            descriptions: self.catalog.descriptions(),
            default_flow: self.config.default_flow.clone(),
            template: self.config.prompt_template.clone(),
        }
    }

    /// Ask the classifier which flow should handle `message`.
    ///
    /// The answer is returned verbatim and is not checked against the
    /// catalog. Cancellation and the configured timeout abort the call;
    /// session state is never touched.
    pub async fn classify_intent(
        &self,
        message: &str,
        cancel: &CancellationToken,
    ) -> FlowResult<String> {
        let request = self.intent_request(message);
        let classify = self.classifier.classify(&request);

        let result = match self.config.classify_timeout() {
            Some(limit) => tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(FlowError::Cancelled),
                outcome = tokio::time::timeout(limit, classify) => {
                    outcome.unwrap_or_else(|_| Err(FlowError::Timeout(limit)))
                }
            },
            None => tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(FlowError::Cancelled),
                outcome = classify => outcome,
            },
        };

        match &result {
            Ok(flow_name) => debug!(
                "Classifier {} selected flow {}",
                self.classifier.name(),
                flow_name
            ),
            Err(e) => warn!("Intent classification failed: {}", e),
        }

        result
    }

    /// Route one conversation turn.
    ///
    /// Continues the in-progress session if there is one; otherwise classifies
    /// the message and starts a session of the selected flow. The in-progress
    /// check is repeated under the conversation's lock before starting, so
    /// concurrent turns of one conversation never open two sessions.
    pub async fn route(
        &self,
        conversation_id: &str,
        message: &str,
        cancel: &CancellationToken,
    ) -> FlowResult<RouteDecision> {
        if let Some(session) = self.get_in_progress_flow_session(conversation_id) {
            debug!(
                "Continuing flow {} in conversation {}",
                session.flow_name(),
                conversation_id
            );
            return Ok(RouteDecision::Continue(session));
        }

        let flow_name = self.classify_intent(message, cancel).await?;
        let flow = self
            .catalog
            .get_flow(&flow_name)
            .ok_or_else(|| FlowError::UnknownFlow(flow_name.clone()))?;

        let mut conversation = self
            .sessions
            .entry(conversation_id.to_string())
            .or_default();

        if let Some(existing) = conversation.latest_in_progress() {
            debug!(
                "Session {} started concurrently in conversation {}",
                existing.id, conversation_id
            );
            return Ok(RouteDecision::Continue(existing.clone()));
        }

        let session = FlowSession::new(flow);
        conversation.insert(session.clone());

        info!(
            "Routed conversation {} to flow {} (session {})",
            conversation_id,
            session.flow_name(),
            session.id
        );
        Ok(RouteDecision::Started(session))
    }
}
