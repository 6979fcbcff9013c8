//! flowpilot Router - Flow catalog, session registry and intent routing
//!
//! This crate provides:
//! - `FlowCatalog` - Two-phase registration and reference resolution of flows
//! - `FlowRouter` - Per-conversation flow sessions and turn routing
//! - `PatternClassifier` - Deterministic regex-based intent classification

pub mod catalog;
pub mod pattern;
pub mod router;
pub mod session;

pub use catalog::{FlowCatalog, FlowCatalogBuilder};
pub use pattern::PatternClassifier;
pub use router::{FlowRouter, RouteDecision};
pub use session::{FlowSession, SessionId, SessionState};

pub use tokio_util::sync::CancellationToken;
