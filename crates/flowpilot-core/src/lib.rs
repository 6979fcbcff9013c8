// flowpilot Core - Foundation types and traits for conversation flow routing
//
// This crate provides the Flow definition and its reference resolution, the
// error taxonomy, the intent classification capability and router
// configuration. Catalog and session management live in `flowpilot-router`.

pub mod classifier;
pub mod config;
pub mod error;
pub mod flow;

// Re-export core types
pub use classifier::{
    FewShotExample, IntentClassifier, IntentRequest, DEFAULT_INTENT_TEMPLATE, INPUT_PLACEHOLDER,
};
pub use config::{RouterConfig, INTERVIEWER_FLOW, QA_FLOW};
pub use error::{FlowError, FlowResult};
pub use flow::{CompletionType, Flow, FlowMetadata, FlowResolver, FlowSpec, FlowStep};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
