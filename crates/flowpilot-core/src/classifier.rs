// flowpilot Core - Intent classification capability
//
// The router never talks to a language model directly. It assembles an
// `IntentRequest` (the message, few-shot examples, flow descriptions and the
// fallback flow) and hands it to an `IntentClassifier`. Implementations range
// from LLM-backed classifiers, which send `render_prompt()` to a model, to
// deterministic pattern matchers used offline and in tests.

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::FlowResult;

/// Built-in prompt for LLM-backed classifiers.
///
/// Placeholders use the `{{$name}}` form and are filled by
/// [`IntentRequest::render_prompt`].
pub const DEFAULT_INTENT_TEMPLATE: &str = r#"You route a user's message to the flow that should handle it.
The user's message and the example utterances are wrapped in {{$delimiter}}.

Available flows, as a JSON object of flow name to description:
{{$descriptions}}

Examples:
{{$examples}}

If no flow clearly matches, answer {{$defaultAnswer}}.
Answer with the flow name only.

USER: {{$input}}
INTENT:"#;

/// Placeholder that every prompt template must contain
pub const INPUT_PLACEHOLDER: &str = "{{$input}}";

/// An example utterance and the flow it should route to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FewShotExample {
    pub utterance: String,
    pub flow: String,
}

impl FewShotExample {
    pub fn new(utterance: impl Into<String>, flow: impl Into<String>) -> Self {
        Self {
            utterance: utterance.into(),
            flow: flow.into(),
        }
    }
}

/// Everything a classifier needs to pick a flow for one message
#[derive(Debug, Clone)]
pub struct IntentRequest {
    /// Raw user message
    pub message: String,

    /// Delimiter bracketing free-text fields
    pub delimiter: String,

    /// Few-shot examples, in prompt order
    pub examples: Vec<FewShotExample>,

    /// Flow name to description, in catalog order
    pub descriptions: IndexMap<String, String>,

    /// Fallback flow when nothing clearly matches
    pub default_flow: String,

    /// Prompt template for LLM-backed classifiers
    pub template: String,
}

impl IntentRequest {
    /// The message wrapped in the delimiter
    pub fn bracketed_message(&self) -> String {
        format!("{d}{}{d}", self.message, d = self.delimiter)
    }

    /// Examples rendered as `USER:` / `INTENT:` pairs, one pair per example
    pub fn formatted_examples(&self) -> String {
        self.examples
            .iter()
            .map(|e| {
                format!(
                    "USER: {d}{}{d}\nINTENT: {}",
                    e.utterance,
                    e.flow,
                    d = self.delimiter
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Descriptions as a JSON object
    pub fn descriptions_json(&self) -> String {
        // A map of strings always serializes.
        serde_json::to_string(&self.descriptions).unwrap_or_else(|_| "{}".to_string())
    }

    /// Template variables, keyed by placeholder name
    pub fn variables(&self) -> IndexMap<&'static str, String> {
        let mut vars = IndexMap::new();
        vars.insert("input", self.bracketed_message());
        vars.insert("delimiter", self.delimiter.clone());
        vars.insert("descriptions", self.descriptions_json());
        vars.insert("examples", self.formatted_examples());
        vars.insert("defaultAnswer", self.default_flow.clone());
        vars
    }

    /// The template with every `{{$name}}` placeholder substituted
    pub fn render_prompt(&self) -> String {
        let mut prompt = self.template.clone();
        for (name, value) in self.variables() {
            prompt = prompt.replace(&format!("{{{{${}}}}}", name), &value);
        }
        prompt
    }

    /// Whether the classifier's answer names a candidate flow
    pub fn is_candidate(&self, flow_name: &str) -> bool {
        self.descriptions.contains_key(flow_name)
    }
}

/// Selects the flow that best matches a message
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    /// Classifier name, for logs
    fn name(&self) -> &str;

    /// Return the name of the best-matching flow, or the request's default
    async fn classify(&self, request: &IntentRequest) -> FlowResult<String>;
}
