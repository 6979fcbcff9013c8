// flowpilot Core - Router configuration
//
// Loaded once at startup, either from YAML or from `Default`. String fields
// support `${VAR}` environment expansion so deployments can swap the prompt
// template or default flow without editing the file.
//
// Example:
// ```yaml
// defaultFlow: QA
// delimiter: "``#``"
// classifyTimeoutMs: 30000
// examples:
//   - utterance: I want to do an interview
//     flow: Interviewer
// promptTemplate: |
//   ...{{$input}}...
// ```

use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::classifier::{FewShotExample, DEFAULT_INTENT_TEMPLATE, INPUT_PLACEHOLDER};
use crate::error::{FlowError, FlowResult};

/// Flow answering general questions; the fallback by default
pub const QA_FLOW: &str = "QA";

/// Flow conducting a coding interview
pub const INTERVIEWER_FLOW: &str = "Interviewer";

/// Intent classification and routing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterConfig {
    /// Flow used when no flow clearly matches
    #[serde(default = "default_flow")]
    pub default_flow: String,

    /// Delimiter bracketing free-text fields in the prompt
    #[serde(default = "default_delimiter")]
    pub delimiter: String,

    /// Few-shot examples
    #[serde(default = "default_examples")]
    pub examples: Vec<FewShotExample>,

    /// Prompt template for LLM-backed classifiers
    #[serde(default = "default_template")]
    pub prompt_template: String,

    /// Upper bound on one classification call, in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classify_timeout_ms: Option<u64>,
}

fn default_flow() -> String {
    QA_FLOW.to_string()
}

fn default_delimiter() -> String {
    "``#``".to_string()
}

fn default_examples() -> Vec<FewShotExample> {
    vec![
        FewShotExample::new("I want to do an interview", INTERVIEWER_FLOW),
        FewShotExample::new("Let's start the phone screen", INTERVIEWER_FLOW),
        FewShotExample::new("What's the longest river in the world", QA_FLOW),
    ]
}

fn default_template() -> String {
    DEFAULT_INTENT_TEMPLATE.to_string()
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            default_flow: default_flow(),
            delimiter: default_delimiter(),
            examples: default_examples(),
            prompt_template: default_template(),
            classify_timeout_ms: None,
        }
    }
}

impl RouterConfig {
    /// Parse, expand and validate a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> FlowResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            FlowError::config(format!("Failed to read router config {}: {}", path.display(), e))
        })?;

        let mut config: RouterConfig = serde_yaml::from_str(&content).map_err(|e| {
            FlowError::config(format!("Failed to parse router config {}: {}", path.display(), e))
        })?;

        config.expand_env_vars();
        config.validate().map_err(|e| {
            FlowError::config(format!("Invalid router config {}: {}", path.display(), e))
        })?;

        tracing::debug!("Loaded router config from {}", path.display());
        Ok(config)
    }

    pub fn with_default_flow(mut self, flow: impl Into<String>) -> Self {
        self.default_flow = flow.into();
        self
    }

    pub fn with_examples(mut self, examples: Vec<FewShotExample>) -> Self {
        self.examples = examples;
        self
    }

    /// Set the classification timeout; sub-millisecond parts round up
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let millis = timeout.as_nanos().div_ceil(1_000_000);
        self.classify_timeout_ms = Some(u64::try_from(millis).unwrap_or(u64::MAX));
        self
    }

    /// Classification timeout, if one is configured
    pub fn classify_timeout(&self) -> Option<Duration> {
        self.classify_timeout_ms.map(Duration::from_millis)
    }

    /// Expand `${VAR}` references in string fields
    pub fn expand_env_vars(&mut self) {
        self.default_flow = expand_env_var(&self.default_flow);
        self.delimiter = expand_env_var(&self.delimiter);
        self.prompt_template = expand_env_var(&self.prompt_template);
    }

    /// Validate the configuration on its own
    pub fn validate(&self) -> Result<(), String> {
        if self.default_flow.trim().is_empty() {
            return Err("defaultFlow is required".to_string());
        }

        if self.delimiter.is_empty() {
            return Err("delimiter must not be empty".to_string());
        }

        if self.prompt_template.trim().is_empty() {
            return Err("promptTemplate is empty".to_string());
        }

        if !self.prompt_template.contains(INPUT_PLACEHOLDER) {
            return Err(format!("promptTemplate must contain {}", INPUT_PLACEHOLDER));
        }

        for (index, example) in self.examples.iter().enumerate() {
            if example.utterance.trim().is_empty() || example.flow.trim().is_empty() {
                return Err(format!("Example {} needs both an utterance and a flow", index));
            }
        }

        if self.classify_timeout_ms == Some(0) {
            return Err("classifyTimeoutMs must be greater than zero".to_string());
        }

        Ok(())
    }

    /// Validate that every flow the configuration names is known
    pub fn validate_flow_names(
        &self,
        mut is_known: impl FnMut(&str) -> bool,
    ) -> Result<(), String> {
        if !is_known(&self.default_flow) {
            return Err(format!("defaultFlow '{}' is not a registered flow", self.default_flow));
        }

        let unknown: Vec<&str> = self
            .examples
            .iter()
            .map(|e| e.flow.as_str())
            .filter(|flow| !is_known(*flow))
            .collect();

        if !unknown.is_empty() {
            return Err(format!("Examples reference unknown flows: {}", unknown.join(", ")));
        }

        Ok(())
    }
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"))
}

/// Expand `${VAR}` references; unset variables are left as written
fn expand_env_var(value: &str) -> String {
    env_var_pattern()
        .replace_all(value, |caps: &Captures| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}
