// flowpilot Core - Flow definition types
//
// A Flow is a named, multi-step task definition that a conversation can be
// routed to. Steps may delegate to other flows by name; those names are bound
// to the referenced Flow objects only once the whole catalog is known, so
// forward, mutual and self references all resolve without ordering concerns.
//
// Architecture:
//   Flow YAML → FlowCatalogBuilder (register) → build() → resolved Flow graph
//
// The catalog owns every Flow through an `Arc`; resolved references are
// `Weak` handles, so reference cycles never keep flows alive on their own.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, OnceLock, Weak};

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FlowError, FlowResult};

/// Flow - Multi-step conversational task
///
/// Example:
/// ```yaml
/// apiVersion: flowpilot.dev/v1
/// kind: Flow
/// metadata:
///   name: Interviewer
/// spec:
///   description: "This flow is used to conduct an interview"
///   patterns: ["interview", "phone screen"]
///   steps:
///     - goal: Generate a coding problem
///       plugins: [GenerateProblem]
///       provides: [problem_statement]
///     - goal: Answer questions about the problem
///       flow: QA
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flow {
    /// API version (e.g., "flowpilot.dev/v1")
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Resource kind, always "Flow"
    #[serde(default = "default_flow_kind")]
    pub kind: String,

    /// Flow metadata
    pub metadata: FlowMetadata,

    /// Flow specification
    pub spec: FlowSpec,

    /// Resolved references, set once by `build_references`
    #[serde(skip)]
    references: OnceLock<IndexMap<String, Weak<Flow>>>,
}

fn default_api_version() -> String {
    "flowpilot.dev/v1".to_string()
}

fn default_flow_kind() -> String {
    "Flow".to_string()
}

/// Flow metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowMetadata {
    /// Flow name, unique within a catalog
    pub name: String,

    /// Labels for categorization
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub labels: HashMap<String, String>,

    /// Annotations for additional metadata
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub annotations: HashMap<String, String>,
}

/// Flow specification
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowSpec {
    /// Human-readable description, shown to the intent classifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Ordered steps
    #[serde(default)]
    pub steps: Vec<FlowStep>,

    /// Case-insensitive regex patterns for offline classification
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patterns: Vec<String>,
}

/// A single step of a flow
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowStep {
    /// What the step should achieve
    pub goal: String,

    /// Plugins the step may invoke
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub plugins: Vec<String>,

    /// Variables that must be available before the step runs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<String>,

    /// Variables the step produces
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provides: Vec<String>,

    /// How many times the step may run
    #[serde(default)]
    pub completion_type: CompletionType,

    /// Name of another flow this step delegates to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow: Option<String>,
}

/// Step completion semantics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CompletionType {
    #[default]
    Once,
    AtLeastOnce,
    ZeroOrMore,
}

impl FlowStep {
    /// Create a step that runs plugins toward a goal
    pub fn new(goal: impl Into<String>) -> Self {
        Self {
            goal: goal.into(),
            ..Default::default()
        }
    }

    /// Create a step that delegates to another flow
    pub fn reference(goal: impl Into<String>, flow: impl Into<String>) -> Self {
        Self {
            goal: goal.into(),
            flow: Some(flow.into()),
            ..Default::default()
        }
    }

    pub fn with_plugins<I, S>(mut self, plugins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.plugins = plugins.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_requires<I, S>(mut self, requires: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requires = requires.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_provides<I, S>(mut self, provides: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.provides = provides.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_completion(mut self, completion_type: CompletionType) -> Self {
        self.completion_type = completion_type;
        self
    }

    /// Whether this step delegates to another flow
    pub fn is_reference(&self) -> bool {
        self.flow.is_some()
    }
}

/// Name lookup handed to each flow while references are built
pub trait FlowResolver {
    /// Look up a registered flow by name
    fn resolve(&self, name: &str) -> Option<Arc<Flow>>;
}

impl FlowResolver for IndexMap<String, Arc<Flow>> {
    fn resolve(&self, name: &str) -> Option<Arc<Flow>> {
        self.get(name).cloned()
    }
}

impl FlowResolver for HashMap<String, Arc<Flow>> {
    fn resolve(&self, name: &str) -> Option<Arc<Flow>> {
        self.get(name).cloned()
    }
}

impl Flow {
    /// Create a flow with a name and description and no steps
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            api_version: default_api_version(),
            kind: default_flow_kind(),
            metadata: FlowMetadata {
                name: name.into(),
                ..Default::default()
            },
            spec: FlowSpec {
                description: Some(description.into()),
                ..Default::default()
            },
            references: OnceLock::new(),
        }
    }

    pub fn with_step(mut self, step: FlowStep) -> Self {
        self.spec.steps.push(step);
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.spec.patterns.push(pattern.into());
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.labels.insert(key.into(), value.into());
        self
    }

    /// Parse a flow from YAML, reporting the failing field path
    pub fn from_yaml(content: &str) -> FlowResult<Self> {
        let deserializer = serde_yaml::Deserializer::from_str(content);
        serde_path_to_error::deserialize(deserializer).map_err(|e| {
            FlowError::config(format!("Failed to parse flow at '{}': {}", e.path(), e.inner()))
        })
    }

    /// Load and validate a flow from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> FlowResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            FlowError::config(format!("Failed to read flow file {}: {}", path.display(), e))
        })?;

        let flow = Self::from_yaml(&content).map_err(|e| match e {
            FlowError::Config(msg) => FlowError::config(format!("{}: {}", path.display(), msg)),
            other => other,
        })?;

        flow.validate().map_err(|e| {
            FlowError::config(format!("Flow validation failed for {}: {}", path.display(), e))
        })?;

        Ok(flow)
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn description(&self) -> &str {
        self.spec.description.as_deref().unwrap_or_default()
    }

    pub fn steps(&self) -> &[FlowStep] {
        &self.spec.steps
    }

    /// Distinct names of the flows this flow delegates to, in step order
    pub fn reference_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for name in self.spec.steps.iter().filter_map(|s| s.flow.as_deref()) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// Validate the flow definition
    pub fn validate(&self) -> Result<(), String> {
        if self.metadata.name.trim().is_empty() {
            return Err("Flow name is required".to_string());
        }

        if self.spec.steps.is_empty() {
            return Err("At least one step is required".to_string());
        }

        for (index, step) in self.spec.steps.iter().enumerate() {
            if step.goal.trim().is_empty() {
                return Err(format!("Step {} has an empty goal", index));
            }

            if let Some(ref flow) = step.flow {
                if flow.trim().is_empty() {
                    return Err(format!("Step {} references an empty flow name", index));
                }
                if !step.plugins.is_empty() {
                    return Err(format!(
                        "Step {} cannot both reference flow '{}' and call plugins",
                        index, flow
                    ));
                }
            }
        }

        for pattern in &self.spec.patterns {
            Regex::new(pattern).map_err(|e| format!("Invalid pattern '{}': {}", pattern, e))?;
        }

        Ok(())
    }

    /// Bind every named reference to the flow the resolver returns for it.
    ///
    /// Must run only after every participating flow has been registered.
    /// Runs at most once; later calls are no-ops.
    pub fn build_references(&self, resolver: &dyn FlowResolver) -> FlowResult<()> {
        if self.references.get().is_some() {
            return Ok(());
        }

        let mut resolved = IndexMap::new();
        for name in self.reference_names() {
            let target = resolver.resolve(name).ok_or_else(|| FlowError::UnresolvedReference {
                flow: self.metadata.name.clone(),
                reference: name.to_string(),
            })?;
            resolved.insert(name.to_string(), Arc::downgrade(&target));
        }

        debug!(
            "Resolved {} reference(s) for flow {}",
            resolved.len(),
            self.metadata.name
        );

        // A concurrent resolver may have won; both bound the same catalog.
        let _ = self.references.set(resolved);
        Ok(())
    }

    /// Whether references have been built
    pub fn is_resolved(&self) -> bool {
        self.references.get().is_some()
    }

    /// The resolved flow behind a named reference
    pub fn referenced_flow(&self, name: &str) -> Option<Arc<Flow>> {
        self.references.get()?.get(name)?.upgrade()
    }

    /// All resolved references, in step order
    pub fn referenced_flows(&self) -> Vec<Arc<Flow>> {
        self.references
            .get()
            .map(|refs| refs.values().filter_map(Weak::upgrade).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interviewer_yaml() -> &'static str {
        r#"
apiVersion: flowpilot.dev/v1
kind: Flow
metadata:
  name: Interviewer
spec:
  description: This flow is used to conduct an interview
  patterns: ["interview", "phone screen"]
  steps:
    - goal: Generate a coding problem
      plugins: [GenerateProblem]
      provides: [problem_statement]
    - goal: Collect the preferred programming language
      plugins: [CollectPreferredLanguage]
      requires: [problem_statement]
      provides: [programming_language]
      completionType: atLeastOnce
    - goal: Answer clarifying questions
      flow: QA
    - goal: Answer more clarifying questions
      flow: QA
"#
    }

    #[test]
    fn test_parse_flow_yaml() {
        let flow = Flow::from_yaml(interviewer_yaml()).unwrap();
        assert_eq!(flow.name(), "Interviewer");
        assert_eq!(flow.description(), "This flow is used to conduct an interview");
        assert_eq!(flow.steps().len(), 4);
        assert_eq!(flow.steps()[1].completion_type, CompletionType::AtLeastOnce);
        assert_eq!(flow.steps()[0].completion_type, CompletionType::Once);
        assert!(flow.steps()[2].is_reference());
        assert!(flow.validate().is_ok());
    }

    #[test]
    fn test_reference_names_are_distinct() {
        let flow = Flow::from_yaml(interviewer_yaml()).unwrap();
        assert_eq!(flow.reference_names(), vec!["QA"]);
    }

    #[test]
    fn test_defaults_applied() {
        let flow = Flow::from_yaml(
            r#"
metadata:
  name: QA
spec:
  steps:
    - goal: Answer the question
"#,
        )
        .unwrap();
        assert_eq!(flow.api_version, "flowpilot.dev/v1");
        assert_eq!(flow.kind, "Flow");
        assert_eq!(flow.description(), "");
        assert!(!flow.is_resolved());
    }

    #[test]
    fn test_parse_error_reports_path() {
        let err = Flow::from_yaml(
            r#"
metadata:
  name: QA
spec:
  steps:
    - goal: Answer
      completionType: sometimes
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("completionType"));
    }

    #[test]
    fn test_validate_rejects_bad_flows() {
        assert!(Flow::new("", "x").with_step(FlowStep::new("g")).validate().is_err());
        assert!(Flow::new("A", "x").validate().is_err());
        assert!(Flow::new("A", "x").with_step(FlowStep::new(" ")).validate().is_err());
        assert!(Flow::new("A", "x")
            .with_step(FlowStep::reference("delegate", "B").with_plugins(["P"]))
            .validate()
            .is_err());
        assert!(Flow::new("A", "x")
            .with_step(FlowStep::new("g"))
            .with_pattern("(unclosed")
            .validate()
            .is_err());
    }

    #[test]
    fn test_built_flow_serializes_as_resource() {
        let flow = Flow::new("Interviewer", "conducts an interview")
            .with_label("category", "hiring")
            .with_step(
                FlowStep::new("Prompt for a solution")
                    .with_plugins(["PromptSolution"])
                    .with_requires(["function_signature"])
                    .with_provides(["solution"])
                    .with_completion(CompletionType::AtLeastOnce),
            );
        assert!(flow.validate().is_ok());

        let yaml = serde_yaml::to_string(&flow).unwrap();
        assert!(yaml.contains("completionType: atLeastOnce"));
        assert!(yaml.contains("category: hiring"));

        let parsed = Flow::from_yaml(&yaml).unwrap();
        assert_eq!(parsed.metadata.labels.get("category").unwrap(), "hiring");
        let step = &parsed.steps()[0];
        assert_eq!(step.requires, vec!["function_signature"]);
        assert_eq!(step.provides, vec!["solution"]);
        assert_eq!(step.completion_type, CompletionType::AtLeastOnce);
        assert!(!step.is_reference());
    }

    #[test]
    fn test_build_references_binds_weak_handles() {
        let qa = Arc::new(Flow::new("QA", "answers").with_step(FlowStep::new("answer")));
        let interviewer = Arc::new(
            Flow::new("Interviewer", "interviews")
                .with_step(FlowStep::reference("ask", "QA")),
        );

        let mut flows = IndexMap::new();
        flows.insert("QA".to_string(), qa.clone());
        flows.insert("Interviewer".to_string(), interviewer.clone());

        interviewer.build_references(&flows).unwrap();
        let resolved = interviewer.referenced_flow("QA").unwrap();
        assert!(Arc::ptr_eq(&resolved, &qa));
        assert_eq!(interviewer.referenced_flows().len(), 1);
        assert!(interviewer.referenced_flow("Missing").is_none());
    }

    #[test]
    fn test_build_references_unresolved() {
        let flow = Flow::new("A", "a").with_step(FlowStep::reference("go", "B"));
        let flows: HashMap<String, Arc<Flow>> = HashMap::new();
        let err = flow.build_references(&flows).unwrap_err();
        assert!(matches!(err, FlowError::UnresolvedReference { ref reference, .. } if reference == "B"));
        assert!(!flow.is_resolved());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("interviewer.yaml");
        std::fs::write(&path, interviewer_yaml()).unwrap();

        let flow = Flow::from_file(&path).unwrap();
        assert_eq!(flow.name(), "Interviewer");

        let missing = Flow::from_file(dir.path().join("missing.yaml")).unwrap_err();
        assert!(matches!(missing, FlowError::Config(_)));
    }
}
