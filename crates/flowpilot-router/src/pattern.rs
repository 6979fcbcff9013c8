//! PatternClassifier - Deterministic intent classification from flow patterns
//!
//! Each flow may declare `spec.patterns`; the first flow (in catalog order)
//! with a pattern matching the message wins, otherwise the request's default
//! flow is returned. Useful offline, in tests, and as a cheap first pass in
//! front of a model-backed classifier.

use async_trait::async_trait;
use flowpilot_core::{FlowError, FlowResult, IntentClassifier, IntentRequest};
use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::catalog::FlowCatalog;

/// Classifier matching messages against per-flow regex patterns
#[derive(Debug, Default)]
pub struct PatternClassifier {
    /// Flow name and its compiled patterns, in catalog order
    rules: Vec<(String, Vec<Regex>)>,
}

impl PatternClassifier {
    /// Create a classifier with no rules; every message gets the default flow
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile the patterns of every flow in the catalog
    pub fn from_catalog(catalog: &FlowCatalog) -> FlowResult<Self> {
        let mut classifier = Self::new();
        for flow in catalog.get_flows() {
            if flow.spec.patterns.is_empty() {
                continue;
            }
            classifier = classifier.with_rule(flow.name(), flow.spec.patterns.iter())?;
        }
        Ok(classifier)
    }

    /// Add a rule routing matches of any of `patterns` to `flow`
    pub fn with_rule<I, S>(mut self, flow: impl Into<String>, patterns: I) -> FlowResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let flow = flow.into();
        let compiled = patterns
            .into_iter()
            .map(|p| {
                RegexBuilder::new(p.as_ref())
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| {
                        FlowError::config(format!(
                            "Invalid pattern '{}' in flow {}: {}",
                            p.as_ref(),
                            flow,
                            e
                        ))
                    })
            })
            .collect::<FlowResult<Vec<_>>>()?;

        self.rules.push((flow, compiled));
        Ok(self)
    }

    /// Number of flows with at least one pattern
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

#[async_trait]
impl IntentClassifier for PatternClassifier {
    fn name(&self) -> &str {
        "pattern"
    }

    async fn classify(&self, request: &IntentRequest) -> FlowResult<String> {
        let matched = self.rules.iter().find(|(flow, patterns)| {
            request.is_candidate(flow) && patterns.iter().any(|re| re.is_match(&request.message))
        });

        match matched {
            Some((flow, _)) => {
                debug!("Message matched patterns of flow {}", flow);
                Ok(flow.clone())
            }
            None => {
                debug!("No pattern matched, using default flow {}", request.default_flow);
                Ok(request.default_flow.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowpilot_core::{Flow, FlowStep, RouterConfig};
    use indexmap::IndexMap;

    fn request(message: &str) -> IntentRequest {
        let config = RouterConfig::default();
        let mut descriptions = IndexMap::new();
        descriptions.insert("QA".to_string(), "answers questions".to_string());
        descriptions.insert("Interviewer".to_string(), "conducts an interview".to_string());

        IntentRequest {
            message: message.to_string(),
            delimiter: config.delimiter,
            examples: config.examples,
            descriptions,
            default_flow: config.default_flow,
            template: config.prompt_template,
        }
    }

    #[tokio::test]
    async fn test_matches_case_insensitively() {
        let classifier = PatternClassifier::new()
            .with_rule("Interviewer", ["interview", "screen"])
            .unwrap();

        assert_eq!(
            classifier.classify(&request("Let's start the phone SCREEN")).await.unwrap(),
            "Interviewer"
        );
    }

    #[tokio::test]
    async fn test_falls_back_to_default() {
        let classifier = PatternClassifier::new()
            .with_rule("Interviewer", ["interview"])
            .unwrap();

        assert_eq!(
            classifier
                .classify(&request("What's the longest river in the world"))
                .await
                .unwrap(),
            "QA"
        );
    }

    #[tokio::test]
    async fn test_skips_rules_for_non_candidates() {
        let classifier = PatternClassifier::new()
            .with_rule("Billing", ["refund"])
            .unwrap();

        assert_eq!(classifier.classify(&request("refund please")).await.unwrap(), "QA");
    }

    #[test]
    fn test_invalid_pattern() {
        let err = PatternClassifier::new().with_rule("QA", ["(oops"]).unwrap_err();
        assert!(matches!(err, FlowError::Config(_)));
    }

    #[test]
    fn test_from_catalog() {
        let catalog = FlowCatalog::from_flows(vec![
            Flow::new("QA", "answers questions").with_step(FlowStep::new("answer")),
            Flow::new("Interviewer", "conducts an interview")
                .with_step(FlowStep::new("interview"))
                .with_pattern("interview")
                .with_pattern(r"phone\s+screen"),
        ])
        .unwrap();

        let classifier = PatternClassifier::from_catalog(&catalog).unwrap();
        assert_eq!(classifier.rule_count(), 1);
    }
}
