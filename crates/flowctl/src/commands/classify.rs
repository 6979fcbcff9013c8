//! Classify a message offline using the flows' patterns

use anyhow::{Context, Result};
use flowpilot_core::RouterConfig;
use flowpilot_router::{CancellationToken, FlowRouter, PatternClassifier};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

pub async fn execute(flows_dir: &Path, message: &str, config: Option<&Path>) -> Result<()> {
    let catalog = Arc::new(super::load_catalog(flows_dir)?);

    let config = match config {
        Some(path) => RouterConfig::from_file(path)
            .with_context(|| format!("Failed to load router config {}", path.display()))?,
        None => {
            // Built-in examples only make sense for flows this catalog has
            let mut config = RouterConfig::default();
            config.examples.retain(|e| catalog.contains(&e.flow));
            config
        }
    };

    let classifier = Arc::new(PatternClassifier::from_catalog(&catalog)?);
    debug!(
        "Classifying with {} pattern rules across {} flows",
        classifier.rule_count(),
        catalog.len()
    );
    let router = FlowRouter::new(catalog, classifier, config)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("Interrupted, cancelling classification");
            on_interrupt.cancel();
        }
    });

    let flow = router.classify_intent(message, &cancel).await?;
    println!("{}", flow);
    Ok(())
}
