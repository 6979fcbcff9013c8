//! Describe a flow in detail (kubectl describe style)

use anyhow::Result;
use std::path::Path;

pub fn execute(flows_dir: &Path, name: &str) -> Result<()> {
    let catalog = super::load_catalog(flows_dir)?;
    let flow = catalog.get_flow(name).ok_or_else(|| {
        anyhow::anyhow!(
            "Flow '{}' not found. Available flows: {}",
            name,
            catalog.names().join(", ")
        )
    })?;

    println!("Name:         {}", flow.name());
    println!("API Version:  {}", flow.api_version);
    println!("Kind:         {}", flow.kind);
    println!("Description:  {}", flow.description());

    if !flow.metadata.labels.is_empty() {
        println!("Labels:");
        let mut labels: Vec<_> = flow.metadata.labels.iter().collect();
        labels.sort();
        for (k, v) in labels {
            println!("  {}: {}", k, v);
        }
    }

    if !flow.spec.patterns.is_empty() {
        println!("Patterns:     {}", flow.spec.patterns.join(", "));
    }

    println!("\nSteps:");
    for (index, step) in flow.steps().iter().enumerate() {
        println!("  {}. {}", index + 1, step.goal);
        if let Some(ref target) = step.flow {
            println!("     Delegates to: {}", target);
        }
        if !step.plugins.is_empty() {
            println!("     Plugins:      {}", step.plugins.join(", "));
        }
        if !step.requires.is_empty() {
            println!("     Requires:     {}", step.requires.join(", "));
        }
        if !step.provides.is_empty() {
            println!("     Provides:     {}", step.provides.join(", "));
        }
        println!("     Completion:   {:?}", step.completion_type);
    }

    let referenced = flow.referenced_flows();
    if !referenced.is_empty() {
        println!("\nReferenced Flows:");
        for target in referenced {
            println!("  {:<20} {}", target.name(), target.description());
        }
    }

    Ok(())
}
