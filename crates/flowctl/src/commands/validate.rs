//! Validate a flows directory (loads, validates and resolves every flow)

use anyhow::Result;
use std::path::Path;

/// Build the catalog and print a summary line per flow
pub fn execute(flows_dir: &Path) -> Result<()> {
    let catalog = super::load_catalog(flows_dir)?;

    for flow in catalog.get_flows() {
        let references = flow.reference_names();
        if references.is_empty() {
            println!("flow/{} ({} steps)", flow.name(), flow.steps().len());
        } else {
            println!(
                "flow/{} ({} steps) -> {}",
                flow.name(),
                flow.steps().len(),
                references.join(", ")
            );
        }
    }

    println!(
        "\n{} flows valid in {}",
        catalog.len(),
        flows_dir.display()
    );
    Ok(())
}
