use anyhow::Result;
use std::path::Path;

/// List flows (kubectl-style: get flows)
pub fn execute(flows_dir: &Path, resource_type: &str, output: &str) -> Result<()> {
    match resource_type.to_lowercase().as_str() {
        "flow" | "flows" => {}
        other => anyhow::bail!("Unknown resource type: {}", other),
    }

    let catalog = super::load_catalog(flows_dir)?;
    let flows = catalog.get_flows();

    match output {
        "json" | "yaml" => {
            let items: Vec<&flowpilot_core::Flow> = flows.iter().map(|f| f.as_ref()).collect();
            let list = serde_json::json!({
                "apiVersion": "flowpilot.dev/v1",
                "kind": "FlowList",
                "items": items,
            });
            if output == "json" {
                println!("{}", serde_json::to_string_pretty(&list)?);
            } else {
                print!("{}", serde_yaml::to_string(&list)?);
            }
        }
        "name" => {
            for flow in &flows {
                println!("flow/{}", flow.name());
            }
        }
        _ => {
            println!("{:<20} {:<6} {:<30} {}", "NAME", "STEPS", "REFERENCES", "DESCRIPTION");
            for flow in &flows {
                let references = flow.reference_names().join(",");
                println!(
                    "{:<20} {:<6} {:<30} {}",
                    flow.name(),
                    flow.steps().len(),
                    if references.is_empty() { "<none>".to_string() } else { references },
                    flow.description()
                );
            }
        }
    }

    Ok(())
}
