pub mod classify;
pub mod completion;
pub mod describe;
pub mod get;
pub mod validate;

use anyhow::{Context, Result};
use flowpilot_router::FlowCatalog;
use std::path::Path;

/// Build the catalog from a flows directory
pub fn load_catalog(flows_dir: &Path) -> Result<FlowCatalog> {
    FlowCatalog::from_directory(flows_dir)
        .with_context(|| format!("Failed to build flow catalog from {}", flows_dir.display()))
}
