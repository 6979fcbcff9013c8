//! FlowCatalog - Holds every known Flow and their resolved references
//!
//! Construction is two-phase because flows may reference each other,
//! including cyclically and themselves:
//! - `FlowCatalogBuilder` registers flows by unique name (phase 1)
//! - `FlowCatalogBuilder::build` hands every flow a resolver bound to the
//!   complete name map so it can bind its references (phase 2)
//!
//! The resulting `FlowCatalog` is immutable, so lookups need no locking.

use std::path::Path;
use std::sync::Arc;

use flowpilot_core::{Flow, FlowError, FlowResolver, FlowResult};
use indexmap::IndexMap;
use tracing::{debug, info};

/// Phase 1 of catalog construction: collects flow definitions by name
#[derive(Debug, Default)]
pub struct FlowCatalogBuilder {
    /// Flows by name, in registration order
    flows: IndexMap<String, Arc<Flow>>,
}

impl FlowCatalogBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a flow under its name.
    ///
    /// Fails with `DuplicateName` if the name is taken, or `Config` if the
    /// flow is invalid; the builder is unchanged on failure.
    pub fn register_flow(&mut self, flow: Flow) -> FlowResult<()> {
        flow.validate().map_err(|e| {
            FlowError::config(format!("Flow validation failed for '{}': {}", flow.name(), e))
        })?;

        let name = flow.name().to_string();
        if self.flows.contains_key(&name) {
            return Err(FlowError::DuplicateName(name));
        }

        debug!("Registered flow: {}", name);
        self.flows.insert(name, Arc::new(flow));
        Ok(())
    }

    /// Builder-style registration
    pub fn with_flow(mut self, flow: Flow) -> FlowResult<Self> {
        self.register_flow(flow)?;
        Ok(self)
    }

    /// Load and register a single flow file
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> FlowResult<String> {
        let path = path.as_ref();
        let flow = Flow::from_file(path)?;
        let name = flow.name().to_string();

        self.register_flow(flow).map_err(|e| match e {
            FlowError::DuplicateName(name) => FlowError::config(format!(
                "Flow '{}' in {} is already registered",
                name,
                path.display()
            )),
            other => other,
        })?;

        Ok(name)
    }

    /// Load every `.yaml`/`.yml` file in a directory.
    ///
    /// Any unreadable, malformed, invalid or duplicate flow fails the whole
    /// load; a partial set of flows is never accepted.
    pub fn load_directory(&mut self, dir: impl AsRef<Path>) -> FlowResult<usize> {
        let dir = dir.as_ref();

        if !dir.is_dir() {
            return Err(FlowError::config(format!(
                "Flows directory does not exist: {}",
                dir.display()
            )));
        }

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().map_or(false, |e| e == "yaml" || e == "yml") {
                paths.push(path);
            }
        }
        // Directory order is platform dependent
        paths.sort();

        let mut staged = Self::new();
        for path in &paths {
            let name = staged.load_file(path)?;
            if self.flows.contains_key(&name) {
                return Err(FlowError::config(format!(
                    "Flow '{}' in {} is already registered",
                    name,
                    path.display()
                )));
            }
            debug!("Loaded flow: {} from {}", name, path.display());
        }

        let loaded = staged.flows.len();
        self.flows.extend(staged.flows);

        info!("Loaded {} flows from {}", loaded, dir.display());
        Ok(loaded)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.flows.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    /// Phase 2: resolve every flow's references against the full set.
    ///
    /// Fails if any flow references a name that was never registered.
    pub fn build(self) -> FlowResult<FlowCatalog> {
        for flow in self.flows.values() {
            flow.build_references(&self.flows)?;
        }

        info!("Built flow catalog with {} flows", self.flows.len());
        Ok(FlowCatalog { flows: self.flows })
    }
}

/// Immutable catalog of fully resolved flows
#[derive(Debug, Default)]
pub struct FlowCatalog {
    flows: IndexMap<String, Arc<Flow>>,
}

impl FlowCatalog {
    /// Start a two-phase build
    pub fn builder() -> FlowCatalogBuilder {
        FlowCatalogBuilder::new()
    }

    /// Register all flows, then resolve their references
    pub fn from_flows(flows: impl IntoIterator<Item = Flow>) -> FlowResult<Self> {
        let mut builder = FlowCatalogBuilder::new();
        for flow in flows {
            builder.register_flow(flow)?;
        }
        builder.build()
    }

    /// Load a flows directory and build the catalog
    pub fn from_directory(dir: impl AsRef<Path>) -> FlowResult<Self> {
        let mut builder = FlowCatalogBuilder::new();
        builder.load_directory(dir)?;
        builder.build()
    }

    /// Get a flow by name
    pub fn get_flow(&self, name: &str) -> Option<Arc<Flow>> {
        self.flows.get(name).cloned()
    }

    /// All flows, in registration order
    pub fn get_flows(&self) -> Vec<Arc<Flow>> {
        self.flows.values().cloned().collect()
    }

    /// Flow names, in registration order
    pub fn names(&self) -> Vec<&str> {
        self.flows.keys().map(|s| s.as_str()).collect()
    }

    /// Flow name to description, in registration order
    pub fn descriptions(&self) -> IndexMap<String, String> {
        self.flows
            .iter()
            .map(|(name, flow)| (name.clone(), flow.description().to_string()))
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.flows.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }
}

impl FlowResolver for FlowCatalog {
    fn resolve(&self, name: &str) -> Option<Arc<Flow>> {
        self.get_flow(name)
    }
}
