//! Named capabilities and the registry that resolves them.
//!
//! Every capability call "succeeds with a string": handlers convert their own
//! failures into descriptive text so the loop and the workers can treat all
//! calls uniformly. The only failure that escapes this layer is resolving a
//! name the registry does not know.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::artifacts::ArtifactStore;
use crate::error::SupervisorError;
use crate::io::config::SupervisorConfig;

pub mod exec;
pub mod files;
pub mod web;

pub use exec::ExecuteCode;
pub use files::{EditFile, ReadFile, WriteFile};
pub use web::{CommandWebProvider, SearchInternet, WebProvider, WebScrape};

/// A named operation a worker or the supervisor may invoke.
pub trait Capability: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    /// Run the capability. Never fails past this boundary.
    fn invoke(&self, args: &Value) -> String;
}

pub type CapabilityHandle = Arc<dyn Capability>;

/// Deserialize `args` for capability `name`, or describe why they are invalid.
pub(crate) fn parse_args<T: DeserializeOwned>(name: &str, args: &Value) -> Result<T, String> {
    serde_json::from_value(args.clone())
        .map_err(|err| format!("Error: invalid arguments for '{name}': {err}"))
}

/// Static name → handler map, built once per run.
#[derive(Clone, Default)]
pub struct CapabilityRegistry {
    capabilities: BTreeMap<String, CapabilityHandle>,
}

impl std::fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("capabilities", &self.list_available())
            .finish()
    }
}

impl CapabilityRegistry {
    /// Build from the union of capability groups. On a name clash the first
    /// registration wins.
    pub fn from_groups(groups: impl IntoIterator<Item = Vec<CapabilityHandle>>) -> Self {
        let mut capabilities = BTreeMap::new();
        for handle in groups.into_iter().flatten() {
            let name = handle.name().to_string();
            if capabilities.contains_key(&name) {
                warn!(capability = %name, "duplicate capability ignored");
                continue;
            }
            capabilities.insert(name, handle);
        }
        Self { capabilities }
    }

    /// The standard groups for one run: file operations over `store`,
    /// code execution, and search/scrape.
    pub fn standard(store: &ArtifactStore, config: &SupervisorConfig) -> Self {
        let provider: Arc<dyn WebProvider> = Arc::new(CommandWebProvider::from_config(&config.web));
        Self::from_groups([
            files::file_capabilities(store),
            exec::exec_capabilities(&config.exec),
            web::web_capabilities(provider),
        ])
    }

    pub fn get(&self, name: &str) -> Result<CapabilityHandle, SupervisorError> {
        self.capabilities
            .get(name)
            .cloned()
            .ok_or_else(|| SupervisorError::UnknownCapability(name.to_string()))
    }

    /// Resolve `names` in order, failing on the first unknown name.
    pub fn resolve<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Result<Vec<CapabilityHandle>, SupervisorError> {
        let handles = names
            .iter()
            .map(|name| self.get(name.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = handles.len(), "capabilities resolved");
        Ok(handles)
    }

    pub fn list_available(&self) -> BTreeSet<String> {
        self.capabilities.keys().cloned().collect()
    }
}
