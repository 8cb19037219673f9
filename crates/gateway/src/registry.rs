//! Module Registry: activation-list driven loading with partial-failure
//! tolerance.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{info, warn};

use secmesh_core::{CapabilityModule, Health, ModuleState, OperationSpec, ToolError};

pub struct ModuleRecord {
    pub identifier: String,
    pub state: ModuleState,
    pub failure_reason: Option<String>,
    pub operations: Vec<OperationSpec>,
    module: Option<Arc<dyn CapabilityModule>>,
}

impl ModuleRecord {
    fn loaded(
        identifier: String,
        module: Arc<dyn CapabilityModule>,
        operations: Vec<OperationSpec>,
    ) -> Self {
        Self {
            identifier,
            state: ModuleState::Loaded,
            failure_reason: None,
            operations,
            module: Some(module),
        }
    }

    fn failed(identifier: String, reason: String) -> Self {
        Self {
            identifier,
            state: ModuleState::Failed,
            failure_reason: Some(reason),
            operations: Vec::new(),
            module: None,
        }
    }
}

/// Outcome of one load pass over an activation list, in activation order.
/// Immutable once returned; reloading means building a fresh registry.
pub struct RegistryResult {
    records: Vec<ModuleRecord>,
}

impl RegistryResult {
    pub fn records(&self) -> &[ModuleRecord] {
        &self.records
    }

    pub fn loaded(&self) -> impl Iterator<Item = &ModuleRecord> {
        self.records
            .iter()
            .filter(|r| r.state == ModuleState::Loaded)
    }

    pub fn failed(&self) -> impl Iterator<Item = &ModuleRecord> {
        self.records
            .iter()
            .filter(|r| r.state == ModuleState::Failed)
    }

    pub fn module(&self, identifier: &str) -> Option<Arc<dyn CapabilityModule>> {
        self.records
            .iter()
            .find(|r| r.identifier == identifier)
            .and_then(|r| r.module.clone())
    }

    pub fn state(&self, identifier: &str) -> Option<ModuleState> {
        self.records
            .iter()
            .find(|r| r.identifier == identifier)
            .map(|r| r.state)
    }

    /// Load report for diagnostics and the serving layer's startup log.
    pub fn report(&self) -> Value {
        json!({
            "loaded": self.loaded().map(|r| r.identifier.clone()).collect::<Vec<_>>(),
            "failed": self
                .failed()
                .map(|r| json!({
                    "identifier": r.identifier,
                    "reason": r.failure_reason,
                }))
                .collect::<Vec<_>>(),
        })
    }
}

/// Load every module named in `activation_list`, in order.
///
/// A module that fails to construct or reports an unhealthy probe is
/// recorded and skipped; loading always continues for the remaining
/// identifiers.
pub fn load<F>(activation_list: &[String], factory: F) -> RegistryResult
where
    F: Fn(&str) -> Result<Arc<dyn CapabilityModule>, ToolError>,
{
    let mut records = Vec::with_capacity(activation_list.len());
    let mut seen: HashSet<&str> = HashSet::new();

    for identifier in activation_list {
        if !seen.insert(identifier.as_str()) {
            warn!(module = %identifier, "duplicate module identifier in activation list");
            records.push(ModuleRecord::failed(
                identifier.clone(),
                "duplicate module identifier".to_string(),
            ));
            continue;
        }

        match factory(identifier) {
            Err(err) => {
                warn!(module = %identifier, error = %err, "module failed to construct");
                records.push(ModuleRecord::failed(identifier.clone(), err.to_string()));
            }
            Ok(module) => match module.health() {
                Health::Failed(reason) => {
                    warn!(module = %identifier, reason = %reason, "module unhealthy at load");
                    records.push(ModuleRecord::failed(identifier.clone(), reason));
                }
                Health::Loaded => {
                    let operations = module.describe();
                    info!(
                        module = %identifier,
                        operations = operations.len(),
                        "module loaded"
                    );
                    records.push(ModuleRecord::loaded(identifier.clone(), module, operations));
                }
            },
        }
    }

    RegistryResult { records }
}
