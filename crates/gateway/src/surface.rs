//! Tool Surface assembly: one flat namespace projected from every loaded
//! module, collisions resolved first-registration-wins.

use std::collections::HashMap;

use serde_json::{json, Value};
use tracing::warn;

use secmesh_core::OperationSpec;

use crate::registry::RegistryResult;

#[derive(Clone)]
pub struct SurfaceEntry {
    pub public_name: String,
    pub operation: OperationSpec,
    pub origin_module: String,
}

#[derive(Debug, Clone)]
pub struct ExcludedOperation {
    pub public_name: String,
    pub origin_module: String,
    pub claimed_by: String,
}

/// Immutable, ordered projection of every loaded module's operations.
pub struct ToolSurface {
    entries: Vec<SurfaceEntry>,
    index: HashMap<String, usize>,
    excluded: Vec<ExcludedOperation>,
}

impl ToolSurface {
    pub fn get(&self, public_name: &str) -> Option<&SurfaceEntry> {
        self.index.get(public_name).map(|&i| &self.entries[i])
    }

    pub fn entries(&self) -> &[SurfaceEntry] {
        &self.entries
    }

    /// Operations excluded by name collision, in assembly order.
    pub fn excluded(&self) -> &[ExcludedOperation] {
        &self.excluded
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ordered tool listing for the calling agent.
    pub fn list_tools(&self) -> Vec<Value> {
        self.entries
            .iter()
            .map(|entry| {
                json!({
                    "name": entry.public_name,
                    "description": entry.operation.description,
                    "inputSchema": entry.operation.input_schema(),
                })
            })
            .collect()
    }
}

/// Project all loaded modules' operations into one namespace.
///
/// Iteration follows registry order (= activation-list order), which makes
/// collision resolution deterministic: the earlier module keeps the name,
/// the later operation is excluded and reported.
pub fn assemble(registry: &RegistryResult) -> ToolSurface {
    let mut entries: Vec<SurfaceEntry> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut excluded: Vec<ExcludedOperation> = Vec::new();

    for record in registry.loaded() {
        for operation in &record.operations {
            let public_name = operation.name.clone();
            if let Some(&claimed) = index.get(&public_name) {
                let claimed_by = entries[claimed].origin_module.clone();
                warn!(
                    name = %public_name,
                    module = %record.identifier,
                    claimed_by = %claimed_by,
                    "operation name collision, excluding later registration"
                );
                excluded.push(ExcludedOperation {
                    public_name,
                    origin_module: record.identifier.clone(),
                    claimed_by,
                });
                continue;
            }
            index.insert(public_name.clone(), entries.len());
            entries.push(SurfaceEntry {
                public_name,
                operation: operation.clone(),
                origin_module: record.identifier.clone(),
            });
        }
    }

    ToolSurface {
        entries,
        index,
        excluded,
    }
}
