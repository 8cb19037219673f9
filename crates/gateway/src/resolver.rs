//! Dispatch Resolver: pure selection of the plan servicing a logical
//! capability. Never invokes anything, so callers can introspect what
//! would run.

use secmesh_core::{ExecutionKind, ToolError};

use crate::surface::{SurfaceEntry, ToolSurface};

/// Ordered sequence of operations servicing one logical capability.
/// All steps come from the same module; remote plans may span several
/// steps, local plans hold exactly one.
#[derive(Clone)]
pub struct Plan {
    pub logical: String,
    pub kind: ExecutionKind,
    pub origin_module: String,
    pub steps: Vec<SurfaceEntry>,
}

/// Select the implementation of `logical` from the surface.
///
/// Candidates are grouped by (origin module, execution kind) in surface
/// order. Remote is preferred over Local; within a kind the earliest
/// registered module wins. Callers control override order through the
/// activation list.
pub fn resolve(logical: &str, surface: &ToolSurface) -> Result<Plan, ToolError> {
    let mut groups: Vec<(String, ExecutionKind, Vec<SurfaceEntry>)> = Vec::new();

    for entry in surface.entries() {
        let Some(binding) = &entry.operation.capability else {
            continue;
        };
        if binding.logical != logical {
            continue;
        }
        let kind = entry.operation.kind;
        match groups
            .iter_mut()
            .find(|(module, k, _)| module == &entry.origin_module && *k == kind)
        {
            Some((_, _, steps)) => steps.push(entry.clone()),
            None => groups.push((entry.origin_module.clone(), kind, vec![entry.clone()])),
        }
    }

    if groups.is_empty() {
        return Err(ToolError::NotAvailable(format!(
            "no implementation available for capability '{logical}'"
        )));
    }

    let (origin_module, kind, mut steps) = groups
        .iter()
        .find(|(_, kind, _)| *kind == ExecutionKind::Remote)
        .unwrap_or(&groups[0])
        .clone();

    steps.sort_by_key(|entry| {
        entry
            .operation
            .capability
            .as_ref()
            .map(|b| b.step)
            .unwrap_or(usize::MAX)
    });

    for (expected, entry) in steps.iter().enumerate() {
        let declared = entry
            .operation
            .capability
            .as_ref()
            .map(|b| b.step)
            .unwrap_or(usize::MAX);
        if declared != expected {
            return Err(ToolError::Internal(format!(
                "capability '{logical}' of module '{origin_module}' declares a broken step \
                 sequence: expected step {expected}, found {declared}"
            )));
        }
    }

    Ok(Plan {
        logical: logical.to_string(),
        kind,
        origin_module,
        steps,
    })
}
