//! Tool-surface composition layer: module loading, namespace assembly,
//! remote/local dispatch resolution, and the uniform invocation envelope.

pub mod adapter;
pub mod registry;
pub mod resolver;
pub mod surface;

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

pub use adapter::InvocationAdapter;
pub use registry::{load, ModuleRecord, RegistryResult};
pub use resolver::{resolve, Plan};
pub use surface::{assemble, ExcludedOperation, SurfaceEntry, ToolSurface};

use secmesh_core::{CancelFlag, CapabilityModule, InvocationResult, ToolError};

/// Published snapshot of one load pass: the registry, the assembled
/// surface, and the invocation adapter.
///
/// Construction runs the whole load phase before anything is visible;
/// afterwards the snapshot is immutable and safe to query from any number
/// of concurrent invocations. Changing the activated set means building a
/// new `Gateway` in a new process.
pub struct Gateway {
    registry: Arc<RegistryResult>,
    surface: Arc<ToolSurface>,
    adapter: InvocationAdapter,
}

impl Gateway {
    pub fn new<F>(activation_list: &[String], factory: F, timeout_ms: u64) -> Self
    where
        F: Fn(&str) -> Result<Arc<dyn CapabilityModule>, ToolError>,
    {
        let registry = registry::load(activation_list, factory);
        let surface = surface::assemble(&registry);
        info!(
            modules = registry.loaded().count(),
            failed = registry.failed().count(),
            tools = surface.len(),
            excluded = surface.excluded().len(),
            "tool surface published"
        );
        Self {
            registry: Arc::new(registry),
            surface: Arc::new(surface),
            adapter: InvocationAdapter::new(timeout_ms),
        }
    }

    pub fn registry(&self) -> &RegistryResult {
        &self.registry
    }

    pub fn surface(&self) -> &ToolSurface {
        &self.surface
    }

    pub fn list_tools(&self) -> Vec<Value> {
        self.surface.list_tools()
    }

    pub fn load_report(&self) -> Value {
        self.registry.report()
    }

    /// Select, without invoking, the plan that would service `logical`.
    pub fn resolve(&self, logical: &str) -> Result<Plan, ToolError> {
        resolver::resolve(logical, &self.surface)
    }

    /// Invoke one published operation by public name.
    pub async fn call_tool(
        &self,
        public_name: &str,
        arguments: &Value,
        cancel: &CancelFlag,
    ) -> InvocationResult {
        match self.surface.get(public_name) {
            None => InvocationResult::failure(
                &ToolError::NotAvailable(format!("no tool named '{public_name}'")),
                None,
            ),
            Some(entry) => {
                let steps = [entry.clone()];
                self.adapter
                    .invoke(&steps, &self.registry, arguments, cancel)
                    .await
            }
        }
    }

    /// Resolve and invoke a logical capability.
    pub async fn call_capability(
        &self,
        logical: &str,
        arguments: &Value,
        cancel: &CancelFlag,
    ) -> InvocationResult {
        match self.resolve(logical) {
            Err(err) => InvocationResult::failure(&err, None),
            Ok(plan) => {
                self.adapter
                    .invoke(&plan.steps, &self.registry, arguments, cancel)
                    .await
            }
        }
    }
}
