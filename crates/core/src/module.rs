use async_trait::async_trait;
use serde_json::Value;

use crate::context::InvocationContext;
use crate::error::ToolError;
use crate::types::{Health, OperationSpec};

/// A self-contained unit implementing named operations against one upstream
/// security platform.
///
/// Modules are stateless aside from a held client handle; `describe` and
/// `health` are consulted once at load time, `call` per invocation. The
/// surface guarantees `call` only receives declared operation names.
#[async_trait]
pub trait CapabilityModule: Send + Sync {
    fn identifier(&self) -> &'static str;

    fn describe(&self) -> Vec<OperationSpec>;

    fn health(&self) -> Health;

    async fn call(
        &self,
        ctx: &InvocationContext,
        operation: &str,
        args: &Value,
    ) -> Result<Value, ToolError>;
}
