//! Invocation Adapter: executes a resolved plan under a per-call timeout
//! and returns the uniform envelope whatever the outcome.

use serde_json::{Map, Value};
use tokio::time::{timeout, Duration};
use tracing::{error, info, warn};

use secmesh_core::{
    validate_args, CancelFlag, InvocationContext, InvocationResult, ToolError,
};

use crate::registry::RegistryResult;
use crate::surface::SurfaceEntry;

pub struct InvocationAdapter {
    timeout_ms: u64,
}

impl InvocationAdapter {
    pub fn new(timeout_ms: u64) -> Self {
        Self { timeout_ms }
    }

    /// Run `steps` in order, piping each step's payload into the next step's
    /// arguments where the operation declares an output binding. The caller's
    /// arguments are re-applied at every step.
    pub async fn invoke(
        &self,
        steps: &[SurfaceEntry],
        registry: &RegistryResult,
        arguments: &Value,
        cancel: &CancelFlag,
    ) -> InvocationResult {
        let Some(first) = steps.first() else {
            return InvocationResult::failure(
                &ToolError::Internal("empty invocation plan".to_string()),
                None,
            );
        };
        let origin = first.origin_module.clone();

        let ctx = InvocationContext::new(self.timeout_ms);
        info!(
            invocation = %ctx.invocation_id,
            module = %origin,
            steps = steps.len(),
            "invoking plan"
        );

        let run = run_plan(steps, registry, arguments, cancel, &ctx);
        match timeout(Duration::from_millis(self.timeout_ms), run).await {
            Ok(Ok((payload, module))) => InvocationResult::ok(payload, &module),
            Ok(Err((err, module))) => {
                warn!(invocation = %ctx.invocation_id, error = %err, "invocation failed");
                InvocationResult::failure(&err, module.as_deref())
            }
            Err(_) => {
                warn!(
                    invocation = %ctx.invocation_id,
                    timeout_ms = self.timeout_ms,
                    "invocation timed out"
                );
                InvocationResult::failure(&ToolError::Timeout, Some(&origin))
            }
        }
    }
}

type StepFailure = (ToolError, Option<String>);

async fn run_plan(
    steps: &[SurfaceEntry],
    registry: &RegistryResult,
    arguments: &Value,
    cancel: &CancelFlag,
    ctx: &InvocationContext,
) -> Result<(Value, String), StepFailure> {
    let caller_args = match arguments {
        Value::Null => Map::new(),
        Value::Object(map) => map.clone(),
        _ => {
            return Err((
                ToolError::InvalidArgument("arguments must be a JSON object".to_string()),
                None,
            ))
        }
    };

    let mut current_args = Value::Object(caller_args.clone());
    let mut payload = Value::Null;
    let mut origin = String::new();

    for (index, entry) in steps.iter().enumerate() {
        if cancel.is_cancelled() {
            return Err((ToolError::Cancelled, Some(entry.origin_module.clone())));
        }

        validate_args(&entry.operation, &current_args)
            .map_err(|err| (err, Some(entry.origin_module.clone())))?;

        let module = registry.module(&entry.origin_module).ok_or_else(|| {
            (
                ToolError::Internal(format!(
                    "module '{}' missing from registry for step {index}",
                    entry.origin_module
                )),
                Some(entry.origin_module.clone()),
            )
        })?;

        payload = module
            .call(ctx, &entry.operation.name, &current_args)
            .await
            .map_err(|err| (err, Some(entry.origin_module.clone())))?;
        origin = entry.origin_module.clone();

        let output_arg = entry
            .operation
            .capability
            .as_ref()
            .and_then(|b| b.output_arg.as_deref());
        if let (Some(output_arg), true) = (output_arg, index + 1 < steps.len()) {
            if payload.is_null() {
                error!(
                    invocation = %ctx.invocation_id,
                    operation = %entry.operation.name,
                    step = index,
                    "plan step produced no output to feed the next step"
                );
                return Err((
                    ToolError::Internal(format!(
                        "step {index} ('{}') produced no output for '{output_arg}'",
                        entry.operation.name
                    )),
                    Some(entry.origin_module.clone()),
                ));
            }
            let mut next = caller_args.clone();
            next.insert(output_arg.to_string(), payload.clone());
            current_args = Value::Object(next);
        }
    }

    Ok((payload, origin))
}
