use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{ErrorKind, ToolError};

/// Whether an operation is serviced by a server-hosted implementation or a
/// direct client-side API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionKind {
    Remote,
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Object,
}

impl ParamType {
    pub fn json_name(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Object => "object",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub param_type: ParamType,
    pub required: bool,
    pub description: String,
}

impl ParamSpec {
    pub fn required(name: &str, param_type: ParamType, description: &str) -> Self {
        Self {
            name: name.to_string(),
            param_type,
            required: true,
            description: description.to_string(),
        }
    }

    pub fn optional(name: &str, param_type: ParamType, description: &str) -> Self {
        Self {
            name: name.to_string(),
            param_type,
            required: false,
            description: description.to_string(),
        }
    }
}

/// Declares that an operation participates in a logical capability.
///
/// `step` orders the operation within the capability's plan. `output_arg`
/// names the argument of the following step that receives this step's
/// payload; the final step leaves it unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityBinding {
    pub logical: String,
    pub step: usize,
    pub output_arg: Option<String>,
}

impl CapabilityBinding {
    pub fn step(logical: &str, step: usize, output_arg: Option<&str>) -> Self {
        Self {
            logical: logical.to_string(),
            step,
            output_arg: output_arg.map(str::to_string),
        }
    }

    pub fn single(logical: &str) -> Self {
        Self::step(logical, 0, None)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationSpec {
    pub name: String,
    pub description: String,
    pub params: Vec<ParamSpec>,
    pub kind: ExecutionKind,
    pub capability: Option<CapabilityBinding>,
}

impl OperationSpec {
    pub fn new(name: &str, description: &str, kind: ExecutionKind, params: Vec<ParamSpec>) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            params,
            kind,
            capability: None,
        }
    }

    pub fn with_capability(mut self, binding: CapabilityBinding) -> Self {
        self.capability = Some(binding);
        self
    }

    /// Project the declared parameters as a JSON-Schema object.
    pub fn input_schema(&self) -> Value {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();
        for param in &self.params {
            properties.insert(
                param.name.clone(),
                json!({
                    "type": param.param_type.json_name(),
                    "description": param.description,
                }),
            );
            if param.required {
                required.push(Value::String(param.name.clone()));
            }
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// Load-time availability probe result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Health {
    Loaded,
    Failed(String),
}

/// Activation state of a module, immutable after the load phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleState {
    Unloaded,
    Loaded,
    Failed,
}

/// Uniform per-call envelope returned to callers regardless of which module
/// serviced the call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_module: Option<String>,
}

impl InvocationResult {
    pub fn ok(payload: Value, origin_module: &str) -> Self {
        Self {
            success: true,
            payload: Some(payload),
            error_kind: None,
            error: None,
            origin_module: Some(origin_module.to_string()),
        }
    }

    pub fn failure(err: &ToolError, origin_module: Option<&str>) -> Self {
        Self {
            success: false,
            payload: None,
            error_kind: Some(err.kind()),
            error: Some(err.to_string()),
            origin_module: origin_module.map(str::to_string),
        }
    }
}
