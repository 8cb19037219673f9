use serde_json::Value;

use crate::error::ToolError;
use crate::types::{OperationSpec, ParamType};

/// Validate an argument object against an operation's declared parameters.
///
/// Required parameters must be present; present parameters must match their
/// declared primitive type. Undeclared keys are passed through untouched.
pub fn validate_args(spec: &OperationSpec, args: &Value) -> Result<(), ToolError> {
    let map = args.as_object().ok_or_else(|| {
        ToolError::InvalidArgument(format!(
            "arguments for '{}' must be a JSON object",
            spec.name
        ))
    })?;

    for param in &spec.params {
        match map.get(&param.name) {
            None | Some(Value::Null) => {
                if param.required {
                    return Err(ToolError::InvalidArgument(format!(
                        "missing required argument '{}' for '{}'",
                        param.name, spec.name
                    )));
                }
            }
            Some(value) => {
                if !matches_type(value, param.param_type) {
                    return Err(ToolError::InvalidArgument(format!(
                        "argument '{}' for '{}' must be of type {}",
                        param.name,
                        spec.name,
                        param.param_type.json_name()
                    )));
                }
            }
        }
    }

    Ok(())
}

fn matches_type(value: &Value, param_type: ParamType) -> bool {
    match param_type {
        ParamType::String => value.is_string(),
        ParamType::Integer => value.is_i64() || value.is_u64(),
        ParamType::Number => value.is_number(),
        ParamType::Boolean => value.is_boolean(),
        ParamType::Object => value.is_object(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ExecutionKind, ParamSpec};
    use serde_json::json;

    fn spec() -> OperationSpec {
        OperationSpec::new(
            "search_udm",
            "UDM event search",
            ExecutionKind::Local,
            vec![
                ParamSpec::required("query", ParamType::String, "UDM query"),
                ParamSpec::optional("hours_back", ParamType::Integer, "lookback window"),
            ],
        )
    }

    #[test]
    fn accepts_valid_arguments() {
        let args = json!({"query": "metadata.event_type = \"NETWORK_DNS\"", "hours_back": 12});
        assert!(validate_args(&spec(), &args).is_ok());
    }

    #[test]
    fn accepts_omitted_optional() {
        assert!(validate_args(&spec(), &json!({"query": "x"})).is_ok());
    }

    #[test]
    fn rejects_missing_required() {
        let err = validate_args(&spec(), &json!({"hours_back": 2})).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgument(_)));
    }

    #[test]
    fn rejects_wrong_type() {
        let err = validate_args(&spec(), &json!({"query": 42})).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgument(_)));
    }

    #[test]
    fn rejects_non_object_arguments() {
        let err = validate_args(&spec(), &json!("query")).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgument(_)));
    }

    #[test]
    fn null_counts_as_absent() {
        let err = validate_args(&spec(), &json!({"query": null})).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgument(_)));
        assert!(validate_args(&spec(), &json!({"query": "x", "hours_back": null})).is_ok());
    }

    #[test]
    fn ignores_undeclared_keys() {
        let args = json!({"query": "x", "project_id": "demo"});
        assert!(validate_args(&spec(), &args).is_ok());
    }
}
