//! Server-hosted SIEM module.
//!
//! Mirrors the direct client's natural-language search as a two-step remote
//! workflow: translate the query on the server, then execute it there. The
//! translate step's payload feeds the search step's `query` argument.

use async_trait::async_trait;
use serde_json::{json, Value};

use secmesh_core::{
    CapabilityBinding, CapabilityModule, ExecutionKind, Health, InvocationContext, OperationSpec,
    ParamSpec, ParamType, ToolError,
};

use crate::args::{int_arg_or, str_arg};
use crate::http::{Auth, UpstreamClient};

pub struct SiemRemoteModule {
    http: UpstreamClient,
    token: Option<String>,
}

impl SiemRemoteModule {
    pub fn from_env() -> Result<Self, ToolError> {
        let base_url = std::env::var("SIEM_REMOTE_URL").map_err(|_| {
            ToolError::NotAvailable("SIEM_REMOTE_URL not configured".to_string())
        })?;
        Ok(Self {
            http: UpstreamClient::new(base_url),
            token: std::env::var("SIEM_REMOTE_TOKEN").ok(),
        })
    }

    fn auth(&self) -> Result<Auth<'_>, ToolError> {
        match &self.token {
            Some(token) => Ok(Auth::Bearer(token)),
            None => Err(ToolError::UpstreamRejected(
                "SIEM_REMOTE_TOKEN not configured".to_string(),
            )),
        }
    }

    async fn translate_udm_query(&self, args: &Value) -> Result<Value, ToolError> {
        let text = str_arg(args, "text")?;
        let response = self
            .http
            .post("/tools/translate", &json!({"text": text}), self.auth()?)
            .await?;
        let query = response
            .get("query")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ToolError::UpstreamUnavailable("translation response missing 'query'".to_string())
            })?;
        Ok(Value::String(query.to_string()))
    }

    async fn run_udm_search(&self, args: &Value) -> Result<Value, ToolError> {
        let body = json!({
            "query": str_arg(args, "query")?,
            "hours_back": int_arg_or(args, "hours_back", 24),
            "max_events": int_arg_or(args, "max_events", 100),
        });
        self.http.post("/tools/search", &body, self.auth()?).await
    }
}

#[async_trait]
impl CapabilityModule for SiemRemoteModule {
    fn identifier(&self) -> &'static str {
        "siem-remote"
    }

    fn describe(&self) -> Vec<OperationSpec> {
        vec![
            OperationSpec::new(
                "translate_udm_query",
                "Translate a natural-language query into a UDM query server-side",
                ExecutionKind::Remote,
                vec![ParamSpec::required(
                    "text",
                    ParamType::String,
                    "Natural-language description of the events to find",
                )],
            )
            .with_capability(CapabilityBinding::step("nl_search", 0, Some("query"))),
            OperationSpec::new(
                "run_udm_search",
                "Execute a UDM query on the server-hosted search backend",
                ExecutionKind::Remote,
                vec![
                    ParamSpec::required("query", ParamType::String, "UDM query to execute"),
                    ParamSpec::optional("hours_back", ParamType::Integer, "Lookback window in hours (default 24)"),
                    ParamSpec::optional("max_events", ParamType::Integer, "Maximum events to return (default 100)"),
                ],
            )
            .with_capability(CapabilityBinding::step("nl_search", 1, None)),
        ]
    }

    fn health(&self) -> Health {
        match &self.token {
            Some(_) => Health::Loaded,
            None => Health::Failed("SIEM_REMOTE_TOKEN not set".to_string()),
        }
    }

    async fn call(
        &self,
        _ctx: &InvocationContext,
        operation: &str,
        args: &Value,
    ) -> Result<Value, ToolError> {
        match operation {
            "translate_udm_query" => self.translate_udm_query(args).await,
            "run_udm_search" => self.run_udm_search(args).await,
            other => Err(ToolError::Internal(format!(
                "siem-remote has no operation '{other}'"
            ))),
        }
    }
}
