//! Direct SIEM client module: UDM search, alerts, IoC matches, rules, and
//! natural-language event search executed client-side.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use tracing::info;

use secmesh_core::{
    CapabilityBinding, CapabilityModule, ExecutionKind, Health, InvocationContext, OperationSpec,
    ParamSpec, ParamType, ToolError,
};

use crate::args::{int_arg_or, opt_str_arg, str_arg};
use crate::http::{Auth, UpstreamClient};

const DEFAULT_BASE_URL: &str = "https://siem.example-apis.com/v2";

pub struct SiemModule {
    http: UpstreamClient,
    project_id: Option<String>,
    customer_id: Option<String>,
    region: String,
    token: Option<String>,
}

impl SiemModule {
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("SIEM_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self {
            http: UpstreamClient::new(base_url),
            project_id: std::env::var("SIEM_PROJECT_ID").ok(),
            customer_id: std::env::var("SIEM_CUSTOMER_ID").ok(),
            region: std::env::var("SIEM_REGION").unwrap_or_else(|_| "us".to_string()),
            token: std::env::var("SIEM_API_TOKEN").ok(),
        }
    }

    fn auth(&self) -> Result<Auth<'_>, ToolError> {
        match &self.token {
            Some(token) => Ok(Auth::Bearer(token)),
            None => Err(ToolError::UpstreamRejected(
                "SIEM_API_TOKEN not configured".to_string(),
            )),
        }
    }

    fn tenant(&self) -> Result<(&str, &str), ToolError> {
        match (&self.project_id, &self.customer_id) {
            (Some(p), Some(c)) => Ok((p, c)),
            _ => Err(ToolError::UpstreamRejected(
                "SIEM_PROJECT_ID and SIEM_CUSTOMER_ID not configured".to_string(),
            )),
        }
    }

    async fn translate(&self, text: &str) -> Result<String, ToolError> {
        let (project_id, customer_id) = self.tenant()?;
        let body = json!({
            "text": text,
            "project_id": project_id,
            "customer_id": customer_id,
            "region": self.region,
        });
        let response = self
            .http
            .post("/udm:translateQuery", &body, self.auth()?)
            .await?;
        response
            .get("query")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                ToolError::UpstreamUnavailable("translation response missing 'query'".to_string())
            })
    }

    async fn run_udm_search(
        &self,
        query: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        max_events: i64,
    ) -> Result<Value, ToolError> {
        let (project_id, customer_id) = self.tenant()?;
        let body = json!({
            "query": query,
            "start_time": start.to_rfc3339(),
            "end_time": end.to_rfc3339(),
            "max_events": max_events,
            "project_id": project_id,
            "customer_id": customer_id,
            "region": self.region,
        });
        self.http.post("/udm/events:search", &body, self.auth()?).await
    }

    async fn search_udm(&self, args: &Value) -> Result<Value, ToolError> {
        let query = str_arg(args, "query")?;
        let (start, end) = window(int_arg_or(args, "hours_back", 24));
        self.run_udm_search(query, start, end, int_arg_or(args, "max_events", 100))
            .await
    }

    async fn search_security_events(&self, args: &Value) -> Result<Value, ToolError> {
        let text = str_arg(args, "text")?;
        let (start, end) = window(int_arg_or(args, "hours_back", 24));
        info!(text = %text, "translating natural-language query");
        let udm_query = self.translate(text).await?;
        let events = self
            .run_udm_search(&udm_query, start, end, int_arg_or(args, "max_events", 100))
            .await?;
        Ok(json!({"udm_query": udm_query, "events": events}))
    }

    async fn get_security_alerts(&self, args: &Value) -> Result<Value, ToolError> {
        let (start, end) = window(int_arg_or(args, "hours_back", 24));
        let mut query = vec![
            ("start_time", start.to_rfc3339()),
            ("end_time", end.to_rfc3339()),
            ("page_size", int_arg_or(args, "max_alerts", 10).to_string()),
        ];
        if let Some(status) = opt_str_arg(args, "status_filter") {
            query.push(("status", status.to_string()));
        }
        self.http.get("/alerts", &query, self.auth()?).await
    }

    async fn get_ioc_matches(&self, args: &Value) -> Result<Value, ToolError> {
        let (start, end) = window(int_arg_or(args, "hours_back", 24));
        let query = vec![
            ("start_time", start.to_rfc3339()),
            ("end_time", end.to_rfc3339()),
            ("page_size", int_arg_or(args, "max_matches", 20).to_string()),
        ];
        self.http.get("/iocs/matches", &query, self.auth()?).await
    }

    async fn list_security_rules(&self, args: &Value) -> Result<Value, ToolError> {
        let query = vec![("page_size", int_arg_or(args, "page_size", 50).to_string())];
        self.http.get("/rules", &query, self.auth()?).await
    }

    async fn lookup_entity(&self, args: &Value) -> Result<Value, ToolError> {
        let value = str_arg(args, "value")?;
        let (start, end) = window(int_arg_or(args, "hours_back", 24));
        let query = vec![
            ("value", value.to_string()),
            ("start_time", start.to_rfc3339()),
            ("end_time", end.to_rfc3339()),
        ];
        self.http.get("/entities:summary", &query, self.auth()?).await
    }
}

fn window(hours_back: i64) -> (DateTime<Utc>, DateTime<Utc>) {
    let end = Utc::now();
    (end - Duration::hours(hours_back.max(0)), end)
}

#[async_trait]
impl CapabilityModule for SiemModule {
    fn identifier(&self) -> &'static str {
        "siem"
    }

    fn describe(&self) -> Vec<OperationSpec> {
        vec![
            OperationSpec::new(
                "search_udm",
                "Search UDM events with a UDM query over a lookback window",
                ExecutionKind::Local,
                vec![
                    ParamSpec::required("query", ParamType::String, "UDM query to execute"),
                    ParamSpec::optional("hours_back", ParamType::Integer, "Lookback window in hours (default 24)"),
                    ParamSpec::optional("max_events", ParamType::Integer, "Maximum events to return (default 100)"),
                ],
            ),
            OperationSpec::new(
                "search_security_events",
                "Search security events using a natural-language query, translated to UDM and executed",
                ExecutionKind::Local,
                vec![
                    ParamSpec::required("text", ParamType::String, "Natural-language description of the events to find"),
                    ParamSpec::optional("hours_back", ParamType::Integer, "Lookback window in hours (default 24)"),
                    ParamSpec::optional("max_events", ParamType::Integer, "Maximum events to return (default 100)"),
                ],
            )
            .with_capability(CapabilityBinding::single("nl_search")),
            OperationSpec::new(
                "get_security_alerts",
                "List non-closed security alerts in a lookback window",
                ExecutionKind::Local,
                vec![
                    ParamSpec::optional("hours_back", ParamType::Integer, "Lookback window in hours (default 24)"),
                    ParamSpec::optional("max_alerts", ParamType::Integer, "Maximum alerts to return (default 10)"),
                    ParamSpec::optional("status_filter", ParamType::String, "Alert status filter, e.g. ACTIVE"),
                ],
            ),
            OperationSpec::new(
                "get_ioc_matches",
                "List IoC matches against ingested events in a lookback window",
                ExecutionKind::Local,
                vec![
                    ParamSpec::optional("hours_back", ParamType::Integer, "Lookback window in hours (default 24)"),
                    ParamSpec::optional("max_matches", ParamType::Integer, "Maximum matches to return (default 20)"),
                ],
            ),
            OperationSpec::new(
                "list_security_rules",
                "List detection rules",
                ExecutionKind::Local,
                vec![ParamSpec::optional("page_size", ParamType::Integer, "Page size (default 50)")],
            ),
            OperationSpec::new(
                "lookup_entity",
                "Summarize an entity (IP, domain, file hash) from event telemetry",
                ExecutionKind::Local,
                vec![
                    ParamSpec::required("value", ParamType::String, "Entity value to look up"),
                    ParamSpec::optional("hours_back", ParamType::Integer, "Lookback window in hours (default 24)"),
                ],
            ),
        ]
    }

    fn health(&self) -> Health {
        if self.token.is_none() {
            return Health::Failed("SIEM_API_TOKEN not set".to_string());
        }
        if self.project_id.is_none() || self.customer_id.is_none() {
            return Health::Failed("SIEM_PROJECT_ID and SIEM_CUSTOMER_ID must be set".to_string());
        }
        Health::Loaded
    }

    async fn call(
        &self,
        _ctx: &InvocationContext,
        operation: &str,
        args: &Value,
    ) -> Result<Value, ToolError> {
        match operation {
            "search_udm" => self.search_udm(args).await,
            "search_security_events" => self.search_security_events(args).await,
            "get_security_alerts" => self.get_security_alerts(args).await,
            "get_ioc_matches" => self.get_ioc_matches(args).await,
            "list_security_rules" => self.list_security_rules(args).await,
            "lookup_entity" => self.lookup_entity(args).await,
            other => Err(ToolError::Internal(format!(
                "siem has no operation '{other}'"
            ))),
        }
    }
}
