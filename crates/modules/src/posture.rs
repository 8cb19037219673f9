//! Cloud posture module: compliance frameworks and posture findings.

use async_trait::async_trait;
use serde_json::Value;

use secmesh_core::{
    CapabilityModule, ExecutionKind, Health, InvocationContext, OperationSpec, ParamSpec,
    ParamType, ToolError,
};

use crate::args::{int_arg_or, opt_str_arg, str_arg};
use crate::http::{Auth, UpstreamClient};

pub struct PostureModule {
    http: UpstreamClient,
    org_id: Option<String>,
    token: Option<String>,
}

impl PostureModule {
    pub fn from_env() -> Result<Self, ToolError> {
        let base_url = std::env::var("POSTURE_BASE_URL")
            .map_err(|_| ToolError::NotAvailable("POSTURE_BASE_URL not configured".to_string()))?;
        Ok(Self {
            http: UpstreamClient::new(base_url),
            org_id: std::env::var("POSTURE_ORG_ID").ok(),
            token: std::env::var("POSTURE_API_TOKEN").ok(),
        })
    }

    fn auth(&self) -> Result<Auth<'_>, ToolError> {
        match &self.token {
            Some(token) => Ok(Auth::Bearer(token)),
            None => Err(ToolError::UpstreamRejected(
                "POSTURE_API_TOKEN not configured".to_string(),
            )),
        }
    }

    fn org(&self) -> Result<&str, ToolError> {
        self.org_id.as_deref().ok_or_else(|| {
            ToolError::UpstreamRejected("POSTURE_ORG_ID not configured".to_string())
        })
    }

    async fn list_frameworks(&self) -> Result<Value, ToolError> {
        let org = self.org()?;
        self.http
            .get(&format!("/organizations/{org}/frameworks"), &[], self.auth()?)
            .await
    }

    async fn list_findings(&self, args: &Value) -> Result<Value, ToolError> {
        let org = self.org()?;
        let mut query = vec![(
            "page_size",
            int_arg_or(args, "max_findings", 20).to_string(),
        )];
        if let Some(severity) = opt_str_arg(args, "severity") {
            query.push(("severity", severity.to_string()));
        }
        self.http
            .get(&format!("/organizations/{org}/findings"), &query, self.auth()?)
            .await
    }

    async fn get_finding(&self, args: &Value) -> Result<Value, ToolError> {
        let org = self.org()?;
        let finding_id = str_arg(args, "finding_id")?;
        self.http
            .get(
                &format!("/organizations/{org}/findings/{finding_id}"),
                &[],
                self.auth()?,
            )
            .await
    }
}

#[async_trait]
impl CapabilityModule for PostureModule {
    fn identifier(&self) -> &'static str {
        "posture"
    }

    fn describe(&self) -> Vec<OperationSpec> {
        vec![
            OperationSpec::new(
                "list_frameworks",
                "List supported compliance frameworks",
                ExecutionKind::Local,
                vec![],
            ),
            OperationSpec::new(
                "list_findings",
                "List posture findings, optionally filtered by severity",
                ExecutionKind::Local,
                vec![
                    ParamSpec::optional(
                        "severity",
                        ParamType::String,
                        "Severity filter: CRITICAL, HIGH, MEDIUM or LOW",
                    ),
                    ParamSpec::optional("max_findings", ParamType::Integer, "Maximum findings to return (default 20)"),
                ],
            ),
            OperationSpec::new(
                "get_finding",
                "Get one posture finding by ID",
                ExecutionKind::Local,
                vec![ParamSpec::required("finding_id", ParamType::String, "Finding ID")],
            ),
        ]
    }

    fn health(&self) -> Health {
        if self.token.is_none() {
            return Health::Failed("POSTURE_API_TOKEN not set".to_string());
        }
        if self.org_id.is_none() {
            return Health::Failed("POSTURE_ORG_ID not set".to_string());
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
            "list_frameworks" => self.list_frameworks().await,
            "list_findings" => self.list_findings(args).await,
            "get_finding" => self.get_finding(args).await,
            other => Err(ToolError::Internal(format!(
                "posture has no operation '{other}'"
            ))),
        }
    }
}
