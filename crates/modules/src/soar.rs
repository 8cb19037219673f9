//! SOAR case-management module.

use async_trait::async_trait;
use serde_json::{json, Value};

use secmesh_core::{
    CapabilityModule, ExecutionKind, Health, InvocationContext, OperationSpec, ParamSpec,
    ParamType, ToolError,
};

use crate::args::str_arg;
use crate::http::{Auth, UpstreamClient};

const CASE_PRIORITIES: &[&str] = &[
    "PriorityLow",
    "PriorityMedium",
    "PriorityHigh",
    "PriorityCritical",
];

pub struct SoarModule {
    http: UpstreamClient,
    app_key: Option<String>,
}

impl SoarModule {
    pub fn from_env() -> Result<Self, ToolError> {
        let base_url = std::env::var("SOAR_BASE_URL")
            .map_err(|_| ToolError::NotAvailable("SOAR_BASE_URL not configured".to_string()))?;
        Ok(Self {
            http: UpstreamClient::new(base_url),
            app_key: std::env::var("SOAR_APP_KEY").ok(),
        })
    }

    fn auth(&self) -> Result<Auth<'_>, ToolError> {
        match &self.app_key {
            Some(key) => Ok(Auth::Header("AppKey", key)),
            None => Err(ToolError::UpstreamRejected(
                "SOAR_APP_KEY not configured".to_string(),
            )),
        }
    }

    async fn list_cases(&self) -> Result<Value, ToolError> {
        self.http.get("/api/external/v1/cases", &[], self.auth()?).await
    }

    async fn get_case_full_details(&self, args: &Value) -> Result<Value, ToolError> {
        let case_id = str_arg(args, "case_id")?;
        self.http
            .get(&format!("/api/external/v1/cases/{case_id}/full"), &[], self.auth()?)
            .await
    }

    async fn post_case_comment(&self, args: &Value) -> Result<Value, ToolError> {
        let case_id = str_arg(args, "case_id")?;
        let comment = str_arg(args, "comment")?;
        self.http
            .post(
                &format!("/api/external/v1/cases/{case_id}/comments"),
                &json!({"Comment": comment}),
                self.auth()?,
            )
            .await
    }

    async fn list_alerts_by_case(&self, args: &Value) -> Result<Value, ToolError> {
        let case_id = str_arg(args, "case_id")?;
        self.http
            .get(&format!("/api/external/v1/cases/{case_id}/alerts"), &[], self.auth()?)
            .await
    }

    async fn change_case_priority(&self, args: &Value) -> Result<Value, ToolError> {
        let case_id = str_arg(args, "case_id")?;
        let priority = str_arg(args, "priority")?;
        if !CASE_PRIORITIES.contains(&priority) {
            return Err(ToolError::InvalidArgument(format!(
                "priority must be one of {CASE_PRIORITIES:?}, got '{priority}'"
            )));
        }
        self.http
            .post(
                &format!("/api/external/v1/cases/{case_id}/priority"),
                &json!({"priority": priority}),
                self.auth()?,
            )
            .await
    }
}

#[async_trait]
impl CapabilityModule for SoarModule {
    fn identifier(&self) -> &'static str {
        "soar"
    }

    fn describe(&self) -> Vec<OperationSpec> {
        vec![
            OperationSpec::new(
                "list_cases",
                "List open cases",
                ExecutionKind::Local,
                vec![],
            ),
            OperationSpec::new(
                "get_case_full_details",
                "Get a case with its alerts and comments",
                ExecutionKind::Local,
                vec![ParamSpec::required("case_id", ParamType::String, "The ID of the case")],
            ),
            OperationSpec::new(
                "post_case_comment",
                "Post a comment on a case",
                ExecutionKind::Local,
                vec![
                    ParamSpec::required("case_id", ParamType::String, "The ID of the case"),
                    ParamSpec::required("comment", ParamType::String, "The comment to add to the case"),
                ],
            ),
            OperationSpec::new(
                "list_alerts_by_case",
                "List alerts attached to a case",
                ExecutionKind::Local,
                vec![ParamSpec::required("case_id", ParamType::String, "The ID of the case")],
            ),
            OperationSpec::new(
                "change_case_priority",
                "Change the priority of a case",
                ExecutionKind::Local,
                vec![
                    ParamSpec::required("case_id", ParamType::String, "The ID of the case"),
                    ParamSpec::required(
                        "priority",
                        ParamType::String,
                        "One of PriorityLow, PriorityMedium, PriorityHigh, PriorityCritical",
                    ),
                ],
            ),
        ]
    }

    fn health(&self) -> Health {
        match &self.app_key {
            Some(_) => Health::Loaded,
            None => Health::Failed("SOAR_APP_KEY not set".to_string()),
        }
    }

    async fn call(
        &self,
        _ctx: &InvocationContext,
        operation: &str,
        args: &Value,
    ) -> Result<Value, ToolError> {
        match operation {
            "list_cases" => self.list_cases().await,
            "get_case_full_details" => self.get_case_full_details(args).await,
            "post_case_comment" => self.post_case_comment(args).await,
            "list_alerts_by_case" => self.list_alerts_by_case(args).await,
            "change_case_priority" => self.change_case_priority(args).await,
            other => Err(ToolError::Internal(format!(
                "soar has no operation '{other}'"
            ))),
        }
    }
}
