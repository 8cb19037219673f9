//! Threat-intelligence graph module: indicator reports and threat search.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde_json::Value;

use secmesh_core::{
    CapabilityModule, ExecutionKind, Health, InvocationContext, OperationSpec, ParamSpec,
    ParamType, ToolError,
};

use crate::args::{int_arg_or, opt_str_arg, str_arg};
use crate::http::{Auth, UpstreamClient};

const DEFAULT_BASE_URL: &str = "https://threatgraph.example-apis.com/api/v3";

pub struct ThreatGraphModule {
    http: UpstreamClient,
    api_key: Option<String>,
}

impl ThreatGraphModule {
    pub fn from_env() -> Self {
        let base_url = std::env::var("THREAT_GRAPH_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self {
            http: UpstreamClient::new(base_url),
            api_key: std::env::var("THREAT_GRAPH_API_KEY").ok(),
        }
    }

    fn auth(&self) -> Result<Auth<'_>, ToolError> {
        match &self.api_key {
            Some(key) => Ok(Auth::Header("x-apikey", key)),
            None => Err(ToolError::UpstreamRejected(
                "THREAT_GRAPH_API_KEY not configured".to_string(),
            )),
        }
    }

    async fn report(&self, collection: &str, id: &str) -> Result<Value, ToolError> {
        self.http
            .get(&format!("/{collection}/{id}"), &[], self.auth()?)
            .await
    }

    async fn search_threats(&self, args: &Value) -> Result<Value, ToolError> {
        let mut query = vec![
            ("filter", str_arg(args, "query")?.to_string()),
            ("limit", int_arg_or(args, "limit", 10).to_string()),
        ];
        if let Some(collection_type) = opt_str_arg(args, "collection_type") {
            query.push(("collection_type", collection_type.to_string()));
        }
        self.http.get("/collections", &query, self.auth()?).await
    }
}

#[async_trait]
impl CapabilityModule for ThreatGraphModule {
    fn identifier(&self) -> &'static str {
        "threat-graph"
    }

    fn describe(&self) -> Vec<OperationSpec> {
        vec![
            OperationSpec::new(
                "get_file_report",
                "Get the threat report for a file by MD5, SHA-1 or SHA-256 hash",
                ExecutionKind::Local,
                vec![ParamSpec::required("hash", ParamType::String, "File hash to look up")],
            ),
            OperationSpec::new(
                "get_domain_report",
                "Get the threat report for a domain",
                ExecutionKind::Local,
                vec![ParamSpec::required("domain", ParamType::String, "Domain to look up")],
            ),
            OperationSpec::new(
                "get_ip_address_report",
                "Get the threat report for an IP address",
                ExecutionKind::Local,
                vec![ParamSpec::required("ip_address", ParamType::String, "IP address to look up")],
            ),
            OperationSpec::new(
                "get_url_report",
                "Get the threat report for a URL",
                ExecutionKind::Local,
                vec![ParamSpec::required("url", ParamType::String, "URL to look up")],
            ),
            OperationSpec::new(
                "get_collection_report",
                "Get a threat collection (actor, campaign, malware family) by ID",
                ExecutionKind::Local,
                vec![ParamSpec::required("id", ParamType::String, "Collection ID")],
            ),
            OperationSpec::new(
                "search_threats",
                "Search threat collections, optionally filtered by collection type",
                ExecutionKind::Local,
                vec![
                    ParamSpec::required("query", ParamType::String, "Search expression"),
                    ParamSpec::optional("limit", ParamType::Integer, "Maximum results (default 10)"),
                    ParamSpec::optional(
                        "collection_type",
                        ParamType::String,
                        "Restrict to one type: threat-actor, campaign, malware-family, report",
                    ),
                ],
            ),
        ]
    }

    fn health(&self) -> Health {
        match &self.api_key {
            Some(_) => Health::Loaded,
            None => Health::Failed("THREAT_GRAPH_API_KEY not set".to_string()),
        }
    }

    async fn call(
        &self,
        _ctx: &InvocationContext,
        operation: &str,
        args: &Value,
    ) -> Result<Value, ToolError> {
        match operation {
            "get_file_report" => self.report("files", str_arg(args, "hash")?).await,
            "get_domain_report" => self.report("domains", str_arg(args, "domain")?).await,
            "get_ip_address_report" => {
                self.report("ip_addresses", str_arg(args, "ip_address")?).await
            }
            "get_url_report" => {
                // URL identifiers travel base64url-encoded without padding.
                let id = URL_SAFE_NO_PAD.encode(str_arg(args, "url")?);
                self.report("urls", &id).await
            }
            "get_collection_report" => self.report("collections", str_arg(args, "id")?).await,
            "search_threats" => self.search_threats(args).await,
            other => Err(ToolError::Internal(format!(
                "threat-graph has no operation '{other}'"
            ))),
        }
    }
}
