//! Shared upstream HTTP plumbing for capability modules.

use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use tracing::debug;

use secmesh_core::ToolError;

/// One client per module, configured once and reused across invocations.
#[derive(Debug, Clone)]
pub(crate) struct UpstreamClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Auth<'a> {
    Bearer(&'a str),
    Header(&'a str, &'a str),
    None,
}

impl UpstreamClient {
    pub(crate) fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub(crate) async fn get(
        &self,
        path: &str,
        query: &[(&str, String)],
        auth: Auth<'_>,
    ) -> Result<Value, ToolError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "upstream GET");
        let req = self.client.get(&url).query(query);
        Self::execute(apply_auth(req, auth)).await
    }

    pub(crate) async fn post(
        &self,
        path: &str,
        body: &Value,
        auth: Auth<'_>,
    ) -> Result<Value, ToolError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "upstream POST");
        let req = self.client.post(&url).json(body);
        Self::execute(apply_auth(req, auth)).await
    }

    async fn execute(req: RequestBuilder) -> Result<Value, ToolError> {
        let response = req.send().await.map_err(normalize_transport)?;
        let status = response.status();
        if !status.is_success() {
            let excerpt = response.text().await.unwrap_or_default();
            return Err(normalize_status(status, &excerpt));
        }
        response
            .json::<Value>()
            .await
            .map_err(|e| ToolError::UpstreamUnavailable(format!("malformed upstream body: {e}")))
    }
}

fn apply_auth(req: RequestBuilder, auth: Auth<'_>) -> RequestBuilder {
    match auth {
        Auth::Bearer(token) => req.bearer_auth(token),
        Auth::Header(name, value) => req.header(name, value),
        Auth::None => req,
    }
}

/// Map upstream HTTP statuses onto the closed error taxonomy.
///
/// Auth/validation rejections are permanent and not retried; rate limits and
/// server errors are transient and left to the caller's retry policy.
pub(crate) fn normalize_status(status: StatusCode, excerpt: &str) -> ToolError {
    let excerpt: String = excerpt.chars().take(200).collect();
    match status {
        StatusCode::BAD_REQUEST
        | StatusCode::UNAUTHORIZED
        | StatusCode::FORBIDDEN
        | StatusCode::UNPROCESSABLE_ENTITY => {
            ToolError::UpstreamRejected(format!("{status}: {excerpt}"))
        }
        StatusCode::NOT_FOUND => ToolError::NotAvailable(format!("{status}: {excerpt}")),
        _ => ToolError::UpstreamUnavailable(format!("{status}: {excerpt}")),
    }
}

pub(crate) fn normalize_transport(err: reqwest::Error) -> ToolError {
    if err.is_timeout() {
        ToolError::Timeout
    } else {
        ToolError::UpstreamUnavailable(err.to_string())
    }
}
