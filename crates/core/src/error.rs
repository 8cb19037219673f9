use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Not available: {0}")]
    NotAvailable(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Upstream rejected: {0}")]
    UpstreamRejected(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Operation timed out")]
    Timeout,

    #[error("Invocation cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Closed error taxonomy surfaced in [`InvocationResult`] envelopes.
///
/// `Collision` never appears at call time; it is reported only in the
/// assembly report. An operation excluded by collision is simply absent
/// from the surface.
///
/// [`InvocationResult`]: crate::types::InvocationResult
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotAvailable,
    Collision,
    InvalidArgument,
    UpstreamRejected,
    UpstreamUnavailable,
    Timeout,
    Cancelled,
    Internal,
}

impl ToolError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ToolError::NotAvailable(_) => ErrorKind::NotAvailable,
            ToolError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            ToolError::UpstreamRejected(_) => ErrorKind::UpstreamRejected,
            ToolError::UpstreamUnavailable(_) => ErrorKind::UpstreamUnavailable,
            ToolError::Timeout => ErrorKind::Timeout,
            ToolError::Cancelled => ErrorKind::Cancelled,
            ToolError::Internal(_) => ErrorKind::Internal,
        }
    }
}
