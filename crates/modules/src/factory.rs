//! Identifier-to-constructor table for the capability modules.
//!
//! Activation is configuration-driven; no dynamic code loading. Adding a
//! module means adding a constructor arm here.

use std::sync::Arc;

use secmesh_core::{CapabilityModule, ToolError};

use crate::posture::PostureModule;
use crate::siem::SiemModule;
use crate::siem_remote::SiemRemoteModule;
use crate::soar::SoarModule;
use crate::threat_graph::ThreatGraphModule;

pub const AVAILABLE_MODULES: &[&str] = &["siem", "siem-remote", "soar", "threat-graph", "posture"];

pub fn build_module(identifier: &str) -> Result<Arc<dyn CapabilityModule>, ToolError> {
    match identifier {
        "siem" => Ok(Arc::new(SiemModule::from_env())),
        "siem-remote" => Ok(Arc::new(SiemRemoteModule::from_env()?)),
        "soar" => Ok(Arc::new(SoarModule::from_env()?)),
        "threat-graph" => Ok(Arc::new(ThreatGraphModule::from_env())),
        "posture" => Ok(Arc::new(PostureModule::from_env()?)),
        other => Err(ToolError::NotAvailable(format!(
            "unknown module identifier '{other}'"
        ))),
    }
}
