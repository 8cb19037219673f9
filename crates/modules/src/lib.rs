mod args;
mod http;

pub mod factory;
pub mod posture;
pub mod siem;
pub mod siem_remote;
pub mod soar;
pub mod threat_graph;

pub use factory::{build_module, AVAILABLE_MODULES};
pub use posture::PostureModule;
pub use siem::SiemModule;
pub use siem_remote::SiemRemoteModule;
pub use soar::SoarModule;
pub use threat_graph::ThreatGraphModule;
