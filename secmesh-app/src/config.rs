use anyhow::{bail, Result};

const DEFAULT_MODULES: &str = "siem-remote,siem,soar,threat-graph,posture";
const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Process activation configuration.
///
/// `SECMESH_MODULES` is an ordered, comma-separated list of module
/// identifiers; order decides collision and same-kind resolution winners.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub modules: Vec<String>,
    pub timeout_ms: u64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let raw = std::env::var("SECMESH_MODULES")
            .unwrap_or_else(|_| DEFAULT_MODULES.to_string());
        let modules: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if modules.is_empty() {
            bail!("SECMESH_MODULES names no modules");
        }

        let timeout_ms = match std::env::var("SECMESH_TIMEOUT_MS") {
            Err(_) => DEFAULT_TIMEOUT_MS,
            Ok(raw) => match raw.parse::<u64>() {
                Ok(ms) if ms > 0 => ms,
                _ => bail!("SECMESH_TIMEOUT_MS must be a positive integer, got '{raw}'"),
            },
        };

        Ok(Self {
            modules,
            timeout_ms,
        })
    }
}
