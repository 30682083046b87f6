use std::time::Duration;
use tracing::warn;

use crate::room::service::DEFAULT_REGISTRY_TIMEOUT;

pub const BIND_ADDR_VAR: &str = "JUKEBOX_BIND_ADDR";
pub const REGISTRY_TIMEOUT_VAR: &str = "JUKEBOX_REGISTRY_TIMEOUT_MS";

/// Process configuration, read from the environment at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: String,
    /// Deadline for each registry call
    pub registry_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            registry_timeout: DEFAULT_REGISTRY_TIMEOUT,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset or invalid values keep their defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = lookup(BIND_ADDR_VAR).filter(|a| !a.trim().is_empty()) {
            config.bind_addr = addr;
        }

        if let Some(raw) = lookup(REGISTRY_TIMEOUT_VAR) {
            match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => config.registry_timeout = Duration::from_millis(ms),
                _ => warn!(
                    value = %raw,
                    default_ms = config.registry_timeout.as_millis() as u64,
                    "Invalid {}, using default", REGISTRY_TIMEOUT_VAR
                ),
            }
        }

        config
    }
}
