use serde::{Deserialize, Serialize};

/// Limits and retry policy for the document service.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Upper bound for one uploaded payload, in bytes.
    pub max_payload_bytes: u64,
    /// How many times a contended catalog update is retried before the
    /// operation surfaces a conflict.
    pub cas_retry_limit: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_payload_bytes: 10 * 1024 * 1024, // 10 MiB
            cas_retry_limit: 32,
        }
    }
}

impl ServiceConfig {
    /// Parse a configuration from TOML, filling omitted fields with
    /// defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }
}
