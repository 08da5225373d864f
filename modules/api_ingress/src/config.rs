use serde::{Deserialize, Serialize};

/// API ingress configuration (`modules.api_ingress` in the app config)
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ApiIngressConfig {
    /// Listen address; falls back to `server.host:server.port` when absent.
    #[serde(default)]
    pub bind_addr: Option<String>,
    #[serde(default = "default_true")]
    pub enable_docs: bool,
    #[serde(default)]
    pub cors_enabled: bool,
    /// Per-request timeout in seconds; 0 disables it. The host fills this
    /// from `server.timeout_sec` when the section leaves it out.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default = "default_body_limit_bytes")]
    pub body_limit_bytes: usize,
}

impl Default for ApiIngressConfig {
    fn default() -> Self {
        Self {
            bind_addr: None,
            enable_docs: true,
            cors_enabled: false,
            request_timeout_secs: None,
            body_limit_bytes: default_body_limit_bytes(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_body_limit_bytes() -> usize {
    16 * 1024 * 1024
}
