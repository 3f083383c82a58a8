use serde::{Deserialize, Serialize};

/// Payload of `GET /health`.
///
/// Only `status` is guaranteed; the rest is whatever the deployment reports.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthStatus {
    pub status: String,
    /// Database connectivity ("connected" / "disconnected")
    #[serde(default)]
    pub database: Option<String>,
    /// Deployment environment name
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}
