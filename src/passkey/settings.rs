//! Relying-party settings for passkey ceremonies

use serde::{Deserialize, Serialize};

/// Relying party identity handed to `webauthn-rs`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasskeySettings {
    pub rp_id: String,
    pub rp_name: String,
    pub rp_origin: String,
    pub timeout_seconds: u64,
}

impl Default for PasskeySettings {
    fn default() -> Self {
        Self {
            rp_id: "localhost".to_string(),
            rp_name: "Home Loan Helper".to_string(),
            rp_origin: "http://localhost:5173".to_string(),
            timeout_seconds: 60,
        }
    }
}

impl PasskeySettings {
    #[must_use]
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_seconds)
    }
}
