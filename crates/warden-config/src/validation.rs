//! External validation network configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ValidationConfig {
    /// Base URL of the validation service. Empty means audits are
    /// acknowledged locally.
    #[serde(default)]
    pub endpoint: String,

    /// Optional bearer token for the validation service.
    #[serde(default)]
    pub token: String,
}

impl ValidationConfig {
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.endpoint.is_empty()
    }
}
