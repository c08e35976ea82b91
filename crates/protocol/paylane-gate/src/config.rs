//! Gateway configuration.

use serde::{Deserialize, Serialize};

use crate::types::DEFAULT_NETWORK;

/// Gateway settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Token quoted in payment instructions.
    pub token: String,
    /// Network quoted in payment instructions.
    pub network: String,
    /// When false, every active entry is served without a license.
    pub enabled: bool,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            token: "USDC".to_string(),
            network: DEFAULT_NETWORK.to_string(),
            enabled: true,
        }
    }
}

impl GateConfig {
    /// A gate that never asks for payment.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Quote a different network.
    pub fn with_network(mut self, network: impl Into<String>) -> Self {
        self.network = network.into();
        self
    }

    /// Quote a different token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }
}
