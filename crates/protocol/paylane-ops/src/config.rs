//! Orchestrator configuration.

use serde::{Deserialize, Serialize};

use paylane_types::MAX_PURCHASE_ITEMS;

/// Settings shared by every settlement strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Token symbol passed to the rail.
    pub token: String,
    /// Ask the rail to sponsor transfer fees.
    pub fee_sponsored: bool,
    /// Maximum distinct fingerprints per call.
    pub max_items: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            token: "USDC".to_string(),
            fee_sponsored: true,
            max_items: MAX_PURCHASE_ITEMS,
        }
    }
}

impl OrchestratorConfig {
    /// Use a different token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    /// Set fee sponsorship.
    pub fn with_fee_sponsored(mut self, sponsored: bool) -> Self {
        self.fee_sponsored = sponsored;
        self
    }

    /// Set the per-call item limit.
    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.token, "USDC");
        assert!(config.fee_sponsored);
        assert_eq!(config.max_items, MAX_PURCHASE_ITEMS);
    }

    #[test]
    fn test_builder() {
        let config = OrchestratorConfig::default()
            .with_token("EURC")
            .with_fee_sponsored(false)
            .with_max_items(4);
        assert_eq!(config.token, "EURC");
        assert!(!config.fee_sponsored);
        assert_eq!(config.max_items, 4);
    }
}
