//! Configuration for the HTTP payment rail.

use serde::{Deserialize, Serialize};

use crate::error::{RailError, RailResult};

/// Default rail gateway endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8402";

/// Default settlement token.
pub const DEFAULT_TOKEN: &str = "USDC";

/// Connection settings for an HTTP rail gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RailConfig {
    /// Base URL of the rail gateway.
    pub endpoint: String,
    /// Paying account.
    pub sender: String,
    /// Token transferred.
    pub token: String,
    /// Ask the gateway to sponsor fees.
    pub fee_sponsored: bool,
    /// Bearer token for the gateway.
    pub api_key: Option<String>,
    /// HTTP timeout. `None` leaves timing to the gateway.
    pub timeout_secs: Option<u64>,
}

impl Default for RailConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            sender: String::new(),
            token: DEFAULT_TOKEN.to_string(),
            fee_sponsored: true,
            api_key: None,
            timeout_secs: None,
        }
    }
}

impl RailConfig {
    /// Config for `sender` against `endpoint` with defaults elsewhere.
    pub fn new(endpoint: impl Into<String>, sender: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            sender: sender.into(),
            ..Default::default()
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    /// Check the config before building a client.
    pub fn validate(&self) -> RailResult<()> {
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(RailError::config(format!(
                "rail endpoint must be an http(s) URL: {}",
                self.endpoint
            )));
        }
        if self.sender.trim().is_empty() {
            return Err(RailError::config("rail sender is not set"));
        }
        if self.token.trim().is_empty() {
            return Err(RailError::config("rail token is not set"));
        }
        if self.timeout_secs == Some(0) {
            return Err(RailError::config("rail timeout must be positive"));
        }
        Ok(())
    }
}
