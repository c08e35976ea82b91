//! CLI configuration.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use paylane_gate::GateConfig;
use paylane_ops::{OrchestratorConfig, SpendingLimits};
use paylane_settle::RailConfig;
use paylane_store::StoreConfig;
use paylane_types::{Amount, Identity, MAX_PURCHASE_ITEMS};

use crate::error::{CliError, CliResult};

/// Expand environment variables in a string.
/// Supports `${VAR_NAME}` syntax; unset variables are left as-is.
fn expand_env_vars(input: &str) -> String {
    static ENV_VAR: OnceLock<Option<Regex>> = OnceLock::new();
    let Some(re) = ENV_VAR
        .get_or_init(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").ok())
        .as_ref()
    else {
        return input.to_string();
    };

    re.replace_all(input, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| caps[0].to_string())
    })
    .to_string()
}

/// CLI configuration loaded from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Paying agent.
    pub agent: AgentConfig,
    /// Spending limits.
    pub limits: LimitsConfig,
    /// Payment rail gateway.
    pub rail: RailSection,
    /// Storage locations.
    pub storage: StorageConfig,
    /// Access gateway policy.
    pub gate: GateSection,
}

impl CliConfig {
    /// Load configuration from a file.
    ///
    /// A missing file yields defaults. `${VAR}` references are expanded in
    /// the agent identity, the rail endpoint and key, and the proof secret.
    pub fn load(path: &Path) -> CliResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&contents)?;

        config.agent.identity = expand_env_vars(&config.agent.identity);
        config.rail.endpoint = expand_env_vars(&config.rail.endpoint);
        if let Some(key) = config.rail.api_key.as_mut() {
            *key = expand_env_vars(key);
        }
        if let Some(secret) = config.gate.proof_secret.as_mut() {
            *secret = expand_env_vars(secret);
        }

        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> CliResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Get the base directory for all paylane data.
    pub fn base_dir(&self) -> PathBuf {
        self.storage.base_dir.clone()
    }

    /// The configured agent identity.
    pub fn agent(&self) -> CliResult<Identity> {
        let identity = Identity::new(self.agent.identity.trim());
        if identity.is_blank() || self.agent.identity.contains("${") {
            return Err(CliError::AgentNotConfigured);
        }
        Ok(identity)
    }

    /// Database settings.
    pub fn store_config(&self) -> StoreConfig {
        let config = StoreConfig::new(&self.storage.base_dir);
        match &self.storage.database {
            Some(path) => config.with_database_path(path),
            None => config,
        }
    }

    /// Rail client settings for the agent.
    pub fn rail_config(&self) -> CliResult<RailConfig> {
        let sender = self.agent()?;
        let mut config = RailConfig::new(&self.rail.endpoint, sender.as_str())
            .with_token(&self.rail.token);
        config.fee_sponsored = self.rail.fee_sponsored;
        config.timeout_secs = self.rail.timeout_secs;
        if let Some(key) = &self.rail.api_key {
            config = config.with_api_key(key);
        }
        Ok(config)
    }

    /// Spending ceilings.
    pub fn spending_limits(&self) -> SpendingLimits {
        SpendingLimits::new(self.limits.daily_ceiling, self.limits.per_item_ceiling)
    }

    /// Orchestrator settings.
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig::default()
            .with_token(&self.rail.token)
            .with_fee_sponsored(self.rail.fee_sponsored)
            .with_max_items(self.limits.max_items)
    }

    /// Gateway policy.
    pub fn gate_config(&self) -> GateConfig {
        GateConfig {
            token: self.rail.token.clone(),
            network: self.gate.network.clone(),
            enabled: self.gate.enabled,
        }
    }
}

/// Agent configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Account that pays for purchases and owns registered content.
    pub identity: String,
}

/// Spending limits configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum spend per rolling 24-hour window.
    pub daily_ceiling: Amount,
    /// Maximum price of any single item.
    pub per_item_ceiling: Amount,
    /// Maximum fingerprints per purchase.
    pub max_items: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            daily_ceiling: 1_000_000,
            per_item_ceiling: 100_000,
            max_items: MAX_PURCHASE_ITEMS,
        }
    }
}

/// Rail gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RailSection {
    /// Rail gateway URL.
    pub endpoint: String,
    /// Token symbol.
    pub token: String,
    /// Ask for sponsored fees.
    pub fee_sponsored: bool,
    /// Bearer token.
    pub api_key: Option<String>,
    /// HTTP timeout in seconds.
    pub timeout_secs: Option<u64>,
}

impl Default for RailSection {
    fn default() -> Self {
        let rail = RailConfig::default();
        Self {
            endpoint: rail.endpoint,
            token: rail.token,
            fee_sponsored: rail.fee_sponsored,
            api_key: None,
            timeout_secs: None,
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Base directory for paylane data.
    pub base_dir: PathBuf,
    /// SQLite database path (default: base_dir/paylane.db).
    pub database: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            database: None,
        }
    }
}

/// Access gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GateSection {
    /// Require licenses from agents.
    pub enabled: bool,
    /// Network quoted in payment instructions.
    pub network: String,
    /// Secret for caller proofs. Proofs are not checked when unset.
    pub proof_secret: Option<String>,
}

impl Default for GateSection {
    fn default() -> Self {
        let gate = GateConfig::default();
        Self {
            enabled: gate.enabled,
            network: gate.network,
            proof_secret: None,
        }
    }
}

/// Get the default base directory.
pub fn default_base_dir() -> PathBuf {
    paylane_store::default_data_dir()
}

/// Get the default config file path.
pub fn default_config_path() -> PathBuf {
    default_base_dir().join("config.toml")
}
