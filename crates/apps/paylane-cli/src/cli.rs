//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use paylane_types::{Amount, Fingerprint, Strategy};

use crate::output::OutputFormat;

/// Paylane CLI.
#[derive(Parser, Debug)]
#[command(name = "paylane")]
#[command(author = "Paylane Contributors")]
#[command(version)]
#[command(about = "Command-line interface for the Paylane protocol")]
#[command(
    long_about = "Paylane licenses content by fingerprint and pays for it on behalf of agents.\n\nSet agent.identity in config.toml (or pass --as) to get started."
)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file.
    #[arg(short, long, global = true, env = "PAYLANE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format (human or json).
    #[arg(short, long, global = true, default_value = "human")]
    pub format: OutputFormatArg,

    /// Act as this identity instead of the configured agent.
    #[arg(long = "as", global = true, value_name = "IDENTITY")]
    pub as_identity: Option<String>,

    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Output format argument for clap.
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormatArg {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => OutputFormat::Human,
            OutputFormatArg::Json => OutputFormat::Json,
        }
    }
}

/// CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    // =========================================================================
    // Setup Commands
    // =========================================================================
    /// Write a configuration file.
    ///
    /// Uses the identity given with --as as the agent.
    Init {
        /// Overwrite an existing configuration file.
        #[arg(long)]
        force: bool,
    },

    // =========================================================================
    // Content Ledger Commands
    // =========================================================================
    /// Register content in the ledger.
    ///
    /// The fingerprint is the SHA-256 of the file, or given directly.
    /// The configured agent becomes the owner.
    Register {
        /// File to fingerprint.
        #[arg(long, conflicts_with = "fingerprint", required_unless_present = "fingerprint")]
        file: Option<PathBuf>,

        /// Precomputed fingerprint (64 hex characters).
        #[arg(long)]
        fingerprint: Option<Fingerprint>,

        /// Price per license in base units.
        #[arg(short, long, value_parser = parse_price)]
        price: Amount,

        /// Where licensed callers fetch the content.
        #[arg(short, long)]
        uri: String,
    },

    /// Change the price of owned content.
    SetPrice {
        /// Content fingerprint.
        fingerprint: Fingerprint,

        /// New price in base units.
        #[arg(value_parser = parse_price)]
        price: Amount,
    },

    /// Activate or deactivate owned content.
    Toggle {
        /// Content fingerprint.
        fingerprint: Fingerprint,
    },

    /// Show a ledger entry.
    Info {
        /// Content fingerprint.
        fingerprint: Fingerprint,
    },

    /// List ledger entries.
    List {
        /// Only content owned by this identity.
        #[arg(short, long)]
        owner: Option<String>,

        /// Only active content.
        #[arg(long)]
        active: bool,

        /// Maximum results to show.
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },

    // =========================================================================
    // Payment Commands
    // =========================================================================
    /// Purchase licenses for one or more fingerprints.
    ///
    /// Already-licensed content is skipped unless --force is given.
    Purchase {
        /// Content fingerprints.
        #[arg(required = true)]
        fingerprints: Vec<Fingerprint>,

        /// Settlement strategy.
        #[arg(short, long, default_value = "sequential")]
        strategy: Strategy,

        /// Buy again even when a valid license exists.
        #[arg(long)]
        force: bool,
    },

    /// Show licenses held by an account.
    License {
        /// Holder to query (default: the agent).
        #[arg(long)]
        holder: Option<String>,
    },

    /// Show the agent's spending budget.
    Budget,

    /// Show purchase history and owned-content totals.
    Stats,

    // =========================================================================
    // Gateway Commands
    // =========================================================================
    /// Evaluate an access request against the gateway.
    Access {
        /// Content fingerprint.
        fingerprint: Fingerprint,

        /// Requesting identity (omit for an anonymous request).
        #[arg(long)]
        caller: Option<String>,

        /// Treat the caller as a human.
        #[arg(long, requires = "caller")]
        human: bool,

        /// Caller proof.
        #[arg(long, requires = "caller")]
        proof: Option<String>,
    },
}

/// Parse a price, rejecting zero.
fn parse_price(s: &str) -> Result<Amount, String> {
    let price: Amount = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid amount", s))?;
    if price == 0 {
        return Err("price must be at least 1".to_string());
    }
    Ok(price)
}
