//! Output formatting for CLI commands.

use colored::Colorize;
use serde::Serialize;

use paylane_gate::AccessDecision;
use paylane_license::LedgerStats;
use paylane_ops::{BudgetStatus, ItemStatus, PurchaseResult, PurchaseStats};
use paylane_types::{Amount, ContentEntry, License, Timestamp};

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

/// Render command output in the requested format.
pub trait Render: Serialize {
    /// Human-readable rendering.
    fn render_human(&self) -> String;

    /// Render in `format`.
    fn render(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Human => self.render_human(),
            OutputFormat::Json => serde_json::to_string_pretty(self)
                .unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e)),
        }
    }
}

// =============================================================================
// Formatting Helpers
// =============================================================================

/// Format a timestamp as UTC.
pub fn format_timestamp(ts: Timestamp) -> String {
    i64::try_from(ts)
        .ok()
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| ts.to_string())
}

/// Format an amount in base units.
pub fn format_amount(amount: Amount, token: &str) -> String {
    format!("{} {}", amount, token)
}

fn active_label(active: bool) -> colored::ColoredString {
    if active {
        "active".green()
    } else {
        "inactive".red()
    }
}

// =============================================================================
// Setup
// =============================================================================

/// Result of writing a configuration file.
#[derive(Debug, Serialize)]
pub struct InitOutput {
    /// Configuration file written.
    pub config_path: String,
    /// Data directory.
    pub data_dir: String,
    /// Agent identity, if configured.
    pub agent: Option<String>,
}

impl Render for InitOutput {
    fn render_human(&self) -> String {
        let mut out = format!(
            "{} {}
  {:<10} {}",
            "Wrote".green(),
            self.config_path,
            "Data:",
            self.data_dir
        );
        match &self.agent {
            Some(agent) => out.push_str(&format!("\n  {:<10} {}", "Agent:", agent)),
            None => out.push_str(&format!(
                "\n  {} set agent.identity before purchasing",
                "Note:".yellow()
            )),
        }
        out
    }
}

// =============================================================================
// Content
// =============================================================================

/// One ledger entry.
#[derive(Debug, Serialize)]
pub struct ContentOutput {
    /// The entry.
    #[serde(flatten)]
    pub entry: ContentEntry,
    /// Token prices are quoted in.
    #[serde(skip)]
    pub token: String,
}

impl Render for ContentOutput {
    fn render_human(&self) -> String {
        let e = &self.entry;
        format!(
            "{} {}\n  {:<12} {}\n  {:<12} {}\n  {:<12} {}\n  {:<12} {}\n  {:<12} {}\n  {:<12} {}\n  {:<12} {}",
            "Content".bold(),
            e.fingerprint.to_string().cyan(),
            "Status:",
            active_label(e.active),
            "Price:",
            format_amount(e.price, &self.token),
            "Owner:",
            e.owner,
            "URI:",
            e.uri,
            "Revenue:",
            format_amount(e.revenue, &self.token),
            "Accesses:",
            e.access_count,
            "Updated:",
            format_timestamp(e.updated_at),
        )
    }
}

/// Result of toggling an entry.
#[derive(Debug, Serialize)]
pub struct ToggleOutput {
    /// Content fingerprint.
    pub fingerprint: String,
    /// New flag.
    pub active: bool,
}

impl Render for ToggleOutput {
    fn render_human(&self) -> String {
        format!(
            "{} {} is now {}",
            "Toggled".green(),
            self.fingerprint.cyan(),
            active_label(self.active)
        )
    }
}

/// Listing of ledger entries.
#[derive(Debug, Serialize)]
pub struct ListOutput {
    /// Entries shown.
    pub content: Vec<ContentEntry>,
    /// Number of entries shown.
    pub total: usize,
    /// Token prices are quoted in.
    #[serde(skip)]
    pub token: String,
}

impl Render for ListOutput {
    fn render_human(&self) -> String {
        if self.content.is_empty() {
            return "No content registered.".dimmed().to_string();
        }

        let mut lines = vec![format!("{} ({})", "Content".bold(), self.total)];
        for entry in &self.content {
            lines.push(format!(
                "  {}  {:>16}  {:<8}  {} accesses  {}",
                entry.fingerprint.to_string().cyan(),
                format_amount(entry.price, &self.token),
                active_label(entry.active),
                entry.access_count,
                entry.uri.dimmed()
            ));
        }
        lines.join("\n")
    }
}

// =============================================================================
// Licenses
// =============================================================================

/// Licenses held by one account.
#[derive(Debug, Serialize)]
pub struct LicenseOutput {
    /// Holder queried.
    pub holder: String,
    /// Licenses, with validity evaluated at `checked_at`.
    pub licenses: Vec<LicenseRow>,
    /// Evaluation time.
    pub checked_at: Timestamp,
}

/// A license and whether it is currently valid.
#[derive(Debug, Serialize)]
pub struct LicenseRow {
    /// The stored license.
    #[serde(flatten)]
    pub license: License,
    /// Valid at the time of the query.
    pub valid: bool,
}

impl LicenseOutput {
    /// Build rows for `licenses` as of `now`.
    pub fn new(holder: String, licenses: Vec<License>, now: Timestamp) -> Self {
        let licenses = licenses
            .into_iter()
            .map(|license| LicenseRow {
                valid: license.is_valid_at(now),
                license,
            })
            .collect();
        Self {
            holder,
            licenses,
            checked_at: now,
        }
    }
}

impl Render for LicenseOutput {
    fn render_human(&self) -> String {
        if self.licenses.is_empty() {
            return format!("No licenses held by {}.", self.holder)
                .dimmed()
                .to_string();
        }

        let mut lines = vec![format!("{} for {}", "Licenses".bold(), self.holder)];
        for row in &self.licenses {
            let status = if row.valid {
                "valid".green()
            } else {
                "expired".yellow()
            };
            lines.push(format!(
                "  {}  {:<8} paid {}  expires {}  ref {}",
                row.license.fingerprint.to_string().cyan(),
                status,
                row.license.price_paid,
                format_timestamp(row.license.expires_at),
                row.license.transfer_ref.dimmed()
            ));
        }
        lines.join("\n")
    }
}

// =============================================================================
// Purchases
// =============================================================================

/// Purchase outcome.
#[derive(Debug, Serialize)]
pub struct PurchaseOutput {
    /// `noop` or the strategy used.
    pub method: String,
    /// Full result.
    #[serde(flatten)]
    pub result: PurchaseResult,
    /// Token prices are quoted in.
    #[serde(skip)]
    pub token: String,
}

impl PurchaseOutput {
    /// Wrap a result.
    pub fn new(result: PurchaseResult, token: impl Into<String>) -> Self {
        Self {
            method: result.method().to_string(),
            result,
            token: token.into(),
        }
    }
}

impl Render for PurchaseOutput {
    fn render_human(&self) -> String {
        let r = &self.result;
        let headline = if r.is_noop() {
            "Nothing to purchase".dimmed().bold()
        } else if r.success {
            "Purchase complete".green().bold()
        } else {
            "Purchase incomplete".yellow().bold()
        };

        let mut lines = vec![format!(
            "{} ({}): {} paid, {} failed, {} skipped, {} spent",
            headline,
            self.method,
            r.succeeded,
            r.failed,
            r.skipped,
            format_amount(r.total_paid, &self.token)
        )];
        if let Some(batch_ref) = &r.batch_ref {
            lines.push(format!("  Batch: {}", batch_ref));
        }

        for item in &r.items {
            let fp = item.fingerprint.to_string();
            let line = match &item.status {
                ItemStatus::Paid {
                    transfer_ref,
                    expires_at,
                    ..
                } => format!(
                    "  {} {}  ref {}  licensed until {}",
                    "✓".green(),
                    fp.cyan(),
                    transfer_ref,
                    format_timestamp(*expires_at)
                ),
                ItemStatus::Skipped { reason } => {
                    format!("  {} {}  {}", "-".dimmed(), fp.cyan(), reason.dimmed())
                }
                ItemStatus::Failed {
                    code,
                    reason,
                    transfer_ref,
                } => {
                    let mut line =
                        format!("  {} {}  {:?}: {}", "✗".red(), fp.cyan(), code, reason);
                    if let Some(transfer_ref) = transfer_ref {
                        line.push_str(&format!("  (ref {})", transfer_ref));
                    }
                    line
                }
            };
            lines.push(line);
        }

        for warning in &r.warnings {
            lines.push(format!("  {}: {}", "Warning".yellow().bold(), warning));
        }
        lines.join("\n")
    }
}

/// Budget snapshot.
#[derive(Debug, Serialize)]
pub struct BudgetOutput {
    /// Guard status.
    #[serde(flatten)]
    pub status: BudgetStatus,
    /// Token prices are quoted in.
    #[serde(skip)]
    pub token: String,
}

impl Render for BudgetOutput {
    fn render_human(&self) -> String {
        let s = &self.status;
        format!(
            "{} for {}\n  {:<18} {}\n  {:<18} {}\n  {:<18} {}\n  {:<18} {}\n  {:<18} {}",
            "Budget".bold(),
            s.payer,
            "Spent:",
            format_amount(s.spent, &self.token),
            "Remaining:",
            format_amount(s.remaining, &self.token).green(),
            "Daily ceiling:",
            format_amount(s.daily_ceiling, &self.token),
            "Per-item ceiling:",
            format_amount(s.per_item_ceiling, &self.token),
            "Resets at:",
            format_timestamp(s.resets_at),
        )
    }
}

/// Purchase history and ledger totals.
#[derive(Debug, Serialize)]
pub struct StatsOutput {
    /// Agent the purchase history belongs to.
    pub payer: String,
    /// Purchase history.
    pub purchases: PurchaseStats,
    /// Ledger totals for content the agent owns.
    pub ledger: LedgerStats,
    /// Token prices are quoted in.
    #[serde(skip)]
    pub token: String,
}

impl Render for StatsOutput {
    fn render_human(&self) -> String {
        let mut lines = vec![
            format!("{} for {}", "Purchases".bold(), self.payer),
            format!(
                "  {:<12} {}  ({} total)",
                "All:",
                self.purchases.purchases,
                format_amount(self.purchases.total_spent, &self.token)
            ),
        ];
        for (strategy, stats) in &self.purchases.by_strategy {
            lines.push(format!(
                "  {:<12} {}  ({} total)",
                format!("{}:", strategy),
                stats.count,
                format_amount(stats.amount, &self.token)
            ));
        }

        lines.push("Owned content".bold().to_string());
        lines.push(format!(
            "  {:<12} {} ({} active)",
            "Entries:", self.ledger.content_count, self.ledger.active_count
        ));
        lines.push(format!(
            "  {:<12} {}",
            "Revenue:",
            format_amount(self.ledger.total_revenue, &self.token)
        ));
        lines.push(format!("  {:<12} {}", "Accesses:", self.ledger.total_accesses));
        lines.join("\n")
    }
}

// =============================================================================
// Access
// =============================================================================

/// Gateway decision.
#[derive(Debug, Serialize)]
pub struct AccessOutput {
    /// HTTP status equivalent.
    pub status: u16,
    /// The decision.
    pub decision: AccessDecision,
    /// Header to send with a 402, as (name, value).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<(String, String)>,
}

impl Render for AccessOutput {
    fn render_human(&self) -> String {
        match &self.decision {
            AccessDecision::Allowed { uri } => {
                format!("{} {}\n  {}", "200".green().bold(), "Allowed".green(), uri)
            }
            AccessDecision::PaymentRequired {
                price,
                instructions,
            } => {
                let mut out = format!(
                    "{} {}\n  Pay {} {} to {} on {}",
                    "402".yellow().bold(),
                    "Payment required".yellow(),
                    price,
                    instructions.token,
                    instructions.pay_to,
                    instructions.network
                );
                if let Some((name, value)) = &self.header {
                    out.push_str(&format!("\n  {}: {}", name, value));
                }
                out
            }
            AccessDecision::NotFound => format!("{} {}", "404".red().bold(), "Not found".red()),
            AccessDecision::Forbidden => {
                format!("{} {}", "403".red().bold(), "Forbidden".red())
            }
        }
    }
}
