//! Paylane CLI binary.

mod cli;
mod commands;
mod config;
mod context;
mod error;
mod output;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::config::{default_config_path, CliConfig};
use crate::context::AppContext;
use crate::error::{CliError, CliResult};
use crate::output::OutputFormat;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let format: OutputFormat = cli.format.into();
    match run(cli, format).await {
        Ok((output, success)) => {
            println!("{}", output);
            if !success {
                std::process::exit(6);
            }
        }
        Err(e) => {
            report_error(&e, format);
            std::process::exit(e.exit_code());
        }
    }
}

/// Install the tracing subscriber when asked for.
///
/// Logs go to stderr so JSON output on stdout stays parseable.
fn init_logging(verbose: bool) {
    if !verbose && std::env::var_os("RUST_LOG").is_none() {
        return;
    }

    let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    if verbose {
        if let Ok(directive) = "paylane=debug".parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Print an error and its suggestion.
fn report_error(error: &CliError, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let body = serde_json::json!({
                "error": error.to_string(),
                "code": error.error_code(),
                "suggestion": error.suggestion(),
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&body).unwrap_or_else(|_| error.to_string())
            );
        }
        OutputFormat::Human => {
            eprintln!("{} {}", "Error:".red().bold(), error);
            if let Some(suggestion) = error.suggestion() {
                eprintln!("{} {}", "Hint:".yellow(), suggestion);
            }
        }
    }
}

/// Dispatch a parsed command. Returns the rendered output and whether the
/// command fully succeeded.
async fn run(cli: Cli, format: OutputFormat) -> CliResult<(String, bool)> {
    let config_path = cli.config.unwrap_or_else(default_config_path);
    let mut config = CliConfig::load(&config_path)?;
    if let Some(identity) = cli.as_identity {
        config.agent.identity = identity;
    }

    let ctx = AppContext::open(config)?;
    let output = match cli.command {
        Commands::Init { force } => commands::init(&ctx.config, &config_path, format, force)?,

        // Content ledger
        Commands::Register {
            file,
            fingerprint,
            price,
            uri,
        } => commands::register(&ctx, format, file, fingerprint, price, &uri)?,
        Commands::SetPrice { fingerprint, price } => {
            commands::set_price(&ctx, format, &fingerprint, price)?
        }
        Commands::Toggle { fingerprint } => commands::toggle(&ctx, format, &fingerprint)?,
        Commands::Info { fingerprint } => commands::info(&ctx, format, &fingerprint)?,
        Commands::List {
            owner,
            active,
            limit,
        } => commands::list(&ctx, format, owner, active, limit)?,

        // Payments
        Commands::Purchase {
            fingerprints,
            strategy,
            force,
        } => {
            let orchestrator = ctx.orchestrator()?;
            return commands::purchase(&orchestrator, format, &fingerprints, strategy, force)
                .await;
        }
        Commands::License { holder } => commands::license(&ctx, format, holder)?,
        Commands::Budget => commands::budget(&ctx.orchestrator()?, format)?,
        Commands::Stats => commands::stats(&ctx, &ctx.orchestrator()?, format)?,

        // Gateway
        Commands::Access {
            fingerprint,
            caller,
            human,
            proof,
        } => commands::access(&ctx, format, fingerprint, caller, human, proof).await?,
    };

    Ok((output, true))
}
