//! Show statistics command.

use paylane_settle::PaymentRail;

use crate::context::{AppContext, Orchestrator};
use crate::error::CliResult;
use crate::output::{OutputFormat, Render, StatsOutput};

/// Execute the stats command.
pub fn stats<R: PaymentRail>(
    ctx: &AppContext,
    orchestrator: &Orchestrator<R>,
    format: OutputFormat,
) -> CliResult<String> {
    let payer = orchestrator.payer();
    let output = StatsOutput {
        payer: payer.to_string(),
        purchases: orchestrator.stats()?,
        ledger: ctx.engine.ledger_stats(Some(payer))?,
        token: ctx.token().to_string(),
    };
    Ok(output.render(format))
}
