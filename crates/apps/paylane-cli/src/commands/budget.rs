//! Show budget command.

use paylane_settle::PaymentRail;

use crate::context::Orchestrator;
use crate::error::CliResult;
use crate::output::{BudgetOutput, OutputFormat, Render};

/// Execute the budget command.
pub fn budget<R: PaymentRail>(orchestrator: &Orchestrator<R>, format: OutputFormat) -> CliResult<String> {
    let output = BudgetOutput {
        status: orchestrator.budget()?,
        token: orchestrator.config().token.clone(),
    };
    Ok(output.render(format))
}
