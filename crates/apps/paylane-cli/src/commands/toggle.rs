//! Toggle content command.

use paylane_types::Fingerprint;

use crate::context::AppContext;
use crate::error::CliResult;
use crate::output::{OutputFormat, Render, ToggleOutput};

/// Execute the toggle command.
pub fn toggle(ctx: &AppContext, format: OutputFormat, fingerprint: &Fingerprint) -> CliResult<String> {
    let caller = ctx.agent()?;
    let active = ctx.engine.toggle_active(fingerprint, &caller)?;

    let output = ToggleOutput {
        fingerprint: fingerprint.to_string(),
        active,
    };
    Ok(output.render(format))
}
