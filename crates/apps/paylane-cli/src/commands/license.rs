//! Show licenses command.

use paylane_types::Identity;

use crate::context::AppContext;
use crate::error::CliResult;
use crate::output::{LicenseOutput, OutputFormat, Render};

/// Execute the license command.
pub fn license(ctx: &AppContext, format: OutputFormat, holder: Option<String>) -> CliResult<String> {
    let holder = match holder {
        Some(holder) => Identity::new(holder),
        None => ctx.agent()?,
    };

    let licenses = ctx.engine.licenses_for(&holder)?;
    let output = LicenseOutput::new(holder.to_string(), licenses, ctx.engine.now());
    Ok(output.render(format))
}
