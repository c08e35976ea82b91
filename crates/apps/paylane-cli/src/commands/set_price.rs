//! Set price command.

use paylane_types::{Amount, Fingerprint};

use crate::context::AppContext;
use crate::error::CliResult;
use crate::output::{ContentOutput, OutputFormat, Render};

/// Execute the set-price command.
pub fn set_price(
    ctx: &AppContext,
    format: OutputFormat,
    fingerprint: &Fingerprint,
    price: Amount,
) -> CliResult<String> {
    let caller = ctx.agent()?;
    let entry = ctx.engine.update_price(fingerprint, price, &caller)?;

    let output = ContentOutput {
        entry,
        token: ctx.token().to_string(),
    };
    Ok(output.render(format))
}
