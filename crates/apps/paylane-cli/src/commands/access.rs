//! Evaluate access command.

use paylane_gate::{AccessRequest, Caller};
use paylane_types::{Fingerprint, Identity};

use crate::context::AppContext;
use crate::error::CliResult;
use crate::output::{AccessOutput, OutputFormat, Render};

/// Execute the access command.
pub async fn access(
    ctx: &AppContext,
    format: OutputFormat,
    fingerprint: Fingerprint,
    caller: Option<String>,
    human: bool,
    proof: Option<String>,
) -> CliResult<String> {
    let request = match caller {
        None => AccessRequest::anonymous(fingerprint),
        Some(identity) => {
            let identity = Identity::new(identity);
            let mut caller = if human {
                Caller::human(identity)
            } else {
                Caller::agent(identity)
            };
            if let Some(proof) = proof {
                caller = caller.with_proof(proof);
            }
            AccessRequest::from_caller(fingerprint, caller)
        }
    };

    let decision = ctx.gateway().decide(&request).await?;
    let header = decision
        .payment_header()?
        .map(|(name, value)| (name.to_string(), value));

    let output = AccessOutput {
        status: decision.status_code(),
        decision,
        header,
    };
    Ok(output.render(format))
}
