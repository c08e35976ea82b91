//! Show content command.

use paylane_types::Fingerprint;

use crate::context::AppContext;
use crate::error::CliResult;
use crate::output::{ContentOutput, OutputFormat, Render};

/// Execute the info command.
pub fn info(ctx: &AppContext, format: OutputFormat, fingerprint: &Fingerprint) -> CliResult<String> {
    let entry = ctx.engine.get_content(fingerprint)?;
    let output = ContentOutput {
        entry,
        token: ctx.token().to_string(),
    };
    Ok(output.render(format))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{seed, test_context};
    use paylane_test_utils::test_fingerprint;

    #[test]
    fn test_info() {
        let (_temp_dir, ctx) = test_context();
        let fp = seed(&ctx, 3, 700, "0xowner");

        let out = info(&ctx, OutputFormat::Human, &fp).unwrap();
        assert!(out.contains("ipfs://item-3"));
        assert!(out.contains("0xowner"));
    }

    #[test]
    fn test_info_unknown() {
        let (_temp_dir, ctx) = test_context();
        let err = info(&ctx, OutputFormat::Human, &test_fingerprint(9)).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.suggestion().is_some());
    }
}
