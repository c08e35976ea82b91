//! Register content command.

use std::path::PathBuf;

use tracing::debug;

use paylane_types::{Amount, Fingerprint};

use crate::context::AppContext;
use crate::error::{CliError, CliResult};
use crate::output::{ContentOutput, OutputFormat, Render};

/// Execute the register command.
///
/// Exactly one of `file` and `fingerprint` names the content.
pub fn register(
    ctx: &AppContext,
    format: OutputFormat,
    file: Option<PathBuf>,
    fingerprint: Option<Fingerprint>,
    price: Amount,
    uri: &str,
) -> CliResult<String> {
    let fingerprint = match (file, fingerprint) {
        (_, Some(fp)) => fp,
        (Some(path), None) => {
            let bytes = std::fs::read(&path)?;
            let fp = Fingerprint::of(&bytes);
            debug!(path = %path.display(), fingerprint = %fp, "Fingerprinted file");
            fp
        }
        (None, None) => {
            return Err(CliError::user("Pass --file or --fingerprint."));
        }
    };

    let owner = ctx.agent()?;
    let entry = ctx.engine.register_content(fingerprint, price, uri, &owner)?;

    let output = ContentOutput {
        entry,
        token: ctx.token().to_string(),
    };
    Ok(output.render(format))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{test_context, AGENT};
    use paylane_types::ErrorCode;

    #[test]
    fn test_register_file() {
        let (temp_dir, ctx) = test_context();
        let path = temp_dir.path().join("report.pdf");
        std::fs::write(&path, b"quarterly numbers").unwrap();

        let out = register(
            &ctx,
            OutputFormat::Json,
            Some(path),
            None,
            2_500,
            "ipfs://report",
        )
        .unwrap();
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();

        let expected = Fingerprint::of(b"quarterly numbers");
        assert_eq!(json["fingerprint"], expected.to_hex());
        assert_eq!(json["owner"], AGENT);
        assert_eq!(json["price"], 2_500);
        assert_eq!(json["active"], true);
    }

    #[test]
    fn test_register_twice_fails() {
        let (_temp_dir, ctx) = test_context();
        let fp = Fingerprint::of(b"doc");
        register(&ctx, OutputFormat::Human, None, Some(fp), 10, "ipfs://doc").unwrap();

        let err = register(&ctx, OutputFormat::Human, None, Some(fp), 10, "ipfs://doc")
            .unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::AlreadyRegistered);
    }

    #[test]
    fn test_register_requires_agent() {
        let (_temp_dir, mut ctx) = test_context();
        ctx.config.agent.identity = String::new();

        let err = register(
            &ctx,
            OutputFormat::Human,
            None,
            Some(Fingerprint::of(b"doc")),
            10,
            "ipfs://doc",
        )
        .unwrap_err();
        assert!(matches!(err, CliError::AgentNotConfigured));
        assert_eq!(err.exit_code(), 3);
    }
}
