//! List content command.

use paylane_types::{ContentFilter, Identity};

use crate::context::AppContext;
use crate::error::CliResult;
use crate::output::{ListOutput, OutputFormat, Render};

/// Execute the list command.
pub fn list(
    ctx: &AppContext,
    format: OutputFormat,
    owner: Option<String>,
    active_only: bool,
    limit: usize,
) -> CliResult<String> {
    let mut filter = ContentFilter::new().with_limit(limit);
    if let Some(owner) = owner {
        filter = filter.with_owner(Identity::new(owner));
    }
    if active_only {
        filter = filter.with_active(true);
    }

    let content = ctx.engine.list_content(&filter)?;
    let total = content.len();

    let output = ListOutput {
        content,
        total,
        token: ctx.token().to_string(),
    };
    Ok(output.render(format))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{seed, test_context, AGENT};

    fn totals(out: &str) -> u64 {
        let json: serde_json::Value = serde_json::from_str(out).unwrap();
        json["total"].as_u64().unwrap()
    }

    #[test]
    fn test_list_filters() {
        let (_temp_dir, ctx) = test_context();
        let mine = seed(&ctx, 1, 100, AGENT);
        seed(&ctx, 2, 100, AGENT);
        seed(&ctx, 3, 100, "0xother");
        ctx.engine
            .toggle_active(&mine, &Identity::new(AGENT))
            .unwrap();

        let all = list(&ctx, OutputFormat::Json, None, false, 50).unwrap();
        assert_eq!(totals(&all), 3);

        let owned = list(&ctx, OutputFormat::Json, Some(AGENT.to_string()), false, 50).unwrap();
        assert_eq!(totals(&owned), 2);

        let active = list(&ctx, OutputFormat::Json, None, true, 50).unwrap();
        assert_eq!(totals(&active), 2);

        let limited = list(&ctx, OutputFormat::Json, None, false, 1).unwrap();
        assert_eq!(totals(&limited), 1);
    }

    #[test]
    fn test_list_empty() {
        let (_temp_dir, ctx) = test_context();
        let out = list(&ctx, OutputFormat::Human, None, false, 50).unwrap();
        assert!(out.contains("No content registered"));
    }
}
