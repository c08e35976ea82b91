//! Purchase command.

use paylane_settle::PaymentRail;
use paylane_types::{Fingerprint, Strategy};

use crate::context::Orchestrator;
use crate::error::CliResult;
use crate::output::{OutputFormat, PurchaseOutput, Render};

/// Execute the purchase command.
///
/// A result with failed items still renders; the caller decides the exit
/// status from `success`.
pub async fn purchase<R: PaymentRail>(
    orchestrator: &Orchestrator<R>,
    format: OutputFormat,
    fingerprints: &[Fingerprint],
    strategy: Strategy,
    force: bool,
) -> CliResult<(String, bool)> {
    let result = if fingerprints.len() == 1 && strategy == Strategy::Sequential {
        orchestrator.purchase_one(&fingerprints[0], force).await?
    } else {
        orchestrator.purchase(fingerprints, strategy, force).await?
    };

    let success = result.success;
    let output = PurchaseOutput::new(result, orchestrator.config().token.clone());
    Ok((output.render(format), success))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{seed, test_context};
    use paylane_store::PurchaseLog;
    use paylane_test_utils::{test_fingerprint, MockRail};
    use paylane_types::ErrorCode;

    #[tokio::test]
    async fn test_purchase_then_noop() {
        let (_temp_dir, ctx) = test_context();
        let a = seed(&ctx, 1, 400, "0xowner");
        let b = seed(&ctx, 2, 600, "0xowner");
        let orchestrator = ctx.orchestrator_with(MockRail::new()).unwrap();

        let (out, success) = purchase(
            &orchestrator,
            OutputFormat::Json,
            &[a, b],
            Strategy::Parallel,
            false,
        )
        .await
        .unwrap();
        assert!(success);
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["method"], "parallel");
        assert_eq!(json["total_paid"], 1_000);
        assert_eq!(json["items"][0]["status"], "paid");

        let (out, success) = purchase(
            &orchestrator,
            OutputFormat::Json,
            &[a, b],
            Strategy::Parallel,
            false,
        )
        .await
        .unwrap();
        assert!(success);
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["method"], "noop");
        assert_eq!(orchestrator.rail().call_count(), 2);
    }

    #[tokio::test]
    async fn test_purchase_single_unknown_is_error() {
        let (_temp_dir, ctx) = test_context();
        let orchestrator = ctx.orchestrator_with(MockRail::new()).unwrap();

        let err = purchase(
            &orchestrator,
            OutputFormat::Human,
            &[test_fingerprint(7)],
            Strategy::Sequential,
            false,
        )
        .await
        .unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_failed_item_reports_failure() {
        let (_temp_dir, ctx) = test_context();
        let a = seed(&ctx, 1, 400, "0xowner");
        let b = seed(&ctx, 2, 600, "0xowner");
        let orchestrator = ctx
            .orchestrator_with(MockRail::new().fail_lane(1))
            .unwrap();

        let (out, success) = purchase(
            &orchestrator,
            OutputFormat::Human,
            &[a, b],
            Strategy::Parallel,
            false,
        )
        .await
        .unwrap();
        assert!(!success);
        assert!(out.contains("Purchase incomplete"));
    }

    #[tokio::test]
    async fn test_budget_survives_restart() {
        let (_temp_dir, ctx) = test_context();
        let a = seed(&ctx, 1, 400, "0xowner");
        {
            let orchestrator = ctx.orchestrator_with(MockRail::new()).unwrap();
            purchase(
                &orchestrator,
                OutputFormat::Human,
                &[a],
                Strategy::Sequential,
                false,
            )
            .await
            .unwrap();
        }

        assert_eq!(ctx.orchestrator_with(MockRail::new()).unwrap().budget().unwrap().spent, 400);
        let log = paylane_store::LedgerDatabase::open(&ctx.config.store_config())
            .unwrap()
            .purchases();
        assert_eq!(log.all().unwrap().len(), 1);
    }
}
