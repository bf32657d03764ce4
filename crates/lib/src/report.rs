//! Implementation of `report`: publish a completion metric.

use anyhow::Result;
use fn_error_context::context;

use amicycle_utils::{output, success};

use crate::cli::{ReportArgs, ReportOpts};
use crate::service::MetricsService;

/// Metric value used when `--value` is not given.
pub(crate) const DEFAULT_METRIC_VALUE: f64 = 1.0;
/// Metric unit used when `--unit` is not given.
pub(crate) const DEFAULT_METRIC_UNIT: &str = "Count";

/// Entry point for the `report` subcommand.
pub(crate) async fn run(opts: &ReportOpts) -> Result<()> {
    let args = opts.validated()?;
    let config = crate::aws::load_config(&args.region).await;
    let cloudwatch = crate::aws::CloudWatchService::new(&config);
    report(&args, &cloudwatch).await
}

/// Publish one metric datum.
#[context("reporting metric")]
pub(crate) async fn report(args: &ReportArgs, metrics: &dyn MetricsService) -> Result<()> {
    output(format!(
        "==> Writing metric {}/{} = {} {} to CloudWatch...",
        args.namespace, args.name, args.value, args.unit
    ));
    metrics
        .put_metric(&args.namespace, &args.name, args.value, &args.unit)
        .await?;
    success("==> Success! Metric reported.");
    Ok(())
}
