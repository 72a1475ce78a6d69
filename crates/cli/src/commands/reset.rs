//! Built-in metric reset command

use anyhow::{Context, Result};
use clap::Args;
use generation_lib::metric::{self, prometheus_address};

use crate::output;

#[derive(Debug, Args)]
pub struct ResetMetricsArgs {
    /// Namespace running the bundled Prometheus instance
    #[arg(long, short, env = "OPTIMIZE_NAMESPACE", default_value = "default")]
    pub namespace: String,
}

/// Delete the series used by the built-in metrics
pub async fn run(args: &ResetMetricsArgs) -> Result<()> {
    let address = prometheus_address(&args.namespace);
    output::print_info(&format!("Resetting built-in metrics at {address}"));

    metric::flush(&args.namespace)
        .await
        .with_context(|| format!("Failed to reset built-in metrics at {address}"))?;

    output::print_success("Built-in metric series deleted");
    Ok(())
}
