//! Queue an export job and poll it to a terminal state.

use serde_json::json;
use tracing::info;
use tunerep_core::{Endpoint, PollConfig, PollOutcome};

use crate::cli::ExportArgs;
use crate::error::CliError;

use super::{export_format, report_query, CommandResult};

/// `verbose` turns on per-poll progress events.
pub async fn run(
    args: &ExportArgs,
    endpoint: &Endpoint,
    verbose: bool,
) -> Result<CommandResult, CliError> {
    let query = report_query(&args.query)?;
    let format = export_format(args.format);
    let config = PollConfig::new(args.sleep_seconds, args.timeout_seconds, verbose);
    config.validate()?;

    let job = endpoint.export(&query, format).await?;
    info!(job_id = job.job_id(), "export job queued");

    match endpoint.poller(job, config).run().await? {
        PollOutcome::Completed(completed) => Ok(CommandResult::ok(json!({
            "state": "completed",
            "job_id": completed.job.job_id(),
            "format": completed.job.format(),
            "attempts": completed.attempts,
            "url": completed.report_url()?,
        }))),
        PollOutcome::TimedOut(timed_out) => Ok(CommandResult::incomplete(json!({
            "state": "timed_out",
            "job_id": timed_out.job.job_id(),
            "status": timed_out.job.status(),
            "percent_complete": timed_out.job.percent_complete(),
            "attempts": timed_out.attempts,
            "elapsed_seconds": timed_out.elapsed.as_secs(),
        }))),
    }
}
