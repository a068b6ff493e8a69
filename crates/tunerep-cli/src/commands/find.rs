use tunerep_core::Endpoint;

use crate::cli::QueryArgs;
use crate::error::CliError;

use super::{report_query, CommandResult};

pub async fn run(args: &QueryArgs, endpoint: &Endpoint) -> Result<CommandResult, CliError> {
    let query = report_query(args)?;
    let envelope = endpoint.find(&query).await?;

    Ok(CommandResult::ok(serde_json::to_value(&envelope)?))
}
