use serde_json::json;
use tunerep_core::Endpoint;

use crate::cli::QueryArgs;
use crate::error::CliError;

use super::{report_query, CommandResult};

pub async fn run(args: &QueryArgs, endpoint: &Endpoint) -> Result<CommandResult, CliError> {
    let query = report_query(args)?;
    let count = endpoint.count(&query).await?;

    Ok(CommandResult::ok(json!({
        "controller": endpoint.controller(),
        "count": count,
    })))
}
