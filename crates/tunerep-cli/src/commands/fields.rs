use serde_json::json;
use tunerep_core::{Endpoint, FieldSelection};

use crate::cli::FieldsArgs;
use crate::error::CliError;

use super::CommandResult;

pub async fn run(args: &FieldsArgs, endpoint: &Endpoint) -> Result<CommandResult, CliError> {
    let selection: FieldSelection = args.policy.parse()?;
    let fields = endpoint.fields(selection).await?;

    Ok(CommandResult::ok(json!({
        "controller": endpoint.controller(),
        "policy": selection.to_string(),
        "fields": fields,
    })))
}
