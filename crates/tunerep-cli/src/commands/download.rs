use tunerep_core::ServiceClient;

use crate::cli::DownloadArgs;
use crate::error::CliError;

use super::CommandResult;

pub async fn run(args: &DownloadArgs, client: &ServiceClient) -> Result<CommandResult, CliError> {
    let body = client.download(&args.url).await?;
    Ok(CommandResult::text(body))
}
