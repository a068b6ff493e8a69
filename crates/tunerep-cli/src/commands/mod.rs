mod count;
mod download;
mod export;
mod fields;
mod find;

use serde_json::Value;
use tunerep_core::{
    ClientConfig, Endpoint, EndpointCapabilities, EndpointDefinition, ExportFormat,
    ReportQuery, ServiceClient,
};

use crate::cli::{ArtifactFormat, Cli, Command, EndpointPreset, QueryArgs};
use crate::error::CliError;

pub enum Output {
    Json(Value),
    /// Printed verbatim.
    Text(String),
}

pub struct CommandResult {
    pub output: Output,
    /// False when the command stopped short of a final result, e.g. an export
    /// that ran out of poll budget.
    pub complete: bool,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self {
            output: Output::Json(data),
            complete: true,
        }
    }

    pub fn incomplete(data: Value) -> Self {
        Self {
            output: Output::Json(data),
            complete: false,
        }
    }

    pub fn text(body: String) -> Self {
        Self {
            output: Output::Text(body),
            complete: true,
        }
    }
}

pub async fn run(cli: &Cli) -> Result<CommandResult, CliError> {
    let config = ClientConfig::from_env()?;
    let client = ServiceClient::new(config);

    if let Command::Download(args) = &cli.command {
        return download::run(args, &client).await;
    }

    let endpoint = Endpoint::new(client, endpoint_definition(cli))
        .with_validate_fields(cli.validate_fields);

    match &cli.command {
        Command::Fields(args) => fields::run(args, &endpoint).await,
        Command::Count(args) => count::run(args, &endpoint).await,
        Command::Find(args) => find::run(args, &endpoint).await,
        Command::Export(args) => export::run(args, &endpoint, cli.verbose > 0).await,
        Command::Download(_) => Err(CliError::Command(String::from(
            "download does not use an endpoint",
        ))),
    }
}

fn endpoint_definition(cli: &Cli) -> EndpointDefinition {
    if let Some(controller) = &cli.controller {
        return EndpointDefinition::new(
            controller.as_str(),
            EndpointCapabilities {
                filters_debug_mode: cli.filter_debug_mode,
                filters_test_profile: cli.filter_test_profile,
                supports_cohort: cli.supports_cohort,
                supports_timestamp_granularity: cli.supports_timestamp,
            },
        );
    }

    match cli.endpoint {
        EndpointPreset::Actuals => EndpointDefinition::actuals(),
        EndpointPreset::Clicks => EndpointDefinition::clicks(),
        EndpointPreset::CohortValue => EndpointDefinition::cohort_value(),
        EndpointPreset::CohortRetention => EndpointDefinition::cohort_retention(),
    }
}

/// Maps query flags onto a [`ReportQuery`]; values are validated by the core.
pub(crate) fn report_query(args: &QueryArgs) -> Result<ReportQuery, CliError> {
    let mut query = ReportQuery::new().dates(args.start_date.as_str(), args.end_date.as_str());

    if let Some(fields) = &args.fields {
        query = query.fields(fields.as_str());
    }
    if let Some(group) = &args.group {
        query = query.group(group.as_str());
    }
    if let Some(filter) = &args.filter {
        query = query.filter(filter.as_str());
    }
    if let Some(limit) = args.limit {
        query = query.limit(limit);
    }
    if let Some(page) = args.page {
        query = query.page(page);
    }
    for entry in &args.sort {
        let (field, direction) = entry.split_once(':').ok_or_else(|| {
            CliError::Command(format!("sort entry '{entry}' must look like field:ASC"))
        })?;
        query = query.sort(field, direction);
    }
    if let Some(timestamp) = &args.timestamp {
        query = query.timestamp(timestamp.as_str());
    }
    if let Some(timezone) = &args.timezone {
        query = query.timezone(timezone.as_str());
    }
    if let Some(cohort_type) = &args.cohort_type {
        query = query.cohort_type(cohort_type.as_str());
    }
    if let Some(cohort_interval) = &args.cohort_interval {
        query = query.cohort_interval(cohort_interval.as_str());
    }
    if let Some(aggregation_type) = &args.aggregation_type {
        query = query.aggregation_type(aggregation_type.as_str());
    }

    Ok(query)
}

pub(crate) const fn export_format(format: ArtifactFormat) -> ExportFormat {
    match format {
        ArtifactFormat::Csv => ExportFormat::Csv,
        ArtifactFormat::Json => ExportFormat::Json,
    }
}
