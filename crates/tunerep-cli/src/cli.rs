//! CLI argument definitions for tunerep.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `fields` | List endpoint fields for a selection policy |
//! | `count` | Count report rows |
//! | `find` | Fetch report rows |
//! | `export` | Queue an export and poll until it finishes |
//! | `download` | Fetch a finished report artifact |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--endpoint` | `actuals` | Built-in endpoint preset |
//! | `--controller` | none | Custom controller path, overrides the preset |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `-v` | off | Raise log verbosity (repeatable) |
//!
//! # Examples
//!
//! ```bash
//! tunerep fields --policy default+related
//! tunerep count --start-date 2024-01-01 --end-date 2024-01-02 --filter "publisher_id > 0"
//! tunerep --endpoint clicks export --start-date 2024-01-01 --end-date 2024-01-01 --format json
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Command-line client for the TUNE reporting API.
///
/// Reads `TUNE_REPORTING_API_KEY`, and optionally `TUNE_REPORTING_BASE_URL`
/// and `TUNE_REPORTING_TIMEOUT_MS`, from the environment.
#[derive(Debug, Parser)]
#[command(name = "tunerep", author, version, about = "TUNE reporting API client")]
pub struct Cli {
    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Raise log verbosity (`-v` info, `-vv` debug). `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Built-in endpoint preset.
    #[arg(long, global = true, value_enum, default_value_t = EndpointPreset::Actuals)]
    pub endpoint: EndpointPreset,

    /// Custom controller path such as `advertiser/stats/installs`.
    ///
    /// Capabilities then come from the `--filter-*` and `--supports-*` flags.
    #[arg(long, global = true)]
    pub controller: Option<String>,

    /// Exclude debug-mode traffic (custom controllers only).
    #[arg(long, global = true, default_value_t = false)]
    pub filter_debug_mode: bool,

    /// Exclude test-profile traffic (custom controllers only).
    #[arg(long, global = true, default_value_t = false)]
    pub filter_test_profile: bool,

    /// Endpoint takes cohort settings (custom controllers only).
    #[arg(long, global = true, default_value_t = false)]
    pub supports_cohort: bool,

    /// Endpoint accepts `--timestamp` (custom controllers only).
    #[arg(long, global = true, default_value_t = false)]
    pub supports_timestamp: bool,

    /// Request stricter field checks.
    #[arg(long, global = true, default_value_t = false)]
    pub validate_fields: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EndpointPreset {
    Actuals,
    Clicks,
    CohortValue,
    CohortRetention,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List fields exposed by the endpoint.
    Fields(FieldsArgs),
    /// Count rows matching a query.
    Count(QueryArgs),
    /// Fetch rows matching a query.
    Find(QueryArgs),
    /// Queue an export job and wait for its artifact URL.
    Export(ExportArgs),
    /// Print the raw body of a finished report artifact.
    Download(DownloadArgs),
}

#[derive(Debug, Args)]
pub struct FieldsArgs {
    /// Selection policy: all, endpoint, default, related, minimal,
    /// recommended; combine with `+`.
    #[arg(long, default_value = "default")]
    pub policy: String,
}

#[derive(Debug, Clone, Args)]
pub struct QueryArgs {
    /// Report start, `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS`.
    #[arg(long)]
    pub start_date: String,

    /// Report end, `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS`.
    #[arg(long)]
    pub end_date: String,

    /// Comma-separated fields. Defaults to the endpoint's resolved fields.
    #[arg(long)]
    pub fields: Option<String>,

    /// Comma-separated group-by fields.
    #[arg(long)]
    pub group: Option<String>,

    /// Filter expression, e.g. `publisher_id > 0 AND site_id IN (1, 2)`.
    #[arg(long)]
    pub filter: Option<String>,

    #[arg(long, allow_negative_numbers = true)]
    pub limit: Option<i64>,

    #[arg(long, allow_negative_numbers = true)]
    pub page: Option<i64>,

    /// Sort entry as `field:ASC` or `field:DESC`; repeatable.
    #[arg(long = "sort")]
    pub sort: Vec<String>,

    /// Row bucketing: hour, datehour, date, week, month.
    #[arg(long)]
    pub timestamp: Option<String>,

    /// Response timezone, e.g. `America/Los_Angeles`.
    #[arg(long)]
    pub timezone: Option<String>,

    /// Cohort type: click or install.
    #[arg(long)]
    pub cohort_type: Option<String>,

    /// Cohort interval: year_day, year_week, year_month, year.
    #[arg(long)]
    pub cohort_interval: Option<String>,

    /// Cohort aggregation: incremental or cumulative.
    #[arg(long)]
    pub aggregation_type: Option<String>,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub query: QueryArgs,

    /// Artifact format.
    #[arg(long, value_enum, default_value_t = ArtifactFormat::Csv)]
    pub format: ArtifactFormat,

    /// Seconds between status polls.
    #[arg(long, default_value_t = 10)]
    pub sleep_seconds: u64,

    /// Poll budget in seconds; 0 waits indefinitely.
    #[arg(long, default_value_t = 300)]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ArtifactFormat {
    Csv,
    Json,
}

#[derive(Debug, Args)]
pub struct DownloadArgs {
    /// Artifact URL returned by `export`.
    pub url: String,
}
