//! # Tunerep Core
//!
//! Client core for a TUNE-style analytics reporting service.
//!
//! ## Overview
//!
//! - **Filter validation** for the service's SQL-like filter language
//! - **Field metadata discovery** with per-endpoint caching and selection policies
//! - **Request building** for `count`, `find`, export and status calls
//! - **Export polling** from submission to a completed artifact URL or a timeout
//! - **Response envelope** normalizing status, payload, errors and debug data
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`backoff`] | Delay schedule between status polls |
//! | [`codec`] | Query parameter wire encoding |
//! | [`config`] | Client and poll configuration |
//! | [`domain`] | Validated parameter types and the export job model |
//! | [`endpoint`] | Endpoint definitions and report operations |
//! | [`envelope`] | Normalized service replies |
//! | [`error`] | Error taxonomy |
//! | [`fields`] | Field metadata merge and selection |
//! | [`filter`] | Filter expression validation |
//! | [`http_client`] | HTTP client abstraction |
//! | [`poller`] | Export job state machine |
//! | [`request`] | Report request composition |
//! | [`transport`] | Service calls over the HTTP seam |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tunerep_core::{
//!     ClientConfig, Endpoint, EndpointDefinition, ExportFormat, PollConfig, PollOutcome,
//!     ReportQuery, ServiceClient,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ServiceClient::new(ClientConfig::from_env()?);
//!     let endpoint = Endpoint::new(client, EndpointDefinition::actuals());
//!
//!     let query = ReportQuery::new()
//!         .dates("2024-01-01", "2024-01-02")
//!         .filter("publisher_id > 0");
//!
//!     let outcome = endpoint
//!         .export_and_wait(&query, ExportFormat::Csv, PollConfig::default())
//!         .await?;
//!     if let PollOutcome::Completed(completed) = outcome {
//!         println!("{}", completed.report_url()?);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`ReportingError`]:
//!
//! ```rust
//! use tunerep_core::ReportingError;
//!
//! fn describe(error: &ReportingError) -> &'static str {
//!     match error {
//!         ReportingError::InvalidArgument(_) => "fix the request",
//!         ReportingError::Sdk { .. } => "unexpected reply shape",
//!         ReportingError::Service { .. } => "the service reported a failure",
//!         ReportingError::Transport(_) => "network problem",
//!     }
//! }
//! ```
//!
//! Validation always happens before a request is sent. Running out of poll
//! budget is not an error: it is [`PollOutcome::TimedOut`].
//!
//! ## Security
//!
//! - The API key is never logged; URLs in logs and errors are redacted

pub mod backoff;
pub mod codec;
pub mod config;
pub mod domain;
pub mod endpoint;
pub mod envelope;
pub mod error;
pub mod fields;
pub mod filter;
pub mod http_client;
pub mod poller;
pub mod request;
pub mod transport;

// Re-export commonly used types at crate root for convenience

pub use backoff::Backoff;

pub use codec::{QueryParams, QueryValue};

pub use config::{ClientConfig, PollConfig};

pub use domain::{
    AggregationType, CohortInterval, CohortType, ExportFormat, ExportJob, ExportStatus,
    FieldList, FieldsInput, JobStatus, ReportDate, SortDirection, TimestampGranularity,
};

pub use endpoint::{Endpoint, EndpointDefinition};

pub use envelope::{ErrorDetail, ResponseEnvelope};

pub use error::{FilterError, ReportingError, ValidationError};

pub use fields::{FieldCatalog, FieldMetadata, FieldSelection};

pub use filter::FilterExpression;

pub use http_client::{
    HttpClient, HttpError, HttpErrorKind, HttpRequest, HttpResponse, ReqwestHttpClient,
};

pub use poller::{
    CompletedExport, ExportJobPoller, JobState, PollObserver, PollOutcome, StatusSource,
    TimedOutExport, TracingObserver,
};

pub use request::{conjoin_filters, Action, EndpointCapabilities, ReportQuery, ReportRequest};

pub use transport::ServiceClient;
