use thiserror::Error;

use crate::envelope::ErrorDetail;
use crate::http_client::HttpError;

/// Lexical failures raised while validating a filter expression.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("filter cannot be empty")]
    Empty,
    #[error("unexpected closing '{found}' at index {index}")]
    UnexpectedClose { found: char, index: usize },
    #[error("closing '{found}' at index {index} does not match opening '{expected}'")]
    MismatchedClose {
        found: char,
        expected: char,
        index: usize,
    },
    #[error("opening '{open}' at index {index} is never closed")]
    UnclosedOpen { open: char, index: usize },
    #[error("invalid token '{token}'")]
    InvalidToken { token: String },
}

/// Local validation errors, always raised before any network call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid filter: {0}")]
    InvalidFilter(#[from] FilterError),

    #[error("parameter '{name}' is required")]
    MissingParameter { name: &'static str },

    #[error("'{field}' must be YYYY-MM-DD or YYYY-MM-DD HH:MM:SS: '{value}'")]
    InvalidDate { field: &'static str, value: String },

    #[error("'{param}' must contain at least one field")]
    EmptyFieldList { param: &'static str },
    #[error("invalid field name '{value}'")]
    InvalidFieldName { value: String },

    #[error("sort direction for '{field}' must be ASC or DESC: '{value}'")]
    InvalidSortDirection { field: String, value: String },

    #[error("'{field}' must be non-negative, got {value}")]
    NegativeValue { field: &'static str, value: i64 },

    #[error("invalid timestamp granularity '{value}', expected one of hour, datehour, date, week, month")]
    InvalidTimestampGranularity { value: String },
    #[error("invalid timezone '{value}'")]
    InvalidTimezone { value: String },
    #[error("invalid export format '{value}', expected csv or json")]
    InvalidExportFormat { value: String },

    #[error("invalid cohort type '{value}', expected click or install")]
    InvalidCohortType { value: String },
    #[error("invalid cohort interval '{value}', expected one of year_day, year_week, year_month, year")]
    InvalidCohortInterval { value: String },
    #[error("invalid aggregation type '{value}', expected incremental or cumulative")]
    InvalidAggregationType { value: String },

    #[error("parameter '{name}' is not supported by controller '{controller}'")]
    UnsupportedParameter {
        name: &'static str,
        controller: String,
    },

    #[error("api key cannot be empty")]
    EmptyApiKey,
    #[error("job id cannot be empty")]
    EmptyJobId,
    #[error("invalid configuration value for {name}: '{value}'")]
    InvalidConfig { name: &'static str, value: String },
}

/// Top-level error type for reporting operations.
#[derive(Debug, Error)]
pub enum ReportingError {
    /// Caller input failed local validation.
    #[error(transparent)]
    InvalidArgument(#[from] ValidationError),

    /// The service reply did not have the expected shape.
    #[error("unexpected service reply: {message}")]
    Sdk { message: String },

    /// The service reported a failure, or an export job failed.
    #[error("service error (status {status}): {message}")]
    Service {
        status: u16,
        message: String,
        errors: Vec<ErrorDetail>,
    },

    #[error(transparent)]
    Transport(#[from] HttpError),
}

impl ReportingError {
    pub fn sdk(message: impl Into<String>) -> Self {
        Self::Sdk {
            message: message.into(),
        }
    }

    pub fn service(status: u16, message: impl Into<String>) -> Self {
        Self::Service {
            status,
            message: message.into(),
            errors: Vec::new(),
        }
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "reporting.invalid_argument",
            Self::Sdk { .. } => "reporting.sdk",
            Self::Service { .. } => "reporting.service",
            Self::Transport(_) => "reporting.transport",
        }
    }
}

impl From<FilterError> for ReportingError {
    fn from(value: FilterError) -> Self {
        Self::InvalidArgument(ValidationError::InvalidFilter(value))
    }
}
