use thiserror::Error;
use tunerep_core::{ReportingError, ValidationError};

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Reporting(#[from] ReportingError),

    #[error("command error: {0}")]
    Command(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) | Self::Command(_) => 2,
            Self::Reporting(error) => match error {
                ReportingError::InvalidArgument(_) => 2,
                ReportingError::Service { .. } => 3,
                ReportingError::Sdk { .. } => 6,
                ReportingError::Transport(_) => 7,
            },
            Self::Serialization(_) => 4,
            Self::Io(_) => 10,
        }
    }
}
