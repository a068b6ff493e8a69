use std::fmt::{Display, Formatter};

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use super::options::ExportFormat;
use crate::{ReportingError, ValidationError};

/// Server-side state of an export job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Complete,
    Fail,
}

impl JobStatus {
    /// Maps a service status string; unknown values keep the job running.
    pub fn from_wire(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" | "queued" => Self::Queued,
            "running" => Self::Running,
            "complete" | "completed" => Self::Complete,
            "fail" | "failed" => Self::Fail,
            other => {
                warn!(status = other, "unrecognized export status; treating as running");
                Self::Running
            }
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Complete => "complete",
            Self::Fail => "fail",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Fail)
    }
}

impl Display for JobStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A submitted export job as last observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportJob {
    job_id: String,
    format: ExportFormat,
    status: JobStatus,
    percent_complete: u8,
}

impl ExportJob {
    pub fn new(job_id: impl Into<String>, format: ExportFormat) -> Result<Self, ValidationError> {
        let job_id = job_id.into().trim().to_owned();
        if job_id.is_empty() {
            return Err(ValidationError::EmptyJobId);
        }

        Ok(Self {
            job_id,
            format,
            status: JobStatus::Queued,
            percent_complete: 0,
        })
    }

    /// Extracts the job id from an export-enqueue payload.
    ///
    /// Accepted shapes: `"<id>"`, `{"job_id": "<id>"}`, `{"data": {"job_id": "<id>"}}`.
    pub fn from_enqueue_payload(
        payload: &Value,
        format: ExportFormat,
    ) -> Result<Self, ReportingError> {
        let job_id = match payload {
            Value::String(id) => Some(id.as_str()),
            Value::Object(map) => map
                .get("job_id")
                .or_else(|| map.get("data").and_then(|data| data.get("job_id")))
                .and_then(Value::as_str),
            _ => None,
        };

        let job_id = job_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| ReportingError::sdk("export reply is missing 'job_id'"))?;

        Ok(Self::new(job_id, format)?)
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub const fn format(&self) -> ExportFormat {
        self.format
    }

    pub const fn status(&self) -> JobStatus {
        self.status
    }

    pub const fn percent_complete(&self) -> u8 {
        self.percent_complete
    }

    pub(crate) fn observe(&mut self, status: &ExportStatus) {
        self.status = status.status;
        self.percent_complete = status.percent_complete;
    }
}

/// One status read for an export job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportStatus {
    pub status: JobStatus,
    pub percent_complete: u8,
    pub payload: Value,
}

impl ExportStatus {
    /// Reads `status` and `percent_complete` from a status payload.
    ///
    /// Both are required; a reply without them is a service protocol failure.
    pub fn from_payload(http_status: u16, payload: Value) -> Result<Self, ReportingError> {
        let status = payload
            .get("status")
            .and_then(Value::as_str)
            .map(JobStatus::from_wire)
            .ok_or_else(|| {
                ReportingError::service(http_status, "export status reply is missing 'status'")
            })?;

        let percent_complete = payload
            .get("percent_complete")
            .and_then(parse_percent)
            .ok_or_else(|| {
                ReportingError::service(
                    http_status,
                    "export status reply is missing 'percent_complete'",
                )
            })?;

        Ok(Self {
            status,
            percent_complete,
            payload,
        })
    }

    /// Resolves the artifact URL from `url` or `data.url`.
    pub fn report_url(&self) -> Result<&str, ReportingError> {
        self.payload
            .get("url")
            .or_else(|| self.payload.get("data").and_then(|data| data.get("url")))
            .and_then(Value::as_str)
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| ReportingError::sdk("completed export reply is missing 'url'"))
    }
}

fn parse_percent(value: &Value) -> Option<u8> {
    let raw = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !raw.is_finite() {
        return None;
    }
    Some(raw.clamp(0.0, 100.0).round() as u8)
}
