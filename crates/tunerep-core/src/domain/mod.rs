//! # Domain Types
//!
//! Validated parameter types used when composing report queries, plus the
//! export job model driven by the poller.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ReportDate`] | `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS` boundary |
//! | [`FieldList`] | Normalized, non-empty field/group list |
//! | [`SortDirection`] | `ASC` / `DESC` |
//! | [`TimestampGranularity`] | Row bucketing (`hour` .. `month`) |
//! | [`ExportFormat`] | `csv` / `json` artifact format |
//! | [`CohortType`], [`CohortInterval`], [`AggregationType`] | Cohort report settings |
//! | [`ExportJob`], [`ExportStatus`], [`JobStatus`] | Export job lifecycle |
//!
//! All constructors validate their input and return
//! [`ValidationError`](crate::ValidationError) before anything reaches the network.

mod date;
mod export;
mod field_list;
mod options;

pub use date::ReportDate;
pub use export::{ExportJob, ExportStatus, JobStatus};
pub use field_list::{FieldList, FieldsInput};
pub use options::{
    parse_sort, parse_timezone, AggregationType, CohortInterval, CohortType, ExportFormat,
    SortDirection, TimestampGranularity,
};
