use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use super::field_list::is_field_name;
use crate::ValidationError;

/// Sort direction for one `sort[field]` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(field: &str, value: &str) -> Result<Self, ValidationError> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ASC" => Ok(Self::Asc),
            "DESC" => Ok(Self::Desc),
            _ => Err(ValidationError::InvalidSortDirection {
                field: field.to_owned(),
                value: value.to_owned(),
            }),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Validates a sort map, preserving caller order.
pub fn parse_sort(
    entries: &[(String, String)],
) -> Result<Vec<(String, SortDirection)>, ValidationError> {
    entries
        .iter()
        .map(|(field, direction)| {
            let field = field.trim();
            if !is_field_name(field) {
                return Err(ValidationError::InvalidFieldName {
                    value: field.to_owned(),
                });
            }
            Ok((field.to_owned(), SortDirection::parse(field, direction)?))
        })
        .collect()
}

/// Row bucketing for endpoints that support the `timestamp` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampGranularity {
    Hour,
    DateHour,
    Date,
    Week,
    Month,
}

impl TimestampGranularity {
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "hour" => Ok(Self::Hour),
            "datehour" => Ok(Self::DateHour),
            "date" => Ok(Self::Date),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            _ => Err(ValidationError::InvalidTimestampGranularity {
                value: value.to_owned(),
            }),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::DateHour => "datehour",
            Self::Date => "date",
            Self::Week => "week",
            Self::Month => "month",
        }
    }
}

/// Validates a `response_timezone` value such as `America/Los_Angeles`.
pub fn parse_timezone(value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    let valid = !trimmed.is_empty()
        && trimmed
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '/' | '+' | '-'));
    if !valid {
        return Err(ValidationError::InvalidTimezone {
            value: value.to_owned(),
        });
    }
    Ok(trimmed.to_owned())
}

/// Artifact format produced by an export job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(ValidationError::InvalidExportFormat {
                value: value.to_owned(),
            }),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

impl Display for ExportFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CohortType {
    Click,
    Install,
}

impl CohortType {
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "click" => Ok(Self::Click),
            "install" => Ok(Self::Install),
            _ => Err(ValidationError::InvalidCohortType {
                value: value.to_owned(),
            }),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::Install => "install",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CohortInterval {
    YearDay,
    YearWeek,
    YearMonth,
    Year,
}

impl CohortInterval {
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "year_day" => Ok(Self::YearDay),
            "year_week" => Ok(Self::YearWeek),
            "year_month" => Ok(Self::YearMonth),
            "year" => Ok(Self::Year),
            _ => Err(ValidationError::InvalidCohortInterval {
                value: value.to_owned(),
            }),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::YearDay => "year_day",
            Self::YearWeek => "year_week",
            Self::YearMonth => "year_month",
            Self::Year => "year",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationType {
    Incremental,
    Cumulative,
}

impl AggregationType {
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "incremental" => Ok(Self::Incremental),
            "cumulative" => Ok(Self::Cumulative),
            _ => Err(ValidationError::InvalidAggregationType {
                value: value.to_owned(),
            }),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Incremental => "incremental",
            Self::Cumulative => "cumulative",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_direction_is_case_insensitive() {
        assert_eq!(SortDirection::parse("id", "desc"), Ok(SortDirection::Desc));
        assert_eq!(SortDirection::parse("id", " Asc "), Ok(SortDirection::Asc));
        assert!(matches!(
            SortDirection::parse("id", "up"),
            Err(ValidationError::InvalidSortDirection { .. })
        ));
    }

    #[test]
    fn sort_rejects_bad_field_names() {
        let entries = vec![(String::from("id;"), String::from("ASC"))];
        assert!(matches!(
            parse_sort(&entries),
            Err(ValidationError::InvalidFieldName { .. })
        ));
    }

    #[test]
    fn timezone_accepts_iana_names() {
        assert_eq!(
            parse_timezone("America/Los_Angeles").as_deref(),
            Ok("America/Los_Angeles")
        );
        assert_eq!(parse_timezone("Etc/GMT+8").as_deref(), Ok("Etc/GMT+8"));
        assert!(parse_timezone("").is_err());
        assert!(parse_timezone("UTC; drop").is_err());
    }

    #[test]
    fn granularity_round_trips_wire_names() {
        for name in ["hour", "datehour", "date", "week", "month"] {
            let parsed = TimestampGranularity::parse(name).expect("valid granularity");
            assert_eq!(parsed.as_str(), name);
        }
        assert!(TimestampGranularity::parse("minute").is_err());
    }
}
