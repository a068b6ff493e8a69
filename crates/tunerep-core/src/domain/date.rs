use std::fmt::{Display, Formatter};

use serde::{Serialize, Serializer};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, PrimitiveDateTime};

use crate::ValidationError;

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const DATE_TIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Report boundary: `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS`, in the report timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReportDate {
    Date(Date),
    DateTime(PrimitiveDateTime),
}

impl ReportDate {
    /// Parses either accepted layout; `field` names the parameter in errors.
    pub fn parse(field: &'static str, input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if let Ok(date) = Date::parse(trimmed, DATE_FORMAT) {
            return Ok(Self::Date(date));
        }
        if let Ok(date_time) = PrimitiveDateTime::parse(trimmed, DATE_TIME_FORMAT) {
            return Ok(Self::DateTime(date_time));
        }

        Err(ValidationError::InvalidDate {
            field,
            value: input.to_owned(),
        })
    }

    /// Wire form, identical to the accepted input layout.
    pub fn to_wire(self) -> String {
        let formatted = match self {
            Self::Date(date) => date.format(DATE_FORMAT),
            Self::DateTime(date_time) => date_time.format(DATE_TIME_FORMAT),
        };
        formatted.unwrap_or_else(|_| String::from("<unformattable>"))
    }
}

impl Display for ReportDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_wire())
    }
}

impl Serialize for ReportDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_wire())
    }
}
