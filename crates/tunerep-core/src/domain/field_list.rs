use serde::Serialize;

use crate::ValidationError;

/// Caller input for `fields`/`group`: a comma-joined string or an ordered list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldsInput {
    Joined(String),
    List(Vec<String>),
}

impl From<&str> for FieldsInput {
    fn from(value: &str) -> Self {
        Self::Joined(value.to_owned())
    }
}

impl From<String> for FieldsInput {
    fn from(value: String) -> Self {
        Self::Joined(value)
    }
}

impl From<Vec<String>> for FieldsInput {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

impl From<Vec<&str>> for FieldsInput {
    fn from(value: Vec<&str>) -> Self {
        Self::List(value.into_iter().map(str::to_owned).collect())
    }
}

impl From<&[&str]> for FieldsInput {
    fn from(value: &[&str]) -> Self {
        Self::List(value.iter().map(|item| (*item).to_owned()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for FieldsInput {
    fn from(value: [&str; N]) -> Self {
        Self::List(value.iter().map(|item| (*item).to_owned()).collect())
    }
}

/// Normalized, non-empty list of field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub struct FieldList(Vec<String>);

impl FieldList {
    /// Strips whitespace, drops empty entries, and rejects an empty result.
    pub fn parse(param: &'static str, input: &FieldsInput) -> Result<Self, ValidationError> {
        let raw: Vec<&str> = match input {
            FieldsInput::Joined(joined) => joined.split(',').collect(),
            FieldsInput::List(items) => items.iter().flat_map(|item| item.split(',')).collect(),
        };

        let mut fields = Vec::with_capacity(raw.len());
        for item in raw {
            let name: String = item.chars().filter(|ch| !ch.is_whitespace()).collect();
            if name.is_empty() {
                continue;
            }
            if !is_field_name(&name) {
                return Err(ValidationError::InvalidFieldName { value: name });
            }
            fields.push(name);
        }

        if fields.is_empty() {
            return Err(ValidationError::EmptyFieldList { param });
        }

        Ok(Self(fields))
    }

    pub fn from_names(param: &'static str, names: &[String]) -> Result<Self, ValidationError> {
        Self::parse(param, &FieldsInput::List(names.to_vec()))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn joined(&self) -> String {
        self.0.join(",")
    }
}

impl From<FieldList> for String {
    fn from(value: FieldList) -> Self {
        value.joined()
    }
}

pub(crate) fn is_field_name(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '.')
}
