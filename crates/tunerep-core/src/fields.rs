//! Field metadata discovery, merging, and selection.
//!
//! Each endpoint describes its fields through the `apidoc/get_controllers`
//! call. The reply is split into direct fields (`publisher_id`) and related
//! fields (`publisher.name`), merged so that every `<prefix>_id` field also
//! exposes a `<prefix>.name` convenience field, and then filtered by a
//! [`FieldSelection`] policy.

use std::collections::{HashMap, HashSet};
use std::fmt::{Debug, Display, Formatter};
use std::ops::{BitOr, BitOrAssign};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{ReportingError, ValidationError};

/// Bit-set selecting which discovered fields to return.
///
/// [`ALL`](Self::ALL) is the empty set.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FieldSelection(u8);

impl FieldSelection {
    pub const ALL: Self = Self(0);
    pub const ENDPOINT_ONLY: Self = Self(1);
    pub const DEFAULT_ONLY: Self = Self(1 << 1);
    pub const RELATED: Self = Self(1 << 2);
    pub const MINIMAL: Self = Self(1 << 3);
    pub const RECOMMENDED: Self = Self(1 << 4);

    const NAMED: [(Self, &'static str); 5] = [
        (Self::ENDPOINT_ONLY, "EndpointOnly"),
        (Self::DEFAULT_ONLY, "DefaultOnly"),
        (Self::RELATED, "Related"),
        (Self::MINIMAL, "Minimal"),
        (Self::RECOMMENDED, "Recommended"),
    ];

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_all(self) -> bool {
        self.0 == 0
    }

    pub const fn has(self, flag: Self) -> bool {
        self.0 & flag.0 != 0
    }
}

impl BitOr for FieldSelection {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for FieldSelection {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl Display for FieldSelection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_all() {
            return f.write_str("All");
        }

        let names = Self::NAMED
            .iter()
            .filter(|(flag, _)| self.has(*flag))
            .map(|(_, name)| *name)
            .collect::<Vec<_>>();
        f.write_str(&names.join("|"))
    }
}

impl Debug for FieldSelection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "FieldSelection({self})")
    }
}

impl FromStr for FieldSelection {
    type Err = ValidationError;

    /// Parses `all`, `endpoint`, `default`, `related`, `minimal`, `recommended`,
    /// combined with `+` or `,`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut selection = Self::ALL;
        for part in s.split(['+', ',']).map(str::trim) {
            selection |= match part.to_ascii_lowercase().as_str() {
                "all" => Self::ALL,
                "endpoint" | "endpoint_only" => Self::ENDPOINT_ONLY,
                "default" | "default_only" => Self::DEFAULT_ONLY,
                "related" => Self::RELATED,
                "minimal" => Self::MINIMAL,
                "recommended" => Self::RECOMMENDED,
                _ => {
                    return Err(ValidationError::InvalidConfig {
                        name: "field selection",
                        value: s.to_owned(),
                    })
                }
            };
        }
        Ok(selection)
    }
}

/// One merged field exposed by an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldMetadata {
    pub name: String,
    pub is_default: bool,
    pub is_related: bool,
}

#[derive(Debug, Deserialize)]
struct ControllerDescription {
    #[serde(rename = "modelName", default)]
    model_name: Option<String>,
    #[serde(default)]
    fields: Vec<DescribedField>,
}

#[derive(Debug, Deserialize)]
struct DescribedField {
    name: String,
    #[serde(
        rename = "fieldDefault",
        alias = "default",
        default,
        deserialize_with = "flexible_bool"
    )]
    field_default: bool,
    #[serde(default, deserialize_with = "flexible_bool")]
    related: bool,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

impl DescribedField {
    fn is_placeholder(&self) -> bool {
        !self.name.contains('.')
            && (self.related || self.kind.as_deref() == Some("property"))
    }
}

fn flexible_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(flag)) => flag,
        Some(Value::Number(number)) => number.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(text)) => matches!(
            text.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes"
        ),
        _ => false,
    })
}

/// Merged field metadata for one endpoint, in reply order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldCatalog {
    controller: String,
    model_name: Option<String>,
    fields: Vec<FieldMetadata>,
}

impl FieldCatalog {
    /// Builds the catalog from a `get_controllers` payload.
    pub fn from_describe_payload(
        controller: &str,
        payload: Value,
    ) -> Result<Self, ReportingError> {
        let descriptions: Vec<ControllerDescription> = match payload {
            Value::Array(_) => serde_json::from_value(payload),
            Value::Object(_) => serde_json::from_value(payload).map(|single| vec![single]),
            _ => {
                return Err(ReportingError::sdk(format!(
                    "field discovery for '{controller}' returned no controller description"
                )))
            }
        }
        .map_err(|error| {
            ReportingError::sdk(format!(
                "field discovery for '{controller}' has an unexpected shape: {error}"
            ))
        })?;

        let description = descriptions.into_iter().next().ok_or_else(|| {
            ReportingError::sdk(format!(
                "field discovery for '{controller}' returned no controller description"
            ))
        })?;

        Ok(Self::merge(
            controller,
            description.model_name,
            description.fields,
        ))
    }

    fn merge(controller: &str, model_name: Option<String>, described: Vec<DescribedField>) -> Self {
        // related-property group -> (property, default flag)
        let mut groups: HashMap<String, Vec<(String, bool)>> = HashMap::new();
        for field in &described {
            if let Some((prefix, property)) = field.name.split_once('.') {
                groups
                    .entry(prefix.to_owned())
                    .or_default()
                    .push((property.to_owned(), field.field_default));
            } else if field.is_placeholder() {
                groups.entry(field.name.clone()).or_default();
            }
        }

        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(described.len());
        let mut push = |field: FieldMetadata| {
            if seen.insert(field.name.clone()) {
                fields.push(field);
            }
        };

        for field in described {
            if field.name.contains('.') {
                push(FieldMetadata {
                    name: field.name,
                    is_default: field.field_default,
                    is_related: true,
                });
                continue;
            }
            if field.is_placeholder() {
                continue;
            }

            let derived = related_name_field(&field.name).map(|(prefix, name_field)| {
                let is_default = groups
                    .get(prefix)
                    .and_then(|group| group.iter().find(|(property, _)| property == "name"))
                    .map(|(_, is_default)| *is_default)
                    .unwrap_or(field.field_default);
                FieldMetadata {
                    name: name_field,
                    is_default,
                    is_related: true,
                }
            });

            push(FieldMetadata {
                name: field.name,
                is_default: field.field_default,
                is_related: false,
            });
            if let Some(derived) = derived {
                push(derived);
            }
        }

        Self {
            controller: controller.to_owned(),
            model_name,
            fields,
        }
    }

    pub fn controller(&self) -> &str {
        &self.controller
    }

    pub fn model_name(&self) -> Option<&str> {
        self.model_name.as_deref()
    }

    pub fn fields(&self) -> &[FieldMetadata] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&FieldMetadata> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Applies a selection policy. `Recommended` is handled by the endpoint,
    /// which never needs discovery for it.
    pub fn select(&self, selection: FieldSelection) -> Result<Vec<String>, ReportingError> {
        let default_only = selection.has(FieldSelection::DEFAULT_ONLY);
        let related = selection.has(FieldSelection::RELATED);
        let endpoint_only = selection.has(FieldSelection::ENDPOINT_ONLY);
        let minimal = selection.has(FieldSelection::MINIMAL);

        let names: Vec<String> = if selection.is_all() || (!default_only && related) {
            self.fields.iter().map(|field| field.name.clone()).collect()
        } else {
            self.fields
                .iter()
                .filter(|field| {
                    ((endpoint_only || !default_only) && !field.is_related)
                        || ((related || minimal) && field.is_related)
                        || (default_only && field.is_default)
                        || (related && field.is_related)
                })
                .map(|field| field.name.clone())
                .collect()
        };

        if names.is_empty() {
            return Err(ReportingError::sdk(format!(
                "no fields for policy {selection} on '{}'",
                self.controller
            )));
        }
        Ok(names)
    }
}

/// `publisher_id` -> (`publisher`, `publisher.name`); `_id` and non-id names yield nothing.
fn related_name_field(name: &str) -> Option<(&str, String)> {
    let prefix = name.strip_suffix("_id")?;
    if prefix.is_empty() {
        return None;
    }
    Some((prefix, format!("{prefix}.name")))
}

/// Returns the hardcoded recommended list, or an error when it is empty.
pub fn recommended_fields(controller: &str, recommended: &[String]) -> Result<Vec<String>, ReportingError> {
    if recommended.is_empty() {
        return Err(ReportingError::sdk(format!(
            "no fields for policy {} on '{controller}'",
            FieldSelection::RECOMMENDED
        )));
    }
    Ok(recommended.to_vec())
}
