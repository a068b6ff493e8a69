//! Normalized service replies.
//!
//! Every reporting call returns a JSON body shaped like
//! `{"status_code": 200, "data": ..., "errors": [...], "debugs": [...]}`.
//! [`ResponseEnvelope`] turns that body (plus the HTTP status) into a single
//! immutable value the rest of the crate consumes.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::ReportingError;
use crate::http_client::HttpResponse;

/// One entry of the service `errors` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorDetail {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    fn from_value(value: Value) -> Self {
        match value {
            Value::String(message) => Self::new(message),
            Value::Object(map) => {
                let message = map
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_owned)
                    .unwrap_or_else(|| Value::Object(map.clone()).to_string());
                let code = map.get("code").and_then(|code| match code {
                    Value::String(text) => Some(text.clone()),
                    Value::Number(number) => Some(number.to_string()),
                    _ => None,
                });
                Self { message, code }
            }
            other => Self::new(other.to_string()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawEnvelope {
    #[serde(default)]
    status_code: Option<u16>,
    #[serde(default)]
    data: Value,
    #[serde(default, deserialize_with = "deserialize_errors")]
    errors: Vec<ErrorDetail>,
    #[serde(default, alias = "debug")]
    debugs: Option<Value>,
}

fn deserialize_errors<'de, D>(deserializer: D) -> Result<Vec<ErrorDetail>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.into_iter().map(ErrorDetail::from_value).collect(),
        Some(Value::Object(map)) if map.is_empty() => Vec::new(),
        Some(other) => vec![ErrorDetail::from_value(other)],
    })
}

/// Normalized reply: status, payload, errors and debug metadata.
///
/// The stored request URL has its `api_key` value redacted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseEnvelope {
    request_url: String,
    http_status: u16,
    payload: Value,
    errors: Option<Vec<ErrorDetail>>,
    debug: Option<Value>,
}

impl ResponseEnvelope {
    pub fn new(
        request_url: impl Into<String>,
        http_status: u16,
        payload: Value,
        errors: Option<Vec<ErrorDetail>>,
        debug: Option<Value>,
    ) -> Self {
        Self {
            request_url: redact_api_key(&request_url.into()),
            http_status,
            payload,
            errors: errors.filter(|errors| !errors.is_empty()),
            debug: debug.filter(|debug| !debug.is_null()),
        }
    }

    /// Builds an envelope from a raw transport reply.
    ///
    /// A 2xx body that is not JSON is a contract mismatch; a non-2xx body that
    /// is not JSON is kept verbatim as the payload.
    pub fn from_http(
        request_url: impl Into<String>,
        response: HttpResponse,
    ) -> Result<Self, ReportingError> {
        let request_url = request_url.into();
        let raw = match serde_json::from_str::<RawEnvelope>(&response.body) {
            Ok(raw) => raw,
            Err(error) if response.is_success() => {
                return Err(ReportingError::sdk(format!(
                    "reply from '{}' is not a JSON envelope: {error}",
                    redact_api_key(&request_url)
                )));
            }
            Err(_) => {
                return Ok(Self::new(
                    request_url,
                    response.status,
                    Value::String(response.body),
                    None,
                    None,
                ));
            }
        };

        let http_status = if response.is_success() {
            raw.status_code.unwrap_or(response.status)
        } else {
            response.status
        };

        Ok(Self::new(
            request_url,
            http_status,
            raw.data,
            Some(raw.errors),
            raw.debugs,
        ))
    }

    pub fn request_url(&self) -> &str {
        &self.request_url
    }

    pub const fn http_status(&self) -> u16 {
        self.http_status
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn into_payload(self) -> Value {
        self.payload
    }

    pub fn errors(&self) -> Option<&[ErrorDetail]> {
        self.errors.as_deref()
    }

    pub fn debug(&self) -> Option<&Value> {
        self.debug.as_ref()
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.http_status) && self.errors.is_none()
    }

    /// Passes successful replies through; failures become `ReportingError::Service`.
    pub fn into_result(self) -> Result<Self, ReportingError> {
        if self.is_success() {
            return Ok(self);
        }

        let errors = self.errors.unwrap_or_default();
        let message = if errors.is_empty() {
            match &self.payload {
                Value::String(text) if !text.trim().is_empty() => text.trim().to_owned(),
                _ => format!("request failed with status {}", self.http_status),
            }
        } else {
            errors
                .iter()
                .map(|error| error.message.as_str())
                .collect::<Vec<_>>()
                .join("; ")
        };

        Err(ReportingError::Service {
            status: self.http_status,
            message,
            errors,
        })
    }
}

/// Strips the `api_key` query value from a URL before it reaches logs or errors.
pub(crate) fn redact_api_key(url: &str) -> String {
    let Some((base, query)) = url.split_once('?') else {
        return url.to_owned();
    };

    let redacted = query
        .split('&')
        .map(|pair| {
            if pair.starts_with("api_key=") {
                "api_key=***"
            } else {
                pair
            }
        })
        .collect::<Vec<_>>()
        .join("&");
    format!("{base}?{redacted}")
}
