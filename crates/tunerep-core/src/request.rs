//! Report request composition.
//!
//! [`ReportQuery`] collects caller input as given; [`ReportQuery::build`]
//! validates all of it against the action and the endpoint's
//! [`EndpointCapabilities`] and produces a [`ReportRequest`] ready for the
//! transport. Nothing here touches the network.

use serde::Serialize;

use crate::codec::{QueryParams, QueryValue};
use crate::domain::{
    parse_sort, parse_timezone, AggregationType, CohortInterval, CohortType, ExportFormat,
    FieldList, FieldsInput, ReportDate, TimestampGranularity,
};
use crate::filter::FilterExpression;
use crate::ValidationError;

const DEBUG_MODE_FRAGMENT: &str = "(debug_mode=0 OR debug_mode is NULL)";
const TEST_PROFILE_FRAGMENT: &str = "(test_profile_id=0 OR test_profile_id IS NULL)";

/// Per-endpoint switches that shape request validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EndpointCapabilities {
    /// Excludes `debug_mode` traffic from every report.
    pub filters_debug_mode: bool,
    /// Excludes test-profile traffic from every report.
    pub filters_test_profile: bool,
    pub supports_cohort: bool,
    pub supports_timestamp_granularity: bool,
}

impl EndpointCapabilities {
    /// Implicit filter fragment, `None` when no suppression is enabled.
    pub fn sdk_filter(&self) -> Option<String> {
        let mut fragments = Vec::with_capacity(2);
        if self.filters_debug_mode {
            fragments.push(DEBUG_MODE_FRAGMENT);
        }
        if self.filters_test_profile {
            fragments.push(TEST_PROFILE_FRAGMENT);
        }

        if fragments.is_empty() {
            None
        } else {
            Some(format!("({})", fragments.join(" AND ")))
        }
    }
}

/// Conjoins the caller's validated filter with the implicit fragment.
///
/// Both sides arrive parenthesized already and are joined without another
/// wrap.
pub fn conjoin_filters(caller: Option<&FilterExpression>, sdk: Option<&str>) -> Option<String> {
    match (caller, sdk) {
        (Some(caller), Some(sdk)) => Some(format!("{caller} AND {sdk}")),
        (Some(caller), None) => Some(caller.to_string()),
        (None, Some(sdk)) => Some(sdk.to_owned()),
        (None, None) => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Count,
    Find,
    ExportEnqueue,
    Status,
}

impl Action {
    pub const fn is_report(self) -> bool {
        !matches!(self, Self::Status)
    }

    /// `(controller, action)` pair the call is sent to.
    ///
    /// Status reads go to `export/download`, except on cohort endpoints which
    /// answer `status` themselves.
    pub fn route<'a>(
        self,
        controller: &'a str,
        capabilities: &EndpointCapabilities,
    ) -> (&'a str, &'static str) {
        match self {
            Self::Count => (controller, "count"),
            Self::Find => (controller, "find"),
            Self::ExportEnqueue => (controller, "find_export_queue"),
            Self::Status if capabilities.supports_cohort => (controller, "status"),
            Self::Status => ("export", "download"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum FilterInput {
    Raw(String),
    Validated(FilterExpression),
}

/// Caller input for one report call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportQuery {
    start_date: Option<String>,
    end_date: Option<String>,
    fields: Option<FieldsInput>,
    group: Option<FieldsInput>,
    filter: Option<FilterInput>,
    limit: Option<i64>,
    page: Option<i64>,
    sort: Vec<(String, String)>,
    timestamp: Option<String>,
    timezone: Option<String>,
    cohort_type: Option<String>,
    cohort_interval: Option<String>,
    aggregation_type: Option<String>,
    format: Option<ExportFormat>,
    job_id: Option<String>,
}

impl ReportQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dates(self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.start_date(start).end_date(end)
    }

    pub fn start_date(mut self, value: impl Into<String>) -> Self {
        self.start_date = Some(value.into());
        self
    }

    pub fn end_date(mut self, value: impl Into<String>) -> Self {
        self.end_date = Some(value.into());
        self
    }

    pub fn fields(mut self, value: impl Into<FieldsInput>) -> Self {
        self.fields = Some(value.into());
        self
    }

    pub fn group(mut self, value: impl Into<FieldsInput>) -> Self {
        self.group = Some(value.into());
        self
    }

    /// Raw filter text, validated at build time.
    pub fn filter(mut self, value: impl Into<String>) -> Self {
        self.filter = Some(FilterInput::Raw(value.into()));
        self
    }

    /// Already-validated filter, used as-is.
    pub fn filter_expression(mut self, value: FilterExpression) -> Self {
        self.filter = Some(FilterInput::Validated(value));
        self
    }

    pub fn limit(mut self, value: i64) -> Self {
        self.limit = Some(value);
        self
    }

    pub fn page(mut self, value: i64) -> Self {
        self.page = Some(value);
        self
    }

    /// Appends one sort entry; entries keep the order they were added in.
    pub fn sort(mut self, field: impl Into<String>, direction: impl Into<String>) -> Self {
        self.sort.push((field.into(), direction.into()));
        self
    }

    pub fn timestamp(mut self, value: impl Into<String>) -> Self {
        self.timestamp = Some(value.into());
        self
    }

    pub fn timezone(mut self, value: impl Into<String>) -> Self {
        self.timezone = Some(value.into());
        self
    }

    pub fn cohort_type(mut self, value: impl Into<String>) -> Self {
        self.cohort_type = Some(value.into());
        self
    }

    pub fn cohort_interval(mut self, value: impl Into<String>) -> Self {
        self.cohort_interval = Some(value.into());
        self
    }

    pub fn aggregation_type(mut self, value: impl Into<String>) -> Self {
        self.aggregation_type = Some(value.into());
        self
    }

    pub fn format(mut self, value: ExportFormat) -> Self {
        self.format = Some(value);
        self
    }

    pub fn job_id(mut self, value: impl Into<String>) -> Self {
        self.job_id = Some(value.into());
        self
    }

    pub fn has_fields(&self) -> bool {
        self.fields.is_some()
    }

    /// Validates every supplied parameter and encodes the request.
    pub fn build(
        &self,
        action: Action,
        controller: &str,
        capabilities: &EndpointCapabilities,
    ) -> Result<ReportRequest, ValidationError> {
        let (route_controller, route_action) = action.route(controller, capabilities);
        let params = if action.is_report() {
            self.report_params(action, controller, capabilities)?
        } else {
            self.status_params()?
        };

        Ok(ReportRequest {
            controller: route_controller.to_owned(),
            action: route_action,
            params,
        })
    }

    fn status_params(&self) -> Result<QueryParams, ValidationError> {
        let job_id = self
            .job_id
            .as_deref()
            .map(str::trim)
            .filter(|job_id| !job_id.is_empty())
            .ok_or(ValidationError::EmptyJobId)?;
        Ok(QueryParams::new().with("job_id", job_id))
    }

    fn report_params(
        &self,
        action: Action,
        controller: &str,
        capabilities: &EndpointCapabilities,
    ) -> Result<QueryParams, ValidationError> {
        let mut params = QueryParams::new();

        let start_date = required("start_date", self.start_date.as_deref())?;
        let end_date = required("end_date", self.end_date.as_deref())?;
        params.insert("start_date", ReportDate::parse("start_date", start_date)?.to_wire());
        params.insert("end_date", ReportDate::parse("end_date", end_date)?.to_wire());

        self.cohort_params(&mut params, controller, capabilities)?;

        if let Some(fields) = &self.fields {
            let fields = FieldList::parse("fields", fields)?;
            params.insert("fields", QueryValue::List(fields.as_slice().to_vec()));
        }
        if let Some(group) = &self.group {
            let group = FieldList::parse("group", group)?;
            params.insert("group", QueryValue::List(group.as_slice().to_vec()));
        }

        let caller_filter = match &self.filter {
            Some(FilterInput::Raw(raw)) => Some(FilterExpression::parse(raw)?),
            Some(FilterInput::Validated(expression)) => Some(expression.clone()),
            None => None,
        };
        let sdk_filter = capabilities.sdk_filter();
        if let Some(filter) = conjoin_filters(caller_filter.as_ref(), sdk_filter.as_deref()) {
            params.insert("filter", filter);
        }

        if let Some(limit) = self.limit {
            params.insert("limit", non_negative("limit", limit)?);
        }
        if let Some(page) = self.page {
            params.insert("page", non_negative("page", page)?);
        }

        if !self.sort.is_empty() {
            let sort = parse_sort(&self.sort)?
                .into_iter()
                .map(|(field, direction)| (field, direction.as_str().to_owned()))
                .collect();
            params.insert("sort", QueryValue::Sort(sort));
        }

        if let Some(timestamp) = &self.timestamp {
            if !capabilities.supports_timestamp_granularity {
                return Err(unsupported("timestamp", controller));
            }
            params.insert("timestamp", TimestampGranularity::parse(timestamp)?.as_str());
        }

        if let Some(timezone) = &self.timezone {
            params.insert("response_timezone", parse_timezone(timezone)?);
        }

        if action == Action::ExportEnqueue {
            params.insert("format", self.format.unwrap_or_default().as_str());
        }

        Ok(params)
    }

    fn cohort_params(
        &self,
        params: &mut QueryParams,
        controller: &str,
        capabilities: &EndpointCapabilities,
    ) -> Result<(), ValidationError> {
        if !capabilities.supports_cohort {
            if self.cohort_type.is_some() {
                return Err(unsupported("cohort_type", controller));
            }
            if self.cohort_interval.is_some() {
                return Err(unsupported("cohort_interval", controller));
            }
            if self.aggregation_type.is_some() {
                return Err(unsupported("aggregation_type", controller));
            }
            return Ok(());
        }

        let cohort_type = CohortType::parse(required("cohort_type", self.cohort_type.as_deref())?)?;
        let cohort_interval =
            CohortInterval::parse(required("cohort_interval", self.cohort_interval.as_deref())?)?;
        params.insert("cohort_type", cohort_type.as_str());
        params.insert("cohort_interval", cohort_interval.as_str());

        if let Some(aggregation_type) = &self.aggregation_type {
            params.insert(
                "aggregation_type",
                AggregationType::parse(aggregation_type)?.as_str(),
            );
        }
        Ok(())
    }
}

/// A validated call: where to send it and what to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    pub controller: String,
    pub action: &'static str,
    pub params: QueryParams,
}

fn required<'a>(name: &'static str, value: Option<&'a str>) -> Result<&'a str, ValidationError> {
    value
        .filter(|value| !value.trim().is_empty())
        .ok_or(ValidationError::MissingParameter { name })
}

fn non_negative(field: &'static str, value: i64) -> Result<i64, ValidationError> {
    if value < 0 {
        return Err(ValidationError::NegativeValue { field, value });
    }
    Ok(value)
}

fn unsupported(name: &'static str, controller: &str) -> ValidationError {
    ValidationError::UnsupportedParameter {
        name,
        controller: controller.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATS: &str = "advertiser/stats";

    fn suppressing() -> EndpointCapabilities {
        EndpointCapabilities {
            filters_debug_mode: true,
            filters_test_profile: true,
            ..EndpointCapabilities::default()
        }
    }

    #[test]
    fn sdk_filter_wraps_fragments_once() {
        assert_eq!(EndpointCapabilities::default().sdk_filter(), None);
        assert_eq!(
            EndpointCapabilities {
                filters_debug_mode: true,
                ..EndpointCapabilities::default()
            }
            .sdk_filter()
            .as_deref(),
            Some("((debug_mode=0 OR debug_mode is NULL))")
        );
    }

    #[test]
    fn caller_and_sdk_filters_are_conjoined() {
        let request = ReportQuery::new()
            .dates("2024-01-01", "2024-01-02")
            .filter("(publisher_id > 0)")
            .build(Action::Find, STATS, &suppressing())
            .expect("valid query");

        assert_eq!(
            request.params.text("filter"),
            Some(
                "((publisher_id > 0)) AND ((debug_mode=0 OR debug_mode is NULL) AND (test_profile_id=0 OR test_profile_id IS NULL))"
            )
        );
    }

    #[test]
    fn conjoin_adds_no_extra_parentheses() {
        let caller = FilterExpression::parse("a = 1").expect("valid filter");
        let sdk = suppressing().sdk_filter();

        assert_eq!(
            conjoin_filters(Some(&caller), sdk.as_deref()).as_deref(),
            Some("(a = 1) AND ((debug_mode=0 OR debug_mode is NULL) AND (test_profile_id=0 OR test_profile_id IS NULL))")
        );
        assert_eq!(conjoin_filters(None, sdk.as_deref()), sdk);
        assert_eq!(
            conjoin_filters(Some(&caller), None).as_deref(),
            Some("(a = 1)")
        );
        assert_eq!(conjoin_filters(None, None), None);
    }

    #[test]
    fn validated_filter_is_not_wrapped_again() {
        let expression = FilterExpression::parse("a = 1").expect("valid filter");
        let request = ReportQuery::new()
            .dates("2024-01-01", "2024-01-02")
            .filter_expression(expression)
            .build(Action::Count, STATS, &EndpointCapabilities::default())
            .expect("valid query");

        assert_eq!(request.params.text("filter"), Some("(a = 1)"));
    }

    #[test]
    fn status_routes_by_cohort_support() {
        let query = ReportQuery::new().job_id("job-1");

        let request = query
            .build(Action::Status, STATS, &EndpointCapabilities::default())
            .expect("valid status");
        assert_eq!((request.controller.as_str(), request.action), ("export", "download"));
        assert_eq!(request.params.text("job_id"), Some("job-1"));

        let cohort = EndpointCapabilities {
            supports_cohort: true,
            ..EndpointCapabilities::default()
        };
        let request = query
            .build(Action::Status, "advertiser/stats/ltv", &cohort)
            .expect("valid status");
        assert_eq!(
            (request.controller.as_str(), request.action),
            ("advertiser/stats/ltv", "status")
        );
    }

    #[test]
    fn export_format_defaults_to_csv() {
        let request = ReportQuery::new()
            .dates("2024-01-01", "2024-01-02")
            .build(Action::ExportEnqueue, STATS, &EndpointCapabilities::default())
            .expect("valid export");

        assert_eq!(request.action, "find_export_queue");
        assert_eq!(request.params.text("format"), Some("csv"));
    }
}
