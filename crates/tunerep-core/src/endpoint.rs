//! Report endpoints.
//!
//! An [`Endpoint`] is a long-lived value: it owns the transport handle, the
//! endpoint's [`EndpointDefinition`] and its field metadata cache. The cache is
//! filled at most once per instance; concurrent first callers share a single
//! discovery call.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::codec::{QueryParams, QueryValue};
use crate::config::PollConfig;
use crate::domain::{ExportFormat, ExportJob, ExportStatus};
use crate::envelope::ResponseEnvelope;
use crate::fields::{recommended_fields, FieldCatalog, FieldSelection};
use crate::poller::{ExportJobPoller, PollOutcome, StatusSource};
use crate::request::{Action, EndpointCapabilities, ReportQuery, ReportRequest};
use crate::transport::ServiceClient;
use crate::ReportingError;

const DISCOVERY_CONTROLLER: &str = "apidoc";
const DISCOVERY_ACTION: &str = "get_controllers";

/// Static description of one report endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointDefinition {
    pub controller: String,
    pub capabilities: EndpointCapabilities,
    pub recommended_fields: Vec<String>,
}

impl EndpointDefinition {
    pub fn new(controller: impl Into<String>, capabilities: EndpointCapabilities) -> Self {
        Self {
            controller: controller.into().trim_matches('/').to_owned(),
            capabilities,
            recommended_fields: Vec::new(),
        }
    }

    pub fn with_recommended_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.recommended_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Aggregated advertiser statistics (`advertiser/stats`).
    pub fn actuals() -> Self {
        Self::new(
            "advertiser/stats",
            EndpointCapabilities {
                filters_debug_mode: true,
                filters_test_profile: true,
                supports_cohort: false,
                supports_timestamp_granularity: true,
            },
        )
        .with_recommended_fields([
            "site_id",
            "site.name",
            "publisher_id",
            "publisher.name",
            "ad_impressions",
            "ad_impressions_unique",
            "ad_clicks",
            "ad_clicks_unique",
            "paid_installs",
            "paid_installs_assists",
            "non_installs_assists",
            "paid_events",
            "paid_events_assists",
            "non_events_assists",
            "paid_opens",
            "paid_opens_assists",
            "non_opens_assists",
        ])
    }

    /// Click log (`advertiser/stats/clicks`).
    pub fn clicks() -> Self {
        Self::new(
            "advertiser/stats/clicks",
            EndpointCapabilities {
                filters_debug_mode: true,
                filters_test_profile: true,
                ..EndpointCapabilities::default()
            },
        )
        .with_recommended_fields([
            "id",
            "created",
            "site_id",
            "site.name",
            "publisher_id",
            "publisher.name",
            "advertiser_sub_publisher.ref",
            "advertiser_sub_site.ref",
            "advertiser_sub_campaign.ref",
            "advertiser_sub_ad.ref",
            "country.name",
            "region.name",
        ])
    }

    /// Cohort lifetime value (`advertiser/stats/ltv`).
    pub fn cohort_value() -> Self {
        Self::new(
            "advertiser/stats/ltv",
            EndpointCapabilities {
                filters_test_profile: true,
                supports_cohort: true,
                ..EndpointCapabilities::default()
            },
        )
        .with_recommended_fields([
            "site_id",
            "site.name",
            "publisher_id",
            "publisher.name",
            "rpi",
            "epi",
        ])
    }

    /// Cohort retention (`advertiser/stats/retention`).
    pub fn cohort_retention() -> Self {
        Self::new(
            "advertiser/stats/retention",
            EndpointCapabilities {
                filters_test_profile: true,
                supports_cohort: true,
                ..EndpointCapabilities::default()
            },
        )
        .with_recommended_fields([
            "site_id",
            "site.name",
            "install_publisher_id",
            "install_publisher.name",
            "installs",
            "opens",
        ])
    }

    /// Looks up a built-in preset by name.
    pub fn preset(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "actuals" => Some(Self::actuals()),
            "clicks" => Some(Self::clicks()),
            "cohort_value" => Some(Self::cohort_value()),
            "cohort_retention" => Some(Self::cohort_retention()),
            _ => None,
        }
    }
}

/// A report endpoint bound to a transport.
#[derive(Debug)]
pub struct Endpoint {
    client: ServiceClient,
    definition: EndpointDefinition,
    validate_fields: bool,
    catalog: OnceCell<Arc<FieldCatalog>>,
}

impl Endpoint {
    pub fn new(client: ServiceClient, definition: EndpointDefinition) -> Self {
        Self {
            client,
            definition,
            validate_fields: false,
            catalog: OnceCell::new(),
        }
    }

    /// Records the stricter-field-check preference. Field names are not yet
    /// checked against discovered metadata either way.
    pub fn with_validate_fields(mut self, validate_fields: bool) -> Self {
        self.validate_fields = validate_fields;
        self
    }

    pub fn definition(&self) -> &EndpointDefinition {
        &self.definition
    }

    pub fn controller(&self) -> &str {
        &self.definition.controller
    }

    pub const fn validate_fields(&self) -> bool {
        self.validate_fields
    }

    pub fn client(&self) -> &ServiceClient {
        &self.client
    }

    /// Returns cached field metadata, discovering it on first use.
    pub async fn load_fields(&self) -> Result<Arc<FieldCatalog>, ReportingError> {
        self.catalog
            .get_or_try_init(|| self.discover_fields())
            .await
            .cloned()
    }

    async fn discover_fields(&self) -> Result<Arc<FieldCatalog>, ReportingError> {
        info!(controller = self.controller(), "discovering field metadata");
        let params = QueryParams::new()
            .with("controllers", self.controller())
            .with(
                "details",
                QueryValue::List(vec![String::from("modelName"), String::from("fields")]),
            );

        let envelope = self
            .client
            .call(DISCOVERY_CONTROLLER, DISCOVERY_ACTION, &params)
            .await?
            .into_result()?;
        let catalog = FieldCatalog::from_describe_payload(self.controller(), envelope.into_payload())?;
        debug!(
            controller = self.controller(),
            fields = catalog.len(),
            "field metadata cached"
        );
        Ok(Arc::new(catalog))
    }

    /// Field names for a selection policy. `Recommended` never triggers discovery.
    pub async fn fields(&self, selection: FieldSelection) -> Result<Vec<String>, ReportingError> {
        if selection.has(FieldSelection::RECOMMENDED) {
            return recommended_fields(self.controller(), &self.definition.recommended_fields);
        }
        self.load_fields().await?.select(selection)
    }

    /// Raw `define` reply describing the endpoint.
    pub async fn define(&self) -> Result<ResponseEnvelope, ReportingError> {
        self.client
            .call(self.controller(), "define", &QueryParams::new())
            .await?
            .into_result()
    }

    pub async fn count(&self, query: &ReportQuery) -> Result<u64, ReportingError> {
        let envelope = self.send(self.build(query, Action::Count)?).await?;
        parse_count(envelope.payload())
    }

    pub async fn find(&self, query: &ReportQuery) -> Result<ResponseEnvelope, ReportingError> {
        self.build(query, Action::Find)?;
        let query = self.with_default_fields(query).await?;
        self.send(self.build(&query, Action::Find)?).await
    }

    /// Enqueues an export job.
    pub async fn export(
        &self,
        query: &ReportQuery,
        format: ExportFormat,
    ) -> Result<ExportJob, ReportingError> {
        self.build(query, Action::ExportEnqueue)?;
        let query = self.with_default_fields(query).await?.format(format);
        let envelope = self.send(self.build(&query, Action::ExportEnqueue)?).await?;
        let job = ExportJob::from_enqueue_payload(envelope.payload(), format)?;
        info!(
            controller = self.controller(),
            job_id = job.job_id(),
            %format,
            "export job enqueued"
        );
        Ok(job)
    }

    /// Reads the current status of an export job once.
    pub async fn status(&self, job: &ExportJob) -> Result<ExportStatus, ReportingError> {
        let query = ReportQuery::new().job_id(job.job_id());
        let envelope = self.send(self.build(&query, Action::Status)?).await?;
        let http_status = envelope.http_status();
        ExportStatus::from_payload(http_status, envelope.into_payload())
    }

    pub fn poller(&self, job: ExportJob, config: PollConfig) -> ExportJobPoller<'_> {
        ExportJobPoller::new(self, job, config)
    }

    /// Enqueues an export and polls it to a terminal state.
    pub async fn export_and_wait(
        &self,
        query: &ReportQuery,
        format: ExportFormat,
        config: PollConfig,
    ) -> Result<PollOutcome, ReportingError> {
        config.validate()?;
        let job = self.export(query, format).await?;
        self.poller(job, config).run().await
    }

    fn build(&self, query: &ReportQuery, action: Action) -> Result<ReportRequest, ReportingError> {
        Ok(query.build(action, self.controller(), &self.definition.capabilities)?)
    }

    async fn send(&self, request: ReportRequest) -> Result<ResponseEnvelope, ReportingError> {
        self.client
            .call(&request.controller, request.action, &request.params)
            .await?
            .into_result()
    }

    /// Fills in fields for a query that was already validated without them.
    async fn with_default_fields(&self, query: &ReportQuery) -> Result<ReportQuery, ReportingError> {
        if query.has_fields() {
            return Ok(query.clone());
        }

        let selection = if self.definition.recommended_fields.is_empty() {
            FieldSelection::DEFAULT_ONLY
        } else {
            FieldSelection::RECOMMENDED
        };
        let fields = self.fields(selection).await?;
        debug!(
            controller = self.controller(),
            %selection,
            count = fields.len(),
            "using resolved fields"
        );
        Ok(query.clone().fields(fields))
    }
}

impl StatusSource for Endpoint {
    fn status<'a>(
        &'a self,
        job: &'a ExportJob,
    ) -> Pin<Box<dyn Future<Output = Result<ExportStatus, ReportingError>> + Send + 'a>> {
        Box::pin(Endpoint::status(self, job))
    }
}

fn parse_count(payload: &Value) -> Result<u64, ReportingError> {
    match payload {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse::<u64>().ok(),
        _ => None,
    }
    .ok_or_else(|| ReportingError::sdk(format!("count reply is not a number: {payload}")))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn presets_resolve_by_name() {
        assert_eq!(
            EndpointDefinition::preset("cohort-value").map(|preset| preset.controller),
            Some(String::from("advertiser/stats/ltv"))
        );
        assert!(EndpointDefinition::preset("installs").is_none());
        assert!(EndpointDefinition::cohort_retention().capabilities.supports_cohort);
    }

    #[test]
    fn preset_recommended_fields_are_valid_names() {
        for preset in [
            EndpointDefinition::actuals(),
            EndpointDefinition::clicks(),
            EndpointDefinition::cohort_value(),
            EndpointDefinition::cohort_retention(),
        ] {
            assert!(crate::FieldList::from_names("fields", &preset.recommended_fields).is_ok());
        }
    }

    #[test]
    fn count_accepts_numbers_and_numeric_strings() {
        assert_eq!(parse_count(&json!(42)).expect("count"), 42);
        assert_eq!(parse_count(&json!("7")).expect("count"), 7);
        assert!(matches!(
            parse_count(&json!({"count": 1})),
            Err(ReportingError::Sdk { .. })
        ));
    }
}
