//! Service calls over the [`HttpClient`] seam.

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use tracing::{debug, debug_span, warn, Instrument};
use uuid::Uuid;

use crate::codec::QueryParams;
use crate::config::ClientConfig;
use crate::envelope::{redact_api_key, ResponseEnvelope};
use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient};
use crate::ReportingError;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Issues `{base_url}/{controller}/{action}.json` calls.
///
/// Cheap to clone; clones share the underlying HTTP client.
#[derive(Clone)]
pub struct ServiceClient {
    http: Arc<dyn HttpClient>,
    config: Arc<ClientConfig>,
}

impl ServiceClient {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_http_client(config, Arc::new(ReqwestHttpClient::new()))
    }

    pub fn with_http_client(config: ClientConfig, http: Arc<dyn HttpClient>) -> Self {
        Self {
            http,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Full request URL including the API key.
    pub fn request_url(&self, controller: &str, action: &str, params: &QueryParams) -> String {
        let mut url = format!(
            "{}/{}/{}.json?api_key={}",
            self.config.base_url(),
            controller.trim_matches('/'),
            action,
            urlencoding::encode(self.config.api_key()),
        );
        if !params.is_empty() {
            url.push('&');
            url.push_str(&params.to_query_string());
        }
        url
    }

    /// Executes one service call and normalizes the reply.
    ///
    /// Service-reported failures are returned inside the envelope; use
    /// [`ResponseEnvelope::into_result`] to turn them into errors.
    pub async fn call(
        &self,
        controller: &str,
        action: &str,
        params: &QueryParams,
    ) -> Result<ResponseEnvelope, ReportingError> {
        let url = self.request_url(controller, action, params);
        let request_id = Uuid::new_v4();
        let span = debug_span!("service_call", controller, action, %request_id);

        async {
            debug!(url = %redact_api_key(&url), "sending request");
            let request = HttpRequest::get(url.clone())
                .with_header(REQUEST_ID_HEADER, request_id.to_string())
                .with_timeout(self.config.request_timeout());

            let response = self.http.execute(request).await.map_err(|error| {
                warn!(%error, "transport failure");
                error
            })?;
            debug!(status = response.status, "received reply");

            ResponseEnvelope::from_http(url, response)
        }
        .instrument(span)
        .await
    }

    /// Fetches a completed report artifact as raw text.
    pub async fn download(&self, url: &str) -> Result<String, ReportingError> {
        let request_id = Uuid::new_v4();
        let span = debug_span!("report_download", %request_id);

        async {
            debug!(url = %redact_api_key(url), "downloading report");
            let request = HttpRequest::get(url)
                .with_header(REQUEST_ID_HEADER, request_id.to_string())
                .with_timeout(self.config.request_timeout());

            let response = self.http.execute(request).await?;
            if !response.is_success() {
                let body = response.body.trim();
                let message = if body.is_empty() {
                    format!("report download failed with status {}", response.status)
                } else {
                    body.to_owned()
                };
                return Err(ReportingError::service(response.status, message));
            }

            debug!(bytes = response.body.len(), "report downloaded");
            Ok(response.body)
        }
        .instrument(span)
        .await
    }
}

impl Debug for ServiceClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_url_puts_api_key_first() {
        let config = ClientConfig::new("k e y")
            .and_then(|config| config.with_base_url("https://reports.test/v2"))
            .expect("valid config");
        let client = ServiceClient::new(config);
        let params = QueryParams::new()
            .with("start_date", "2024-01-01")
            .with("fields", vec![String::from("a"), String::from("b")]);

        assert_eq!(
            client.request_url("/advertiser/stats/", "find", &params),
            "https://reports.test/v2/advertiser/stats/find.json?api_key=k%20e%20y&start_date=2024-01-01&fields=a%2Cb"
        );
    }
}
