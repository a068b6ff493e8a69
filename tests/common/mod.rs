//! Shared fixtures for behaviour tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use tunerep_core::{
    ClientConfig, Endpoint, EndpointDefinition, HttpClient, HttpError, HttpRequest, HttpResponse,
    ServiceClient,
};

pub const BASE_URL: &str = "https://reports.test/v2";
pub const API_KEY: &str = "test-key";

/// Replays canned replies in order and records every request.
#[derive(Default)]
pub struct ScriptedHttpClient {
    replies: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedHttpClient {
    pub fn new<I>(replies: I) -> Arc<Self>
    where
        I: IntoIterator<Item = HttpResponse>,
    {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().map(Ok).collect()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing(error: HttpError) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::from([Err(error)])),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn recorded_requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .expect("request store should not be poisoned")
            .clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .expect("request store should not be poisoned")
            .len()
    }

    pub fn recorded_urls(&self) -> Vec<String> {
        self.recorded_requests()
            .into_iter()
            .map(|request| request.url)
            .collect()
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        self.requests
            .lock()
            .expect("request store should not be poisoned")
            .push(request);
        let reply = self
            .replies
            .lock()
            .expect("reply queue should not be poisoned")
            .pop_front()
            .unwrap_or_else(|| Err(HttpError::other("no scripted reply left")));
        Box::pin(async move { reply })
    }
}

pub fn client_config() -> ClientConfig {
    ClientConfig::new(API_KEY)
        .and_then(|config| config.with_base_url(BASE_URL))
        .expect("valid test config")
}

pub fn service_client(http: Arc<ScriptedHttpClient>) -> ServiceClient {
    ServiceClient::with_http_client(client_config(), http)
}

pub fn endpoint(http: Arc<ScriptedHttpClient>, definition: EndpointDefinition) -> Endpoint {
    Endpoint::new(service_client(http), definition)
}

/// A successful service envelope around `data`.
pub fn envelope(data: Value) -> HttpResponse {
    HttpResponse::ok_json(json!({"status_code": 200, "data": data}).to_string())
}

pub fn status_reply(status: &str, percent_complete: u8) -> HttpResponse {
    envelope(json!({
        "status": status,
        "percent_complete": percent_complete,
        "data": {"url": "https://download.test/report.csv"},
    }))
}

/// Query pairs of a recorded URL, percent-decoded.
pub fn query_pairs(url: &str) -> Vec<(String, String)> {
    let Some((_, query)) = url.split_once('?') else {
        return Vec::new();
    };
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .map(|(name, value)| (decode(name), decode(value)))
        .collect()
}

pub fn query_value(url: &str, name: &str) -> Option<String> {
    query_pairs(url)
        .into_iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value)
}

fn decode(value: &str) -> String {
    urlencoding::decode(value)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| value.to_owned())
}
