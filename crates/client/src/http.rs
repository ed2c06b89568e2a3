//! HTTP client wrapper
//!
//! Every backend call goes through [`ApiClient::send`], which turns the three
//! ways a call can go wrong (no response, rejected response, undecodable
//! body) into one [`Error`] variant each. Nothing here retries: create and
//! delete carry payments and the backend makes no idempotency promise.

use async_trait::async_trait;
use cloudpanel_common::{ClientConfig, Error, Result};
use reqwest::header::ACCEPT;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Request body
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Form(Vec<(String, String)>),
}

/// A single backend call, relative to the configured base URL
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    pub bearer: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            bearer: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Attach a form-encoded body
    pub fn form(mut self, fields: &[(&str, &str)]) -> Self {
        self.body = RequestBody::Form(
            fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        self
    }

    pub fn query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn bearer(mut self, token: Option<String>) -> Self {
        self.bearer = token;
        self
    }
}

/// Status and body of a response that was received
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Moves a request over the wire
///
/// Implementations only report [`Error::Transport`]; status interpretation
/// happens in [`ApiClient`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, url: &str, request: &ApiRequest) -> Result<RawResponse>;
}

/// Transport backed by reqwest
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Transport(e.to_string()))?;
        Ok(Self { http })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, url: &str, request: &ApiRequest) -> Result<RawResponse> {
        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .header(ACCEPT, "application/json");

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Form(fields) => builder.form(fields),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        Ok(RawResponse {
            status,
            body: body.to_vec(),
        })
    }
}

/// Client for the backend REST API
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    transport: Arc<dyn Transport>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            transport,
        }
    }

    /// Build a client with the reqwest transport from configuration
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = ReqwestTransport::new(config.request_timeout())?;
        Ok(Self::new(config.api.base_url.clone(), Arc::new(transport)))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an endpoint path
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Perform a request and decode the JSON success body
    pub async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let url = self.url_for(&request.path);
        debug!(method = %request.method, %url, "Sending request");

        let response = match self.transport.execute(&url, &request).await {
            Ok(response) => response,
            Err(e) => {
                error!(method = %request.method, %url, "Request failed: {}", e);
                return Err(e);
            }
        };

        interpret(&request, &url, response)
    }
}

fn interpret<T: DeserializeOwned>(
    request: &ApiRequest,
    url: &str,
    response: RawResponse,
) -> Result<T> {
    let status = response.status;

    if (200..300).contains(&status) {
        let body: &[u8] = if response.body.iter().all(u8::is_ascii_whitespace) {
            b"null"
        } else {
            &response.body
        };
        return serde_json::from_slice(body).map_err(|e| {
            error!(%url, status, "Undecodable response body: {}", e);
            Error::Decode(e.to_string())
        });
    }

    if matches!(status, 401 | 403) && request.bearer.is_some() {
        warn!(%url, status, "Authenticated request rejected");
        return Err(Error::AuthExpired);
    }

    let detail = serde_json::from_slice::<serde_json::Value>(&response.body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string));
    warn!(%url, status, detail = ?detail, "Backend rejected request");

    Err(Error::BackendRejection { status, detail })
}
