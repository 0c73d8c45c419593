use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use crate::error::Error;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
}

/// A single authenticated request to the hub.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub token: String,
    pub body: Option<serde_json::Value>,
}

/// Trait for sending requests to the hub
///
/// This trait allows for mocking the HTTP layer for testing purposes
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and return the raw response body of a successful call
    async fn send(&self, request: Request) -> Result<Vec<u8>>;
}

/// Real transport implementation using reqwest
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("hubctl/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::Client)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: Request) -> Result<Vec<u8>> {
        let builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };
        let mut builder = builder
            .header(AUTHORIZATION, format!("Bearer {}", request.token))
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let http_err = |error| Error::Http {
            url: request.url.clone(),
            error,
        };
        let response = builder.send().await.map_err(http_err)?;
        let status = response.status();
        let body = response.bytes().await.map_err(http_err)?;
        debug!("{} {} -> {} ({} bytes)", request.method, request.url, status, body.len());

        if !status.is_success() {
            return Err(Error::Status {
                url: request.url,
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).trim().to_string(),
            });
        }
        Ok(body.to_vec())
    }
}

/// Mock transport for testing
///
/// Responses are looked up by the longest registered path suffix of the
/// request URL; every request is recorded.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: Vec<(String, Vec<u8>)>,
    requests: std::sync::Mutex<Vec<Request>>,
}

#[cfg(test)]
impl MockTransport {
    /// Create a new mock transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock serving the shared `states.json` and `services.json` fixtures
    pub fn with_fixtures() -> Self {
        Self::new()
            .with_response("/states", include_str!("../../tests/testdata/states.json"))
            .with_response("/services", include_str!("../../tests/testdata/services.json"))
    }

    /// Add a canned response body for URLs ending in `path`
    pub fn with_response(mut self, path: &str, body: &str) -> Self {
        self.responses.push((path.to_string(), body.as_bytes().to_vec()));
        self
    }

    /// All requests sent so far
    pub fn requests(&self) -> Vec<Request> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Requests other than the listing GETs
    pub fn posts(&self) -> Vec<Request> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == Method::Post)
            .collect()
    }
}

#[cfg(test)]
#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: Request) -> Result<Vec<u8>> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        self.responses
            .iter()
            .filter(|(path, _)| request.url.ends_with(path.as_str()))
            .max_by_key(|(path, _)| path.len())
            .map(|(_, body)| body.clone())
            .ok_or(Error::Status {
                url: request.url,
                status: 404,
                body: "Not Found".to_string(),
            })
    }
}
