//! Live transport capability.
//!
//! # Design
//! `Transport` executes one `HttpRequest` and hands back the raw response.
//! Error statuses are data, not failures: the dispatcher classifies them.
//! Only a request that never produced a response (or never left) is a
//! `TransportFailure`. Timeouts and cancellation are enforced above this
//! layer so every implementation gets them for free.

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::error::TransportFailure;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportFailure>;
}

/// `reqwest`-backed transport for live mode.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    origin: Option<Url>,
}

impl ReqwestTransport {
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(origin: Option<Url>) -> Result<Self, reqwest::Error> {
        let client = Client::builder().build()?;
        Ok(Self { client, origin })
    }

    /// Resolve a possibly path-relative URL against the configured origin.
    fn resolve(&self, raw: &str) -> Result<Url, TransportFailure> {
        match Url::parse(raw) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => match &self.origin {
                Some(origin) => origin
                    .join(raw)
                    .map_err(|e| TransportFailure::Local(format!("invalid URL `{raw}`: {e}"))),
                None => Err(TransportFailure::Local(format!(
                    "relative URL `{raw}` requires a configured origin"
                ))),
            },
            Err(e) => Err(TransportFailure::Local(format!("invalid URL `{raw}`: {e}"))),
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportFailure> {
        let url = self.resolve(&request.url)?;
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(map_transport_error)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await.map_err(map_transport_error)?;

        Ok(HttpResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}

fn map_transport_error(error: reqwest::Error) -> TransportFailure {
    if error.is_builder() {
        TransportFailure::Local(error.to_string())
    } else {
        TransportFailure::NoResponse {
            message: error.to_string(),
            timed_out: error.is_timeout(),
        }
    }
}
