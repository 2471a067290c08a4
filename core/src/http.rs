//! HTTP data types shared by the dispatch pipeline.
//!
//! # Design
//! A `RequestDescriptor` describes *what* the caller wants (method, API path,
//! query, JSON body, whether a credential should be attached). The dispatcher
//! resolves it into an `HttpRequest` (absolute or base-relative URL plus
//! headers) only at send time, so the credential is derived per dispatch and
//! never stored on the descriptor. `HttpResponse` is raw data handed back by
//! a transport or a fixture; `ResponseEnvelope` is the normalized result
//! returned to callers.

use std::fmt;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable description of one outbound API call.
///
/// `path` is relative to the versioned API base (e.g. `/v1/reports`). Built
/// with `get`/`post`/`put`/`delete` and refined with the consuming `with_*`
/// methods; once handed to the dispatcher it is only ever borrowed.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    method: HttpMethod,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
    requires_auth: bool,
    session_exchange: bool,
    timeout: Option<Duration>,
}

impl RequestDescriptor {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            requires_auth: true,
            session_exchange: false,
            timeout: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Append a query parameter. Order is preserved on the wire.
    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Append a query parameter only when `value` is present.
    pub fn with_optional_query<T: ToString>(self, key: &str, value: Option<T>) -> Self {
        match value {
            Some(value) => self.with_query(key, value),
            None => self,
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Attach a serializable body. Serialization failure is a configuration
    /// error: the request could not be constructed.
    pub fn with_json<T: serde::Serialize>(self, body: &T) -> Result<Self, ApiError> {
        let value =
            serde_json::to_value(body).map_err(|e| ApiError::Configuration(e.to_string()))?;
        Ok(self.with_body(value))
    }

    pub fn without_auth(mut self) -> Self {
        self.requires_auth = false;
        self
    }

    /// Mark this call as a credential exchange (login/register). Such calls
    /// never attach a credential and never invalidate the current session on
    /// rejection.
    pub fn as_session_exchange(mut self) -> Self {
        self.session_exchange = true;
        self.requires_auth = false;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Look up a top-level string field of the JSON body.
    pub fn body_str(&self, field: &str) -> Option<&str> {
        self.body.as_ref()?.get(field)?.as_str()
    }

    pub fn requires_auth(&self) -> bool {
        self.requires_auth
    }

    pub fn is_session_exchange(&self) -> bool {
        self.session_exchange
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// A wire-ready HTTP request.
///
/// `url` is either absolute (development) or base-relative such as
/// `/api/v1/reports` (production); resolving a relative URL against an
/// origin is the transport's concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A raw HTTP response as produced by a transport or a fixture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Build a JSON response, the shape every fixture produces.
    pub fn json(status: u16, value: &Value) -> Self {
        Self {
            status,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: value.to_string().into_bytes(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// True unless a content type is present and names something other than
    /// JSON. Servers that omit the header are assumed to speak JSON.
    pub fn is_json(&self) -> bool {
        self.header("content-type")
            .map(|ct| ct.to_ascii_lowercase().contains("json"))
            .unwrap_or(true)
    }
}

/// Coarse classification of an HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    ClientError,
    ServerError,
}

impl StatusClass {
    pub fn from_status(status: u16) -> Self {
        match status {
            200..=399 => StatusClass::Success,
            400..=499 => StatusClass::ClientError,
            _ => StatusClass::ServerError,
        }
    }
}

/// Decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Binary(Vec<u8>),
    Empty,
}

/// The normalized result of a dispatched request, identical in shape whether
/// it came from the network or from a fixture.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    pub status_class: StatusClass,
    pub status: u16,
    pub payload: Payload,
}

impl ResponseEnvelope {
    /// Decode the JSON payload into `T`.
    ///
    /// A payload that is not JSON, or JSON of the wrong shape, is reported as
    /// a server error: the server answered, but not with what the endpoint
    /// promises.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        match &self.payload {
            Payload::Json(value) => {
                T::deserialize(value).map_err(|e| ApiError::Server {
                    status: self.status,
                    message: format!("unexpected response shape: {e}"),
                })
            }
            Payload::Binary(_) | Payload::Empty => Err(ApiError::Server {
                status: self.status,
                message: "expected a JSON response body".to_string(),
            }),
        }
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.payload {
            Payload::Binary(bytes) => Some(bytes),
            _ => None,
        }
    }
}
