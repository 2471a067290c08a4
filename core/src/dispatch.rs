//! Transport core: turns a descriptor into exactly one classified outcome.
//!
//! # Design
//! `Dispatcher` splits each call the same way the pipeline reads:
//! `build_request` resolves the descriptor against the base address and the
//! current credential, the router executes it (fixture or network), and
//! `parse_response` classifies the result into an envelope or an
//! `ApiError`. Every failure passes through the classifier once. A 401 on
//! any request other than login/register invalidates the session before the
//! error is returned.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, debug_span, warn, Instrument};
use uuid::Uuid;

use crate::classify::{classify_failure, classify_response, malformed_body};
use crate::config::ClientConfig;
use crate::error::{ApiError, TransportFailure};
use crate::http::{
    HttpRequest, HttpResponse, Payload, RequestDescriptor, ResponseEnvelope, StatusClass,
};
use crate::router::Router;
use crate::session::SessionManager;

#[derive(Debug, Clone)]
pub struct Dispatcher {
    base_url: String,
    default_timeout: Duration,
    router: Arc<Router>,
    session: SessionManager,
}

impl Dispatcher {
    pub fn new(config: &ClientConfig, router: Router, session: SessionManager) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            default_timeout: config.timeout,
            router: Arc::new(router),
            session,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve a descriptor into a wire-ready request.
    ///
    /// The `Authorization` header is attached only when the descriptor
    /// requires auth and a non-empty credential is supplied; a missing
    /// credential does not stop the request.
    pub fn build_request(
        &self,
        descriptor: &RequestDescriptor,
        credential: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        let mut url = format!("{}{}", self.base_url, descriptor.path());
        if !descriptor.query().is_empty() {
            let encoded = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(descriptor.query())
                .finish();
            url.push('?');
            url.push_str(&encoded);
        }

        let mut headers = vec![("accept".to_string(), "application/json".to_string())];
        let body = match descriptor.body() {
            Some(value) => {
                let body = serde_json::to_string(value)
                    .map_err(|e| ApiError::Configuration(e.to_string()))?;
                headers.push(("content-type".to_string(), "application/json".to_string()));
                Some(body)
            }
            None => None,
        };

        if descriptor.requires_auth() {
            if let Some(token) = credential.filter(|t| !t.is_empty()) {
                headers.push(("authorization".to_string(), format!("Bearer {token}")));
            }
        }

        Ok(HttpRequest {
            method: descriptor.method(),
            url,
            headers,
            body,
        })
    }

    /// Classify a received response and decode its payload.
    pub fn parse_response(
        &self,
        descriptor: &RequestDescriptor,
        response: HttpResponse,
    ) -> Result<ResponseEnvelope, ApiError> {
        if let Some(err) = classify_response(&response, descriptor.is_session_exchange()) {
            return Err(err);
        }

        let status = response.status;
        let payload = if response.body.is_empty() {
            Payload::Empty
        } else if response.is_json() {
            let value = serde_json::from_slice(&response.body)
                .map_err(|e| malformed_body(status, &e))?;
            Payload::Json(value)
        } else {
            Payload::Binary(response.body)
        };

        Ok(ResponseEnvelope {
            status_class: StatusClass::from_status(status),
            status,
            payload,
        })
    }

    pub async fn send(&self, descriptor: &RequestDescriptor) -> Result<ResponseEnvelope, ApiError> {
        self.send_with_cancel(descriptor, &CancellationToken::new())
            .await
    }

    /// Dispatch with a per-request timeout and caller-controlled cancellation.
    pub async fn send_with_cancel(
        &self,
        descriptor: &RequestDescriptor,
        cancel: &CancellationToken,
    ) -> Result<ResponseEnvelope, ApiError> {
        let span = debug_span!(
            "dispatch",
            request_id = %Uuid::new_v4(),
            method = %descriptor.method(),
            path = descriptor.path(),
        );
        self.dispatch(descriptor, cancel).instrument(span).await
    }

    async fn dispatch(
        &self,
        descriptor: &RequestDescriptor,
        cancel: &CancellationToken,
    ) -> Result<ResponseEnvelope, ApiError> {
        let credential = self.session.credential();
        let request = self.build_request(descriptor, credential.as_deref())?;
        let timeout = descriptor.timeout().unwrap_or(self.default_timeout);

        let routed = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("request cancelled");
                return Err(ApiError::Cancelled);
            }
            routed = tokio::time::timeout(timeout, self.router.route(descriptor, &request)) => {
                routed
            }
        };

        let result = match routed {
            Ok(Ok(response)) => self.parse_response(descriptor, response),
            Ok(Err(failure)) => Err(classify_failure(failure)),
            Err(_elapsed) => Err(classify_failure(TransportFailure::NoResponse {
                message: format!("no response within {timeout:?}"),
                timed_out: true,
            })),
        };

        match &result {
            Ok(envelope) => debug!(status = envelope.status, "request settled"),
            Err(err) => {
                warn!(error = %err, "request failed");
                if err.is_unauthorized() && !descriptor.is_session_exchange() {
                    self.session.invalidate();
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LatencyPolicy;
    use crate::fixture::FixtureRegistry;
    use crate::http::HttpMethod;
    use crate::store::MemoryStore;
    use crate::transport::Transport;
    use async_trait::async_trait;
    use serde_json::json;

    struct Unreachable;

    #[async_trait]
    impl Transport for Unreachable {
        async fn send(&self, _request: &HttpRequest) -> Result<HttpResponse, TransportFailure> {
            Err(TransportFailure::NoResponse {
                message: "connection refused".into(),
                timed_out: false,
            })
        }
    }

    fn dispatcher(base_url: &str) -> Dispatcher {
        let config = ClientConfig::for_base_url(base_url);
        let session = SessionManager::bootstrap(Arc::new(MemoryStore::new()), None);
        Dispatcher::new(&config, Router::live(Arc::new(Unreachable)), session)
    }

    #[test]
    fn build_request_resolves_base_and_query() {
        let d = RequestDescriptor::get("/v1/reports")
            .with_query("limit", 10)
            .with_query("q", "a b&c");
        let req = dispatcher("http://localhost:8000/api/").build_request(&d, None).unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:8000/api/v1/reports?limit=10&q=a+b%26c");
        assert!(req.body.is_none());
        assert!(req.header("authorization").is_none());
    }

    #[test]
    fn production_base_is_path_relative() {
        let req = dispatcher("/api")
            .build_request(&RequestDescriptor::get("/v1/reports"), None)
            .unwrap();
        assert_eq!(req.url, "/api/v1/reports");
    }

    #[test]
    fn bearer_header_attached_when_credential_present() {
        let d = RequestDescriptor::get("/v1/reports");
        let req = dispatcher("/api").build_request(&d, Some("tok")).unwrap();
        assert_eq!(req.header("Authorization"), Some("Bearer tok"));
    }

    #[test]
    fn empty_credential_means_no_header() {
        let d = RequestDescriptor::get("/v1/reports");
        let req = dispatcher("/api").build_request(&d, Some("")).unwrap();
        assert!(req.header("authorization").is_none());
    }

    #[test]
    fn session_exchange_never_carries_credential() {
        let d = RequestDescriptor::post("/v1/auth/login").as_session_exchange();
        let req = dispatcher("/api").build_request(&d, Some("tok")).unwrap();
        assert!(req.header("authorization").is_none());
    }

    #[test]
    fn json_body_sets_content_type() {
        let d = RequestDescriptor::post("/v1/reports/generate").with_body(json!({"title": "Q3"}));
        let req = dispatcher("/api").build_request(&d, None).unwrap();
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.body.as_deref(), Some(r#"{"title":"Q3"}"#));
    }

    #[test]
    fn parse_response_decodes_binary_and_empty() {
        let d = RequestDescriptor::get("/v1/reports/1/download");
        let binary = HttpResponse {
            status: 200,
            headers: vec![("content-type".into(), "application/pdf".into())],
            body: b"%PDF".to_vec(),
        };
        let envelope = dispatcher("/api").parse_response(&d, binary).unwrap();
        assert_eq!(envelope.bytes(), Some(&b"%PDF"[..]));

        let empty = HttpResponse {
            status: 204,
            headers: Vec::new(),
            body: Vec::new(),
        };
        let envelope = dispatcher("/api").parse_response(&d, empty).unwrap();
        assert_eq!(envelope.payload, Payload::Empty);
    }

    #[test]
    fn parse_response_rejects_malformed_json() {
        let d = RequestDescriptor::get("/v1/reports");
        let response = HttpResponse {
            status: 200,
            headers: vec![("content-type".into(), "application/json".into())],
            body: b"{not json".to_vec(),
        };
        let err = dispatcher("/api").parse_response(&d, response).unwrap_err();
        assert!(matches!(err, ApiError::Server { status: 200, .. }));
    }

    #[tokio::test]
    async fn connectivity_failure_is_network_unavailable() {
        let err = dispatcher("http://localhost:1/api")
            .send(&RequestDescriptor::get("/v1/analysis/trends"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::NetworkUnavailable {
                timed_out: false,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn relative_url_without_origin_is_configuration_error() {
        let config = ClientConfig::production();
        let session = SessionManager::bootstrap(Arc::new(MemoryStore::new()), None);
        let transport = crate::transport::ReqwestTransport::new(None).unwrap();
        let dispatcher = Dispatcher::new(&config, Router::live(Arc::new(transport)), session);

        let err = dispatcher
            .send(&RequestDescriptor::get("/v1/reports"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Configuration(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_fixture_times_out() {
        let config = ClientConfig::for_base_url("/api");
        let session = SessionManager::bootstrap(Arc::new(MemoryStore::new()), None);
        let router = Router::simulated(
            Arc::new(Unreachable),
            FixtureRegistry::dashboard(),
            LatencyPolicy::Fixed(Duration::from_secs(5)),
        );
        let dispatcher = Dispatcher::new(&config, router, session);

        let d = RequestDescriptor::get("/v1/reports").with_timeout(Duration::from_secs(1));
        let err = dispatcher.send(&d).await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::NetworkUnavailable {
                timed_out: true,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = dispatcher("/api")
            .send_with_cancel(&RequestDescriptor::get("/v1/reports"), &cancel)
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::Cancelled);
    }
}
