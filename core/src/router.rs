//! Response router: fixture or live transport, per request.
//!
//! The strategy is fixed at construction. A simulated router only overrides
//! the requests its registry covers; every other request still reaches the
//! live transport, exactly as a live router would send it.

use std::sync::Arc;

use tracing::debug;

use crate::config::LatencyPolicy;
use crate::error::TransportFailure;
use crate::fixture::FixtureRegistry;
use crate::http::{HttpRequest, HttpResponse, RequestDescriptor};
use crate::transport::Transport;

#[derive(Clone)]
pub struct Router {
    transport: Arc<dyn Transport>,
    fixtures: Option<FixtureRegistry>,
    latency: LatencyPolicy,
}

impl Router {
    pub fn live(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            fixtures: None,
            latency: LatencyPolicy::Disabled,
        }
    }

    pub fn simulated(
        transport: Arc<dyn Transport>,
        fixtures: FixtureRegistry,
        latency: LatencyPolicy,
    ) -> Self {
        Self {
            transport,
            fixtures: Some(fixtures),
            latency,
        }
    }

    pub fn is_simulated(&self) -> bool {
        self.fixtures.is_some()
    }

    pub async fn route(
        &self,
        descriptor: &RequestDescriptor,
        request: &HttpRequest,
    ) -> Result<HttpResponse, TransportFailure> {
        let fixture = self
            .fixtures
            .as_ref()
            .and_then(|registry| registry.lookup(descriptor));

        if let Some(fixture) = fixture {
            debug!(prefix = fixture.prefix(), "serving fixture");
            if let Some(delay) = self.latency.sample() {
                tokio::time::sleep(delay).await;
            }
            return Ok(fixture.respond(descriptor));
        }

        self.transport.send(request).await
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("fixtures", &self.fixtures)
            .field("latency", &self.latency)
            .finish_non_exhaustive()
    }
}
