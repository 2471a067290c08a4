//! Public entry point: one dispatcher and one session manager, wired once.
//!
//! # Design
//! `Client` is constructed by `bootstrap`, which restores the session and
//! binds it to the dispatcher. Consumers receive the client explicitly and
//! reach the session only through it; there is no ambient global.

use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::{ClientConfig, DeploymentMode};
use crate::dispatch::Dispatcher;
use crate::error::{ApiError, StoreError};
use crate::fixture::FixtureRegistry;
use crate::http::{RequestDescriptor, ResponseEnvelope};
use crate::router::Router;
use crate::session::{Identity, Session, SessionManager};
use crate::store::{FileStore, MemoryStore, SessionStore};
use crate::transport::ReqwestTransport;

/// Failures while assembling a client from configuration.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to build HTTP transport: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to open session storage: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone)]
pub struct Client {
    dispatcher: Dispatcher,
    session: SessionManager,
}

impl Client {
    /// Restore the session from `store` and bind it to `router`.
    pub fn bootstrap(config: &ClientConfig, router: Router, store: Arc<dyn SessionStore>) -> Self {
        let seed = (config.mode == DeploymentMode::Development && config.seed_identity)
            .then(Identity::test_user);
        let session = SessionManager::bootstrap(store, seed);
        let dispatcher = Dispatcher::new(config, router, session.clone());
        info!(
            base_url = dispatcher.base_url(),
            simulated = config.simulated,
            authenticated = session.is_authenticated(),
            "client bootstrapped"
        );
        Self {
            dispatcher,
            session,
        }
    }

    /// Build the reqwest transport, the fixture set (when simulated) and the
    /// configured store, then bootstrap.
    pub fn from_config(config: &ClientConfig) -> Result<Self, BuildError> {
        let transport = Arc::new(ReqwestTransport::new(config.origin.clone())?);
        let router = if config.simulated {
            Router::simulated(transport, FixtureRegistry::dashboard(), config.fixture_latency)
        } else {
            Router::live(transport)
        };
        let store: Arc<dyn SessionStore> = match &config.storage_dir {
            Some(dir) => Arc::new(FileStore::open(dir)?),
            None => Arc::new(MemoryStore::new()),
        };
        Ok(Self::bootstrap(config, router, store))
    }

    pub async fn dispatch(
        &self,
        descriptor: &RequestDescriptor,
    ) -> Result<ResponseEnvelope, ApiError> {
        self.dispatcher.send(descriptor).await
    }

    pub async fn dispatch_with_cancel(
        &self,
        descriptor: &RequestDescriptor,
        cancel: &CancellationToken,
    ) -> Result<ResponseEnvelope, ApiError> {
        self.dispatcher.send_with_cancel(descriptor, cancel).await
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ApiError> {
        self.session.login(&self.dispatcher, email, password).await
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Session, ApiError> {
        self.session
            .register(&self.dispatcher, name, email, password)
            .await
    }

    pub async fn logout(&self) {
        self.session.logout().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LatencyPolicy;

    #[test]
    fn from_config_uses_memory_store_by_default() {
        let config = ClientConfig {
            fixture_latency: LatencyPolicy::Disabled,
            ..ClientConfig::development()
        };
        let client = Client::from_config(&config).unwrap();
        assert!(!client.session().is_authenticated());
        assert_eq!(client.dispatcher().base_url(), "http://localhost:8000/api");
    }

    #[test]
    fn development_seed_installs_test_identity() {
        let config = ClientConfig {
            seed_identity: true,
            ..ClientConfig::development()
        };
        let client = Client::from_config(&config).unwrap();
        let session = client.session().current();
        assert_eq!(session.identity(), Some(&Identity::test_user()));
        assert!(session.credential().is_none());
    }

    #[test]
    fn production_never_seeds() {
        let config = ClientConfig {
            seed_identity: true,
            ..ClientConfig::production()
        };
        let client = Client::from_config(&config).unwrap();
        assert!(!client.session().is_authenticated());
    }

    #[test]
    fn file_store_directory_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig {
            storage_dir: Some(dir.path().join("session")),
            ..ClientConfig::production()
        };
        Client::from_config(&config).unwrap();
        assert!(dir.path().join("session").is_dir());
    }
}
