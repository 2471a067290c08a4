//! Request dispatch and session core for the market-intelligence dashboard.
//!
//! # Overview
//! Every API call goes through one pipeline: a `RequestDescriptor` is
//! resolved against the base address and the current credential, routed to
//! either a fixture (simulated mode) or the live transport, and normalized
//! into a `ResponseEnvelope` or a classified `ApiError`.
//!
//! # Design
//! - `Client` is the only entry point: `dispatch` plus the session
//!   operations (`login`, `register`, `logout`).
//! - `SessionManager` is the sole owner and writer of the session and its
//!   persisted copy; the dispatcher only asks it to `invalidate` on a 401.
//! - Live vs simulated is a `Router` chosen at construction, not a flag
//!   checked per request.
//! - DTOs are defined independently from the mock-server crate; the live
//!   integration tests catch schema drift.

pub mod classify;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod endpoints;
pub mod error;
pub mod fixture;
pub mod http;
pub mod router;
pub mod session;
pub mod store;
pub mod transport;
pub mod types;

pub use client::{BuildError, Client};
pub use config::{ClientConfig, DeploymentMode, LatencyPolicy};
pub use dispatch::Dispatcher;
pub use error::{ApiError, ConfigError, StoreError, TransportFailure};
pub use fixture::{Fixture, FixtureRegistry, MOCK_TOKEN};
pub use http::{
    HttpMethod, HttpRequest, HttpResponse, Payload, RequestDescriptor, ResponseEnvelope,
    StatusClass,
};
pub use router::Router;
pub use session::{Identity, Session, SessionManager};
pub use store::{FileStore, MemoryStore, SessionStore};
pub use tokio_util::sync::CancellationToken;
pub use transport::{ReqwestTransport, Transport};
