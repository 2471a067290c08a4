//! Session state and its single owner, the session manager.
//!
//! # Design
//! `Session` can only be built unauthenticated or from an identity, so a
//! credential without an identity is unrepresentable in memory. Raw storage
//! can still hold that combination (e.g. after tampering); `restore` reports
//! it as invalid and `bootstrap` wipes it.
//!
//! `SessionManager` is the only writer of both the in-memory session and the
//! persisted keys. Storage is written while the in-memory write guard is held
//! and before the value is swapped, so memory is never ahead of storage and
//! a concurrent reset cannot interleave. Login, register and logout
//! take turns on a FIFO async mutex; `invalidate` is a synchronous reset used
//! by the dispatcher on 401 and does not queue.

use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::dispatch::Dispatcher;
use crate::endpoints;
use crate::error::{ApiError, StoreError};
use crate::store::{SessionStore, SESSION_KEY, TOKEN_KEY};
use crate::types::{AuthResponse, Credentials, Registration};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
}

impl Identity {
    /// Deterministic identity used for development seeding.
    pub fn test_user() -> Self {
        Self {
            id: "1".to_string(),
            email: "test@example.com".to_string(),
            name: "Test User".to_string(),
            role: "admin".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    identity: Option<Identity>,
    credential: Option<String>,
}

impl Session {
    pub fn unauthenticated() -> Self {
        Self::default()
    }

    /// An empty credential string is treated as no credential.
    pub fn new(identity: Identity, credential: Option<String>) -> Self {
        Self {
            identity: Some(identity),
            credential: credential.filter(|c| !c.is_empty()),
        }
    }

    pub fn authenticated(&self) -> bool {
        self.identity.is_some()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }
}

/// Outcome of reading the persisted session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Restored {
    Empty,
    Valid(Session),
    Invalid(String),
}

/// Write a session to storage: drop the old credential, write the snapshot,
/// then the new credential.
///
/// Every intermediate state restores as a session of a single identity: the
/// previous one without its credential, or the new one with or without its
/// credential. A previous credential is never paired with a new identity.
pub fn persist(store: &dyn SessionStore, session: &Session) -> Result<(), StoreError> {
    let Some(identity) = session.identity() else {
        return clear(store);
    };
    let snapshot = serde_json::to_string(identity).map_err(|e| StoreError::Encode {
        key: SESSION_KEY.to_string(),
        message: e.to_string(),
    })?;
    store.remove(TOKEN_KEY)?;
    store.set(SESSION_KEY, &snapshot)?;
    match session.credential() {
        Some(token) => store.set(TOKEN_KEY, token),
        None => Ok(()),
    }
}

/// Read the persisted session without modifying storage.
pub fn restore(store: &dyn SessionStore) -> Result<Restored, StoreError> {
    let token = store.get(TOKEN_KEY)?.filter(|t| !t.is_empty());
    let snapshot = store.get(SESSION_KEY)?;
    match (snapshot, token) {
        (None, None) => Ok(Restored::Empty),
        (None, Some(_)) => Ok(Restored::Invalid(
            "credential present without an identity".to_string(),
        )),
        (Some(raw), token) => match serde_json::from_str::<Identity>(&raw) {
            Ok(identity) => Ok(Restored::Valid(Session::new(identity, token))),
            Err(e) => Ok(Restored::Invalid(format!("unreadable identity snapshot: {e}"))),
        },
    }
}

/// Remove both keys, credential first.
fn clear(store: &dyn SessionStore) -> Result<(), StoreError> {
    store.remove(TOKEN_KEY)?;
    store.remove(SESSION_KEY)
}

struct Inner {
    session: RwLock<Session>,
    store: Arc<dyn SessionStore>,
    turn: Mutex<()>,
}

/// Owner of the process-wide session. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    /// Restore the persisted session, or start unauthenticated.
    ///
    /// When nothing valid was restored and `seed` is given, that identity is
    /// installed (without a credential) and persisted.
    pub fn bootstrap(store: Arc<dyn SessionStore>, seed: Option<Identity>) -> Self {
        let restored = match restore(store.as_ref()) {
            Ok(restored) => restored,
            Err(e) => Restored::Invalid(e.to_string()),
        };

        let session = match restored {
            Restored::Valid(session) => {
                info!(authenticated = session.authenticated(), "session restored");
                Some(session)
            }
            Restored::Empty => None,
            Restored::Invalid(reason) => {
                warn!(%reason, "discarding persisted session");
                if let Err(e) = clear(store.as_ref()) {
                    warn!(error = %e, "failed to clear persisted session");
                }
                None
            }
        };

        let session = match (session, seed) {
            (Some(session), _) => session,
            (None, Some(identity)) => {
                let seeded = Session::new(identity, None);
                match persist(store.as_ref(), &seeded) {
                    Ok(()) => {
                        info!("seeded development identity");
                        seeded
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to persist seeded identity");
                        Session::unauthenticated()
                    }
                }
            }
            (None, None) => Session::unauthenticated(),
        };

        Self {
            inner: Arc::new(Inner {
                session: RwLock::new(session),
                store,
                turn: Mutex::new(()),
            }),
        }
    }

    /// Snapshot of the current session.
    pub fn current(&self) -> Session {
        self.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().authenticated()
    }

    pub fn credential(&self) -> Option<String> {
        self.read().credential().map(str::to_string)
    }

    /// Exchange credentials for a session.
    ///
    /// Any failure is reported as [`ApiError::Authentication`] (or
    /// [`ApiError::Configuration`] if the new session could not be persisted)
    /// and leaves the current session untouched.
    pub async fn login(
        &self,
        dispatcher: &Dispatcher,
        email: &str,
        password: &str,
    ) -> Result<Session, ApiError> {
        let _turn = self.inner.turn.lock().await;
        let descriptor = endpoints::auth::login(&Credentials {
            email: email.to_string(),
            password: password.to_string(),
        })?;
        let auth = exchange(dispatcher, &descriptor).await?;

        // Servers that only return a token get the development identity
        // under the submitted email.
        let identity = auth.user.unwrap_or_else(|| Identity {
            email: email.to_string(),
            ..Identity::test_user()
        });
        self.publish(Session::new(identity, Some(auth.token)), "login")
    }

    /// Create an account and sign in as it.
    ///
    /// The submitted name and email take precedence over the returned
    /// identity's fields.
    pub async fn register(
        &self,
        dispatcher: &Dispatcher,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Session, ApiError> {
        let _turn = self.inner.turn.lock().await;
        let descriptor = endpoints::auth::register(&Registration {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        })?;
        let auth = exchange(dispatcher, &descriptor).await?;

        let identity = Identity {
            name: name.to_string(),
            email: email.to_string(),
            ..auth.user.unwrap_or_else(Identity::test_user)
        };
        self.publish(Session::new(identity, Some(auth.token)), "register")
    }

    /// Sign out. Waits for any in-flight login/register, then resets.
    pub async fn logout(&self) {
        let _turn = self.inner.turn.lock().await;
        self.reset("logout");
    }

    /// Drop the session immediately after the server rejected the credential.
    pub fn invalidate(&self) {
        self.reset("invalidated");
    }

    /// Storage and memory change under the same write guard, so a
    /// concurrent `invalidate` lands entirely before or after.
    fn publish(&self, session: Session, reason: &'static str) -> Result<Session, ApiError> {
        let mut current = self.write();
        persist(self.inner.store.as_ref(), &session)
            .map_err(|e| ApiError::Configuration(format!("failed to persist session: {e}")))?;
        *current = session.clone();
        drop(current);
        info!(
            reason,
            user = session.identity().map(|i| i.id.as_str()),
            "session established"
        );
        Ok(session)
    }

    fn reset(&self, reason: &'static str) {
        let mut current = self.write();
        if let Err(e) = clear(self.inner.store.as_ref()) {
            warn!(error = %e, reason, "failed to clear persisted session");
        }
        *current = Session::unauthenticated();
        drop(current);
        info!(reason, "session cleared");
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Session> {
        self.inner
            .session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Session> {
        self.inner
            .session
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

/// Dispatch a login/register call and decode its token.
async fn exchange(
    dispatcher: &Dispatcher,
    descriptor: &crate::http::RequestDescriptor,
) -> Result<AuthResponse, ApiError> {
    let envelope = dispatcher
        .send(descriptor)
        .await
        .map_err(ApiError::into_authentication)?;
    let auth: AuthResponse = envelope.json().map_err(ApiError::into_authentication)?;
    if auth.token.is_empty() {
        return Err(ApiError::Authentication {
            status: Some(envelope.status),
            message: "server returned an empty token".to_string(),
        });
    }
    Ok(auth)
}
