//! The session store: single source of truth for authentication state.

use crate::api;
use crate::identity::{Identity, Role};
use crate::persist::{PersistedSession, SessionStorage};
use qbank_http::{ApiClient, ApiError, CredentialProvider, Result};
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

#[derive(Default)]
struct SessionState {
    credential: Option<String>,
    identity: Option<Identity>,
}

/// Immutable copy of the session at one point in time. All role
/// predicates are pure functions of the snapshot, recomputed per read.
#[derive(Clone, Debug, Default)]
pub struct SessionSnapshot {
    pub credential: Option<String>,
    pub identity: Option<Identity>,
}

impl SessionSnapshot {
    #[inline]
    pub fn is_logged_in(&self) -> bool {
        self.credential.is_some()
    }

    pub fn role(&self) -> Option<Role> {
        self.identity.as_ref().map(|i| i.role)
    }

    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role() == Some(Role::Admin)
    }

    #[inline]
    pub fn is_teacher(&self) -> bool {
        self.role() == Some(Role::Teacher)
    }

    #[inline]
    pub fn is_student(&self) -> bool {
        self.role() == Some(Role::Student)
    }

    /// Credential present but identity not yet fetched.
    pub fn identity_pending(&self) -> bool {
        self.credential.is_some() && self.identity.is_none()
    }
}

/// Owns the credential and identity. Mutations are short synchronous
/// transitions under the lock, never held across an await point, and
/// every mutation is written through to storage before it returns.
///
/// Invariant: identity present implies credential present.
pub struct SessionStore {
    state: RwLock<SessionState>,
    storage: Arc<dyn SessionStorage>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        SessionStore {
            state: RwLock::new(SessionState::default()),
            storage,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read().expect("session lock poisoned");
        SessionSnapshot {
            credential: state.credential.clone(),
            identity: state.identity.clone(),
        }
    }

    /// Load the persisted session at start-up. A persisted identity that
    /// fails to decode, or one present without a credential, is dropped
    /// and the storage rewritten without it. Returns true when an
    /// identity fetch should follow (credential restored, identity not).
    pub fn restore(&self) -> bool {
        let persisted = self.storage.load();
        let identity = match (&persisted.credential, persisted.identity) {
            (Some(_), Some(raw)) => match serde_json::from_value::<Identity>(raw) {
                Ok(identity) => Some(identity),
                Err(e) => {
                    warn!("discarding unreadable persisted identity: {}", e);
                    None
                }
            },
            (None, Some(_)) => {
                warn!("discarding persisted identity with no credential");
                None
            }
            (_, None) => None,
        };

        let mut state = self.state.write().expect("session lock poisoned");
        state.credential = persisted.credential;
        state.identity = identity;
        self.persist_locked(&state);
        state.credential.is_some() && state.identity.is_none()
    }

    /// Authenticate and store the returned credential, then resolve the
    /// identity. The credential write completes (and is durable) before
    /// the identity fetch is issued, so an interleaved observer sees
    /// credential-present/identity-absent, never a torn write. A failed
    /// identity fetch is swallowed; guard evaluation retries it later.
    pub async fn login(&self, client: &ApiClient, username: &str, password: &str) -> Result<()> {
        let request = api::LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let token = api::login(client, &request).await.map_err(login_error)?;

        {
            let mut state = self.state.write().expect("session lock poisoned");
            state.credential = Some(token.access_token);
            state.identity = None;
            self.persist_locked(&state);
        }

        if let Err(e) = self.fetch_identity(client).await {
            warn!("identity fetch after login failed: {}", e);
        }
        Ok(())
    }

    /// Resolve the identity for the current credential. A failure leaves
    /// the session untouched: a network hiccup while already logged in is
    /// not a credential rejection (that arrives via the unauthorized
    /// hook, which clears the session separately).
    pub async fn fetch_identity(&self, client: &ApiClient) -> Result<()> {
        let identity = api::current_user(client).await?;
        let mut state = self.state.write().expect("session lock poisoned");
        if state.credential.is_none() {
            // Invalidated while the fetch was in flight; an identity
            // without a credential would violate the session invariant.
            debug!("dropping identity resolved after invalidation");
            return Ok(());
        }
        state.identity = Some(identity);
        self.persist_locked(&state);
        Ok(())
    }

    /// Clear the session locally first, then best-effort notify the
    /// remote. Logout is always locally authoritative; a failed remote
    /// notification is swallowed. Idempotent.
    pub async fn logout(&self, client: &ApiClient) {
        self.clear();
        if let Err(e) = api::logout(client).await {
            debug!("remote logout notification failed: {}", e);
        }
    }

    /// Drop credential and identity from memory and storage. Entry point
    /// for the unauthorized hook.
    pub fn clear(&self) {
        let mut state = self.state.write().expect("session lock poisoned");
        state.credential = None;
        state.identity = None;
        drop(state);
        self.storage.clear();
    }

    fn persist_locked(&self, state: &SessionState) {
        self.storage.save(&PersistedSession {
            credential: state.credential.clone(),
            identity: state
                .identity
                .as_ref()
                .and_then(|i| serde_json::to_value(i).ok()),
        });
    }
}

impl CredentialProvider for SessionStore {
    fn credential(&self) -> Option<String> {
        self.state
            .read()
            .expect("session lock poisoned")
            .credential
            .clone()
    }
}

/// A rejected login is an authentication failure, not a session-level
/// one; there is no session to invalidate yet.
fn login_error(err: ApiError) -> ApiError {
    match err {
        ApiError::Transport { status: 401, message } | ApiError::Business { code: 401, message } => {
            ApiError::Auth(message)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::MemoryStorage;
    use async_trait::async_trait;
    use qbank_http::{ApiRequest, ClientConfig, RawResponse, RequestBody, Transport};

    const TOKEN: &str = "tok-abc";

    fn identity_json() -> serde_json::Value {
        serde_json::json!({
            "id": 7,
            "username": "alice",
            "role": "teacher",
            "is_active": true,
            "is_verified": true,
            "created_at": "2025-01-01T00:00:00Z"
        })
    }

    /// Fake remote implementing the auth endpoints.
    struct AuthServer {
        me_status: u16,
        fail_logout: bool,
    }

    impl AuthServer {
        fn healthy() -> Self {
            AuthServer {
                me_status: 200,
                fail_logout: false,
            }
        }
    }

    #[async_trait]
    impl Transport for AuthServer {
        async fn send(&self, request: ApiRequest) -> qbank_http::Result<RawResponse> {
            match request.path.as_str() {
                "/api/v1/auth/login" => {
                    let body = match &request.body {
                        RequestBody::Json(v) => v.clone(),
                        _ => serde_json::Value::Null,
                    };
                    if body["username"] == "alice" && body["password"] == "pw" {
                        Ok(RawResponse::json(
                            200,
                            &serde_json::json!({
                                "access_token": TOKEN,
                                "token_type": "bearer",
                                "expires_in": 3600
                            }),
                        ))
                    } else {
                        Ok(RawResponse::json(
                            401,
                            &serde_json::json!({"detail": "invalid username or password"}),
                        ))
                    }
                }
                "/api/v1/auth/me" => {
                    if self.me_status != 200 {
                        return Ok(RawResponse::new(self.me_status, ""));
                    }
                    if request.bearer.as_deref() == Some(TOKEN) {
                        Ok(RawResponse::json(200, &identity_json()))
                    } else {
                        Ok(RawResponse::new(401, ""))
                    }
                }
                "/api/v1/auth/logout" => {
                    if self.fail_logout {
                        Err(qbank_http::ApiError::Network("connection refused".into()))
                    } else {
                        Ok(RawResponse::json(200, &serde_json::json!({})))
                    }
                }
                other => panic!("unexpected path: {other}"),
            }
        }
    }

    fn store_and_client(server: AuthServer) -> (Arc<SessionStore>, ApiClient, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        let store = Arc::new(SessionStore::new(storage.clone()));
        let client = ApiClient::with_transport(ClientConfig::default(), Arc::new(server))
            .with_credentials(store.clone());
        (store, client, storage)
    }

    #[tokio::test]
    async fn test_login_stores_credential_and_identity() {
        let (store, client, storage) = store_and_client(AuthServer::healthy());
        store.login(&client, "alice", "pw").await.unwrap();

        let snapshot = store.snapshot();
        assert_eq!(snapshot.credential.as_deref(), Some(TOKEN));
        assert!(snapshot.is_teacher());

        // Write-through: both entries durable.
        let persisted = storage.snapshot();
        assert_eq!(persisted.credential.as_deref(), Some(TOKEN));
        assert!(persisted.identity.is_some());
    }

    #[tokio::test]
    async fn test_failed_login_leaves_session_untouched() {
        let (store, client, storage) = store_and_client(AuthServer::healthy());
        let err = store.login(&client, "alice", "wrong").await.unwrap_err();
        assert!(matches!(err, ApiError::Auth(_)));
        assert!(!store.snapshot().is_logged_in());
        assert!(storage.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_login_survives_identity_fetch_failure() {
        let (store, client, _) = store_and_client(AuthServer {
            me_status: 500,
            fail_logout: false,
        });
        store.login(&client, "alice", "pw").await.unwrap();
        let snapshot = store.snapshot();
        assert!(snapshot.is_logged_in());
        assert!(snapshot.identity_pending());
    }

    #[tokio::test]
    async fn test_restore_round_trip_after_login() {
        let (store, client, storage) = store_and_client(AuthServer::healthy());
        store.login(&client, "alice", "pw").await.unwrap();
        let before = store.snapshot();

        // Simulate a reload: a fresh store over the same storage.
        let restored = SessionStore::new(storage.clone());
        let needs_fetch = restored.restore();
        assert!(!needs_fetch);
        let after = restored.snapshot();
        assert_eq!(after.credential, before.credential);
        assert_eq!(after.identity, before.identity);
    }

    #[tokio::test]
    async fn test_restore_requests_identity_fetch_when_missing() {
        let storage = Arc::new(MemoryStorage::seeded(PersistedSession {
            credential: Some(TOKEN.into()),
            identity: None,
        }));
        let store = SessionStore::new(storage);
        assert!(store.restore());
        assert!(store.snapshot().identity_pending());
    }

    #[tokio::test]
    async fn test_restore_discards_corrupt_identity() {
        let storage = Arc::new(MemoryStorage::seeded(PersistedSession {
            credential: Some(TOKEN.into()),
            identity: Some(serde_json::json!({"role": "emperor"})),
        }));
        let store = SessionStore::new(storage.clone());
        assert!(store.restore());
        assert!(store.snapshot().identity.is_none());
        // The corrupt entry is gone from storage too.
        assert!(storage.snapshot().identity.is_none());
        assert_eq!(storage.snapshot().credential.as_deref(), Some(TOKEN));
    }

    #[tokio::test]
    async fn test_restore_drops_identity_without_credential() {
        let storage = Arc::new(MemoryStorage::seeded(PersistedSession {
            credential: None,
            identity: Some(identity_json()),
        }));
        let store = SessionStore::new(storage);
        assert!(!store.restore());
        assert!(store.snapshot().identity.is_none());
    }

    #[tokio::test]
    async fn test_fetch_identity_failure_does_not_clear() {
        let (store, client, _) = store_and_client(AuthServer {
            me_status: 500,
            fail_logout: false,
        });
        store.login(&client, "alice", "pw").await.unwrap();
        let err = store.fetch_identity(&client).await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert!(store.snapshot().is_logged_in());
    }

    #[tokio::test]
    async fn test_logout_is_idempotent_and_locally_authoritative() {
        let (store, client, storage) = store_and_client(AuthServer {
            me_status: 200,
            fail_logout: true,
        });
        store.login(&client, "alice", "pw").await.unwrap();

        // Remote notification fails; the session is still cleared.
        store.logout(&client).await;
        assert!(!store.snapshot().is_logged_in());
        assert!(storage.snapshot().is_empty());

        // Second logout is a no-op with the same end state.
        store.logout(&client).await;
        assert!(!store.snapshot().is_logged_in());
        assert!(storage.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_credential_provider_reflects_current_state() {
        let (store, client, _) = store_and_client(AuthServer::healthy());
        assert_eq!(store.credential(), None);
        store.login(&client, "alice", "pw").await.unwrap();
        assert_eq!(store.credential().as_deref(), Some(TOKEN));
        store.clear();
        assert_eq!(store.credential(), None);
    }

    #[test]
    fn test_predicates_are_pure_over_snapshot() {
        let snapshot = SessionSnapshot {
            credential: Some(TOKEN.into()),
            identity: serde_json::from_value(identity_json()).ok(),
        };
        assert!(snapshot.is_logged_in());
        assert!(snapshot.is_teacher());
        assert!(!snapshot.is_admin());
        assert!(!snapshot.is_student());
        assert!(!snapshot.identity_pending());
    }
}
