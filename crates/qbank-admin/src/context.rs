//! Explicitly-owned wiring of session, pipeline and guard.
//!
//! The context replaces the ambient globals of a typical SPA shell: one
//! owned session store, injected into the pipeline (credential provider)
//! and the guard, with the one-shot invalidator as the pipeline's
//! unauthorized hook.

use crate::guard::{GuardOutcome, NavigationGuard, Navigator};
use crate::invalidate::Invalidator;
use crate::routes::RouteTable;
use qbank_http::{ApiClient, ClientConfig, NoticeSink, Result, Transport};
use qbank_session::{SessionStorage, SessionStore};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct AppContext {
    session: Arc<SessionStore>,
    client: ApiClient,
    table: RouteTable,
    navigator: Arc<dyn Navigator>,
    invalidator: Arc<Invalidator>,
    guard: NavigationGuard,
}

impl AppContext {
    /// Build the context over the reqwest transport.
    pub fn new(
        config: ClientConfig,
        storage: Arc<dyn SessionStorage>,
        navigator: Arc<dyn Navigator>,
        notices: Arc<dyn NoticeSink>,
    ) -> Result<Self> {
        let transport = Arc::new(qbank_http::HttpTransport::new(&config)?);
        Ok(Self::with_transport(
            config, transport, storage, navigator, notices,
        ))
    }

    /// Build the context over an arbitrary transport (tests use this).
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        storage: Arc<dyn SessionStorage>,
        navigator: Arc<dyn Navigator>,
        notices: Arc<dyn NoticeSink>,
    ) -> Self {
        let session = Arc::new(SessionStore::new(storage));
        let invalidator = Arc::new(Invalidator::new(
            session.clone(),
            navigator.clone(),
            notices.clone(),
        ));
        let client = ApiClient::with_transport(config, transport)
            .with_credentials(session.clone())
            .with_notices(notices.clone())
            .with_auth_events(invalidator.clone());
        let guard = NavigationGuard::new(
            session.clone(),
            client.clone(),
            navigator.clone(),
            notices.clone(),
        );
        AppContext {
            session,
            client,
            table: RouteTable::admin_console(),
            navigator,
            invalidator,
            guard,
        }
    }

    pub fn with_table(mut self, table: RouteTable) -> Self {
        self.table = table;
        self
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn invalidator(&self) -> &Arc<Invalidator> {
        &self.invalidator
    }

    /// Start-up: restore the persisted session, and resolve the identity
    /// when a credential came back without one. A failed start-up fetch
    /// is not fatal; the guard retries it on the first navigation.
    pub async fn start(&self) {
        if self.session.restore() {
            if let Err(e) = self.session.fetch_identity(&self.client).await {
                warn!("start-up identity fetch failed: {}", e);
            }
        }
    }

    /// Authenticate. Re-arms the invalidator so a later credential
    /// rejection is handled again.
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        self.invalidator.arm();
        self.session.login(&self.client, username, password).await
    }

    pub async fn logout(&self) {
        self.session.logout(&self.client).await;
    }

    /// Drive one route transition through the guard. The after-hook
    /// (scroll reset) runs on every completed transition, redirects
    /// included.
    pub async fn navigate(&self, path: &str) -> GuardOutcome {
        let mut path = path;
        let mut target = self.table.resolve(path);
        if let Some(to) = target.redirect {
            debug!("[route] {} aliases {}", path, to);
            path = to;
            target = self.table.resolve(to);
        }
        let outcome = self.guard.evaluate(target).await;
        match &outcome {
            GuardOutcome::Allow => {
                debug!("[route] -> {}", path);
                self.navigator.go(path);
            }
            GuardOutcome::Redirected(to) => {
                debug!("[route] {} -> {} (redirected)", path, to);
            }
        }
        self.navigator.reset_scroll();
        outcome
    }
}
