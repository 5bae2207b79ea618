//! One-shot session invalidation on credential rejection.
//!
//! Several in-flight calls can fail with 401 at once; the clear/notice/
//! redirect sequence must still run exactly once. The state machine is
//! `NORMAL -> INVALIDATING -> LOGGED_OUT`; re-entrant calls during or
//! after an invalidation are no-ops, and a successful login re-arms it.

use crate::guard::Navigator;
use crate::routes;
use qbank_http::{AuthEvents, Notice, NoticeSink};
use qbank_session::SessionStore;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tracing::warn;

const NORMAL: u8 = 0;
const INVALIDATING: u8 = 1;
const LOGGED_OUT: u8 = 2;

pub struct Invalidator {
    state: AtomicU8,
    session: Arc<SessionStore>,
    navigator: Arc<dyn Navigator>,
    notices: Arc<dyn NoticeSink>,
}

impl Invalidator {
    pub fn new(
        session: Arc<SessionStore>,
        navigator: Arc<dyn Navigator>,
        notices: Arc<dyn NoticeSink>,
    ) -> Self {
        Invalidator {
            state: AtomicU8::new(NORMAL),
            session,
            navigator,
            notices,
        }
    }

    /// Reset after a successful login so the next rejection is handled.
    pub fn arm(&self) {
        self.state.store(NORMAL, Ordering::SeqCst);
    }

    pub fn is_armed(&self) -> bool {
        self.state.load(Ordering::SeqCst) == NORMAL
    }
}

impl AuthEvents for Invalidator {
    fn on_unauthorized(&self) {
        // A rejection with no session behind it (e.g. a failed login
        // attempt) has nothing to invalidate.
        if !self.session.snapshot().is_logged_in() {
            return;
        }
        if self
            .state
            .compare_exchange(NORMAL, INVALIDATING, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        warn!("credential rejected, invalidating session");
        self.session.clear();
        self.notices
            .notify(Notice::warning("Login expired, please log in again"));
        self.navigator.go(routes::LOGIN);
        self.state.store(LOGGED_OUT, Ordering::SeqCst);
    }
}
