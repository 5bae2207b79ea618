//! Navigation guard: gates every route transition on session state.

use crate::routes::{self, RoleRequirement, Route};
use qbank_http::{ApiClient, Notice, NoticeSink};
use qbank_session::SessionStore;
use std::sync::Arc;
use tracing::debug;

/// The host's navigation surface. `go` completes a transition or a
/// redirect; `reset_scroll` is the post-transition after-hook.
pub trait Navigator: Send + Sync + 'static {
    fn location(&self) -> String;
    fn go(&self, path: &str);
    fn reset_scroll(&self);
}

/// Outcome of one guard evaluation. A redirect means the original
/// transition was aborted; it never completes first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardOutcome {
    Allow,
    Redirected(String),
}

/// Evaluated once per route transition against the target route's
/// requirement and the current session snapshot. Steps run in a fixed
/// order; the first matching outcome wins.
pub struct NavigationGuard {
    session: Arc<SessionStore>,
    client: ApiClient,
    navigator: Arc<dyn Navigator>,
    notices: Arc<dyn NoticeSink>,
}

impl NavigationGuard {
    pub fn new(
        session: Arc<SessionStore>,
        client: ApiClient,
        navigator: Arc<dyn Navigator>,
        notices: Arc<dyn NoticeSink>,
    ) -> Self {
        NavigationGuard {
            session,
            client,
            navigator,
            notices,
        }
    }

    pub async fn evaluate(&self, target: &Route) -> GuardOutcome {
        let session = self.session.snapshot();

        if target.requirement.requires_auth {
            if !session.is_logged_in() {
                self.notices.notify(Notice::warning("Please log in first"));
                return self.redirect(routes::LOGIN);
            }

            match target.requirement.role {
                RoleRequirement::TeacherOrAdmin
                    if !session.is_teacher() && !session.is_admin() =>
                {
                    self.notices
                        .notify(Notice::warning("Teacher or admin privileges required"));
                    return self.redirect(routes::DEFAULT_LANDING);
                }
                RoleRequirement::Admin if !session.is_admin() => {
                    self.notices
                        .notify(Notice::warning("Admin privileges required"));
                    return self.redirect(routes::DEFAULT_LANDING);
                }
                _ => {}
            }

            // Credential restored but identity not yet resolved: block the
            // transition on the fetch. Navigation never completes with an
            // unresolved identity.
            if session.identity_pending() {
                if let Err(e) = self.session.fetch_identity(&self.client).await {
                    debug!("blocking identity fetch failed: {}", e);
                    // A credential rejection already ran the unauthorized
                    // hook (clear, notice, redirect); repeating it here
                    // would show a second notice and redirect twice.
                    if !self.session.snapshot().is_logged_in() {
                        return GuardOutcome::Redirected(routes::LOGIN.to_string());
                    }
                    self.session.clear();
                    self.notices
                        .notify(Notice::error("Session expired, please log in again"));
                    return self.redirect(routes::LOGIN);
                }
            }
        }

        // Re-entering the auth screens while authenticated bounces to the
        // landing route.
        if (target.pattern == routes::LOGIN || target.pattern == routes::REGISTER)
            && session.is_logged_in()
        {
            return self.redirect(routes::DEFAULT_LANDING);
        }

        GuardOutcome::Allow
    }

    fn redirect(&self, to: &str) -> GuardOutcome {
        self.navigator.go(to);
        GuardOutcome::Redirected(to.to_string())
    }
}
