//! Application shell for the qbank admin client.
//!
//! Wires the session store, request pipeline and navigation guard around
//! a single explicitly-owned context, and hosts the route table and the
//! problem-bank API bindings.

pub mod api;
pub mod context;
pub mod guard;
pub mod invalidate;
pub mod notice;
pub mod routes;

pub use context::AppContext;
pub use guard::{GuardOutcome, NavigationGuard, Navigator};
pub use invalidate::Invalidator;
pub use notice::TracingNotices;
pub use routes::{RoleRequirement, Route, RouteRequirement, RouteTable};
