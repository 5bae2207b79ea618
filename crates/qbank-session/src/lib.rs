//! Session state for the qbank admin client.
//!
//! Owns the single source of truth for "is the caller authenticated, and
//! with what privileges": the persisted credential, the resolved identity,
//! and the pure role predicates derived from them.

pub mod api;
pub mod identity;
pub mod persist;
pub mod store;

pub use identity::{Identity, Role};
pub use persist::{FileStorage, MemoryStorage, PersistedSession, SessionStorage};
pub use store::{SessionSnapshot, SessionStore};
