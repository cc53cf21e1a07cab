//! Per-user conversational sessions.
//!
//! A session tracks one user's in-progress multi-step command: which command
//! is active, the step cursor, and typed data carried between steps. Sessions
//! live in a concurrent in-memory map keyed by user id and expire after an
//! idle TTL.

pub mod session;
pub mod store;

pub use {
    session::{Session, SessionData},
    store::SessionStore,
};
