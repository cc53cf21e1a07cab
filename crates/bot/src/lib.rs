//! The bot runtime: routes inbound relay messages to per-user command
//! sessions, sends the replies, and keeps the relay connection alive.

pub mod console;
pub mod dispatcher;
pub mod error;
pub mod runner;
pub mod transport;

#[cfg(feature = "metrics")]
pub mod counters;

pub use {
    console::ConsoleTransport,
    dispatcher::{Dispatcher, Services, UNSUPPORTED_COMMAND},
    error::{Error, Result},
    runner::Runner,
    transport::{MessageHandler, RelayTransport},
};
