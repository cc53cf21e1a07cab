//! Conversational commands.
//!
//! Each command is a small state machine driven one message at a time: it
//! receives the user's session by value, advances it, and hands back the
//! updated session plus an optional reply. Setting the session's command to
//! empty ends the flow.

pub mod command;
pub mod echo;
pub mod error;
pub mod help;
pub mod poem;
pub mod price;
pub mod registry;
pub mod settlement;
pub mod swap;
pub mod transfer;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use {
    command::{Command, CommandContext, CommandDescriptor, Outcome},
    error::{Error, Result},
    poem::{HttpQuoteSource, Quote, QuoteSource},
    registry::CommandRegistry,
    settlement::{MtgSettlement, Settlement, SwapRequest},
};
