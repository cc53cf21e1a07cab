//! Shared message envelopes, deterministic ids, wallet traits and error
//! definitions used across all relaybot crates.

pub mod error;
pub mod ids;
pub mod services;
pub mod types;

pub use {
    error::{Error, FromMessage, Result},
    services::{Messenger, Wallet},
    types::{
        Message, MessageCategory, MessageView, MultisigTransferInput, OutboundMessage,
        TransferInput, TransferView,
    },
};
