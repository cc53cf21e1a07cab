use {
    async_trait::async_trait,
    relaybot_assets::{AssetDirectory, AssetReader},
    relaybot_common::{Message, OutboundMessage, Wallet},
    relaybot_sessions::Session,
};

use crate::{QuoteSource, Result, Settlement};

/// Static description of a registered command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandDescriptor {
    /// Dispatch token, e.g. `/echo`.
    pub name: &'static str,
    /// One-line description for `/help`.
    pub description: &'static str,
    /// Number of steps in the flow.
    pub step_count: usize,
}

/// Services a command may call, passed explicitly on every execution.
#[derive(Clone, Copy)]
pub struct CommandContext<'a> {
    pub directory: &'a AssetDirectory,
    pub assets: &'a dyn AssetReader,
    pub wallet: &'a dyn Wallet,
    pub settlement: &'a dyn Settlement,
    pub quotes: &'a dyn QuoteSource,
    /// Every registered command, in registration order.
    pub commands: &'a [CommandDescriptor],
}

/// Result of one execution step: the updated session and an optional reply.
#[derive(Debug)]
pub struct Outcome {
    pub session: Session,
    pub reply: Option<OutboundMessage>,
}

impl Outcome {
    pub fn reply(session: Session, reply: OutboundMessage) -> Self {
        Self {
            session,
            reply: Some(reply),
        }
    }

    /// Plain-text reply to `msg`.
    pub fn text(session: Session, msg: &Message, text: &str) -> Self {
        Self::reply(session, OutboundMessage::text_reply(msg, text))
    }

    pub fn silent(session: Session) -> Self {
        Self {
            session,
            reply: None,
        }
    }
}

/// A named, possibly multi-step conversational handler.
#[async_trait]
pub trait Command: Send + Sync {
    fn descriptor(&self) -> CommandDescriptor;

    fn name(&self) -> &'static str {
        self.descriptor().name
    }

    /// Whether an open session of this command consumes payments. When it
    /// does not, a payment closes the session and is refunded.
    fn accepts_transfers(&self) -> bool {
        false
    }

    /// Run the step the session points at. `msg.body` holds the user's input
    /// with the command token already stripped on the first step.
    async fn execute(
        &self,
        ctx: &CommandContext<'_>,
        session: Session,
        msg: &Message,
    ) -> Result<Outcome>;
}
