use std::sync::Arc;

use {
    async_trait::async_trait,
    relaybot_assets::{AssetDirectory, AssetReader},
    relaybot_commands::{
        CommandContext, CommandRegistry, Outcome, QuoteSource, Settlement, transfer,
    },
    relaybot_common::{
        Message, MessageCategory, MessageView, Messenger, OutboundMessage, Wallet, ids,
    },
    relaybot_sessions::{Session, SessionStore},
    tracing::{debug, error, info, warn},
};

#[cfg(feature = "metrics")]
use crate::counters;
use crate::MessageHandler;

pub const UNSUPPORTED_COMMAND: &str =
    "Unsupported command, send '/help' to get all available commands.";

/// External services handed to every command execution.
pub struct Services {
    pub directory: AssetDirectory,
    pub assets: Arc<dyn AssetReader>,
    pub wallet: Arc<dyn Wallet>,
    pub settlement: Arc<dyn Settlement>,
    pub quotes: Arc<dyn QuoteSource>,
}

/// Routes each inbound message to the right command and applies the result
/// to the sender's session.
///
/// Messages must be fed sequentially; the dispatcher relies on the transport
/// to never run two messages for the same user at once.
pub struct Dispatcher {
    registry: CommandRegistry,
    sessions: Arc<SessionStore>,
    services: Services,
    messenger: Arc<dyn Messenger>,
}

impl Dispatcher {
    pub fn new(
        registry: CommandRegistry,
        sessions: Arc<SessionStore>,
        services: Services,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        Self {
            registry,
            sessions,
            services,
            messenger,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    fn context(&self) -> CommandContext<'_> {
        CommandContext {
            directory: &self.services.directory,
            assets: self.services.assets.as_ref(),
            wallet: self.services.wallet.as_ref(),
            settlement: self.services.settlement.as_ref(),
            quotes: self.services.quotes.as_ref(),
            commands: self.registry.descriptors(),
        }
    }

    /// Handle one inbound message end to end. Failures are reported to the
    /// user or logged; nothing propagates to the transport.
    pub async fn handle_message(&self, view: &MessageView) {
        let Some(msg) = self.accept(view) else {
            return;
        };

        #[cfg(feature = "metrics")]
        metrics::counter!(counters::MESSAGES_RECEIVED_TOTAL).increment(1);

        let ctx = self.context();

        if let Some(session) = self.sessions.get(&msg.user_id) {
            match self.registry.get(&session.command) {
                Some(command) if msg.is_transfer() && !command.accepts_transfers() => {
                    info!(
                        user_id = %msg.user_id,
                        message_id = %msg.message_id,
                        command = %session.command,
                        "closing session that does not take payments"
                    );
                    self.sessions.delete(&msg.user_id);
                },
                Some(command) => {
                    debug!(
                        user_id = %msg.user_id,
                        message_id = %msg.message_id,
                        command = %session.command,
                        step = session.current_step,
                        "continuing session"
                    );
                    #[cfg(feature = "metrics")]
                    metrics::counter!(counters::COMMANDS_EXECUTED_TOTAL, "command" => command.name())
                        .increment(1);
                    let result = command.execute(&ctx, session, &msg).await;
                    self.apply(&msg, result).await;
                    return;
                },
                None => {
                    warn!(
                        user_id = %msg.user_id,
                        command = %session.command,
                        "dropping session for unregistered command"
                    );
                    self.sessions.delete(&msg.user_id);
                },
            }
        }

        if msg.is_transfer() {
            match transfer::handle_transfer(&ctx, &msg, None).await {
                Ok(Some(reply)) => self.send(&reply).await,
                Ok(None) => {},
                Err(e) => self.report(&msg, &e).await,
            }
            return;
        }

        if msg.is_plain_text() {
            let text = msg.body.trim();
            let (token, rest) = text
                .split_once(char::is_whitespace)
                .map_or((text, ""), |(token, rest)| (token, rest.trim()));
            if let Some(command) = self.registry.get(token) {
                let session = Session::new(command.name(), msg.user_id.as_str());
                self.sessions.put(session.clone());
                info!(
                    user_id = %msg.user_id,
                    message_id = %msg.message_id,
                    command = command.name(),
                    "session started"
                );
                #[cfg(feature = "metrics")]
                metrics::counter!(counters::COMMANDS_EXECUTED_TOTAL, "command" => command.name())
                    .increment(1);
                let input = msg.clone().with_body(rest);
                let result = command.execute(&ctx, session, &input).await;
                self.apply(&input, result).await;
                return;
            }
        }

        debug!(user_id = %msg.user_id, message_id = %msg.message_id, "unsupported input");
        self.send(&OutboundMessage::text_reply(&msg, UNSUPPORTED_COMMAND))
            .await;
    }

    /// Validate the sender and decode the payload. Returns `None` for
    /// messages that must be dropped.
    fn accept(&self, view: &MessageView) -> Option<Message> {
        let is_transfer = view.category == MessageCategory::SystemAccountSnapshot;
        if !is_transfer && !ids::is_valid_user_id(&view.user_id) {
            debug!(user_id = %view.user_id, message_id = %view.message_id, "dropping message from invalid sender");
            #[cfg(feature = "metrics")]
            metrics::counter!(counters::MESSAGES_DROPPED_TOTAL, "reason" => "sender").increment(1);
            return None;
        }

        let mut msg = match view.decode() {
            Ok(msg) => msg,
            Err(e) => {
                warn!(message_id = %view.message_id, error = %e, "dropping undecodable message");
                #[cfg(feature = "metrics")]
                metrics::counter!(counters::MESSAGES_DROPPED_TOTAL, "reason" => "decode").increment(1);
                return None;
            },
        };

        // Snapshots may arrive without a sender; the payer is the opponent.
        if is_transfer && !ids::is_valid_user_id(&msg.user_id) {
            match msg.transfer_view() {
                Ok(transfer) if ids::is_valid_user_id(&transfer.opponent_id) => {
                    msg.user_id = transfer.opponent_id;
                },
                Ok(_) => {
                    debug!(message_id = %msg.message_id, "dropping transfer without a payer");
                    return None;
                },
                Err(e) => {
                    warn!(message_id = %msg.message_id, error = %e, "dropping malformed transfer");
                    return None;
                },
            }
        }

        Some(msg)
    }

    /// Apply a command result: send the reply, persist or drop the session.
    async fn apply(&self, msg: &Message, result: relaybot_commands::Result<Outcome>) {
        match result {
            Ok(Outcome { session, reply }) => {
                if let Some(reply) = reply {
                    self.send(&reply).await;
                }
                if session.is_active() {
                    self.sessions.put(session);
                } else {
                    debug!(user_id = %msg.user_id, "session finished");
                    self.sessions.delete(&msg.user_id);
                }
            },
            Err(e) => {
                self.sessions.delete(&msg.user_id);
                #[cfg(feature = "metrics")]
                metrics::counter!(counters::SESSIONS_ABORTED_TOTAL).increment(1);
                self.report(msg, &e).await;
            },
        }
    }

    async fn report(&self, msg: &Message, err: &relaybot_commands::Error) {
        warn!(
            user_id = %msg.user_id,
            message_id = %msg.message_id,
            error = %err,
            "command failed"
        );
        self.send(&OutboundMessage::text_reply(msg, &err.user_message()))
            .await;
    }

    async fn send(&self, reply: &OutboundMessage) {
        if let Err(e) = self.messenger.send_message(reply).await {
            error!(
                recipient_id = %reply.recipient_id,
                message_id = %reply.message_id,
                error = %e,
                "failed to send reply"
            );
        }
    }
}

#[async_trait]
impl MessageHandler for Dispatcher {
    async fn handle(&self, view: &MessageView) {
        self.handle_message(view).await;
    }
}
