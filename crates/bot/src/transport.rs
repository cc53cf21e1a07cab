use {async_trait::async_trait, relaybot_common::MessageView, tokio_util::sync::CancellationToken};

use crate::Result;

/// Receives inbound messages from a transport, one at a time.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, view: &MessageView);
}

/// A bidirectional relay connection.
///
/// `listen` delivers every inbound message to `handler` in receive order and
/// returns when the stream ends or breaks. The caller reconnects.
#[async_trait]
pub trait RelayTransport: Send + Sync {
    async fn listen(&self, handler: &dyn MessageHandler, cancel: &CancellationToken)
    -> Result<()>;
}
