use async_trait::async_trait;

use crate::{
    Result,
    types::{MultisigTransferInput, OutboundMessage, TransferInput},
};

/// Send messages back through the relay.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_message(&self, message: &OutboundMessage) -> Result<()>;
}

/// The bot's own account on the relay network.
#[async_trait]
pub trait Wallet: Send + Sync {
    /// The bot's client (user) id.
    fn client_id(&self) -> &str;

    /// Transfer an asset to a single user.
    async fn transfer(&self, input: &TransferInput) -> Result<()>;

    /// Send an asset to a multisig group. Settlement happens asynchronously.
    async fn transaction(&self, input: &MultisigTransferInput) -> Result<()>;
}
