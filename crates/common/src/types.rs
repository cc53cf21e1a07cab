use {
    base64::{Engine, engine::general_purpose::STANDARD},
    rust_decimal::Decimal,
    serde::{Deserialize, Serialize},
};

use crate::{Result, ids};

/// Relay message category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageCategory {
    #[serde(rename = "PLAIN_TEXT")]
    PlainText,
    /// Structured action payload (clickable buttons).
    #[serde(rename = "APP_BUTTON_GROUP")]
    AppButtonGroup,
    /// System notification that a transfer to the bot was settled.
    #[serde(rename = "SYSTEM_ACCOUNT_SNAPSHOT")]
    SystemAccountSnapshot,
    #[serde(other)]
    Unknown,
}

/// Inbound message as delivered by the relay, payload still base64-encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageView {
    pub conversation_id: String,
    pub user_id: String,
    pub message_id: String,
    pub category: MessageCategory,
    pub data: String,
}

impl MessageView {
    /// Decode the transport payload into a [`Message`].
    pub fn decode(&self) -> Result<Message> {
        let bytes = STANDARD.decode(self.data.as_bytes())?;
        Ok(Message {
            conversation_id: self.conversation_id.clone(),
            user_id: self.user_id.clone(),
            message_id: self.message_id.clone(),
            category: self.category.clone(),
            body: String::from_utf8(bytes)?,
        })
    }
}

/// Inbound message with its payload decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub conversation_id: String,
    pub user_id: String,
    pub message_id: String,
    pub category: MessageCategory,
    pub body: String,
}

impl Message {
    pub fn is_plain_text(&self) -> bool {
        self.category == MessageCategory::PlainText
    }

    pub fn is_transfer(&self) -> bool {
        self.category == MessageCategory::SystemAccountSnapshot
    }

    /// Same message with a different body (used to strip the command token).
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Parse the body of a transfer notification.
    pub fn transfer_view(&self) -> Result<TransferView> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Outbound message, payload base64-encoded for the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub conversation_id: String,
    pub recipient_id: String,
    pub message_id: String,
    pub category: MessageCategory,
    pub data: String,
}

impl OutboundMessage {
    /// Reply to `msg` in its conversation. The reply id is derived from the
    /// inbound message id.
    pub fn reply(msg: &Message, category: MessageCategory, payload: &[u8]) -> Self {
        Self {
            conversation_id: msg.conversation_id.clone(),
            recipient_id: msg.user_id.clone(),
            message_id: ids::reply_id(&msg.message_id),
            category,
            data: STANDARD.encode(payload),
        }
    }

    pub fn text_reply(msg: &Message, text: &str) -> Self {
        Self::reply(msg, MessageCategory::PlainText, text.as_bytes())
    }

    /// Decoded payload, for logging and local transports.
    pub fn payload_text(&self) -> Result<String> {
        Ok(String::from_utf8(STANDARD.decode(self.data.as_bytes())?)?)
    }
}

/// Body of a `SYSTEM_ACCOUNT_SNAPSHOT` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferView {
    #[serde(default)]
    pub snapshot_id: String,
    #[serde(default)]
    pub opponent_id: String,
    pub asset_id: String,
    pub amount: Decimal,
    #[serde(default)]
    pub trace_id: String,
    #[serde(default)]
    pub memo: String,
}

/// A plain transfer to a single opponent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferInput {
    pub asset_id: String,
    pub opponent_id: String,
    pub amount: Decimal,
    pub trace_id: String,
    pub memo: String,
}

/// A transfer addressed to a multisig group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MultisigTransferInput {
    pub asset_id: String,
    pub amount: Decimal,
    pub trace_id: String,
    pub memo: String,
    pub receivers: Vec<String>,
    pub threshold: u8,
}
