//! A local stand-in for the relay: stdin lines become plain-text messages
//! from one fixed user and replies are printed to stdout.
//!
//! A line of the form `!pay <asset id> <amount>` is delivered as a transfer
//! notification instead, so payment flows can be exercised locally. The
//! console wallet logs transfers instead of moving funds.

use std::sync::atomic::{AtomicU64, Ordering};

use {
    async_trait::async_trait,
    base64::{Engine, engine::general_purpose::STANDARD},
    relaybot_common::{
        MessageCategory, Messenger, MessageView, MultisigTransferInput, OutboundMessage,
        TransferInput, Wallet,
    },
    rust_decimal::Decimal,
    serde_json::json,
    tokio::{
        io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader},
        sync::Mutex,
    },
    tokio_util::sync::CancellationToken,
    tracing::{debug, info},
    uuid::Uuid,
};

use crate::{Error, MessageHandler, RelayTransport, Result, error::Context};

const PAY_PREFIX: &str = "!pay";

/// Console user id used when none is configured.
pub const CONSOLE_USER_ID: &str = "6f1e4c7a-2d35-4b8e-9f01-5a6b7c8d9e0f";

pub struct ConsoleTransport {
    client_id: String,
    user_id: String,
    conversation_id: String,
    output: Mutex<Box<dyn AsyncWrite + Send + Unpin>>,
    snapshots: AtomicU64,
}

impl ConsoleTransport {
    /// Console transport writing to stdout.
    pub fn new(client_id: impl Into<String>) -> Self {
        Self::with_output(client_id, Box::new(tokio::io::stdout()))
    }

    pub fn with_output(
        client_id: impl Into<String>,
        output: Box<dyn AsyncWrite + Send + Unpin>,
    ) -> Self {
        let user_id = CONSOLE_USER_ID.to_string();
        Self {
            client_id: client_id.into(),
            conversation_id: Uuid::new_v5(&Uuid::NAMESPACE_OID, user_id.as_bytes()).to_string(),
            user_id,
            output: Mutex::new(output),
            snapshots: AtomicU64::new(0),
        }
    }

    /// Read `input` line by line, dispatching each to `handler`, until EOF or
    /// cancellation.
    pub async fn listen_on<R>(
        &self,
        input: R,
        handler: &dyn MessageHandler,
        cancel: &CancellationToken,
    ) -> Result<()>
    where
        R: AsyncBufRead + Unpin + Send,
    {
        let mut lines = input.lines();
        loop {
            let line = tokio::select! {
                () = cancel.cancelled() => return Ok(()),
                line = lines.next_line() => line.context("reading console input")?,
            };
            let Some(line) = line else {
                debug!("console input closed");
                return Ok(());
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match self.to_view(line) {
                Ok(view) => handler.handle(&view).await,
                Err(e) => self
                    .write_line(&e.to_string())
                    .await
                    .context("writing to console")?,
            }
        }
    }

    fn to_view(&self, line: &str) -> Result<MessageView> {
        let (category, body) = match line.strip_prefix(PAY_PREFIX) {
            Some(rest) => (MessageCategory::SystemAccountSnapshot, self.snapshot(rest)?),
            None => (MessageCategory::PlainText, line.to_string()),
        };
        Ok(MessageView {
            conversation_id: self.conversation_id.clone(),
            user_id: self.user_id.clone(),
            message_id: Uuid::new_v4().to_string(),
            category,
            data: STANDARD.encode(body.as_bytes()),
        })
    }

    fn snapshot(&self, args: &str) -> Result<String> {
        let mut parts = args.split_whitespace();
        let (Some(asset_id), Some(amount), None) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(Error::message(format!("usage: {PAY_PREFIX} <asset id> <amount>")));
        };
        let amount: Decimal = amount
            .parse()
            .map_err(|e| Error::external("invalid amount", e))?;
        let n = self.snapshots.fetch_add(1, Ordering::Relaxed);
        Ok(json!({
            "snapshot_id": format!("console-{n}"),
            "opponent_id": self.user_id,
            "asset_id": asset_id,
            "amount": amount.to_string(),
            "trace_id": Uuid::new_v4().to_string(),
            "memo": ""
        })
        .to_string())
    }

    async fn write_line(&self, line: &str) -> std::io::Result<()> {
        let mut output = self.output.lock().await;
        output.write_all(line.as_bytes()).await?;
        output.write_all(b"\n").await?;
        output.flush().await
    }
}

#[async_trait]
impl RelayTransport for ConsoleTransport {
    async fn listen(&self, handler: &dyn MessageHandler, cancel: &CancellationToken) -> Result<()> {
        info!(user_id = %self.user_id, "console transport ready");
        self.listen_on(BufReader::new(tokio::io::stdin()), handler, cancel)
            .await?;
        // Nothing to reconnect to once stdin is closed.
        info!("console input closed, shutting down");
        cancel.cancel();
        Ok(())
    }
}

#[async_trait]
impl Messenger for ConsoleTransport {
    async fn send_message(&self, message: &OutboundMessage) -> relaybot_common::Result<()> {
        let text = message.payload_text()?;
        let line = match message.category {
            MessageCategory::AppButtonGroup => format!("[buttons] {text}"),
            _ => text,
        };
        self.write_line(&line)
            .await
            .map_err(|e| relaybot_common::Error::external("writing to console", e))
    }
}

#[async_trait]
impl Wallet for ConsoleTransport {
    fn client_id(&self) -> &str {
        &self.client_id
    }

    async fn transfer(&self, input: &TransferInput) -> relaybot_common::Result<()> {
        info!(
            opponent_id = %input.opponent_id,
            asset_id = %input.asset_id,
            amount = %input.amount,
            trace_id = %input.trace_id,
            memo = %input.memo,
            "console transfer"
        );
        Ok(())
    }

    async fn transaction(&self, input: &MultisigTransferInput) -> relaybot_common::Result<()> {
        info!(
            asset_id = %input.asset_id,
            amount = %input.amount,
            trace_id = %input.trace_id,
            receivers = input.receivers.len(),
            threshold = input.threshold,
            "console multisig transaction"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use {super::*, tokio::io::AsyncReadExt};

    #[derive(Default)]
    struct Collect {
        views: StdMutex<Vec<MessageView>>,
    }

    #[async_trait]
    impl MessageHandler for Collect {
        async fn handle(&self, view: &MessageView) {
            self.views.lock().unwrap().push(view.clone());
        }
    }

    fn transport() -> ConsoleTransport {
        ConsoleTransport::with_output("bot", Box::new(tokio::io::sink()))
    }

    #[tokio::test]
    async fn lines_become_plain_text_messages() {
        let transport = transport();
        let collect = Collect::default();
        let input: &[u8] = b"/echo hi\n\n  /help  \n";
        transport
            .listen_on(input, &collect, &CancellationToken::new())
            .await
            .unwrap();

        let views = collect.views.lock().unwrap();
        assert_eq!(views.len(), 2);
        let first = views[0].decode().unwrap();
        assert_eq!(first.body, "/echo hi");
        assert!(first.is_plain_text());
        assert_eq!(first.user_id, CONSOLE_USER_ID);
        assert_ne!(views[0].message_id, views[1].message_id);
        assert_eq!(views[1].decode().unwrap().body, "/help");
    }

    #[tokio::test]
    async fn pay_lines_become_transfers() {
        let transport = transport();
        let collect = Collect::default();
        let input: &[u8] = b"!pay c6d0c728-2624-429b-8e0d-d9d19b6592fa 0.5\n";
        transport
            .listen_on(input, &collect, &CancellationToken::new())
            .await
            .unwrap();

        let views = collect.views.lock().unwrap();
        let msg = views[0].decode().unwrap();
        assert!(msg.is_transfer());
        let transfer = msg.transfer_view().unwrap();
        assert_eq!(transfer.asset_id, "c6d0c728-2624-429b-8e0d-d9d19b6592fa");
        assert_eq!(transfer.amount.to_string(), "0.5");
        assert_eq!(transfer.opponent_id, CONSOLE_USER_ID);
    }

    #[tokio::test]
    async fn malformed_pay_line_prints_usage_and_continues() {
        let (writer, mut reader) = tokio::io::duplex(1024);
        let transport = ConsoleTransport::with_output("bot", Box::new(writer));
        let collect = Collect::default();
        let input: &[u8] = b"!pay btc
/help
";
        transport
            .listen_on(input, &collect, &CancellationToken::new())
            .await
            .unwrap();
        drop(transport);

        assert_eq!(collect.views.lock().unwrap().len(), 1);
        let mut printed = String::new();
        reader.read_to_string(&mut printed).await.unwrap();
        assert_eq!(printed, "usage: !pay <asset id> <amount>\n");
    }

    #[tokio::test]
    async fn replies_are_printed() {
        let (writer, mut reader) = tokio::io::duplex(1024);
        let transport = ConsoleTransport::with_output("bot", Box::new(writer));
        let msg = relaybot_common::Message {
            conversation_id: "c".into(),
            user_id: CONSOLE_USER_ID.into(),
            message_id: "m".into(),
            category: MessageCategory::PlainText,
            body: String::new(),
        };
        transport
            .send_message(&OutboundMessage::text_reply(&msg, "hello"))
            .await
            .unwrap();
        drop(transport);

        let mut printed = String::new();
        reader.read_to_string(&mut printed).await.unwrap();
        assert_eq!(printed, "hello\n");
    }

    #[tokio::test]
    async fn cancellation_stops_listening() {
        let transport = transport();
        let collect = Collect::default();
        let cancel = CancellationToken::new();
        cancel.cancel();
        // A reader that never yields; only cancellation can end the loop.
        let (_writer, reader) = tokio::io::duplex(64);
        transport
            .listen_on(BufReader::new(reader), &collect, &cancel)
            .await
            .unwrap();
        assert!(collect.views.lock().unwrap().is_empty());
    }
}
