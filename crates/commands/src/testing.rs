//! In-memory fakes of the services a command can reach, for tests here and
//! in downstream crates (enable the `testing` feature).

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use {
    async_trait::async_trait,
    base64::{Engine, engine::general_purpose::STANDARD},
    relaybot_assets::{Asset, AssetDirectory, AssetReader, directory::ListedAsset},
    relaybot_common::{
        Message, MessageCategory, MessageView, MultisigTransferInput, TransferInput, Wallet,
    },
    rust_decimal::Decimal,
    serde_json::json,
};

use crate::{
    CommandContext, CommandRegistry, Error, Quote, QuoteSource, Result, Settlement, SwapRequest,
};

pub const BOT_ID: &str = "5f0d2a5e-8c47-4b6e-9a1a-0d1c2b3a4f50";
pub const USER_ID: &str = "3c2f8e1a-6b9d-4e7a-8f10-2a3b4c5d6e7f";

pub const BTC_ID: &str = "c6d0c728-2624-429b-8e0d-d9d19b6592fa";
pub const ETH_ID: &str = "43d61dcd-e413-450d-80b8-101d5e903357";
pub const USDT_ID: &str = "4d8c508b-91c5-375b-92b0-ee702ed2dac5";
/// Listed in the directory but priced at zero.
pub const DUST_ID: &str = "9b180ab6-6abe-3dc0-a13f-04169eb34bfa";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn price(s: &str) -> Decimal {
    s.parse().unwrap_or_default()
}

pub fn asset(asset_id: &str, symbol: &str, name: &str, price_usd: &str) -> Asset {
    Asset {
        asset_id: asset_id.into(),
        symbol: symbol.into(),
        name: name.into(),
        price_usd: price(price_usd),
    }
}

pub fn btc() -> Asset {
    asset(BTC_ID, "BTC", "Bitcoin", "60000")
}

pub fn eth() -> Asset {
    asset(ETH_ID, "ETH", "Ether", "3000")
}

pub fn usdt() -> Asset {
    asset(USDT_ID, "USDT", "Tether USD", "1")
}

pub fn dust() -> Asset {
    asset(DUST_ID, "DUST", "Dust Token", "0")
}

/// Asset reader backed by a fixed table.
pub struct FakeAssets {
    assets: Mutex<HashMap<String, Asset>>,
}

impl FakeAssets {
    pub fn new(assets: impl IntoIterator<Item = Asset>) -> Self {
        Self {
            assets: Mutex::new(
                assets
                    .into_iter()
                    .map(|a| (a.asset_id.clone(), a))
                    .collect(),
            ),
        }
    }

    /// Make `asset_id` unreadable, as if the network call failed.
    pub fn remove(&self, asset_id: &str) {
        lock(&self.assets).remove(asset_id);
    }
}

#[async_trait]
impl AssetReader for FakeAssets {
    async fn read_asset(&self, asset_id: &str) -> relaybot_assets::Result<Asset> {
        lock(&self.assets)
            .get(asset_id)
            .cloned()
            .ok_or_else(|| relaybot_assets::Error::Api {
                code: 404,
                description: format!("asset {asset_id} unavailable"),
            })
    }
}

/// Wallet that records every transfer and transaction it is asked to make.
pub struct FakeWallet {
    client_id: String,
    transfers: Mutex<Vec<TransferInput>>,
    transactions: Mutex<Vec<MultisigTransferInput>>,
    failure: Mutex<Option<String>>,
}

impl FakeWallet {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            transfers: Mutex::new(Vec::new()),
            transactions: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
        }
    }

    /// Fail every subsequent call with `message`.
    pub fn fail_with(&self, message: &str) {
        *lock(&self.failure) = Some(message.to_string());
    }

    pub fn transfers(&self) -> Vec<TransferInput> {
        lock(&self.transfers).clone()
    }

    pub fn transactions(&self) -> Vec<MultisigTransferInput> {
        lock(&self.transactions).clone()
    }

    fn check(&self) -> relaybot_common::Result<()> {
        match lock(&self.failure).as_deref() {
            Some(message) => Err(relaybot_common::Error::message(message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Wallet for FakeWallet {
    fn client_id(&self) -> &str {
        &self.client_id
    }

    async fn transfer(&self, input: &TransferInput) -> relaybot_common::Result<()> {
        self.check()?;
        lock(&self.transfers).push(input.clone());
        Ok(())
    }

    async fn transaction(&self, input: &MultisigTransferInput) -> relaybot_common::Result<()> {
        self.check()?;
        lock(&self.transactions).push(input.clone());
        Ok(())
    }
}

/// Settlement that records swap requests instead of placing them.
#[derive(Default)]
pub struct FakeSettlement {
    requests: Mutex<Vec<SwapRequest>>,
    failure: Mutex<Option<String>>,
}

impl FakeSettlement {
    pub fn fail_with(&self, message: &str) {
        *lock(&self.failure) = Some(message.to_string());
    }

    pub fn requests(&self) -> Vec<SwapRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl Settlement for FakeSettlement {
    async fn swap(&self, request: &SwapRequest) -> Result<()> {
        if let Some(message) = lock(&self.failure).as_deref() {
            return Err(Error::settlement(message));
        }
        lock(&self.requests).push(request.clone());
        Ok(())
    }
}

/// Quote source returning whatever was last set; `None` makes it fail.
#[derive(Default)]
pub struct FakeQuotes {
    quote: Mutex<Option<Quote>>,
}

impl FakeQuotes {
    pub fn set(&self, quote: Option<Quote>) {
        *lock(&self.quote) = quote;
    }
}

#[async_trait]
impl QuoteSource for FakeQuotes {
    async fn fetch_quote(&self) -> Result<Quote> {
        lock(&self.quote)
            .clone()
            .ok_or_else(|| Error::invalid_state("no quote available"))
    }
}

/// Builtin registry plus fakes for every service, wired into a
/// [`CommandContext`] by [`Fixture::ctx`].
///
/// The directory lists BTC, ETH, USDT and DUST; the reader knows all four.
pub struct Fixture {
    pub registry: CommandRegistry,
    pub directory: AssetDirectory,
    pub assets: Arc<FakeAssets>,
    pub wallet: Arc<FakeWallet>,
    pub settlement: Arc<FakeSettlement>,
    pub quotes: Arc<FakeQuotes>,
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Fixture {
    pub fn new() -> Self {
        let known = [btc(), eth(), usdt(), dust()];
        let directory = AssetDirectory::from_listed(known.iter().map(|a| ListedAsset {
            id: a.asset_id.clone(),
            name: a.name.clone(),
            symbol: a.symbol.clone(),
        }));
        Self {
            registry: CommandRegistry::with_builtins(),
            directory,
            assets: Arc::new(FakeAssets::new(known)),
            wallet: Arc::new(FakeWallet::new(BOT_ID)),
            settlement: Arc::new(FakeSettlement::default()),
            quotes: Arc::new(FakeQuotes::default()),
        }
    }

    pub fn ctx(&self) -> CommandContext<'_> {
        CommandContext {
            directory: &self.directory,
            assets: self.assets.as_ref(),
            wallet: self.wallet.as_ref(),
            settlement: self.settlement.as_ref(),
            quotes: self.quotes.as_ref(),
            commands: self.registry.descriptors(),
        }
    }
}

/// Decoded plain-text message from `user_id` with a fresh message id.
pub fn text_message(user_id: &str, body: &str) -> Message {
    Message {
        conversation_id: format!("conv-{user_id}"),
        user_id: user_id.into(),
        message_id: uuid_like(user_id, body),
        category: MessageCategory::PlainText,
        body: body.into(),
    }
}

/// Decoded transfer notification: `user_id` paid `amount` of `asset_id`.
pub fn transfer_message(user_id: &str, asset_id: &str, amount: &str) -> Message {
    let body = json!({
        "snapshot_id": format!("snap-{user_id}-{asset_id}"),
        "opponent_id": user_id,
        "asset_id": asset_id,
        "amount": amount,
        "trace_id": format!("trace-{user_id}"),
        "memo": ""
    })
    .to_string();
    Message {
        conversation_id: format!("conv-{user_id}"),
        user_id: user_id.into(),
        message_id: uuid_like(user_id, &body),
        category: MessageCategory::SystemAccountSnapshot,
        body,
    }
}

/// Wire form of `msg`, as the relay would deliver it.
pub fn wire(msg: &Message) -> MessageView {
    MessageView {
        conversation_id: msg.conversation_id.clone(),
        user_id: msg.user_id.clone(),
        message_id: msg.message_id.clone(),
        category: msg.category.clone(),
        data: STANDARD.encode(msg.body.as_bytes()),
    }
}

// Stable per (user, body) so tests can predict reply ids.
fn uuid_like(user_id: &str, body: &str) -> String {
    relaybot_common::ids::derive(user_id, body)
}
