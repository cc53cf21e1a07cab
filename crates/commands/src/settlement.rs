//! Settlement of `/swap` payments through a multisig exchange group.

use std::sync::Arc;

use {
    async_trait::async_trait,
    base64::{Engine, engine::general_purpose::URL_SAFE},
    relaybot_common::{MultisigTransferInput, Wallet},
    rust_decimal::Decimal,
    serde::Deserialize,
    tracing::{debug, info},
};

use crate::{Error, Result};

/// Swap action code understood by the exchange group.
const SWAP_ACTION: u8 = 3;

/// Smallest fill the group may settle with: `0.00000001`.
pub const MINIMUM_FILL: Decimal = Decimal::from_parts(1, 0, 0, false, 8);

/// A request to exchange `amount` of `pay_asset_id` into `fill_asset_id`
/// on behalf of `receiver_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRequest {
    pub receiver_id: String,
    pub pay_asset_id: String,
    pub fill_asset_id: String,
    pub amount: Decimal,
    /// Trace id of the outgoing transaction; the relay deduplicates on it.
    pub trace_id: String,
    /// Id the exchange uses to track the resulting order.
    pub follow_id: String,
}

#[async_trait]
pub trait Settlement: Send + Sync {
    /// Hand the swap to the exchange. Success means the payment was placed,
    /// not that the order filled.
    async fn swap(&self, request: &SwapRequest) -> Result<()>;
}

#[derive(Debug, Clone, Deserialize)]
struct Group {
    #[serde(default)]
    members: Vec<String>,
    #[serde(default)]
    threshold: u8,
}

#[derive(Debug, Deserialize)]
struct GroupResponse {
    data: Group,
}

/// Build the swap memo: `3,<receiver>,<follow>,<fill>,<routes>,<minimum>`,
/// base64url-encoded. An empty `routes` lets the exchange pick the path.
pub fn swap_memo(
    receiver_id: &str,
    follow_id: &str,
    fill_asset_id: &str,
    routes: &str,
    minimum: Decimal,
) -> String {
    let action = format!(
        "{SWAP_ACTION},{receiver_id},{follow_id},{fill_asset_id},{routes},{}",
        minimum.normalize()
    );
    URL_SAFE.encode(action)
}

/// Settles swaps by paying into the exchange's multisig group.
pub struct MtgSettlement {
    client: reqwest::Client,
    api_base: String,
    wallet: Arc<dyn Wallet>,
}

impl MtgSettlement {
    pub fn new(client: reqwest::Client, api_base: impl Into<String>, wallet: Arc<dyn Wallet>) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            wallet,
        }
    }

    async fn read_group(&self) -> Result<Group> {
        let url = format!("{}/api/info", self.api_base);
        let body = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let group = serde_json::from_str::<GroupResponse>(&body)?.data;
        if group.members.is_empty() {
            return Err(Error::settlement("exchange group has no members"));
        }
        if group.threshold == 0 || usize::from(group.threshold) > group.members.len() {
            return Err(Error::settlement(format!(
                "invalid group threshold {} for {} members",
                group.threshold,
                group.members.len()
            )));
        }
        debug!(members = group.members.len(), threshold = group.threshold, "read exchange group");
        Ok(group)
    }
}

#[async_trait]
impl Settlement for MtgSettlement {
    async fn swap(&self, request: &SwapRequest) -> Result<()> {
        let group = self.read_group().await?;
        let memo = swap_memo(
            &request.receiver_id,
            &request.follow_id,
            &request.fill_asset_id,
            "",
            MINIMUM_FILL,
        );
        let input = MultisigTransferInput {
            asset_id: request.pay_asset_id.clone(),
            amount: request.amount,
            trace_id: request.trace_id.clone(),
            memo,
            receivers: group.members,
            threshold: group.threshold,
        };
        self.wallet.transaction(&input).await?;
        info!(
            receiver_id = %request.receiver_id,
            pay_asset_id = %request.pay_asset_id,
            fill_asset_id = %request.fill_asset_id,
            amount = %request.amount,
            follow_id = %request.follow_id,
            "swap placed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::testing::FakeWallet, serde_json::json, std::str::FromStr};

    fn request() -> SwapRequest {
        SwapRequest {
            receiver_id: "user-1".into(),
            pay_asset_id: "pay".into(),
            fill_asset_id: "fill".into(),
            amount: Decimal::from_str("0.5").unwrap(),
            trace_id: "trace-1".into(),
            follow_id: "follow-1".into(),
        }
    }

    #[test]
    fn minimum_fill_is_one_satoshi() {
        assert_eq!(MINIMUM_FILL, Decimal::from_str("0.00000001").unwrap());
    }

    #[test]
    fn memo_layout() {
        let memo = swap_memo("r", "f", "a", "", MINIMUM_FILL);
        let decoded = String::from_utf8(URL_SAFE.decode(memo).unwrap()).unwrap();
        assert_eq!(decoded, "3,r,f,a,,0.00000001");
    }

    #[tokio::test]
    async fn places_multisig_transaction_to_group() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/info")
            .with_status(200)
            .with_body(
                json!({
                    "data": {
                        "members": ["m1", "m2", "m3"],
                        "threshold": 2,
                        "public_key": "pk"
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let wallet = Arc::new(FakeWallet::new("bot"));
        let settlement = MtgSettlement::new(reqwest::Client::new(), server.url(), wallet.clone());
        settlement.swap(&request()).await.unwrap();
        mock.assert_async().await;

        let txs = wallet.transactions();
        assert_eq!(txs.len(), 1);
        let tx = &txs[0];
        assert_eq!(tx.asset_id, "pay");
        assert_eq!(tx.amount, Decimal::from_str("0.5").unwrap());
        assert_eq!(tx.trace_id, "trace-1");
        assert_eq!(tx.receivers, vec!["m1", "m2", "m3"]);
        assert_eq!(tx.threshold, 2);
        assert_eq!(
            tx.memo,
            swap_memo("user-1", "follow-1", "fill", "", MINIMUM_FILL)
        );
    }

    #[tokio::test]
    async fn rejects_group_with_bad_threshold() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/info")
            .with_status(200)
            .with_body(json!({"data": {"members": ["m1"], "threshold": 3}}).to_string())
            .create_async()
            .await;

        let wallet = Arc::new(FakeWallet::new("bot"));
        let settlement = MtgSettlement::new(reqwest::Client::new(), server.url(), wallet.clone());
        let err = settlement.swap(&request()).await.unwrap_err();
        assert!(matches!(err, Error::Settlement { .. }));
        assert!(wallet.transactions().is_empty());
    }

    #[tokio::test]
    async fn group_fetch_failure_propagates() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/info")
            .with_status(502)
            .create_async()
            .await;

        let wallet = Arc::new(FakeWallet::new("bot"));
        let settlement = MtgSettlement::new(reqwest::Client::new(), server.url(), wallet);
        assert!(matches!(settlement.swap(&request()).await, Err(Error::Http(_))));
    }

    #[tokio::test]
    async fn wallet_failure_propagates() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/info")
            .with_status(200)
            .with_body(json!({"data": {"members": ["m1"], "threshold": 1}}).to_string())
            .create_async()
            .await;

        let wallet = Arc::new(FakeWallet::new("bot"));
        wallet.fail_with("insufficient balance");
        let settlement = MtgSettlement::new(reqwest::Client::new(), server.url(), wallet);
        assert!(matches!(settlement.swap(&request()).await, Err(Error::Relay(_))));
    }
}
