use {async_trait::async_trait, serde::Deserialize, tracing::debug};

use crate::{Asset, AssetDirectory, Error, Result};

/// Read asset details (symbol, name, USD price) by asset id.
#[async_trait]
pub trait AssetReader: Send + Sync {
    async fn read_asset(&self, asset_id: &str) -> Result<Asset>;
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct AssetEnvelope {
    data: Option<Asset>,
    error: Option<ApiError>,
}

/// Reads assets from the relay network's public asset endpoint
/// (`GET {base}/network/assets/{id}`).
pub struct NetworkAssetReader {
    client: reqwest::Client,
    base_url: String,
}

impl NetworkAssetReader {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl AssetReader for NetworkAssetReader {
    async fn read_asset(&self, asset_id: &str) -> Result<Asset> {
        let url = format!("{}/network/assets/{asset_id}", self.base_url);
        debug!(asset_id, "reading asset");
        let body = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let envelope: AssetEnvelope = serde_json::from_str(&body)?;
        match (envelope.data, envelope.error) {
            (_, Some(err)) => Err(Error::Api {
                code: err.code,
                description: err.description,
            }),
            (Some(asset), None) => Ok(asset),
            (None, None) => Err(Error::Api {
                code: 0,
                description: format!("empty response for asset {asset_id}"),
            }),
        }
    }
}

/// Resolve a ticker symbol to full asset details.
///
/// Unknown tickers yield [`Error::NotFound`] carrying the upper-cased symbol.
pub async fn resolve_symbol(
    directory: &AssetDirectory,
    reader: &dyn AssetReader,
    symbol: &str,
) -> Result<Asset> {
    let symbol = symbol.trim().to_uppercase();
    let asset_id = directory
        .lookup(&symbol)
        .ok_or_else(|| Error::not_found(symbol.as_str()))?;
    reader.read_asset(asset_id).await
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::directory::ListedAsset,
        rust_decimal::Decimal,
        serde_json::json,
        std::{collections::HashMap, str::FromStr},
    };

    struct FixedReader(HashMap<String, Asset>);

    #[async_trait]
    impl AssetReader for FixedReader {
        async fn read_asset(&self, asset_id: &str) -> Result<Asset> {
            self.0.get(asset_id).cloned().ok_or(Error::Api {
                code: 404,
                description: "not found".into(),
            })
        }
    }

    #[tokio::test]
    async fn network_reader_parses_asset() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/network/assets/btc-id")
            .with_status(200)
            .with_body(
                json!({ "data": {
                    "asset_id": "btc-id",
                    "symbol": "BTC",
                    "name": "Bitcoin",
                    "price_usd": "64000.5"
                }})
                .to_string(),
            )
            .create_async()
            .await;

        let reader = NetworkAssetReader::new(reqwest::Client::new(), format!("{}/", server.url()));
        let asset = reader.read_asset("btc-id").await.unwrap();
        assert_eq!(asset.symbol, "BTC");
        assert_eq!(asset.price_usd, Decimal::from_str("64000.5").unwrap());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn network_reader_surfaces_api_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/network/assets/missing")
            .with_status(200)
            .with_body(json!({ "error": { "code": 10002, "description": "Invalid asset" } }).to_string())
            .create_async()
            .await;

        let reader = NetworkAssetReader::new(reqwest::Client::new(), server.url());
        let err = reader.read_asset("missing").await.unwrap_err();
        assert!(matches!(err, Error::Api { code: 10002, .. }));
    }

    #[tokio::test]
    async fn resolve_symbol_reports_unknown_ticker() {
        let dir = AssetDirectory::default();
        let reader = FixedReader(HashMap::new());
        let err = resolve_symbol(&dir, &reader, "xxxx").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Symbol(XXXX) not found.");
    }

    #[tokio::test]
    async fn resolve_symbol_reads_details() {
        let dir = AssetDirectory::from_listed([ListedAsset {
            id: "eth-id".into(),
            name: "Ether".into(),
            symbol: "ETH".into(),
        }]);
        let eth = Asset {
            asset_id: "eth-id".into(),
            symbol: "ETH".into(),
            name: "Ether".into(),
            price_usd: Decimal::from(3000),
        };
        let reader = FixedReader(HashMap::from([("eth-id".to_string(), eth.clone())]));
        assert_eq!(resolve_symbol(&dir, &reader, "eth").await.unwrap(), eth);
    }
}
