use std::collections::HashMap;

use {serde::Deserialize, tracing::info};

use crate::Result;

/// Entry of the swap asset list.
#[derive(Debug, Clone, Deserialize)]
pub struct ListedAsset {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub symbol: String,
}

#[derive(Debug, Deserialize)]
struct AssetListData {
    #[serde(default)]
    assets: Vec<ListedAsset>,
}

#[derive(Debug, Deserialize)]
struct AssetListResponse {
    #[serde(default)]
    ts: i64,
    data: AssetListData,
}

/// Read-only ticker → asset id snapshot, built once at start-up.
#[derive(Debug, Clone, Default)]
pub struct AssetDirectory {
    tickers: HashMap<String, String>,
}

impl AssetDirectory {
    /// Build a directory from listed assets. Symbols are upper-cased; when two
    /// entries share a symbol the later one wins.
    pub fn from_listed(assets: impl IntoIterator<Item = ListedAsset>) -> Self {
        let tickers = assets
            .into_iter()
            .map(|asset| (asset.symbol.to_uppercase(), asset.id))
            .collect();
        Self { tickers }
    }

    /// Fetch the asset list from `url`. Fails on transport errors, non-2xx
    /// status and malformed bodies.
    pub async fn fetch(client: &reqwest::Client, url: &str) -> Result<Self> {
        let body = client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let response: AssetListResponse = serde_json::from_str(&body)?;
        let ts = response.ts;
        let directory = Self::from_listed(response.data.assets);
        info!(url, ts, tickers = directory.len(), "asset directory loaded");
        Ok(directory)
    }

    /// Asset id for `symbol`, matched case-insensitively.
    pub fn lookup(&self, symbol: &str) -> Option<&str> {
        self.tickers
            .get(&symbol.trim().to_uppercase())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }
}
