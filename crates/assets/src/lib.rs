//! Asset lookup: the ticker directory built at start-up and on-demand reads
//! of asset details (name, USD price) from the relay network.

pub mod directory;
pub mod error;
pub mod reader;

use {
    rust_decimal::Decimal,
    serde::{Deserialize, Serialize},
};

pub use {
    directory::AssetDirectory,
    error::{Error, Result},
    reader::{AssetReader, NetworkAssetReader, resolve_symbol},
};

/// An asset as known to the relay network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub asset_id: String,
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub price_usd: Decimal,
}
