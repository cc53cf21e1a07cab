use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Symbol({symbol}) not found.")]
    NotFound { symbol: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("asset API error {code}: {description}")]
    Api { code: i64, description: String },
}

impl Error {
    #[must_use]
    pub fn not_found(symbol: impl Into<String>) -> Self {
        Self::NotFound {
            symbol: symbol.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
