use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelaybotConfig {
    /// Path to the bot's keystore JSON.
    pub keystore_path: PathBuf,
    pub endpoints: EndpointsConfig,
    pub sessions: SessionsConfig,
    pub relay: RelayConfig,
    pub http: HttpConfig,
}

impl Default for RelaybotConfig {
    fn default() -> Self {
        Self {
            keystore_path: PathBuf::from("keystore.json"),
            endpoints: EndpointsConfig::default(),
            sessions: SessionsConfig::default(),
            relay: RelayConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

impl RelaybotConfig {
    /// Reject values the bot cannot start with.
    pub fn validate(&self) -> Result<()> {
        let urls = [
            ("endpoints.assets_url", &self.endpoints.assets_url),
            ("endpoints.network_api_url", &self.endpoints.network_api_url),
            ("endpoints.quote_url", &self.endpoints.quote_url),
            (
                "endpoints.settlement_api_url",
                &self.endpoints.settlement_api_url,
            ),
        ];
        for (key, url) in urls {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(Error::invalid(format!(
                    "{key} must be an http(s) URL, got {url:?}"
                )));
            }
        }
        if self.http.timeout_secs == 0 {
            return Err(Error::invalid("http.timeout_secs must be greater than 0"));
        }
        if self.sessions.ttl_secs > 0 && self.sessions.janitor_interval_secs == 0 {
            return Err(Error::invalid(
                "sessions.janitor_interval_secs must be greater than 0 when ttl is enabled",
            ));
        }
        Ok(())
    }
}

/// External HTTP endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    /// Asset list used to build the ticker directory at start-up.
    pub assets_url: String,
    /// Relay network API base, used to read asset details and prices.
    pub network_api_url: String,
    /// Quote-of-the-day source for `/poem`.
    pub quote_url: String,
    /// Settlement group API base for `/swap`.
    pub settlement_api_url: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            assets_url: "https://api.4swap.org/api/assets".into(),
            network_api_url: "https://api.mixin.one".into(),
            quote_url: "https://v1.jinrishici.com/all.json".into(),
            settlement_api_url: "https://mtgswap-api.fox.one".into(),
        }
    }
}

/// Conversational session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionsConfig {
    /// Idle time after which an unfinished session is dropped. 0 disables
    /// expiry.
    pub ttl_secs: u64,
    /// How often idle sessions are swept.
    pub janitor_interval_secs: u64,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 600,
            janitor_interval_secs: 60,
        }
    }
}

impl SessionsConfig {
    pub fn ttl(&self) -> Option<Duration> {
        (self.ttl_secs > 0).then(|| Duration::from_secs(self.ttl_secs))
    }

    pub fn janitor_interval(&self) -> Duration {
        Duration::from_secs(self.janitor_interval_secs.max(1))
    }
}

/// Relay connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Delay before reconnecting after the stream breaks.
    pub reconnect_backoff_ms: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            reconnect_backoff_ms: 1000,
        }
    }
}

impl RelayConfig {
    pub fn reconnect_backoff(&self) -> Duration {
        Duration::from_millis(self.reconnect_backoff_ms)
    }
}

/// Outbound HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 15 }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
