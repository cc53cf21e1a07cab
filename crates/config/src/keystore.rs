//! Bot keystore (relay credentials) loading.

use std::path::Path;

use {
    relaybot_common::ids,
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
};

use crate::{Error, Result};

/// Relay credentials for the bot account.
#[derive(Clone, Deserialize)]
pub struct Keystore {
    pub client_id: String,
    pub session_id: String,
    pub private_key: Secret<String>,
    #[serde(default)]
    pub pin_token: Option<Secret<String>>,
    #[serde(default)]
    pub scope: String,
}

impl std::fmt::Debug for Keystore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keystore")
            .field("client_id", &self.client_id)
            .field("session_id", &self.session_id)
            .field("private_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// Read and validate a keystore file. Any failure here is fatal at start-up.
pub fn load_keystore(path: &Path) -> Result<Keystore> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let keystore: Keystore = serde_json::from_str(&raw)?;

    if !ids::is_valid_user_id(&keystore.client_id) {
        return Err(Error::invalid(format!(
            "keystore client_id {:?} is not a valid id",
            keystore.client_id
        )));
    }
    if keystore.session_id.trim().is_empty() {
        return Err(Error::invalid("keystore session_id is empty"));
    }
    if keystore.private_key.expose_secret().trim().is_empty() {
        return Err(Error::invalid("keystore private_key is empty"));
    }
    Ok(keystore)
}
