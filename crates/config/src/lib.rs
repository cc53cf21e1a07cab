//! Configuration loading, env substitution, and keystore loading.
//!
//! Config files: `relaybot.toml`, `relaybot.yaml`, `relaybot.yml` or
//! `relaybot.json`, searched in `./` then `~/.config/relaybot/`.
//!
//! Supports `${ENV_VAR}` and `${ENV_VAR:-default}` substitution in all string
//! values.

pub mod env_subst;
pub mod error;
pub mod keystore;
pub mod loader;
pub mod schema;

pub use {
    error::{Error, Result},
    keystore::{Keystore, load_keystore},
    loader::{config_dir, discover_and_load, load_config},
    schema::{EndpointsConfig, HttpConfig, RelayConfig, RelaybotConfig, SessionsConfig},
};
