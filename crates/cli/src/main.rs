use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use {
    anyhow::{Context, bail},
    clap::{Parser, ValueEnum},
    relaybot_assets::{AssetDirectory, NetworkAssetReader},
    relaybot_bot::{ConsoleTransport, Dispatcher, Runner, Services},
    relaybot_commands::{CommandRegistry, HttpQuoteSource, MtgSettlement},
    relaybot_common::Wallet,
    relaybot_config::RelaybotConfig,
    relaybot_sessions::SessionStore,
    secrecy::{ExposeSecret, Secret},
    tokio_util::sync::CancellationToken,
    tracing::{info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

/// Client id used by the console transport when no keystore is present.
const LOCAL_CLIENT_ID: &str = "0c1d2e3f-4a5b-4c6d-8e7f-8091a2b3c4d5";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Transport {
    /// Read messages from stdin, print replies to stdout.
    Console,
}

#[derive(Parser)]
#[command(name = "relaybot", about = "relaybot, a conversational command bot", version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, default_value_t = false)]
    json_logs: bool,

    /// Config file (overrides discovery of relaybot.{toml,yaml,yml,json}).
    #[arg(long, env = "RELAYBOT_CONFIG")]
    config: Option<PathBuf>,

    /// Keystore file (overrides `keystore_path` from the config).
    #[arg(long, env = "RELAYBOT_KEYSTORE")]
    keystore: Option<PathBuf>,

    /// Wallet PIN, required whenever a keystore is loaded.
    #[arg(long, env = "RELAYBOT_PIN", hide_env_values = true)]
    pin: Option<String>,

    /// Where messages come from.
    #[arg(long, value_enum, default_value_t = Transport::Console)]
    transport: Transport,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr; stdout carries console replies.
    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<RelaybotConfig> {
    match &cli.config {
        Some(path) => relaybot_config::load_config(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(relaybot_config::discover_and_load()),
    }
}

/// Resolve the bot's client id from the keystore.
///
/// A keystore named explicitly must exist. The default keystore path may be
/// absent, in which case a local id is used. Whenever a keystore is loaded a
/// non-empty PIN is required.
fn resolve_client_id(
    keystore_path: &Path,
    explicit: bool,
    pin: Option<&Secret<String>>,
) -> anyhow::Result<String> {
    if !explicit && !keystore_path.exists() {
        warn!(
            path = %keystore_path.display(),
            client_id = LOCAL_CLIENT_ID,
            "no keystore found, running with a local client id"
        );
        return Ok(LOCAL_CLIENT_ID.to_string());
    }

    let keystore = relaybot_config::load_keystore(keystore_path)
        .with_context(|| format!("failed to load keystore {}", keystore_path.display()))?;
    match pin {
        Some(pin) if !pin.expose_secret().trim().is_empty() => {},
        Some(_) => bail!("the wallet PIN is empty"),
        None => bail!("a wallet PIN is required (--pin or RELAYBOT_PIN)"),
    }
    info!(client_id = %keystore.client_id, "keystore loaded");
    Ok(keystore.client_id)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "relaybot starting");

    let config = load_config(&cli)?;
    let pin = cli.pin.clone().map(Secret::new);
    let keystore_path = cli.keystore.clone().unwrap_or_else(|| config.keystore_path.clone());
    let client_id = resolve_client_id(&keystore_path, cli.keystore.is_some(), pin.as_ref())?;

    let http = reqwest::Client::builder()
        .timeout(config.http.timeout())
        .build()
        .context("failed to build HTTP client")?;

    let endpoints = &config.endpoints;
    let directory = AssetDirectory::fetch(&http, &endpoints.assets_url)
        .await
        .context("failed to load the asset directory")?;

    let transport = match cli.transport {
        Transport::Console => Arc::new(ConsoleTransport::new(client_id)),
    };
    let wallet: Arc<dyn Wallet> = transport.clone();

    let services = Services {
        directory,
        assets: Arc::new(NetworkAssetReader::new(
            http.clone(),
            endpoints.network_api_url.as_str(),
        )),
        settlement: Arc::new(MtgSettlement::new(
            http.clone(),
            endpoints.settlement_api_url.as_str(),
            Arc::clone(&wallet),
        )),
        quotes: Arc::new(HttpQuoteSource::new(http, endpoints.quote_url.as_str())),
        wallet,
    };

    let sessions = Arc::new(SessionStore::new(config.sessions.ttl()));
    let dispatcher = Arc::new(Dispatcher::new(
        CommandRegistry::with_builtins(),
        sessions,
        services,
        transport.clone(),
    ));
    info!(
        commands = ?dispatcher.registry().list(),
        session_ttl_secs = config.sessions.ttl_secs,
        "dispatcher ready"
    );

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            return;
        }
        info!("shutdown requested");
        on_signal.cancel();
    });

    Runner::new(transport, dispatcher)
        .with_backoff(config.relay.reconnect_backoff())
        .with_janitor(config.sessions.janitor_interval())
        .run(cancel)
        .await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use {super::*, clap::CommandFactory, serde_json::json};

    const CLIENT_ID: &str = "6f1b2c3d-4e5f-4a6b-8c7d-9e0f1a2b3c4d";

    fn write_keystore(dir: &Path) -> PathBuf {
        let path = dir.join("keystore.json");
        std::fs::write(
            &path,
            json!({
                "client_id": CLIENT_ID,
                "session_id": "a1b2c3d4-0000-4000-8000-000000000001",
                "private_key": "secret-key"
            })
            .to_string(),
        )
        .unwrap();
        path
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn missing_default_keystore_falls_back_to_local_id() {
        let dir = tempfile::tempdir().unwrap();
        let id = resolve_client_id(&dir.path().join("keystore.json"), false, None).unwrap();
        assert_eq!(id, LOCAL_CLIENT_ID);
    }

    #[test]
    fn missing_explicit_keystore_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        assert!(resolve_client_id(&dir.path().join("nope.json"), true, None).is_err());
    }

    #[test]
    fn keystore_requires_non_empty_pin() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_keystore(dir.path());

        assert!(resolve_client_id(&path, false, None).is_err());
        let blank = Secret::new("  ".to_string());
        assert!(resolve_client_id(&path, false, Some(&blank)).is_err());

        let pin = Secret::new("123456".to_string());
        assert_eq!(resolve_client_id(&path, false, Some(&pin)).unwrap(), CLIENT_ID);
    }

    #[test]
    fn malformed_keystore_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keystore.json");
        std::fs::write(&path, "{not json").unwrap();
        let pin = Secret::new("123456".to_string());
        assert!(resolve_client_id(&path, true, Some(&pin)).is_err());
    }
}
