use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{Error, Result, env_subst::substitute_env, schema::RelaybotConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "relaybot.toml",
    "relaybot.yaml",
    "relaybot.yml",
    "relaybot.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<RelaybotConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let raw = substitute_env(&raw);
    let config = parse_config(&raw, path)?;
    config.validate()?;
    Ok(config)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./relaybot.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/relaybot/relaybot.{toml,yaml,yml,json}` (user-global)
///
/// Returns `RelaybotConfig::default()` if no config file is found or the one
/// found cannot be loaded.
pub fn discover_and_load() -> RelaybotConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    RelaybotConfig::default()
}

fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let config_dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| config_dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/relaybot/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "relaybot").map(|d| d.config_dir().to_path_buf())
}

fn parse_config(raw: &str, path: &Path) -> Result<RelaybotConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => Err(Error::UnsupportedFormat(ext.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use {super::*, std::io::Write};

    fn write_config(name: &str, body: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn loads_toml() {
        let (_dir, path) = write_config(
            "relaybot.toml",
            r#"
            keystore_path = "/etc/relaybot/keystore.json"

            [relay]
            reconnect_backoff_ms = 250
            "#,
        );
        let cfg = load_config(&path).unwrap();
        assert_eq!(
            cfg.keystore_path,
            PathBuf::from("/etc/relaybot/keystore.json")
        );
        assert_eq!(cfg.relay.reconnect_backoff_ms, 250);
    }

    #[test]
    fn loads_yaml() {
        let (_dir, path) = write_config("relaybot.yaml", "sessions:\n  ttl_secs: 5\n");
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.sessions.ttl_secs, 5);
    }

    #[test]
    fn loads_json() {
        let (_dir, path) = write_config(
            "relaybot.json",
            r#"{"endpoints": {"quote_url": "http://127.0.0.1:9000/q"}}"#,
        );
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.endpoints.quote_url, "http://127.0.0.1:9000/q");
    }

    #[test]
    fn substitutes_defaults_before_parsing() {
        let (_dir, path) = write_config(
            "relaybot.toml",
            "[http]\ntimeout_secs = ${RELAYBOT_UNSET_TIMEOUT_FOR_TEST:-7}\n",
        );
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.http.timeout_secs, 7);
    }

    #[test]
    fn rejects_unknown_extension() {
        let (_dir, path) = write_config("relaybot.ini", "x=1");
        assert!(matches!(
            load_config(&path),
            Err(Error::UnsupportedFormat(ext)) if ext == "ini"
        ));
    }

    #[test]
    fn rejects_invalid_values() {
        let (_dir, path) = write_config("relaybot.toml", "[http]\ntimeout_secs = 0\n");
        assert!(matches!(load_config(&path), Err(Error::Invalid { .. })));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_config(Path::new("/nonexistent/relaybot.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/relaybot.toml"));
    }
}
