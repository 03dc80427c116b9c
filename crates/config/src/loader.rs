use std::path::{Path, PathBuf};

use {
    secrecy::{ExposeSecret, Secret},
    tracing::{debug, warn},
};

use crate::{env_subst::substitute_env, schema::CitawatchConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "citawatch.toml",
    "citawatch.yaml",
    "citawatch.yml",
    "citawatch.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<CitawatchConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    let mut cfg = parse_config(&raw, path)?;
    apply_env_fallbacks(&mut cfg);
    Ok(cfg)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./citawatch.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/citawatch/citawatch.{toml,yaml,yml,json}` (user-global)
///
/// Returns `CitawatchConfig::default()` (plus env fallbacks) if no config
/// file is found.
pub fn discover_and_load() -> CitawatchConfig {
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
    let mut cfg = CitawatchConfig::default();
    apply_env_fallbacks(&mut cfg);
    cfg
}

/// Find the first config file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    // Project-local
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    // User-global: ~/.config/citawatch/
    if let Some(dirs) = directories::ProjectDirs::from("", "", "citawatch") {
        let config_dir = dirs.config_dir();
        for name in CONFIG_FILENAMES {
            let p = config_dir.join(name);
            if p.exists() {
                return Some(p);
            }
        }
    }

    None
}

/// Returns the user-global config directory (`~/.config/citawatch/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "citawatch").map(|d| d.config_dir().to_path_buf())
}

/// Fill empty Telegram credentials from the environment.
///
/// `TELEGRAM_BOT_TOKEN` and `TELEGRAM_CHAT_ID` are the variables the
/// watcher has always read; a config file value takes precedence.
fn apply_env_fallbacks(cfg: &mut CitawatchConfig) {
    if cfg.telegram.token.expose_secret().is_empty()
        && let Ok(token) = std::env::var("TELEGRAM_BOT_TOKEN")
    {
        cfg.telegram.token = Secret::new(token);
    }
    if cfg.telegram.chat_id.is_empty()
        && let Ok(chat_id) = std::env::var("TELEGRAM_CHAT_ID")
    {
        cfg.telegram.chat_id = chat_id;
    }
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<CitawatchConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}
