use std::{
    path::{Path, PathBuf},
    sync::RwLock,
};

use {
    secrecy::Secret,
    tracing::{debug, warn},
};

use crate::{env_subst::substitute_env, schema::RedwindConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "redwind.toml",
    "redwind.yaml",
    "redwind.yml",
    "redwind.json",
];

static CONFIG_DIR_OVERRIDE: RwLock<Option<PathBuf>> = RwLock::new(None);

/// Override the user-global config directory (CLI `--config-dir`).
pub fn set_config_dir(dir: PathBuf) {
    let mut guard = CONFIG_DIR_OVERRIDE
        .write()
        .unwrap_or_else(|e| e.into_inner());
    *guard = Some(dir);
}

pub fn clear_config_dir() {
    let mut guard = CONFIG_DIR_OVERRIDE
        .write()
        .unwrap_or_else(|e| e.into_inner());
    *guard = None;
}

/// Returns the user-global config directory.
///
/// Resolution order:
/// 1. programmatic override (`set_config_dir`)
/// 2. `~/.config/redwind`
pub fn config_dir() -> Option<PathBuf> {
    if let Some(dir) = CONFIG_DIR_OVERRIDE
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .clone()
    {
        return Some(dir);
    }
    directories::ProjectDirs::from("", "", "redwind").map(|d| d.config_dir().to_path_buf())
}

/// Returns the data directory (`~/.local/share/redwind/` or platform equivalent).
pub fn data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "redwind")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".redwind"))
}

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<RedwindConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./redwind.{toml,yaml,yml,json}` (project-local)
/// 2. `<config_dir>/redwind.{toml,yaml,yml,json}` (user-global)
///
/// Returns `RedwindConfig::default()` if no config file is found. Env
/// overrides are applied in every case.
pub fn discover_and_load() -> RedwindConfig {
    let mut config = if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
                RedwindConfig::default()
            },
        }
    } else {
        debug!("no config file found, using defaults");
        RedwindConfig::default()
    };
    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    config
}

/// Apply `REDWIND_*` overrides on top of a loaded config.
pub fn apply_env_overrides(config: &mut RedwindConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(key) = lookup("REDWIND_TWITTER_CONSUMER_KEY") {
        config.twitter.consumer_key = key;
    }
    if let Some(secret) = lookup("REDWIND_TWITTER_CONSUMER_SECRET") {
        config.twitter.consumer_secret = Some(Secret::new(secret));
    }
    if let Some(url) = lookup("REDWIND_SITE_URL") {
        config.site.url = url;
    }
}

/// Find the first config file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<RedwindConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}
