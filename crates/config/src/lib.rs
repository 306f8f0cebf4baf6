//! Configuration loading and env substitution.
//!
//! Config files: `redwind.toml`, `redwind.yaml`, or `redwind.json`
//! Searched in `./` then `~/.config/redwind/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{
        apply_env_overrides, clear_config_dir, config_dir, data_dir, discover_and_load,
        load_config, set_config_dir,
    },
    schema::{
        AuthConfig, DatabaseConfig, PluginsConfig, RedwindConfig, ServerConfig, SiteConfig,
        TwitterConfig,
    },
};
