//! Configuration loading and env substitution.
//!
//! Config files: `lumod.toml`, `lumod.yaml`, or `lumod.json`
//! Searched in `./` then `~/.config/lumod/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{
        config_dir, data_dir, discover_and_load, find_or_default_config_path, load_config,
        save_config, set_config_dir, set_data_dir,
    },
    schema::{AuthConfig, BrowserConfig, ChatConfig, LumodConfig, ServerConfig},
};
