use std::{
    path::{Path, PathBuf},
    sync::RwLock,
};

use tracing::{debug, warn};

use crate::{env_subst::substitute_env, schema::LumodConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["lumod.toml", "lumod.yaml", "lumod.yml", "lumod.json"];

/// Process-wide directory overrides, set once at startup from CLI flags.
static CONFIG_DIR_OVERRIDE: RwLock<Option<PathBuf>> = RwLock::new(None);
static DATA_DIR_OVERRIDE: RwLock<Option<PathBuf>> = RwLock::new(None);

/// Override the config directory (normally `~/.config/lumod/`).
pub fn set_config_dir(dir: PathBuf) {
    if let Ok(mut guard) = CONFIG_DIR_OVERRIDE.write() {
        *guard = Some(dir);
    }
}

/// Override the data directory used for the auth state file.
pub fn set_data_dir(dir: PathBuf) {
    if let Ok(mut guard) = DATA_DIR_OVERRIDE.write() {
        *guard = Some(dir);
    }
}

fn override_of(lock: &RwLock<Option<PathBuf>>) -> Option<PathBuf> {
    lock.read().ok().and_then(|guard| guard.clone())
}

/// Returns the user-global config directory (`~/.config/lumod/` unless
/// overridden).
pub fn config_dir() -> Option<PathBuf> {
    if let Some(dir) = override_of(&CONFIG_DIR_OVERRIDE) {
        return Some(dir);
    }
    directories::ProjectDirs::from("", "", "lumod").map(|d| d.config_dir().to_path_buf())
}

/// Returns the data directory (platform data dir unless overridden; falls
/// back to the working directory when the platform offers none).
pub fn data_dir() -> PathBuf {
    if let Some(dir) = override_of(&DATA_DIR_OVERRIDE) {
        return dir;
    }
    directories::ProjectDirs::from("", "", "lumod")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<LumodConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./lumod.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/lumod/lumod.{toml,yaml,yml,json}` (user-global)
///
/// Returns `LumodConfig::default()` if no config file is found.
pub fn discover_and_load() -> LumodConfig {
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
    LumodConfig::default()
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

    // User-global
    if let Some(dir) = config_dir() {
        for name in CONFIG_FILENAMES {
            let p = dir.join(name);
            if p.exists() {
                return Some(p);
            }
        }
    }

    None
}

/// Returns the path of an existing config file, or the default TOML path.
pub fn find_or_default_config_path() -> PathBuf {
    if let Some(path) = find_config_file() {
        return path;
    }
    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lumod.toml")
}

/// Serialize `config` to TOML and write it to the user-global config path.
///
/// Creates parent directories if needed. Returns the path written to.
pub fn save_config(config: &LumodConfig) -> anyhow::Result<PathBuf> {
    let path = find_or_default_config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str =
        toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("serialize config: {e}"))?;
    std::fs::write(&path, toml_str)?;
    debug!(path = %path.display(), "saved config");
    Ok(path)
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<LumodConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn loads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lumod.toml");
        std::fs::write(&path, "[server]\nport = 4321\n").unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.server.port, 4321);
    }

    #[test]
    fn loads_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lumod.yaml");
        std::fs::write(&path, "chat:\n  placeholder: \"...\"\n").unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.chat.placeholder, "...");
        // Untouched sections keep their defaults.
        assert_eq!(cfg.server.port, 8080);
    }

    #[test]
    fn loads_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lumod.json");
        std::fs::write(&path, r#"{"browser": {"headless": false}}"#).unwrap();

        let cfg = load_config(&path).unwrap();
        assert!(!cfg.browser.headless);
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lumod.ini");
        std::fs::write(&path, "port=1\n").unwrap();

        assert!(load_config(&path).is_err());
    }

    #[test]
    fn substitutes_env_in_string_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lumod.toml");
        std::fs::write(
            &path,
            "[auth]\nstate_path = \"${LUMOD_MISSING_VAR_FOR_TEST}/auth.json\"\n",
        )
        .unwrap();

        // Unresolved placeholders are left as-is rather than erroring.
        let cfg = load_config(&path).unwrap();
        assert_eq!(
            cfg.auth.state_path,
            Some(PathBuf::from("${LUMOD_MISSING_VAR_FOR_TEST}/auth.json"))
        );
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lumod.toml");
        std::fs::write(&path, "this is not toml [[[").unwrap();

        assert!(load_config(&path).is_err());
    }

    #[test]
    fn save_config_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        set_config_dir(dir.path().to_path_buf());

        let mut cfg = LumodConfig::default();
        cfg.server.port = 4545;

        let path = save_config(&cfg).unwrap();
        assert_eq!(path, dir.path().join("lumod.toml"));

        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded.server.port, 4545);
    }
}
