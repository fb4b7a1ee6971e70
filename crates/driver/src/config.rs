//! Driver-side configuration resolved from the config schema.

use std::{path::PathBuf, time::Duration};

/// Everything the driver needs to launch, authenticate, and poll one session.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Operational UI URL.
    pub app_url: String,
    /// Login surface URL for the interactive sign-in mode.
    pub login_url: String,
    pub selectors: Selectors,
    /// Transient text the UI renders while a reply is pending.
    pub placeholder: String,
    pub poll_interval: Duration,
    pub settle_interval: Duration,
    pub ready_timeout: Duration,
    pub login_timeout: Duration,
    pub headless: bool,
    pub chrome_path: Option<String>,
    pub extra_args: Vec<String>,
    /// Where the captured auth state lives on disk.
    pub auth_state_path: PathBuf,
}

/// How the chat UI's elements are located.
#[derive(Debug, Clone)]
pub struct Selectors {
    pub chat_input: String,
    pub assistant_message: String,
    pub web_search_toggle: String,
    /// Class the toggle carries while web search is enabled.
    pub toggle_active_class: String,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self::from(&lumod_config::LumodConfig::default())
    }
}

impl From<&lumod_config::LumodConfig> for DriverConfig {
    fn from(cfg: &lumod_config::LumodConfig) -> Self {
        Self {
            app_url: cfg.chat.app_url.clone(),
            login_url: cfg.chat.login_url.clone(),
            selectors: Selectors {
                chat_input: cfg.chat.input_selector.clone(),
                assistant_message: cfg.chat.reply_selector.clone(),
                web_search_toggle: cfg.chat.web_search_toggle_selector.clone(),
                toggle_active_class: cfg.chat.toggle_active_class.clone(),
            },
            placeholder: cfg.chat.placeholder.clone(),
            poll_interval: Duration::from_millis(cfg.chat.poll_interval_ms),
            settle_interval: Duration::from_millis(cfg.chat.settle_interval_ms),
            ready_timeout: Duration::from_millis(cfg.chat.ready_timeout_ms),
            login_timeout: Duration::from_millis(cfg.chat.login_timeout_ms),
            headless: cfg.browser.headless,
            chrome_path: cfg.browser.chrome_path.clone(),
            extra_args: cfg.browser.extra_args.clone(),
            auth_state_path: cfg.auth.resolved_state_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_from_schema() {
        let mut schema = lumod_config::LumodConfig::default();
        schema.chat.poll_interval_ms = 50;
        schema.browser.headless = false;
        schema.auth.state_path = Some(PathBuf::from("/tmp/state.json"));

        let cfg = DriverConfig::from(&schema);
        assert_eq!(cfg.poll_interval, Duration::from_millis(50));
        assert!(!cfg.headless);
        assert_eq!(cfg.auth_state_path, PathBuf::from("/tmp/state.json"));
        assert_eq!(cfg.selectors.toggle_active_class, "is-active");
    }

    #[test]
    fn default_carries_lumo_tunables() {
        let cfg = DriverConfig::default();
        assert_eq!(cfg.poll_interval, Duration::from_millis(200));
        assert_eq!(cfg.settle_interval, Duration::from_millis(300));
        assert_eq!(cfg.ready_timeout, Duration::from_secs(30));
        assert_eq!(cfg.placeholder, "…");
    }
}
