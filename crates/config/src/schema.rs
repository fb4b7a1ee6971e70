//! Config schema types (server, browser, chat UI, auth state).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LumodConfig {
    pub server: ServerConfig,
    pub browser: BrowserConfig,
    pub chat: ChatConfig,
    pub auth: AuthConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to. Defaults to "127.0.0.1".
    pub bind: String,
    /// Port to listen on. Defaults to 8080.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 8080,
        }
    }
}

/// Browser engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run the browser without a visible window. Defaults to true.
    /// The interactive login flow overrides this; a human cannot sign in
    /// through a window that does not exist.
    pub headless: bool,
    /// Explicit path to a Chrome/Chromium binary. When unset, detection
    /// falls back to the `CHROME` env var, platform install locations, and
    /// `PATH`.
    pub chrome_path: Option<String>,
    /// Extra arguments appended to the browser command line.
    pub extra_args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_path: None,
            extra_args: Vec::new(),
        }
    }
}

/// Chat UI configuration: where the app lives and how its elements are found.
///
/// The defaults target the live Lumo UI. They are tunables, not correctness
/// constants: a UI redesign means updating selectors here, not code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Operational UI to drive prompts through.
    pub app_url: String,
    /// Login surface for the one-time interactive sign-in.
    pub login_url: String,
    /// Selector of the prompt input element.
    pub input_selector: String,
    /// Selector matching assistant reply elements; the last match is read.
    pub reply_selector: String,
    /// Selector of the web-search toggle button.
    pub web_search_toggle_selector: String,
    /// Class the toggle carries while web search is enabled.
    pub toggle_active_class: String,
    /// Transient text the UI renders while a reply is pending.
    pub placeholder: String,
    /// Pause between reply samples while nothing real has rendered yet.
    pub poll_interval_ms: u64,
    /// Pause between two samples that must match for a reply to count as
    /// finished.
    pub settle_interval_ms: u64,
    /// How long bootstrap waits for the prompt input to become ready.
    pub ready_timeout_ms: u64,
    /// How long the interactive login flow waits for the human to finish.
    pub login_timeout_ms: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            app_url: "https://lumo.proton.me/".into(),
            login_url: "https://lumo.proton.me/login".into(),
            input_selector: "textarea[data-testid='chat-input']".into(),
            reply_selector: "div[data-testid='assistant-message']".into(),
            web_search_toggle_selector: "button[data-testid='web-search-toggle']".into(),
            toggle_active_class: "is-active".into(),
            placeholder: "\u{2026}".into(),
            poll_interval_ms: 200,
            settle_interval_ms: 300,
            ready_timeout_ms: 30_000,
            login_timeout_ms: 300_000,
        }
    }
}

/// Auth state persistence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Path of the saved auth state file. Defaults to `auth.json` in the
    /// data directory.
    pub state_path: Option<PathBuf>,
}

impl AuthConfig {
    /// Resolve the auth state path, honoring the data-dir override.
    pub fn resolved_state_path(&self) -> PathBuf {
        self.state_path
            .clone()
            .unwrap_or_else(|| crate::loader::data_dir().join("auth.json"))
    }
}
