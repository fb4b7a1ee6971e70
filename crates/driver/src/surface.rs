//! Abstraction over the chat page DOM.
//!
//! [`ChatSurface`] is the seam between prompt orchestration and the live
//! browser: submission and reply polling are written against this trait, the
//! CDP-backed implementation lives in [`crate::page`], and tests substitute a
//! scripted surface.

use async_trait::async_trait;
use chromiumoxide::error::CdpError;
use thiserror::Error;

/// Errors from interacting with the chat page DOM.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("element not found: {0}")]
    ElementNotFound(String),

    #[error("script evaluation failed: {0}")]
    JsEval(String),

    #[error("browser protocol error: {0}")]
    Cdp(String),

    #[error("script encoding failed: {0}")]
    Script(#[from] serde_json::Error),
}

impl From<CdpError> for SurfaceError {
    fn from(err: CdpError) -> Self {
        Self::Cdp(err.to_string())
    }
}

/// The operations prompt submission and reply polling need from the page.
#[async_trait]
pub trait ChatSurface: Send + Sync {
    /// Whether the web-search toggle is currently active. `None` when the
    /// control is not present in the DOM.
    async fn web_search_state(&self) -> Result<Option<bool>, SurfaceError>;

    /// Click the web-search toggle once.
    async fn toggle_web_search(&self) -> Result<(), SurfaceError>;

    /// Clear any leftover text from the prompt input.
    async fn clear_input(&self) -> Result<(), SurfaceError>;

    /// Type the prompt into the input as the page's editor expects it.
    async fn type_prompt(&self, text: &str) -> Result<(), SurfaceError>;

    /// Send the typed prompt.
    async fn submit(&self) -> Result<(), SurfaceError>;

    /// Text of the newest assistant message, or `None` before the first
    /// one appears.
    async fn last_reply(&self) -> Result<Option<String>, SurfaceError>;
}
