//! Driver error types.

use std::time::Duration;

use thiserror::Error;

/// Fatal startup errors. Any of these means the process must not begin
/// serving; there is no retry policy at this layer.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("browser not available: {0}")]
    BrowserNotAvailable(String),

    #[error("browser launch failed: {0}")]
    LaunchFailed(String),

    #[error("page setup failed: {0}")]
    PageSetup(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("auth state load failed: {0}")]
    AuthLoad(String),

    #[error("auth state could not be applied: {0}")]
    AuthApply(String),

    #[error("auth state save failed: {0}")]
    AuthSave(String),

    #[error("sign-in failed: {0}")]
    Login(String),

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("chat input did not become ready within {0:?}")]
    NotReady(Duration),
}

/// Per-request errors. The session survives all of these; retry policy, if
/// any, belongs to the caller.
#[derive(Debug, Error)]
pub enum AskError {
    /// Another prompt is already in flight. Reported immediately, never
    /// queued.
    #[error("another prompt is already in flight")]
    Busy,

    /// The prompt could not be delivered to the page. Carries the step that
    /// failed.
    #[error("prompt submission failed: {0}")]
    Submission(String),

    /// The reply did not stabilize before the caller's deadline. The prompt
    /// stays submitted; the remote side keeps generating regardless.
    #[error("timeout waiting for answer")]
    Timeout,
}
