//! Drives the Lumo chat UI (lumo.proton.me) through one persistent
//! Chromium session.
//!
//! The crate owns the whole lifecycle: find a browser, launch it, restore
//! saved auth state (or capture it once via an interactive login), then
//! answer prompts one at a time. A prompt is typed into the real page,
//! submitted, and its streamed reply is polled until the text holds still.

pub mod auth;
pub mod config;
pub mod detect;
pub mod error;
pub mod page;
pub mod session;
pub mod surface;

mod guard;
mod prompt;
mod stabilize;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
pub(crate) mod testing;

pub use auth::{AuthState, AuthStore, Cookie};
pub use config::{DriverConfig, Selectors};
pub use error::{AskError, BootstrapError};
pub use page::LumoPage;
pub use session::{BootstrapMode, Session};
pub use surface::{ChatSurface, SurfaceError};

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};

use crate::guard::SingleFlight;

/// One live chat session plus the admission control in front of it.
///
/// At most one prompt is in flight at a time; concurrent callers get
/// [`AskError::Busy`] immediately instead of queueing.
pub struct Driver<S: ChatSurface = LumoPage> {
    slot: SingleFlight<Session<S>>,
    config: DriverConfig,
}

impl Driver {
    /// Bootstrap a session against the real browser.
    pub async fn bootstrap(
        config: DriverConfig,
        mode: BootstrapMode,
    ) -> Result<Self, BootstrapError> {
        let store = AuthStore::new(config.auth_state_path.clone());
        let session = Session::bootstrap(&config, &store, mode).await?;
        Ok(Self {
            slot: SingleFlight::new(session),
            config,
        })
    }
}

impl<S: ChatSurface> Driver<S> {
    /// Submit `prompt` and wait for the reply to stabilize.
    ///
    /// The deadline covers the whole operation; when it passes, the page is
    /// left as-is and the slot frees up for the next caller.
    pub async fn ask(
        &self,
        prompt: &str,
        web_search: bool,
        timeout: Duration,
    ) -> Result<String, AskError> {
        let session = self.slot.try_acquire().ok_or(AskError::Busy)?;
        // Timeouts too large for instant arithmetic clamp to a ~30 year
        // horizon instead of panicking.
        let now = Instant::now();
        let deadline = now
            .checked_add(timeout)
            .unwrap_or_else(|| now + Duration::from_secs(86_400 * 365 * 30));

        debug!(chars = prompt.len(), web_search, ?timeout, "prompt accepted");
        prompt::submit_prompt(session.surface(), prompt, web_search).await?;
        let answer = stabilize::wait_for_reply(session.surface(), &self.config, deadline).await?;

        info!(chars = answer.len(), "answer stabilized");
        Ok(answer)
    }

    /// Close the browser session. Waits for an in-flight prompt to finish
    /// rather than cutting it off.
    pub async fn shutdown(&self) {
        let mut session = self.slot.acquire().await;
        session.close().await;
    }

    #[cfg(test)]
    fn scripted(surface: S, config: DriverConfig) -> Self {
        Self {
            slot: SingleFlight::new(Session::scripted(surface)),
            config,
        }
    }
}
