//! Seam between the HTTP handlers and the browser driver.

use std::time::Duration;

use async_trait::async_trait;
use lumod_driver::{AskError, ChatSurface, Driver};

/// What the HTTP layer needs from the prompt backend.
///
/// The real backend is [`Driver`]; route tests substitute stubs so they run
/// without a browser.
#[async_trait]
pub trait PromptService: Send + Sync {
    async fn ask(
        &self,
        prompt: &str,
        web_search: bool,
        timeout: Duration,
    ) -> Result<String, AskError>;
}

#[async_trait]
impl<S: ChatSurface> PromptService for Driver<S> {
    async fn ask(
        &self,
        prompt: &str,
        web_search: bool,
        timeout: Duration,
    ) -> Result<String, AskError> {
        Driver::ask(self, prompt, web_search, timeout).await
    }
}
