//! CDP-backed implementation of [`ChatSurface`].
//!
//! All DOM access goes through small script evaluations against the live
//! page. Prompt text is typed with `execCommand('insertText')` rather than by
//! assigning `value`, so the page's own editor state stays in sync with what
//! it will actually send.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use tokio::time::Instant;
use tracing::trace;

use crate::config::Selectors;
use crate::surface::{ChatSurface, SurfaceError};

pub struct LumoPage {
    page: Page,
    selectors: Selectors,
}

impl LumoPage {
    pub(crate) fn new(page: Page, selectors: Selectors) -> Self {
        Self { page, selectors }
    }

    pub(crate) async fn goto(&self, url: &str) -> Result<(), SurfaceError> {
        self.page.goto(url).await?;
        let _ = self.page.wait_for_navigation().await;
        Ok(())
    }

    pub(crate) async fn reload(&self) -> Result<(), SurfaceError> {
        self.page.reload().await?;
        Ok(())
    }

    /// Poll until the chat input is present, enabled, and visibly laid out.
    ///
    /// Evaluation errors are retried rather than surfaced: login navigations
    /// tear down the execution context mid-probe.
    pub(crate) async fn wait_ready(&self, timeout: Duration, interval: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            match self.input_ready().await {
                Ok(true) => return true,
                Ok(false) => {},
                Err(err) => {
                    trace!(error = %err, "readiness probe failed, retrying");
                },
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            tokio::time::sleep(interval.min(deadline - now)).await;
        }
    }

    async fn input_ready(&self) -> Result<bool, SurfaceError> {
        let selector = serde_json::to_string(&self.selectors.chat_input)?;
        self.eval(format!(
            "(() => {{
                const el = document.querySelector({selector});
                if (!el || el.disabled) return false;
                const rect = el.getBoundingClientRect();
                return rect.width > 0 && rect.height > 0;
            }})()"
        ))
        .await
    }

    pub(crate) async fn capture_local_storage(
        &self,
    ) -> Result<HashMap<String, String>, SurfaceError> {
        self.eval(
            "(() => {
                const out = {};
                for (let i = 0; i < localStorage.length; i++) {
                    const key = localStorage.key(i);
                    out[key] = localStorage.getItem(key);
                }
                return out;
            })()"
            .to_owned(),
        )
        .await
    }

    pub(crate) async fn apply_local_storage(
        &self,
        entries: &HashMap<String, String>,
    ) -> Result<(), SurfaceError> {
        let entries = serde_json::to_string(entries)?;
        let _: bool = self
            .eval(format!(
                "(() => {{
                    const entries = {entries};
                    for (const [key, value] of Object.entries(entries)) {{
                        localStorage.setItem(key, value);
                    }}
                    return true;
                }})()"
            ))
            .await?;
        Ok(())
    }

    async fn eval<T: DeserializeOwned>(&self, js: String) -> Result<T, SurfaceError> {
        let result = self.page.evaluate(js).await?;
        result
            .into_value()
            .map_err(|err| SurfaceError::JsEval(err.to_string()))
    }

    async fn find(&self, selector: &str) -> Result<chromiumoxide::Element, SurfaceError> {
        self.page
            .find_element(selector)
            .await
            .map_err(|_| SurfaceError::ElementNotFound(selector.to_owned()))
    }
}

#[async_trait]
impl ChatSurface for LumoPage {
    async fn web_search_state(&self) -> Result<Option<bool>, SurfaceError> {
        let selector = serde_json::to_string(&self.selectors.web_search_toggle)?;
        let active = serde_json::to_string(&self.selectors.toggle_active_class)?;
        self.eval(format!(
            "(() => {{
                const el = document.querySelector({selector});
                return el ? el.className.indexOf({active}) !== -1 : null;
            }})()"
        ))
        .await
    }

    async fn toggle_web_search(&self) -> Result<(), SurfaceError> {
        self.find(&self.selectors.web_search_toggle).await?.click().await?;
        Ok(())
    }

    async fn clear_input(&self) -> Result<(), SurfaceError> {
        let selector = serde_json::to_string(&self.selectors.chat_input)?;
        let cleared: bool = self
            .eval(format!(
                "(() => {{
                    const el = document.querySelector({selector});
                    if (!el) return false;
                    el.focus();
                    if (el.select) {{ el.select(); }}
                    else {{ document.execCommand('selectAll', false, null); }}
                    document.execCommand('delete', false, null);
                    return true;
                }})()"
            ))
            .await?;
        if cleared {
            Ok(())
        } else {
            Err(SurfaceError::ElementNotFound(self.selectors.chat_input.clone()))
        }
    }

    async fn type_prompt(&self, text: &str) -> Result<(), SurfaceError> {
        let selector = serde_json::to_string(&self.selectors.chat_input)?;
        let text = serde_json::to_string(text)?;
        let typed: bool = self
            .eval(format!(
                "(() => {{
                    const el = document.querySelector({selector});
                    if (!el) return false;
                    el.focus();
                    document.execCommand('insertText', false, {text});
                    el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                    return true;
                }})()"
            ))
            .await?;
        if typed {
            Ok(())
        } else {
            Err(SurfaceError::ElementNotFound(self.selectors.chat_input.clone()))
        }
    }

    async fn submit(&self) -> Result<(), SurfaceError> {
        let input = self.find(&self.selectors.chat_input).await?;
        input.focus().await?.press_key("Enter").await?;
        Ok(())
    }

    async fn last_reply(&self) -> Result<Option<String>, SurfaceError> {
        let selector = serde_json::to_string(&self.selectors.assistant_message)?;
        self.eval(format!(
            "(() => {{
                const nodes = document.querySelectorAll({selector});
                if (!nodes.length) return null;
                return nodes[nodes.length - 1].innerText;
            }})()"
        ))
        .await
    }
}
