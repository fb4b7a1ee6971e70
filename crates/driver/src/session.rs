//! Browser session lifecycle.
//!
//! A session is one Chromium process, one CDP event task, and one chat page.
//! Bootstrap runs launch, auth establishment, and a readiness wait as a
//! single fallible sequence; any failure tears down whatever was already up
//! before the error is returned.

use std::collections::HashMap;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{self, CookieParam, CookieSameSite};
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

use crate::auth::{AuthState, AuthStore, Cookie};
use crate::config::DriverConfig;
use crate::detect::detect_browser;
use crate::error::BootstrapError;
use crate::page::LumoPage;
use crate::surface::ChatSurface;

/// How bootstrap obtains an authenticated page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapMode {
    /// Inject the saved auth state and go straight to the app. Fails if no
    /// state was ever saved; never opens a login page.
    Restore,
    /// Open the sign-in page in a visible window, wait for a human to
    /// finish, then capture and save the resulting auth state.
    InteractiveLogin,
}

struct Engine {
    browser: Browser,
    events: JoinHandle<()>,
    page: Page,
}

/// A live, authenticated chat session.
pub struct Session<S = LumoPage> {
    engine: Option<Engine>,
    surface: S,
}

impl Session {
    /// Launch the browser, establish auth according to `mode`, and wait for
    /// the chat input to become interactive.
    pub async fn bootstrap(
        config: &DriverConfig,
        store: &AuthStore,
        mode: BootstrapMode,
    ) -> Result<Self, BootstrapError> {
        Url::parse(&config.app_url).map_err(|err| {
            BootstrapError::InvalidConfig(format!("app_url {:?}: {err}", config.app_url))
        })?;

        let detection = detect_browser(config.chrome_path.as_deref());
        let Some(executable) = detection.path else {
            return Err(BootstrapError::BrowserNotAvailable(detection.install_hint));
        };

        // An interactive login needs a window a human can see.
        let headless = config.headless && mode != BootstrapMode::InteractiveLogin;
        if config.headless && !headless {
            info!("interactive login overrides headless mode");
        }

        let mut builder = BrowserConfig::builder().chrome_executable(&executable);
        if !headless {
            builder = builder.with_head();
        }
        for arg in &config.extra_args {
            builder = builder.arg(arg);
        }
        builder = builder
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-software-rasterizer")
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox");

        let browser_config = builder.build().map_err(BootstrapError::LaunchFailed)?;

        info!(executable = %executable.display(), headless, "launching browser");
        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|err| BootstrapError::LaunchFailed(err.to_string()))?;

        let events = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    debug!(error = %err, "browser event handler stopped");
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(err) => {
                teardown(browser, events, None).await;
                return Err(BootstrapError::PageSetup(err.to_string()));
            },
        };

        let surface = LumoPage::new(page.clone(), config.selectors.clone());
        let mut session = Session {
            engine: Some(Engine { browser, events, page }),
            surface,
        };

        if let Err(err) = session.establish(config, store, mode).await {
            session.close().await;
            return Err(err);
        }

        info!("chat session ready");
        Ok(session)
    }

    async fn establish(
        &mut self,
        config: &DriverConfig,
        store: &AuthStore,
        mode: BootstrapMode,
    ) -> Result<(), BootstrapError> {
        let Some(engine) = self.engine.as_ref() else {
            return Ok(());
        };

        let mut flow = EngineLoginFlow {
            browser: &engine.browser,
            page: &self.surface,
            config,
        };
        establish_auth(&mut flow, store, mode).await?;

        if !self
            .surface
            .wait_ready(config.ready_timeout, config.poll_interval)
            .await
        {
            return Err(BootstrapError::NotReady(config.ready_timeout));
        }
        Ok(())
    }
}

impl<S: ChatSurface> Session<S> {
    pub(crate) fn surface(&self) -> &S {
        &self.surface
    }

    #[cfg(test)]
    pub(crate) fn scripted(surface: S) -> Self {
        Self {
            engine: None,
            surface,
        }
    }

    /// Tear the session down in order: page, browser, process, event task.
    /// Failures are logged and never propagated; teardown always completes.
    pub async fn close(&mut self) {
        let Some(engine) = self.engine.take() else {
            return;
        };
        teardown(engine.browser, engine.events, Some(engine.page)).await;
    }
}

async fn teardown(mut browser: Browser, events: JoinHandle<()>, page: Option<Page>) {
    if let Some(page) = page {
        if let Err(err) = page.close().await {
            debug!(error = %err, "page close failed");
        }
    }
    if let Err(err) = browser.close().await {
        warn!(error = %err, "browser close failed");
    }
    if let Err(err) = browser.wait().await {
        debug!(error = %err, "waiting for browser exit failed");
    }
    events.abort();
    info!("browser session closed");
}

/// The two ways a page becomes authenticated. Split from [`Session`] so the
/// mode selection logic is testable without a browser.
#[async_trait]
pub(crate) trait LoginFlow {
    async fn restore(&mut self, state: &AuthState) -> Result<(), BootstrapError>;
    async fn interactive_login(&mut self) -> Result<AuthState, BootstrapError>;
}

pub(crate) async fn establish_auth<F>(
    flow: &mut F,
    store: &AuthStore,
    mode: BootstrapMode,
) -> Result<(), BootstrapError>
where
    F: LoginFlow + Send,
{
    match mode {
        BootstrapMode::Restore => {
            let state = store
                .load()
                .map_err(|err| BootstrapError::AuthLoad(err.to_string()))?;
            match state {
                Some(state) => {
                    debug!(
                        cookies = state.cookies.len(),
                        local_storage = state.local_storage.len(),
                        "restoring saved auth state"
                    );
                    flow.restore(&state).await
                },
                None => Err(BootstrapError::Login(
                    "no saved auth state; run the login command once to create it".to_owned(),
                )),
            }
        },
        BootstrapMode::InteractiveLogin => {
            let state = flow.interactive_login().await?;
            store
                .save(&state)
                .map_err(|err| BootstrapError::AuthSave(err.to_string()))?;
            info!(path = %store.path().display(), "auth state saved");
            Ok(())
        },
    }
}

struct EngineLoginFlow<'a> {
    browser: &'a Browser,
    page: &'a LumoPage,
    config: &'a DriverConfig,
}

#[async_trait]
impl LoginFlow for EngineLoginFlow<'_> {
    async fn restore(&mut self, state: &AuthState) -> Result<(), BootstrapError> {
        let params = cookie_params(&state.cookies, &self.config.app_url)
            .map_err(BootstrapError::AuthApply)?;
        if !params.is_empty() {
            self.browser
                .set_cookies(params)
                .await
                .map_err(|err| BootstrapError::AuthApply(err.to_string()))?;
        }

        self.page
            .goto(&self.config.app_url)
            .await
            .map_err(|err| navigation(&self.config.app_url, err))?;

        // localStorage only exists once the app origin is loaded, so it is
        // injected after the first navigation and picked up on reload.
        if !state.local_storage.is_empty() {
            self.page
                .apply_local_storage(&state.local_storage)
                .await
                .map_err(|err| BootstrapError::AuthApply(err.to_string()))?;
            self.page
                .reload()
                .await
                .map_err(|err| navigation(&self.config.app_url, err))?;
        }
        Ok(())
    }

    async fn interactive_login(&mut self) -> Result<AuthState, BootstrapError> {
        self.page
            .goto(&self.config.login_url)
            .await
            .map_err(|err| navigation(&self.config.login_url, err))?;

        info!(
            timeout = ?self.config.login_timeout,
            "waiting for sign-in to finish in the browser window"
        );
        let ready = self
            .page
            .wait_ready(self.config.login_timeout, self.config.poll_interval)
            .await;
        if !ready {
            return Err(BootstrapError::Login(format!(
                "sign-in did not complete within {:?}",
                self.config.login_timeout
            )));
        }

        let cookies = self
            .browser
            .get_cookies()
            .await
            .map_err(|err| BootstrapError::Login(format!("reading cookies: {err}")))?;
        let local_storage = self
            .page
            .capture_local_storage()
            .await
            .map_err(|err| BootstrapError::Login(format!("reading local storage: {err}")))?;

        Ok(auth_state_from(cookies, local_storage))
    }
}

fn navigation(url: &str, err: crate::surface::SurfaceError) -> BootstrapError {
    BootstrapError::Navigation {
        url: url.to_owned(),
        reason: err.to_string(),
    }
}

/// Map saved cookies to CDP params. Cookies saved without a domain are
/// scoped to the app URL instead.
fn cookie_params(cookies: &[Cookie], fallback_url: &str) -> Result<Vec<CookieParam>, String> {
    let mut params = Vec::with_capacity(cookies.len());
    for cookie in cookies {
        let mut builder = CookieParam::builder()
            .name(&cookie.name)
            .value(&cookie.value)
            .path(&cookie.path)
            .secure(cookie.secure)
            .http_only(cookie.http_only);

        if cookie.domain.is_empty() {
            builder = builder.url(fallback_url);
        } else {
            builder = builder.domain(&cookie.domain);
        }
        if let Some(expires) = cookie.expires {
            builder = builder.expires(network::TimeSinceEpoch::new(expires));
        }
        if let Some(same_site) = same_site_param(cookie.same_site.as_deref()) {
            builder = builder.same_site(same_site);
        }

        let param = builder
            .build()
            .map_err(|err| format!("cookie {:?}: {err}", cookie.name))?;
        params.push(param);
    }
    Ok(params)
}

fn same_site_param(value: Option<&str>) -> Option<CookieSameSite> {
    match value? {
        "Strict" => Some(CookieSameSite::Strict),
        "Lax" => Some(CookieSameSite::Lax),
        "None" => Some(CookieSameSite::None),
        other => {
            debug!(value = other, "unrecognized SameSite value, dropping");
            None
        },
    }
}

/// Convert what the browser reports into the saved blob. A negative expiry
/// marks a session cookie and is stored as "no expiry".
fn auth_state_from(
    cookies: Vec<network::Cookie>,
    local_storage: HashMap<String, String>,
) -> AuthState {
    let cookies = cookies
        .into_iter()
        .map(|c| Cookie {
            name: c.name,
            value: c.value,
            domain: c.domain,
            path: c.path,
            expires: (c.expires >= 0.0).then_some(c.expires),
            http_only: c.http_only,
            secure: c.secure,
            same_site: c.same_site.map(|s| format!("{s:?}")),
        })
        .collect();
    AuthState {
        cookies,
        local_storage,
    }
}
