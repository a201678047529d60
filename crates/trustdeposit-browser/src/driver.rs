use crate::launcher::{LaunchOptions, WINDOW_HEIGHT, WINDOW_WIDTH};
use crate::query::{exists_expression, handle_selector, locate_expression};
use crate::{ChromeFinder, Error, ProfileManager};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use std::future::Future;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use trustdeposit_core::{Launcher, PageDriver, Query};

type CoreResult<T> = trustdeposit_core::Result<T>;

/// Interval between query attempts while waiting for an element
pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

const CLEAR_VALUE_JS: &str = "function() { \
     this.value = ''; \
     this.dispatchEvent(new Event('input', { bubbles: true })); \
     }";

const IS_ENABLED_JS: &str =
    "function() { return !this.disabled && this.getAttribute('aria-disabled') !== 'true'; }";

fn cdp(err: chromiumoxide::error::CdpError) -> trustdeposit_core::Error {
    Error::from(err).into()
}

/// Starts Chrome through the DevTools protocol
pub struct CdpLauncher {
    options: LaunchOptions,
}

impl CdpLauncher {
    pub fn new(options: LaunchOptions) -> Self {
        Self { options }
    }

    async fn start(&self) -> crate::Result<CdpDriver> {
        let chrome_path = ChromeFinder::new(self.options.chrome_path.clone()).find()?;
        tracing::info!("Using Chrome at {}", chrome_path.display());

        let profile = match &self.options.profile {
            Some(name) => ProfileManager::named(name)?,
            None => ProfileManager::temporary()?,
        };
        tracing::debug!("Chrome profile: {}", profile.path().display());

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .user_data_dir(profile.path())
            .window_size(WINDOW_WIDTH, WINDOW_HEIGHT)
            .viewport(None)
            .args(self.options.launch_args());
        if !self.options.headless {
            builder = builder.with_head();
        }
        let config = builder
            .build()
            .map_err(|e| Error::Browser(format!("Failed to configure browser: {}", e)))?;

        let (browser, mut handler) = Browser::launch(config).await?;

        // The handler must be polled for any page command to complete
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("CDP handler event error (continuing): {}", e);
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler_task.abort();
                return Err(e.into());
            }
        };

        Ok(CdpDriver {
            browser: Some(browser),
            page,
            handler_task,
            _profile: profile,
            next_token: AtomicU64::new(0),
        })
    }
}

#[async_trait]
impl Launcher for CdpLauncher {
    type Driver = CdpDriver;

    async fn launch(&self) -> CoreResult<CdpDriver> {
        Ok(self.start().await?)
    }
}

/// One Chrome instance with a single tab
pub struct CdpDriver {
    browser: Option<Browser>,
    page: Page,
    handler_task: JoinHandle<()>,
    // Removed after the browser has exited
    _profile: ProfileManager,
    next_token: AtomicU64,
}

impl CdpDriver {
    fn token(&self) -> String {
        format!("td-{}", self.next_token.fetch_add(1, Ordering::Relaxed))
    }

    /// Poll the locate script until it tags a match, then resolve the tag
    async fn locate(
        &self,
        query: &Query,
        timeout: Duration,
        allow_disabled: bool,
    ) -> CoreResult<Option<Element>> {
        let token = self.token();
        let expression = locate_expression(query, &token, allow_disabled)?;

        let tagged = poll_until(timeout, || self.eval_bool(expression.clone())).await?;
        if !tagged {
            return Ok(None);
        }

        let element = self
            .page
            .find_element(handle_selector(&token))
            .await
            .map_err(cdp)?;
        Ok(Some(element))
    }

    async fn eval_bool(&self, expression: String) -> CoreResult<bool> {
        let result = self.page.evaluate(expression).await.map_err(cdp)?;
        result
            .into_value::<bool>()
            .map_err(|e| Error::Cdp(format!("Unexpected script result: {}", e)).into())
    }
}

/// Retry `check` every [`POLL_INTERVAL`] until it is true or `timeout` passes.
/// Always checks at least once.
async fn poll_until<F, Fut>(timeout: Duration, mut check: F) -> CoreResult<bool>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = CoreResult<bool>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if check().await? {
            return Ok(true);
        }
        if Instant::now() >= deadline {
            return Ok(false);
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

#[async_trait]
impl PageDriver for CdpDriver {
    type Handle = Element;

    async fn goto(&self, url: &str, timeout: Duration) -> CoreResult<()> {
        tracing::debug!("Navigating to {}", url);
        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Ok(result) => result.map(|_| ()).map_err(cdp),
            Err(_) => Err(trustdeposit_core::Error::Navigation(format!(
                "timed out after {}s loading {}",
                timeout.as_secs(),
                url
            ))),
        }
    }

    async fn current_url(&self) -> CoreResult<String> {
        Ok(self.page.url().await.map_err(cdp)?.unwrap_or_default())
    }

    async fn find(&self, query: &Query, timeout: Duration) -> CoreResult<Option<Element>> {
        self.locate(query, timeout, false).await
    }

    async fn find_visible(&self, query: &Query, timeout: Duration) -> CoreResult<Option<Element>> {
        self.locate(query, timeout, true).await
    }

    async fn click(&self, handle: &Element) -> CoreResult<()> {
        handle.click().await.map_err(cdp)?;
        Ok(())
    }

    async fn fill(&self, handle: &Element, text: &str) -> CoreResult<()> {
        handle.click().await.map_err(cdp)?;
        handle.call_js_fn(CLEAR_VALUE_JS, false).await.map_err(cdp)?;
        handle.type_str(text).await.map_err(cdp)?;
        Ok(())
    }

    async fn press(&self, handle: &Element, key: &str) -> CoreResult<()> {
        handle.press_key(key).await.map_err(cdp)?;
        Ok(())
    }

    async fn is_enabled(&self, handle: &Element) -> CoreResult<bool> {
        let returns = handle.call_js_fn(IS_ENABLED_JS, false).await.map_err(cdp)?;
        Ok(returns
            .result
            .value
            .and_then(|v| v.as_bool())
            .unwrap_or(false))
    }

    async fn wait_for_url(&self, fragment: &str, timeout: Duration) -> CoreResult<bool> {
        poll_until(timeout, || async {
            let url = self.current_url().await?;
            CoreResult::Ok(url.contains(fragment))
        })
        .await
    }

    async fn wait_until_ready(&self, timeout: Duration) -> CoreResult<bool> {
        poll_until(timeout, || {
            self.eval_bool("document.readyState === 'complete'".to_string())
        })
        .await
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> CoreResult<bool> {
        let expression = exists_expression(selector)?;
        poll_until(timeout, || self.eval_bool(expression.clone())).await
    }

    async fn screenshot(&self, path: &Path) -> CoreResult<()> {
        let params = ScreenshotParams::builder().full_page(true).build();
        self.page.save_screenshot(params, path).await.map_err(cdp)?;
        Ok(())
    }

    async fn close(&mut self) -> CoreResult<()> {
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                tracing::debug!("Browser close command failed: {}", e);
            }
            if let Err(e) = browser.wait().await {
                tracing::debug!("Waiting for Chrome to exit failed: {}", e);
            }
        }
        self.handler_task.abort();
        Ok(())
    }
}
