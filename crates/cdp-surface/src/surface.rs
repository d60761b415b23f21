use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::config::SurfaceConfig;
use crate::element::{clear_value, is_ready};
use crate::error::{SurfaceError, SurfaceErrorKind};

pub type ElementHandle = Element;
pub type PageHandle = Page;

/// The primitives a browser-automation engine exposes to the rest of the
/// system (§4.1). Every method returns `SurfaceError` rather than
/// panicking; the orchestrator is the only caller allowed to turn that
/// into a `TaskResult`.
#[async_trait]
pub trait BrowserSurface: Send + Sync {
    async fn goto(&self, page: &PageHandle, url: &str, timeout: Duration) -> Result<(), SurfaceError>;
    async fn title(&self, page: &PageHandle) -> Result<String, SurfaceError>;
    async fn current_url(&self, page: &PageHandle) -> Result<String, SurfaceError>;
    async fn find(
        &self,
        page: &PageHandle,
        selector: &str,
        timeout: Duration,
        retries: u32,
    ) -> Result<ElementHandle, SurfaceError>;
    async fn fill(&self, element: &ElementHandle, text: &str) -> Result<(), SurfaceError>;
    async fn press(&self, element: &ElementHandle, key: &str) -> Result<(), SurfaceError>;
    async fn click(&self, element: &ElementHandle) -> Result<(), SurfaceError>;
    async fn eval(&self, page: &PageHandle, script: &str) -> Result<serde_json::Value, SurfaceError>;
    async fn new_tab(&self, url: &str) -> Result<PageHandle, SurfaceError>;
    async fn close_tab(&self, page: &PageHandle) -> Result<(), SurfaceError>;
    /// Tears down the underlying browser process. A no-op if the browser
    /// was never launched. Idempotent: safe to call even after a prior
    /// `shutdown` succeeded.
    async fn shutdown(&self) -> Result<(), SurfaceError>;
}

struct Launched {
    browser: tokio::sync::Mutex<Browser>,
    _handler: tokio::task::JoinHandle<()>,
}

/// Chromium-backed implementation. Launch is lazy: the browser process
/// doesn't start until the first primitive is invoked, and idempotent:
/// every primitive shares the single `OnceCell`-guarded instance.
pub struct ChromiumSurface {
    config: SurfaceConfig,
    inner: OnceCell<Launched>,
}

impl ChromiumSurface {
    pub fn new(config: SurfaceConfig) -> Self {
        Self {
            config,
            inner: OnceCell::new(),
        }
    }

    async fn launched(&self) -> Result<&Launched, SurfaceError> {
        self.inner
            .get_or_try_init(|| async { self.launch().await })
            .await
    }

    async fn launch(&self) -> Result<Launched, SurfaceError> {
        let (width, height) = self.config.viewport;
        let mut builder = BrowserConfig::builder()
            .window_size(width, height)
            .arg(format!("--user-agent={}", self.config.user_agent))
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--no-first-run")
            .arg("--no-default-browser-check");

        if self.config.headless {
            // Tests only: production always launches headful so a human
            // can see and clear a CAPTCHA.
            builder = builder.with_head();
        } else {
            builder = builder.with_head();
        }
        if let Some(path) = &self.config.executable_path {
            builder = builder.chrome_executable(path);
        }

        let browser_config = builder
            .build()
            .map_err(|e| SurfaceError::new(SurfaceErrorKind::LaunchFailed).with_hint(e))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| SurfaceError::new(SurfaceErrorKind::LaunchFailed).with_hint(e.to_string()))?;

        let task = tokio::spawn(async move {
            use futures::StreamExt;
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    debug!(%err, "cdp handler event error");
                }
            }
        });

        Ok(Launched {
            browser: tokio::sync::Mutex::new(browser),
            _handler: task,
        })
    }
}

#[async_trait]
impl BrowserSurface for ChromiumSurface {
    async fn goto(&self, page: &PageHandle, url: &str, timeout: Duration) -> Result<(), SurfaceError> {
        tokio::time::timeout(timeout, page.goto(url))
            .await
            .map_err(|_| SurfaceError::new(SurfaceErrorKind::NavTimeout).with_hint(url.to_string()))?
            .map_err(SurfaceError::from)?;

        // DOM-parsed wait: block on navigation settling.
        if let Err(err) = tokio::time::timeout(timeout, page.wait_for_navigation()).await {
            warn!(%url, ?err, "wait_for_navigation timed out, continuing");
        }

        // Network-quiet wait is best-effort and non-fatal on expiry (§4.1).
        let idle_timeout = Duration::from_secs(5).min(timeout);
        let _ = tokio::time::timeout(idle_timeout, wait_for_document_complete(page)).await;
        Ok(())
    }

    async fn title(&self, page: &PageHandle) -> Result<String, SurfaceError> {
        let value = page
            .evaluate("document.title")
            .await
            .map_err(SurfaceError::from)?
            .into_value::<String>()
            .unwrap_or_default();
        Ok(value)
    }

    async fn current_url(&self, page: &PageHandle) -> Result<String, SurfaceError> {
        Ok(page
            .url()
            .await
            .map_err(SurfaceError::from)?
            .unwrap_or_default())
    }

    async fn find(
        &self,
        page: &PageHandle,
        selector: &str,
        timeout: Duration,
        retries: u32,
    ) -> Result<ElementHandle, SurfaceError> {
        let start = tokio::time::Instant::now();
        let mut backoff = Duration::from_millis(150);
        let mut attempt = 0u32;
        loop {
            if let Ok(element) = page.find_element(selector).await {
                if is_ready(&element).await? {
                    return Ok(element);
                }
            }
            attempt += 1;
            if attempt > retries || start.elapsed() >= timeout {
                return Err(SurfaceError::new(SurfaceErrorKind::ElementNotFound)
                    .with_hint(format!("selector '{selector}' not ready after {attempt} attempts"))
                    .retriable(false));
            }
            tokio::time::sleep(backoff).await;
            backoff = (backoff * 2).min(Duration::from_secs(2));
        }
    }

    async fn fill(&self, element: &ElementHandle, text: &str) -> Result<(), SurfaceError> {
        element.focus().await.map_err(SurfaceError::from)?;
        clear_value(element).await?;
        element.type_str(text).await.map_err(SurfaceError::from)?;
        Ok(())
    }

    async fn press(&self, element: &ElementHandle, key: &str) -> Result<(), SurfaceError> {
        element.focus().await.map_err(SurfaceError::from)?;
        element.press_key(key).await.map_err(SurfaceError::from)?;
        Ok(())
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), SurfaceError> {
        element.click().await.map_err(SurfaceError::from)?;
        Ok(())
    }

    async fn eval(&self, page: &PageHandle, script: &str) -> Result<serde_json::Value, SurfaceError> {
        let result = page
            .evaluate(script)
            .await
            .map_err(|e| SurfaceError::new(SurfaceErrorKind::EvalFailed).with_hint(e.to_string()))?;
        result
            .into_value::<serde_json::Value>()
            .map_err(|e| SurfaceError::new(SurfaceErrorKind::EvalFailed).with_hint(e.to_string()))
    }

    async fn new_tab(&self, url: &str) -> Result<PageHandle, SurfaceError> {
        let launched = self.launched().await?;
        let page = launched
            .browser
            .lock()
            .await
            .new_page(url)
            .await
            .map_err(|e| SurfaceError::new(SurfaceErrorKind::TabError).with_hint(e.to_string()))?;
        Ok(page)
    }

    async fn close_tab(&self, page: &PageHandle) -> Result<(), SurfaceError> {
        page.clone()
            .close()
            .await
            .map_err(|e| SurfaceError::new(SurfaceErrorKind::TabError).with_hint(e.to_string()))?;
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), SurfaceError> {
        let Some(launched) = self.inner.get() else {
            return Ok(());
        };
        let mut browser = launched.browser.lock().await;
        if let Err(err) = browser.close().await {
            warn!(%err, "browser close command failed, killing process");
        }
        let _ = browser.wait().await;
        Ok(())
    }
}

async fn wait_for_document_complete(page: &PageHandle) {
    loop {
        let ready = page
            .evaluate("document.readyState")
            .await
            .ok()
            .and_then(|r| r.into_value::<String>().ok());
        if ready.as_deref() == Some("complete") {
            return;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
}
