//! Agent Session: per-request owner of the browser and the step trace.
//! Every incoming request gets one of these, with its own browser
//! instance; sessions never share browser state with each other.

use std::sync::Arc;

use cdp_surface::{BrowserSurface, ChromiumSurface, PageHandle, SurfaceConfig, SurfaceError};
use reasoning_oracle::ReasoningOracle;
use taskbrowser_core_types::{StepRecord, TaskResult};

/// Owns the browser surface, the single active page, and the append-only
/// step trace for one task. `captcha_detected` is written only by the
/// CAPTCHA Controller call sites in this crate; every other reader goes
/// through `captcha_detected()`.
pub struct AgentSession {
    pub agent_id: String,
    pub surface: Arc<dyn BrowserSurface>,
    pub active_page: PageHandle,
    pub oracle: Option<Arc<dyn ReasoningOracle>>,
    steps: Vec<StepRecord>,
    captcha_detected: bool,
}

impl AgentSession {
    pub async fn new(agent_id: impl Into<String>, oracle: Option<Arc<dyn ReasoningOracle>>) -> Result<Self, SurfaceError> {
        let surface: Arc<dyn BrowserSurface> = Arc::new(ChromiumSurface::new(SurfaceConfig::default()));
        let active_page = surface.new_tab("about:blank").await?;
        Ok(Self {
            agent_id: agent_id.into(),
            surface,
            active_page,
            oracle,
            steps: Vec::new(),
            captcha_detected: false,
        })
    }

    pub fn record_step(&mut self, step: impl Into<String>, result: TaskResult) {
        self.steps.push(StepRecord::new(step, result));
    }

    pub fn steps(&self) -> &[StepRecord] {
        &self.steps
    }

    pub fn into_steps(self) -> Vec<StepRecord> {
        self.steps
    }

    pub fn captcha_detected(&self) -> bool {
        self.captcha_detected
    }

    pub(crate) fn set_captcha_detected(&mut self, value: bool) {
        self.captcha_detected = value;
    }

    pub fn last_result_success(&self) -> bool {
        self.steps.last().map(|s| s.success).unwrap_or(false)
    }

    /// Swaps in a freshly opened tab as the active page, runs `work` on
    /// it, then closes that tab and restores the original active page —
    /// even if `work` fails. Mirrors the fallback/enrichment tab
    /// lifecycle from §5: one active page at a time, swap always undone.
    pub async fn with_fresh_tab<F, Fut, T>(&mut self, url: &str, work: F) -> Result<T, SurfaceError>
    where
        F: FnOnce(Arc<dyn BrowserSurface>, PageHandle) -> Fut,
        Fut: std::future::Future<Output = Result<T, SurfaceError>>,
    {
        let new_page = self.surface.new_tab(url).await?;
        let outcome = work(self.surface.clone(), new_page.clone()).await;
        let _ = self.surface.close_tab(&new_page).await;
        outcome
    }

    /// Releases session resources. A no-op while a CAPTCHA is unresolved
    /// and `force_close` is false — the browser must stay open so a human
    /// can finish the challenge. `force_close` is the use-case layer's
    /// call once the task has definitively completed.
    pub async fn cleanup(&self, force_close: bool) {
        if self.captcha_detected && !force_close {
            tracing::debug!(agent_id = %self.agent_id, "cleanup skipped: captcha still unresolved");
            return;
        }
        if let Err(err) = self.surface.close_tab(&self.active_page).await {
            tracing::debug!(agent_id = %self.agent_id, %err, "error while closing active page during cleanup");
        }
        if let Err(err) = self.surface.shutdown().await {
            tracing::debug!(agent_id = %self.agent_id, %err, "error while shutting down browser during cleanup");
        }
    }
}
