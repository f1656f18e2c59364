//! One browser session per test.
//!
//! [`Session`] owns the driver, the wait and retry policies, and the
//! [`SessionContext`] naming the tab and frame path that element calls act
//! in. Switching tabs or frames replaces the context; nothing global is
//! mutated, so a context obtained earlier keeps pointing where it pointed.

use crate::config::Config;
use crate::driver::{BrowserDriver, SessionContext};
use crate::locator::Locator;
use crate::result::{PageError, PageResult};
use crate::retry::RetryPolicy;
use crate::wait::{ElementCondition, LoadState, WaitOptions, WaitPolicy, WaitResult, Waiter};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Poll interval used while waiting for tabs to open
const TAB_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// A driver plus the policies and context element calls run under
#[derive(Debug)]
pub struct Session<D> {
    driver: D,
    ctx: SessionContext,
    waits: WaitPolicy,
    retry: RetryPolicy,
    base_url: String,
    screenshot_dir: PathBuf,
}

impl<D: BrowserDriver> Session<D> {
    /// Session with default policies
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            ctx: SessionContext::default(),
            waits: WaitPolicy::default(),
            retry: RetryPolicy::default(),
            base_url: "http://localhost".to_string(),
            screenshot_dir: PathBuf::from("target/screenshots"),
        }
    }

    /// Session with policies and paths taken from configuration
    pub fn from_config(driver: D, config: &Config) -> Self {
        Self {
            driver,
            ctx: SessionContext::default(),
            waits: WaitPolicy::from_config(config),
            retry: RetryPolicy::from_config(config),
            base_url: config.base_url(),
            screenshot_dir: config.screenshot_dir(),
        }
    }

    /// Replace the wait policy
    #[must_use]
    pub fn with_wait_policy(mut self, waits: WaitPolicy) -> Self {
        self.waits = waits;
        self
    }

    /// Replace the stale retry policy
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Base URL relative paths are resolved against
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Directory screenshots are saved to
    #[must_use]
    pub fn with_screenshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.screenshot_dir = dir.into();
        self
    }

    /// The underlying driver
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Tab and frame path calls currently act in
    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    /// Wait policy
    pub fn wait_policy(&self) -> &WaitPolicy {
        &self.waits
    }

    /// Stale retry policy
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Waiter for element preconditions, honouring a locator's own timeout
    pub fn element_waiter(&self, locator: &Locator) -> Waiter {
        let options = locator
            .timeout()
            .map_or(self.waits.element, |t| self.waits.element.with_timeout(t));
        Waiter::new(options)
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Absolute URLs pass through, anything else is joined onto the base URL
    pub fn resolve_url(&self, url: &str) -> String {
        if url.contains("://") || url.starts_with("about:") || url.starts_with("data:") {
            return url.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            url.trim_start_matches('/')
        )
    }

    /// Open a URL in the current tab
    pub async fn open(&self, url: &str) -> PageResult<()> {
        let url = self.resolve_url(url);
        info!(url = %url, "Opening URL");
        self.driver.navigate(&self.ctx, &url).await.map_err(|e| {
            error!(url = %url, error = %e, "Failed to open URL");
            e
        })
    }

    /// Open a URL and wait for the document to finish loading
    pub async fn open_and_wait(&self, url: &str) -> PageResult<WaitResult> {
        self.open(url).await?;
        self.wait_for_page_load().await
    }

    /// Current URL
    pub async fn current_url(&self) -> PageResult<String> {
        self.driver.current_url(&self.ctx).await
    }

    /// Current page title
    pub async fn title(&self) -> PageResult<String> {
        self.driver.title(&self.ctx).await
    }

    /// Reload the page
    pub async fn refresh(&self) -> PageResult<()> {
        info!("Refreshing page");
        self.driver.reload(&self.ctx).await
    }

    /// History back
    pub async fn back(&self) -> PageResult<()> {
        info!("Navigating back");
        self.driver.go_back(&self.ctx).await
    }

    /// History forward
    pub async fn forward(&self) -> PageResult<()> {
        info!("Navigating forward");
        self.driver.go_forward(&self.ctx).await
    }

    /// Wait until `document.readyState` is `complete`
    ///
    /// # Errors
    ///
    /// [`PageError::Timeout`] after the page load timeout.
    pub async fn wait_for_page_load(&self) -> PageResult<WaitResult> {
        self.wait_for_load_state(LoadState::Load).await
    }

    /// Wait for a specific load state
    pub async fn wait_for_load_state(&self, state: LoadState) -> PageResult<WaitResult> {
        let result = Waiter::new(self.waits.page_load)
            .for_load_state(&self.driver, &self.ctx, state)
            .await;
        if result.success {
            debug!(elapsed_ms = result.elapsed.as_millis() as u64, "Page {state}");
            Ok(result)
        } else {
            error!(timeout_ms = self.waits.page_load.timeout_ms(), "Page did not finish loading");
            Err(PageError::Timeout {
                element: "page".to_string(),
                condition: state.to_string(),
                timeout_ms: self.waits.page_load.timeout_ms(),
            })
        }
    }

    /// Wait for a condition on an arbitrary locator
    pub async fn wait_for(
        &self,
        locator: &Locator,
        condition: &ElementCondition,
    ) -> WaitResult {
        self.element_waiter(locator)
            .for_element(&self.driver, &self.ctx, locator.selector(), condition)
            .await
    }

    /// Evaluate a script in the current document
    pub async fn execute_js(&self, script: &str) -> PageResult<serde_json::Value> {
        debug!(script, "Executing script");
        self.driver.execute_js(&self.ctx, script).await
    }

    /// PNG bytes of the current tab
    pub async fn screenshot(&self) -> PageResult<Vec<u8>> {
        self.driver.screenshot(&self.ctx).await
    }

    /// Save a screenshot as `<screenshot dir>/<name>.png`
    pub async fn save_screenshot(&self, name: &str) -> PageResult<PathBuf> {
        let png = self.screenshot().await?;
        tokio::fs::create_dir_all(&self.screenshot_dir).await?;
        let path = self.screenshot_dir.join(format!("{name}.png"));
        tokio::fs::write(&path, png).await?;
        info!(path = %path.display(), "Saved screenshot");
        Ok(path)
    }

    // =========================================================================
    // Tabs
    // =========================================================================

    /// Number of open tabs
    pub async fn tab_count(&self) -> PageResult<usize> {
        self.driver.tab_count().await
    }

    /// Act in the tab at `index` from now on
    ///
    /// Frames entered in the previous tab are left behind.
    pub async fn switch_to_tab(&mut self, index: usize) -> PageResult<&SessionContext> {
        let count = self.driver.tab_count().await?;
        if index >= count {
            warn!(index, count, "No tab at index");
            return Err(PageError::NoSuchTab { index, count });
        }
        info!(index, "Switching to tab");
        self.ctx = SessionContext::tab(index);
        Ok(&self.ctx)
    }

    /// Act in the most recently opened tab
    pub async fn switch_to_last_tab(&mut self) -> PageResult<&SessionContext> {
        let count = self.driver.tab_count().await?;
        self.switch_to_tab(count.saturating_sub(1)).await
    }

    /// Switch to the first tab whose title contains `title`
    ///
    /// Returns `false`, staying in the current tab, when none matches.
    pub async fn switch_to_tab_titled(&mut self, title: &str) -> PageResult<bool> {
        let count = self.driver.tab_count().await?;
        for index in 0..count {
            let tab_title = self.driver.title(&SessionContext::tab(index)).await?;
            if tab_title.contains(title) {
                info!(index, title = %tab_title, "Switched to tab by title");
                self.ctx = SessionContext::tab(index);
                return Ok(true);
            }
        }
        warn!(title, "No tab with matching title");
        Ok(false)
    }

    /// Wait until at least `expected` tabs are open
    pub async fn wait_for_tab_count(&self, expected: usize, timeout: Duration) -> bool {
        let options = WaitOptions::new()
            .with_timeout(timeout)
            .with_poll_interval(TAB_POLL_INTERVAL);
        let driver = &self.driver;
        let result = Waiter::new(options)
            .until(format!("{expected} tabs"), move || async move {
                driver.tab_count().await.is_ok_and(|n| n >= expected)
            })
            .await;
        if !result.success {
            warn!(expected, "Timed out waiting for tabs to open");
        }
        result.success
    }

    /// Close the current tab and act in `switch_to`, counted before closing
    ///
    /// Does nothing but warn when `switch_to` is out of range.
    pub async fn close_current_tab_and_switch(&mut self, switch_to: usize) -> PageResult<()> {
        let count = self.driver.tab_count().await?;
        if switch_to >= count {
            warn!(switch_to, count, "Cannot switch to tab after closing");
            return Ok(());
        }
        let current = self.ctx.tab;
        info!(current, switch_to, "Closing tab");
        self.driver.close_tab(current).await?;
        let target = match switch_to.cmp(&current) {
            std::cmp::Ordering::Greater => switch_to - 1,
            _ => switch_to,
        };
        self.ctx = SessionContext::tab(target);
        Ok(())
    }

    /// Close every tab but the first and act in the first
    pub async fn close_other_tabs(&mut self) -> PageResult<()> {
        let count = self.driver.tab_count().await?;
        if count <= 1 {
            warn!("Only one tab is open, nothing to close");
        }
        for index in (1..count).rev() {
            self.driver.close_tab(index).await?;
        }
        self.ctx = SessionContext::tab(0);
        Ok(())
    }

    // =========================================================================
    // Frames
    // =========================================================================

    /// Act inside the frame matched by `frame` from now on
    ///
    /// # Errors
    ///
    /// [`PageError::Timeout`] if the frame element never appears.
    pub async fn enter_frame(&mut self, frame: &Locator) -> PageResult<()> {
        let result = self.wait_for(frame, &ElementCondition::Exists).await;
        if !result.success {
            return Err(PageError::Timeout {
                element: frame.to_string(),
                condition: ElementCondition::Exists.to_string(),
                timeout_ms: self.element_waiter(frame).options().timeout_ms(),
            });
        }
        info!(frame = %frame, "Entering frame");
        self.ctx = self.ctx.with_frame(frame.selector().clone());
        Ok(())
    }

    /// Leave the innermost frame; `false` when already at the top level
    pub fn exit_frame(&mut self) -> bool {
        self.ctx.frames.pop().is_some()
    }

    /// Return to the tab's top-level document
    pub fn exit_to_main(&mut self) {
        self.ctx.frames.clear();
    }

    /// Shut the browser down
    pub async fn close(self) -> PageResult<()> {
        info!("Closing session");
        self.driver.close().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::{MockDriver, MockEffect, MockElement};

    #[test]
    fn test_resolve_url() {
        let session = Session::new(MockDriver::new()).with_base_url("http://localhost:8080/");
        assert_eq!(session.resolve_url("/search"), "http://localhost:8080/search");
        assert_eq!(session.resolve_url("https://a.test/x"), "https://a.test/x");
        assert_eq!(session.resolve_url("about:blank"), "about:blank");
    }

    #[tokio::test]
    async fn test_open_uses_base_url() {
        let session = Session::new(MockDriver::new()).with_base_url("http://site.test");
        session.open("hotels").await.unwrap();
        assert_eq!(session.current_url().await.unwrap(), "http://site.test/hotels");
    }

    #[tokio::test(start_paused = true)]
    async fn test_page_load_wait_succeeds_once_ready() {
        let driver = MockDriver::new();
        driver.page_ready_after(Duration::from_secs(3));
        let session = Session::new(driver);
        let result = session.wait_for_page_load().await.unwrap();
        assert!(result.elapsed >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_page_load_timeout_is_error() {
        let driver = MockDriver::new();
        driver.page_ready_after(Duration::from_secs(60));
        let session = Session::new(driver);
        let err = session.wait_for_page_load().await.unwrap_err();
        assert!(matches!(err, PageError::Timeout { timeout_ms: 20_000, .. }));
    }

    #[tokio::test]
    async fn test_tab_switching() {
        let driver = MockDriver::new().with_element(MockElement::new("#open").on_click(
            MockEffect::OpenTab {
                url: "https://details.test".to_string(),
                title: "Hotel details".to_string(),
            },
        ));
        let mut session = Session::new(driver);
        session
            .driver()
            .click(session.context(), &"#open".into(), crate::ClickKind::Single)
            .await
            .unwrap();
        assert!(session.wait_for_tab_count(2, Duration::from_secs(1)).await);
        assert!(session.switch_to_tab_titled("details").await.unwrap());
        assert_eq!(session.context().tab, 1);
        assert!(!session.switch_to_tab_titled("nope").await.unwrap());
        assert_eq!(session.context().tab, 1);
        let err = session.switch_to_tab(5).await.unwrap_err();
        assert!(matches!(err, PageError::NoSuchTab { index: 5, count: 2 }));
        session.close_current_tab_and_switch(0).await.unwrap();
        assert_eq!(session.tab_count().await.unwrap(), 1);
        assert_eq!(session.context().tab, 0);
    }

    #[tokio::test]
    async fn test_close_other_tabs() {
        let driver = MockDriver::new();
        let mut session = Session::new(driver);
        for url in ["https://a.test", "https://b.test"] {
            let open = MockElement::new("#new").on_click(MockEffect::OpenTab {
                url: url.to_string(),
                title: url.to_string(),
            });
            session.driver().add(open);
            session
                .driver()
                .click(session.context(), &"#new".into(), crate::ClickKind::Single)
                .await
                .unwrap();
            session.driver().remove("#new");
        }
        assert_eq!(session.tab_count().await.unwrap(), 3);
        session.switch_to_last_tab().await.unwrap();
        session.close_other_tabs().await.unwrap();
        assert_eq!(session.tab_count().await.unwrap(), 1);
        assert_eq!(session.context().tab, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_frames_push_and_pop() {
        let driver = MockDriver::new().with_element(MockElement::new("iframe#pay"));
        let mut session = Session::new(driver);
        session.enter_frame(&Locator::new("iframe#pay")).await.unwrap();
        assert_eq!(session.context().frames.len(), 1);
        assert!(session.exit_frame());
        assert!(!session.exit_frame());
        let err = session
            .enter_frame(&Locator::new("iframe#missing").with_timeout(Duration::from_secs(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, PageError::Timeout { timeout_ms: 1000, .. }));
    }

    #[tokio::test]
    async fn test_save_screenshot_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new(MockDriver::new()).with_screenshot_dir(dir.path());
        let path = session.save_screenshot("home").await.unwrap();
        assert_eq!(path, dir.path().join("home.png"));
        assert_eq!(std::fs::read(path).unwrap(), crate::mock::MOCK_PNG);
    }

    #[tokio::test]
    async fn test_close_shuts_driver() {
        let session = Session::new(MockDriver::new());
        session.close().await.unwrap();
    }
}
