//! Chromium control over the DevTools protocol.
//!
//! [`ChromiumDriver`] launches (or connects to) a Chromium browser through
//! chromiumoxide and implements [`BrowserDriver`] with one page-side script
//! per element operation (see [`crate::dom_script`]). Pointer and keyboard
//! input go through the `Input` domain so pages see trusted events.

use crate::config::Config;
use crate::dom_script::{self, OptionKey, ScriptFailure};
use crate::driver::{
    BrowserDriver, ClickKind, ElementState, Key, OptionMatch, SelectOption, SessionContext,
};
use crate::locator::Selector;
use crate::result::{PageError, PageResult};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::browser::{
    SetDownloadBehaviorBehavior, SetDownloadBehaviorParams,
};
use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchKeyEventParams, DispatchKeyEventType, DispatchMouseEventParams,
    DispatchMouseEventType, InsertTextParams, MouseButton,
};
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams, GetNavigationHistoryParams,
    NavigateToHistoryEntryParams,
};
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Browser families that are driven through CDP
const CHROMIUM_FAMILIES: [&str; 3] = ["chrome", "chromium", "edge"];

/// Real browser behind the driver seam
pub struct ChromiumDriver {
    browser: Arc<Mutex<CdpBrowser>>,
    tabs: Mutex<Vec<CdpPage>>,
    handle: tokio::task::JoinHandle<()>,
}

impl fmt::Debug for ChromiumDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChromiumDriver")
            .field("handler_finished", &self.handle.is_finished())
            .finish_non_exhaustive()
    }
}

impl Drop for ChromiumDriver {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl ChromiumDriver {
    /// Launch a local browser, or connect to `remoteGridUrl` when set
    ///
    /// Honors `browser`, `headless`, `browserSize`, `chromePath` and
    /// `downloadDir`. One blank tab is opened.
    ///
    /// # Errors
    ///
    /// [`PageError::BrowserLaunch`] if the browser cannot be started or
    /// reached, [`PageError::Download`] if the download directory cannot be
    /// configured.
    pub async fn launch(config: &Config) -> PageResult<Self> {
        let family = config.browser().to_ascii_lowercase();
        if !CHROMIUM_FAMILIES.contains(&family.as_str()) {
            return Err(PageError::BrowserLaunch {
                message: format!("browser '{family}' is not driven over CDP"),
            });
        }

        let (browser, mut handler) = match config.remote_grid_url() {
            Some(url) => {
                info!(%url, "Connecting to remote browser");
                CdpBrowser::connect(url.as_str()).await.map_err(launch_error)?
            }
            None => {
                let (width, height) = config.browser_size();
                let mut builder = CdpConfig::builder().window_size(width, height);
                if !config.headless() {
                    builder = builder.with_head();
                }
                if let Some(path) = config.chrome_path() {
                    builder = builder.chrome_executable(path);
                }
                if std::env::var_os("CI").is_some() {
                    builder = builder.no_sandbox();
                }
                let cdp_config = builder
                    .build()
                    .map_err(|message| PageError::BrowserLaunch { message })?;
                info!(
                    browser = %family,
                    width,
                    height,
                    headless = config.headless(),
                    "Launching browser"
                );
                CdpBrowser::launch(cdp_config).await.map_err(launch_error)?
            }
        };

        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handle.abort();
                return Err(launch_error(e));
            }
        };
        // Dropping the driver on a failed download setup aborts the handler
        let driver = Self {
            browser: Arc::new(Mutex::new(browser)),
            tabs: Mutex::new(vec![page]),
            handle,
        };
        driver.allow_downloads(&config.download_dir()).await?;
        Ok(driver)
    }

    async fn allow_downloads(&self, dir: &Path) -> PageResult<()> {
        std::fs::create_dir_all(dir).map_err(|e| PageError::Download {
            message: format!("cannot create {}: {e}", dir.display()),
        })?;
        let absolute = std::fs::canonicalize(dir)?;
        let params = SetDownloadBehaviorParams::builder()
            .behavior(SetDownloadBehaviorBehavior::Allow)
            .download_path(absolute.display().to_string())
            .build()
            .map_err(|message| PageError::Download { message })?;
        self.browser
            .lock()
            .await
            .execute(params)
            .await
            .map_err(|e| PageError::Download {
                message: e.to_string(),
            })?;
        debug!(dir = %absolute.display(), "Downloads enabled");
        Ok(())
    }

    /// Merge the browser's page targets into the tab list
    ///
    /// Known tabs keep their position, closed ones drop out and new ones
    /// (popups, `target=_blank`) are appended in discovery order.
    async fn sync_tabs(&self) -> PageResult<()> {
        let pages = self
            .browser
            .lock()
            .await
            .pages()
            .await
            .map_err(driver_error)?;
        let mut tabs = self.tabs.lock().await;
        tabs.retain(|t| pages.iter().any(|p| p.target_id() == t.target_id()));
        for page in pages {
            if !tabs.iter().any(|t| t.target_id() == page.target_id()) {
                debug!(target = ?page.target_id(), "New tab discovered");
                tabs.push(page);
            }
        }
        Ok(())
    }

    async fn tab(&self, index: usize) -> PageResult<CdpPage> {
        {
            let tabs = self.tabs.lock().await;
            if let Some(page) = tabs.get(index) {
                return Ok(page.clone());
            }
        }
        self.sync_tabs().await?;
        let tabs = self.tabs.lock().await;
        tabs.get(index).cloned().ok_or(PageError::NoSuchTab {
            index,
            count: tabs.len(),
        })
    }

    async fn on_document(&self, ctx: &SessionContext, body: &str) -> PageResult<Value> {
        let page = self.tab(ctx.tab).await?;
        evaluate(&page, dom_script::document_script(&ctx.frames, body))
            .await
            .map_err(|e| frame_error(ctx, &e))
    }

    async fn on_all(
        &self,
        ctx: &SessionContext,
        selector: &Selector,
        body: &str,
    ) -> PageResult<Value> {
        let page = self.tab(ctx.tab).await?;
        evaluate(&page, dom_script::all_script(&ctx.frames, selector, body))
            .await
            .map_err(|e| element_error(selector, &e))
    }

    async fn on_element(
        &self,
        ctx: &SessionContext,
        selector: &Selector,
        index: usize,
        body: &str,
    ) -> PageResult<Value> {
        let page = self.tab(ctx.tab).await?;
        evaluate(&page, dom_script::element_script(&ctx.frames, selector, index, body))
            .await
            .map_err(|e| element_error(selector, &e))
    }

    async fn click_at(&self, page: &CdpPage, point: (f64, f64), kind: ClickKind) -> PageResult<()> {
        let (x, y) = point;
        page.execute(mouse(DispatchMouseEventType::MouseMoved, x, y, MouseButton::None, 0)?)
            .await
            .map_err(driver_error)?;
        let (button, clicks) = match kind {
            ClickKind::Single => (MouseButton::Left, 1),
            ClickKind::Double => (MouseButton::Left, 2),
            ClickKind::Context => (MouseButton::Right, 1),
        };
        for count in 1..=clicks {
            for phase in [
                DispatchMouseEventType::MousePressed,
                DispatchMouseEventType::MouseReleased,
            ] {
                page.execute(mouse(phase, x, y, button.clone(), count)?)
                    .await
                    .map_err(driver_error)?;
            }
        }
        Ok(())
    }

    async fn click_index(
        &self,
        ctx: &SessionContext,
        selector: &Selector,
        index: usize,
        kind: ClickKind,
    ) -> PageResult<()> {
        let point = self
            .on_element(ctx, selector, index, dom_script::CLICK_POINT)
            .await?;
        let point = as_point(&point).ok_or_else(|| PageError::Script {
            message: format!("no click point for {selector}: {point}"),
        })?;
        let page = self.tab(ctx.tab).await?;
        self.click_at(&page, point, kind).await
    }

    async fn history_step(&self, ctx: &SessionContext, delta: i64) -> PageResult<()> {
        let page = self.tab(ctx.tab).await?;
        let history = page
            .execute(GetNavigationHistoryParams::default())
            .await
            .map_err(driver_error)?;
        let target = usize::try_from(history.current_index + delta)
            .ok()
            .and_then(|i| history.entries.get(i));
        let Some(entry) = target else {
            debug!(delta, "No history entry, staying put");
            return Ok(());
        };
        let url = entry.url.clone();
        page.execute(NavigateToHistoryEntryParams::new(entry.id))
            .await
            .map_err(|e| navigation_error(&url, &e))?;
        page.wait_for_navigation()
            .await
            .map_err(|e| navigation_error(&url, &e))?;
        Ok(())
    }
}

async fn evaluate(page: &CdpPage, expression: String) -> Result<Value, CdpError> {
    let result = page.evaluate(expression).await?;
    Ok(result.value().cloned().unwrap_or(Value::Null))
}

fn mouse(
    kind: DispatchMouseEventType,
    x: f64,
    y: f64,
    button: MouseButton,
    click_count: i64,
) -> PageResult<DispatchMouseEventParams> {
    DispatchMouseEventParams::builder()
        .r#type(kind)
        .x(x)
        .y(y)
        .button(button)
        .click_count(click_count)
        .build()
        .map_err(PageError::driver)
}

fn key_event(kind: DispatchKeyEventType, key: Key) -> PageResult<DispatchKeyEventParams> {
    let mut builder = DispatchKeyEventParams::builder()
        .r#type(kind.clone())
        .key(key.dom_key())
        .code(key.dom_code())
        .windows_virtual_key_code(key.key_code())
        .native_virtual_key_code(key.key_code());
    if let (DispatchKeyEventType::KeyDown, Some(text)) = (kind, key.text()) {
        builder = builder.text(text);
    }
    builder.build().map_err(PageError::driver)
}

fn file_list(paths: &[PathBuf]) -> Vec<String> {
    paths.iter().map(|p| p.display().to_string()).collect()
}

fn as_point(value: &Value) -> Option<(f64, f64)> {
    Some((value.get(0)?.as_f64()?, value.get(1)?.as_f64()?))
}

fn option_key(option: &OptionMatch) -> OptionKey<'_> {
    match option {
        OptionMatch::Text(t) => OptionKey::Text(t),
        OptionMatch::Value(v) => OptionKey::Value(v),
        OptionMatch::Index(i) => OptionKey::Index(*i),
    }
}

fn launch_error(e: CdpError) -> PageError {
    PageError::BrowserLaunch {
        message: e.to_string(),
    }
}

fn driver_error(e: CdpError) -> PageError {
    PageError::driver(e.to_string())
}

fn navigation_error(url: &str, e: &CdpError) -> PageError {
    PageError::Navigation {
        url: url.to_string(),
        message: e.to_string(),
    }
}

fn frame_error(ctx: &SessionContext, e: &CdpError) -> PageError {
    let message = e.to_string();
    match dom_script::classify_failure(&message) {
        ScriptFailure::FrameMissing => PageError::ElementNotFound {
            selector: ctx.frames.last().map(Selector::raw).unwrap_or_default(),
        },
        ScriptFailure::Stale => PageError::Script {
            message: format!("document replaced during script: {message}"),
        },
        _ => PageError::Script { message },
    }
}

fn element_error(selector: &Selector, e: &CdpError) -> PageError {
    let message = e.to_string();
    match dom_script::classify_failure(&message) {
        ScriptFailure::NotFound | ScriptFailure::FrameMissing => PageError::ElementNotFound {
            selector: selector.raw(),
        },
        ScriptFailure::Stale => PageError::StaleElement {
            selector: selector.raw(),
        },
        ScriptFailure::NoOption => {
            PageError::invalid_argument(format!("no matching option in {selector}"))
        }
        ScriptFailure::DisabledOption => {
            PageError::invalid_state(format!("matching option in {selector} is disabled"))
        }
        ScriptFailure::SingleSelect => {
            PageError::invalid_state("only options of a multi-select can be deselected")
        }
        ScriptFailure::NotSelect => PageError::driver(format!("{selector} is not a select")),
        ScriptFailure::NotFileInput => {
            PageError::driver(format!("element {selector} is not a file input"))
        }
        ScriptFailure::NotInteractable => {
            PageError::driver(format!("element {selector} has no size to click"))
        }
        ScriptFailure::NoForm => PageError::invalid_state(format!("{selector} is not in a form")),
        ScriptFailure::Other => PageError::Script { message },
    }
}

#[async_trait]
impl BrowserDriver for ChromiumDriver {
    async fn navigate(&self, ctx: &SessionContext, url: &str) -> PageResult<()> {
        let page = self.tab(ctx.tab).await?;
        page.goto(url).await.map_err(|e| navigation_error(url, &e))?;
        Ok(())
    }

    async fn current_url(&self, ctx: &SessionContext) -> PageResult<String> {
        let page = self.tab(ctx.tab).await?;
        Ok(page.url().await.map_err(driver_error)?.unwrap_or_default())
    }

    async fn title(&self, ctx: &SessionContext) -> PageResult<String> {
        let page = self.tab(ctx.tab).await?;
        Ok(page.get_title().await.map_err(driver_error)?.unwrap_or_default())
    }

    async fn reload(&self, ctx: &SessionContext) -> PageResult<()> {
        let page = self.tab(ctx.tab).await?;
        page.reload().await.map_err(driver_error)?;
        Ok(())
    }

    async fn go_back(&self, ctx: &SessionContext) -> PageResult<()> {
        self.history_step(ctx, -1).await
    }

    async fn go_forward(&self, ctx: &SessionContext) -> PageResult<()> {
        self.history_step(ctx, 1).await
    }

    async fn execute_js(
        &self,
        ctx: &SessionContext,
        script: &str,
    ) -> PageResult<serde_json::Value> {
        self.on_document(ctx, script).await
    }

    async fn evaluate_on(
        &self,
        ctx: &SessionContext,
        selector: &Selector,
        body: &str,
    ) -> PageResult<serde_json::Value> {
        self.on_element(ctx, selector, 0, body).await
    }

    async fn ready_state(&self, ctx: &SessionContext) -> PageResult<String> {
        let state = self.on_document(ctx, "return doc.readyState;").await?;
        Ok(state.as_str().unwrap_or_default().to_string())
    }

    async fn probe(&self, ctx: &SessionContext, selector: &Selector) -> PageResult<ElementState> {
        match self.on_all(ctx, selector, dom_script::PROBE).await {
            Ok(value) => Ok(serde_json::from_value(value)?),
            // A missing frame means nothing inside it can match.
            Err(PageError::ElementNotFound { .. }) => Ok(ElementState::absent()),
            Err(e) => Err(e),
        }
    }

    async fn click(
        &self,
        ctx: &SessionContext,
        selector: &Selector,
        kind: ClickKind,
    ) -> PageResult<()> {
        self.click_index(ctx, selector, 0, kind).await
    }

    async fn click_nth(
        &self,
        ctx: &SessionContext,
        selector: &Selector,
        index: usize,
    ) -> PageResult<()> {
        self.click_index(ctx, selector, index, ClickKind::Single).await
    }

    async fn hover(&self, ctx: &SessionContext, selector: &Selector) -> PageResult<()> {
        let point = self
            .on_element(ctx, selector, 0, dom_script::CLICK_POINT)
            .await?;
        let (x, y) = as_point(&point).ok_or_else(|| PageError::Script {
            message: format!("no hover point for {selector}: {point}"),
        })?;
        let page = self.tab(ctx.tab).await?;
        page.execute(mouse(DispatchMouseEventType::MouseMoved, x, y, MouseButton::None, 0)?)
            .await
            .map_err(driver_error)?;
        Ok(())
    }

    async fn focus(&self, ctx: &SessionContext, selector: &Selector) -> PageResult<()> {
        self.on_element(ctx, selector, 0, dom_script::FOCUS).await?;
        Ok(())
    }

    async fn scroll_into_view(&self, ctx: &SessionContext, selector: &Selector) -> PageResult<()> {
        self.on_element(ctx, selector, 0, dom_script::SCROLL_INTO_VIEW)
            .await?;
        Ok(())
    }

    async fn clear(&self, ctx: &SessionContext, selector: &Selector) -> PageResult<()> {
        self.on_element(ctx, selector, 0, dom_script::CLEAR).await?;
        Ok(())
    }

    async fn type_text(
        &self,
        ctx: &SessionContext,
        selector: &Selector,
        text: &str,
    ) -> PageResult<()> {
        self.on_element(ctx, selector, 0, dom_script::FOCUS_END).await?;
        let page = self.tab(ctx.tab).await?;
        page.execute(InsertTextParams::new(text))
            .await
            .map_err(driver_error)?;
        Ok(())
    }

    async fn set_value(
        &self,
        ctx: &SessionContext,
        selector: &Selector,
        value: &str,
    ) -> PageResult<()> {
        self.on_element(ctx, selector, 0, &dom_script::set_value(value))
            .await?;
        Ok(())
    }

    async fn press_key(
        &self,
        ctx: &SessionContext,
        selector: &Selector,
        key: Key,
    ) -> PageResult<()> {
        self.on_element(ctx, selector, 0, dom_script::FOCUS).await?;
        let page = self.tab(ctx.tab).await?;
        for kind in [DispatchKeyEventType::KeyDown, DispatchKeyEventType::KeyUp] {
            page.execute(key_event(kind, key)?)
                .await
                .map_err(driver_error)?;
        }
        Ok(())
    }

    async fn text(&self, ctx: &SessionContext, selector: &Selector) -> PageResult<String> {
        let value = self.on_element(ctx, selector, 0, dom_script::TEXT).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn texts(&self, ctx: &SessionContext, selector: &Selector) -> PageResult<Vec<String>> {
        match self.on_all(ctx, selector, dom_script::TEXTS).await {
            Ok(value) => Ok(serde_json::from_value(value)?),
            Err(PageError::ElementNotFound { .. }) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    async fn value(&self, ctx: &SessionContext, selector: &Selector) -> PageResult<String> {
        let value = self.on_element(ctx, selector, 0, dom_script::VALUE).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn attribute(
        &self,
        ctx: &SessionContext,
        selector: &Selector,
        name: &str,
    ) -> PageResult<Option<String>> {
        let value = self
            .on_element(ctx, selector, 0, &dom_script::attribute(name))
            .await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn attributes(
        &self,
        ctx: &SessionContext,
        selector: &Selector,
        name: &str,
    ) -> PageResult<Vec<Option<String>>> {
        match self.on_all(ctx, selector, &dom_script::attributes(name)).await {
            Ok(value) => Ok(serde_json::from_value(value)?),
            Err(PageError::ElementNotFound { .. }) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    async fn css_value(
        &self,
        ctx: &SessionContext,
        selector: &Selector,
        property: &str,
    ) -> PageResult<String> {
        let value = self
            .on_element(ctx, selector, 0, &dom_script::css_value(property))
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn options(
        &self,
        ctx: &SessionContext,
        selector: &Selector,
    ) -> PageResult<Vec<SelectOption>> {
        let value = self.on_element(ctx, selector, 0, dom_script::OPTIONS).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn select_option(
        &self,
        ctx: &SessionContext,
        selector: &Selector,
        option: &OptionMatch,
    ) -> PageResult<()> {
        self.on_element(ctx, selector, 0, &dom_script::select_option(option_key(option)))
            .await?;
        Ok(())
    }

    async fn deselect_option(
        &self,
        ctx: &SessionContext,
        selector: &Selector,
        option: Option<&OptionMatch>,
    ) -> PageResult<()> {
        let script = dom_script::deselect_option(option.map(option_key));
        self.on_element(ctx, selector, 0, &script).await?;
        Ok(())
    }

    async fn upload_files(
        &self,
        ctx: &SessionContext,
        selector: &Selector,
        paths: &[PathBuf],
    ) -> PageResult<()> {
        let page = self.tab(ctx.tab).await?;
        let expression =
            dom_script::element_script(&ctx.frames, selector, 0, dom_script::FILE_INPUT_GUARD);
        let params = EvaluateParams::builder()
            .expression(expression)
            .return_by_value(false)
            .await_promise(true)
            .build()
            .map_err(PageError::driver)?;
        let handle = page
            .evaluate_expression(params)
            .await
            .map_err(|e| element_error(selector, &e))?;
        let object_id = handle.object().object_id.clone().ok_or_else(|| PageError::Script {
            message: format!("no remote object for {selector}"),
        })?;
        let params = SetFileInputFilesParams::builder()
            .files(file_list(paths))
            .object_id(object_id)
            .build()
            .map_err(PageError::driver)?;
        page.execute(params).await.map_err(driver_error)?;
        Ok(())
    }

    async fn screenshot(&self, ctx: &SessionContext) -> PageResult<Vec<u8>> {
        let page = self.tab(ctx.tab).await?;
        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        let screenshot = page.execute(params).await.map_err(driver_error)?;

        use base64::Engine;
        base64::engine::general_purpose::STANDARD
            .decode(&screenshot.data)
            .map_err(|e| PageError::driver(format!("screenshot is not base64: {e}")))
    }

    async fn tab_count(&self) -> PageResult<usize> {
        self.sync_tabs().await?;
        Ok(self.tabs.lock().await.len())
    }

    async fn close_tab(&self, index: usize) -> PageResult<()> {
        self.sync_tabs().await?;
        let page = {
            let mut tabs = self.tabs.lock().await;
            if index >= tabs.len() {
                return Err(PageError::NoSuchTab {
                    index,
                    count: tabs.len(),
                });
            }
            tabs.remove(index)
        };
        page.close().await.map_err(driver_error)?;
        Ok(())
    }

    async fn close(&self) -> PageResult<()> {
        let mut browser = self.browser.lock().await;
        if let Err(e) = browser.close().await {
            warn!(error = %e, "Browser did not close cleanly");
        }
        self.tabs.lock().await.clear();
        self.handle.abort();
        info!("Browser closed");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_file_list_keeps_order() {
        let paths = vec![PathBuf::from("/tmp/a.pdf"), PathBuf::from("/tmp/b.png")];
        assert_eq!(file_list(&paths), vec!["/tmp/a.pdf", "/tmp/b.png"]);
        assert!(file_list(&[]).is_empty());
    }

    #[test]
    fn test_click_point_from_script_result() {
        assert_eq!(as_point(&json!([12.5, 40])), Some((12.5, 40.0)));
        assert_eq!(as_point(&json!([12.5])), None);
        assert_eq!(as_point(&Value::Null), None);
    }

    #[test]
    fn test_option_key_mapping() {
        let text = OptionMatch::Text("Economy".to_string());
        assert!(matches!(option_key(&text), OptionKey::Text("Economy")));
        assert!(matches!(option_key(&OptionMatch::Index(2)), OptionKey::Index(2)));
    }

    #[test]
    fn test_double_click_event() {
        let params = mouse(DispatchMouseEventType::MousePressed, 3.0, 4.0, MouseButton::Left, 2)
            .unwrap();
        let wire = serde_json::to_value(&params).unwrap();
        assert_eq!(wire["clickCount"], 2);
        assert_eq!(wire["button"], "left");
    }

    #[test]
    fn test_key_text_only_on_key_down() {
        let down = key_event(DispatchKeyEventType::KeyDown, Key::Enter).unwrap();
        let up = key_event(DispatchKeyEventType::KeyUp, Key::Enter).unwrap();
        let down = serde_json::to_value(down).unwrap();
        let up = serde_json::to_value(up).unwrap();
        assert_eq!(down["text"], "\r");
        assert!(up.get("text").map_or(true, Value::is_null));
    }

    #[tokio::test]
    #[ignore = "requires chromium"]
    async fn test_dropping_driver_stops_handler() {
        let config = Config::from_pairs([("headless", "true")]);
        let driver = ChromiumDriver::launch(&config).await.unwrap();
        let pump = driver.handle.abort_handle();
        drop(driver);
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        assert!(pump.is_finished());
    }
}
