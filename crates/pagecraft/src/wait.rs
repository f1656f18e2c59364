//! Wait mechanisms.
//!
//! Every wait is a poll: evaluate a probe, sleep for the poll interval, try
//! again until the deadline. A wait that never succeeds gives up no earlier
//! than the timeout and no later than one poll interval after it.

use crate::config::Config;
use crate::driver::{BrowserDriver, SessionContext};
use crate::locator::Selector;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default element timeout (10 seconds)
pub const DEFAULT_ELEMENT_TIMEOUT_MS: u64 = 10_000;

/// Default page load timeout (20 seconds)
pub const DEFAULT_PAGE_LOAD_TIMEOUT_MS: u64 = 20_000;

/// Default polling interval (100ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

// =============================================================================
// LOAD STATE
// =============================================================================

/// Document load states, as reported by `document.readyState`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoadState {
    /// `readyState` is `complete`
    #[default]
    Load,
    /// `readyState` is `interactive` or `complete`
    DomContentLoaded,
}

impl LoadState {
    /// Whether a reported `readyState` satisfies this load state
    #[must_use]
    pub fn is_reached(&self, ready_state: &str) -> bool {
        match self {
            Self::Load => ready_state == "complete",
            Self::DomContentLoaded => matches!(ready_state, "interactive" | "complete"),
        }
    }
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load => f.write_str("loaded"),
            Self::DomContentLoaded => f.write_str("interactive"),
        }
    }
}

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Timeout and poll interval for one wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Give up after this long
    pub timeout: Duration,
    /// Sleep between probes
    pub poll_interval: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_ELEMENT_TIMEOUT_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set polling interval
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Timeout in whole milliseconds
    #[must_use]
    pub const fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }
}

/// Session-wide wait settings derived from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    /// Element precondition waits
    pub element: WaitOptions,
    /// Page load waits
    pub page_load: WaitOptions,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            element: WaitOptions::default(),
            page_load: WaitOptions::default()
                .with_timeout(Duration::from_millis(DEFAULT_PAGE_LOAD_TIMEOUT_MS)),
        }
    }
}

impl WaitPolicy {
    /// Policy from `elementTimeout`, `pageLoadTimeout` and `pollInterval`
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let poll = Duration::from_millis(config.poll_interval_ms().max(1));
        Self {
            element: WaitOptions::new()
                .with_timeout(Duration::from_millis(config.element_timeout_ms()))
                .with_poll_interval(poll),
            page_load: WaitOptions::new()
                .with_timeout(Duration::from_millis(config.page_load_timeout_ms()))
                .with_poll_interval(poll),
        }
    }
}

// =============================================================================
// ELEMENT CONDITIONS
// =============================================================================

/// Conditions an element wait can target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementCondition {
    /// At least one node matches
    Exists,
    /// First match is visible
    Visible,
    /// First match is visible and enabled
    Clickable,
    /// Nothing matches, or the first match is not visible
    Hidden,
    /// First match is enabled
    Enabled,
    /// Trimmed text equals the value
    TextEquals(String),
    /// Text contains the value
    TextContains(String),
    /// Attribute equals the value
    AttributeEquals {
        /// Attribute name
        name: String,
        /// Expected value
        value: String,
    },
    /// At least this many nodes match
    CountAtLeast(usize),
}

impl ElementCondition {
    /// Evaluate once; resolution errors count as "not yet"
    pub async fn is_met<D>(&self, driver: &D, ctx: &SessionContext, selector: &Selector) -> bool
    where
        D: BrowserDriver + ?Sized,
    {
        match self {
            Self::Exists => probe(driver, ctx, selector).await.is_some_and(|s| s.exists()),
            Self::Visible => probe(driver, ctx, selector)
                .await
                .is_some_and(|s| s.exists() && s.visible),
            Self::Clickable => probe(driver, ctx, selector)
                .await
                .is_some_and(|s| s.clickable()),
            Self::Hidden => probe(driver, ctx, selector)
                .await
                .is_some_and(|s| !s.exists() || !s.visible),
            Self::Enabled => probe(driver, ctx, selector)
                .await
                .is_some_and(|s| s.exists() && s.enabled),
            Self::TextEquals(expected) => driver
                .text(ctx, selector)
                .await
                .is_ok_and(|t| t.trim() == expected.trim()),
            Self::TextContains(part) => driver
                .text(ctx, selector)
                .await
                .is_ok_and(|t| t.contains(part.as_str())),
            Self::AttributeEquals { name, value } => driver
                .attribute(ctx, selector, name)
                .await
                .is_ok_and(|v| v.as_deref() == Some(value.as_str())),
            Self::CountAtLeast(n) => probe(driver, ctx, selector)
                .await
                .is_some_and(|s| s.count >= *n),
        }
    }
}

async fn probe<D>(
    driver: &D,
    ctx: &SessionContext,
    selector: &Selector,
) -> Option<crate::driver::ElementState>
where
    D: BrowserDriver + ?Sized,
{
    driver.probe(ctx, selector).await.ok()
}

impl fmt::Display for ElementCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exists => f.write_str("present"),
            Self::Visible => f.write_str("visible"),
            Self::Clickable => f.write_str("clickable"),
            Self::Hidden => f.write_str("hidden"),
            Self::Enabled => f.write_str("enabled"),
            Self::TextEquals(t) => write!(f, "showing text '{t}'"),
            Self::TextContains(t) => write!(f, "containing text '{t}'"),
            Self::AttributeEquals { name, value } => write!(f, "having {name}='{value}'"),
            Self::CountAtLeast(n) => write!(f, "matched at least {n} times"),
        }
    }
}

// =============================================================================
// WAIT RESULT
// =============================================================================

/// Result of a wait operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitResult {
    /// Whether the wait was successful
    pub success: bool,
    /// Time spent waiting
    pub elapsed: Duration,
    /// Description of what was waited for
    pub waited_for: String,
}

impl WaitResult {
    /// Create a successful wait result
    #[must_use]
    pub fn success(elapsed: Duration, waited_for: impl Into<String>) -> Self {
        Self {
            success: true,
            elapsed,
            waited_for: waited_for.into(),
        }
    }

    /// Create a timeout wait result
    #[must_use]
    pub fn timeout(elapsed: Duration, waited_for: impl Into<String>) -> Self {
        Self {
            success: false,
            elapsed,
            waited_for: waited_for.into(),
        }
    }
}

// =============================================================================
// WAITER IMPLEMENTATION
// =============================================================================

/// Polls a probe until it succeeds or the deadline passes
#[derive(Debug, Clone, Copy, Default)]
pub struct Waiter {
    options: WaitOptions,
}

impl Waiter {
    /// Create a waiter with the given options
    #[must_use]
    pub const fn new(options: WaitOptions) -> Self {
        Self { options }
    }

    /// Options in use
    #[must_use]
    pub const fn options(&self) -> WaitOptions {
        self.options
    }

    /// Poll `check` until it returns `true`
    pub async fn until<F, Fut>(&self, waited_for: impl Into<String>, mut check: F) -> WaitResult
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = bool>,
    {
        let waited_for = waited_for.into();
        match self.until_some(|| {
            let fut = check();
            async move { fut.await.then_some(()) }
        })
        .await
        {
            Ok((elapsed, ())) => WaitResult::success(elapsed, waited_for),
            Err(elapsed) => WaitResult::timeout(elapsed, waited_for),
        }
    }

    /// Poll `check` until it yields a value
    ///
    /// Returns the value with the time taken, or the elapsed time on timeout.
    pub async fn until_some<T, F, Fut>(&self, mut check: F) -> Result<(Duration, T), Duration>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        let start = Instant::now();
        loop {
            if let Some(value) = check().await {
                return Ok((start.elapsed(), value));
            }
            let elapsed = start.elapsed();
            if elapsed >= self.options.timeout {
                return Err(elapsed);
            }
            let remaining = self.options.timeout - elapsed;
            tokio::time::sleep(self.options.poll_interval.min(remaining)).await;
        }
    }

    /// Poll an element condition
    pub async fn for_element<D>(
        &self,
        driver: &D,
        ctx: &SessionContext,
        selector: &Selector,
        condition: &ElementCondition,
    ) -> WaitResult
    where
        D: BrowserDriver + ?Sized,
    {
        self.until(format!("{selector} {condition}"), move || {
            condition.is_met(driver, ctx, selector)
        })
        .await
    }

    /// Poll `document.readyState`
    pub async fn for_load_state<D>(
        &self,
        driver: &D,
        ctx: &SessionContext,
        state: LoadState,
    ) -> WaitResult
    where
        D: BrowserDriver + ?Sized,
    {
        self.until(format!("page {state}"), move || async move {
            driver
                .ready_state(ctx)
                .await
                .is_ok_and(|s| state.is_reached(&s))
        })
        .await
    }

    /// Poll `probe` until two consecutive readings agree
    ///
    /// Used by workflows that must let a re-rendering list settle before
    /// reading it. Returns the settled reading, or `None` on timeout.
    pub async fn settle<T, F, Fut>(&self, mut probe: F) -> Option<T>
    where
        T: PartialEq + Clone,
        F: FnMut() -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        let start = Instant::now();
        let mut last: Option<T> = None;
        loop {
            let current = probe().await;
            if let (Some(a), Some(b)) = (&last, &current) {
                if a == b {
                    return current;
                }
            }
            last = current;
            let elapsed = start.elapsed();
            if elapsed >= self.options.timeout {
                return None;
            }
            let remaining = self.options.timeout - elapsed;
            tokio::time::sleep(self.options.poll_interval.min(remaining)).await;
        }
    }
}
