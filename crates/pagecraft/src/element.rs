//! Named elements.
//!
//! An [`Element`] is a locator, a display name used in logs and errors, a
//! kind tag and a capability set. It holds no node handle: every call goes
//! to the driver with the selector and the session's current context.
//!
//! Queries such as [`Element::exists`] never fail; a lookup error is logged
//! and reported as `false`. Actions wait for their precondition (visible,
//! clickable or present) up to the element timeout, then run once under the
//! stale-element retry policy.

use crate::driver::{BrowserDriver, ClickKind, ElementState};
use crate::locator::{Locator, Selector};
use crate::result::{PageError, PageResult};
use crate::session::Session;
use crate::wait::{ElementCondition, WaitResult};
use std::fmt;
use std::future::Future;
use std::ops::BitOr;
use std::time::Duration;
use tracing::{debug, error, info, warn};

// =============================================================================
// CAPABILITIES
// =============================================================================

/// Families of operations an element supports beyond the common ones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Capabilities(u16);

impl Capabilities {
    /// Only the common operations
    pub const NONE: Self = Self(0);
    /// Editable text
    pub const TEXT: Self = Self(1);
    /// Option lists
    pub const OPTIONS: Self = Self(1 << 1);
    /// More than one option selected at once
    pub const MULTI_SELECT: Self = Self(1 << 2);
    /// Checked / unchecked state
    pub const CHECKED: Self = Self(1 << 3);
    /// Numeric range with min, max and step
    pub const RANGE: Self = Self(1 << 4);
    /// Local file attachment
    pub const FILES: Self = Self(1 << 5);
    /// Keyboard input
    pub const KEYS: Self = Self(1 << 6);

    const NAMES: [(Self, &'static str); 7] = [
        (Self::TEXT, "text"),
        (Self::OPTIONS, "options"),
        (Self::MULTI_SELECT, "multi-select"),
        (Self::CHECKED, "checked state"),
        (Self::RANGE, "range"),
        (Self::FILES, "files"),
        (Self::KEYS, "keys"),
    ];

    /// Whether every capability in `other` is present
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Union of two sets
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Set without the capabilities in `other`
    #[must_use]
    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }
}

impl BitOr for Capabilities {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = Self::NAMES
            .iter()
            .filter(|(cap, _)| self.contains(*cap))
            .map(|(_, name)| *name)
            .collect();
        if names.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&names.join(", "))
        }
    }
}

// =============================================================================
// ELEMENT KIND
// =============================================================================

/// What an element represents on the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ElementKind {
    /// Anything without a more specific kind
    #[default]
    Element,
    /// Static text
    Label,
    /// Button or link acting as one
    Button,
    /// Text input or textarea
    TextBox,
    /// Single-choice `<select>`
    Dropdown,
    /// Multi-choice `<select multiple>`
    ListBox,
    /// Checkbox
    CheckBox,
    /// Radio button
    RadioButton,
    /// On/off switch
    Toggle,
    /// Range input
    Slider,
    /// Date input or calendar trigger
    DatePicker,
    /// Rich text editor host
    RichTextEditor,
    /// File input
    FileUpload,
    /// Control that starts a download
    FileDownload,
    /// Image
    Image,
    /// Repeated items matched by one locator
    Collection,
}

impl ElementKind {
    /// Kind for a type name used in locator files
    ///
    /// Unknown names return `None`; callers fall back to [`ElementKind::Element`].
    #[must_use]
    pub fn from_type_name(name: &str) -> Option<Self> {
        let kind = match name.trim() {
            "Element" | "BaseElement" => Self::Element,
            "Label" => Self::Label,
            "Button" => Self::Button,
            "TextBox" => Self::TextBox,
            "Dropdown" => Self::Dropdown,
            "ListBox" => Self::ListBox,
            "CheckBox" | "Checkbox" => Self::CheckBox,
            "RadioButton" => Self::RadioButton,
            "Toggle" | "ToggleSwitch" => Self::Toggle,
            "Slider" => Self::Slider,
            "DatePicker" => Self::DatePicker,
            "RichTextEditor" => Self::RichTextEditor,
            "FileUpload" => Self::FileUpload,
            "FileDownload" | "FileDownloadButton" => Self::FileDownload,
            "Image" => Self::Image,
            "ElementCollection" | "Collection" => Self::Collection,
            _ => return None,
        };
        Some(kind)
    }

    /// Capabilities elements of this kind start with
    #[must_use]
    pub const fn capabilities(&self) -> Capabilities {
        match self {
            Self::TextBox | Self::RichTextEditor => {
                Capabilities::TEXT.union(Capabilities::KEYS)
            }
            Self::Dropdown => Capabilities::OPTIONS,
            Self::ListBox => Capabilities::OPTIONS.union(Capabilities::MULTI_SELECT),
            Self::CheckBox | Self::RadioButton | Self::Toggle => Capabilities::CHECKED,
            Self::Slider => Capabilities::RANGE.union(Capabilities::KEYS),
            Self::DatePicker => Capabilities::TEXT,
            Self::FileUpload => Capabilities::FILES,
            Self::Button => Capabilities::KEYS,
            Self::Element
            | Self::Label
            | Self::FileDownload
            | Self::Image
            | Self::Collection => Capabilities::NONE,
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// =============================================================================
// ELEMENT
// =============================================================================

/// A named, locator-backed page element
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Element {
    locator: Locator,
    name: String,
    kind: ElementKind,
    capabilities: Capabilities,
}

impl Element {
    /// Generic element
    #[must_use]
    pub fn new(locator: &str, name: &str) -> Self {
        Self::of_kind(ElementKind::Element, locator, name)
    }

    /// Element of a given kind with that kind's capabilities
    #[must_use]
    pub fn of_kind(kind: ElementKind, locator: &str, name: &str) -> Self {
        Self::from_locator(kind, Locator::new(locator), name)
    }

    /// Element from an already built locator
    #[must_use]
    pub fn from_locator(kind: ElementKind, locator: Locator, name: &str) -> Self {
        Self {
            locator,
            name: name.to_string(),
            kind,
            capabilities: kind.capabilities(),
        }
    }

    /// Text input
    #[must_use]
    pub fn text_box(locator: &str, name: &str) -> Self {
        Self::of_kind(ElementKind::TextBox, locator, name)
    }

    /// Button
    #[must_use]
    pub fn button(locator: &str, name: &str) -> Self {
        Self::of_kind(ElementKind::Button, locator, name)
    }

    /// Static text
    #[must_use]
    pub fn label(locator: &str, name: &str) -> Self {
        Self::of_kind(ElementKind::Label, locator, name)
    }

    /// Single-choice select
    #[must_use]
    pub fn dropdown(locator: &str, name: &str) -> Self {
        Self::of_kind(ElementKind::Dropdown, locator, name)
    }

    /// Multi-choice select
    #[must_use]
    pub fn list_box(locator: &str, name: &str) -> Self {
        Self::of_kind(ElementKind::ListBox, locator, name)
    }

    /// Checkbox
    #[must_use]
    pub fn checkbox(locator: &str, name: &str) -> Self {
        Self::of_kind(ElementKind::CheckBox, locator, name)
    }

    /// Radio button
    #[must_use]
    pub fn radio(locator: &str, name: &str) -> Self {
        Self::of_kind(ElementKind::RadioButton, locator, name)
    }

    /// On/off switch
    #[must_use]
    pub fn toggle(locator: &str, name: &str) -> Self {
        Self::of_kind(ElementKind::Toggle, locator, name)
    }

    /// Range slider
    #[must_use]
    pub fn slider(locator: &str, name: &str) -> Self {
        Self::of_kind(ElementKind::Slider, locator, name)
    }

    /// File input
    #[must_use]
    pub fn file_upload(locator: &str, name: &str) -> Self {
        Self::of_kind(ElementKind::FileUpload, locator, name)
    }

    /// Repeated items
    #[must_use]
    pub fn collection(locator: &str, name: &str) -> Self {
        Self::of_kind(ElementKind::Collection, locator, name)
    }

    /// Replace the capability set
    #[must_use]
    pub const fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Add capabilities
    #[must_use]
    pub const fn with_capability(mut self, capability: Capabilities) -> Self {
        self.capabilities = self.capabilities.union(capability);
        self
    }

    /// Override the wait timeout for this element
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.locator = self.locator.with_timeout(timeout);
        self
    }

    /// Element located inside this one
    #[must_use]
    pub fn child(&self, kind: ElementKind, locator: &str, name: &str) -> Self {
        Self::from_locator(kind, self.locator.child(locator), name)
    }

    /// Locator
    #[must_use]
    pub const fn locator(&self) -> &Locator {
        &self.locator
    }

    /// Selector
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        self.locator.selector()
    }

    /// Display name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kind
    #[must_use]
    pub const fn kind(&self) -> ElementKind {
        self.kind
    }

    /// Capability set
    #[must_use]
    pub const fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Fail with [`PageError::Unsupported`] unless `capability` is present
    pub fn require(&self, capability: Capabilities) -> PageResult<()> {
        if self.capabilities.contains(capability) {
            Ok(())
        } else {
            Err(PageError::Unsupported {
                element: self.name.clone(),
                capability: capability.to_string(),
            })
        }
    }

    // =========================================================================
    // Passive queries
    // =========================================================================

    async fn state<D: BrowserDriver>(&self, session: &Session<D>) -> Option<ElementState> {
        match session
            .driver()
            .probe(session.context(), self.selector())
            .await
        {
            Ok(state) => Some(state),
            Err(e) => {
                warn!(element = %self.name, error = %e, "Element lookup failed");
                None
            }
        }
    }

    /// At least one node matches
    pub async fn exists<D: BrowserDriver>(&self, session: &Session<D>) -> bool {
        self.state(session).await.is_some_and(|s| s.exists())
    }

    /// First match is visible
    pub async fn is_visible<D: BrowserDriver>(&self, session: &Session<D>) -> bool {
        self.state(session)
            .await
            .is_some_and(|s| s.exists() && s.visible)
    }

    /// First match is enabled
    pub async fn is_enabled<D: BrowserDriver>(&self, session: &Session<D>) -> bool {
        self.state(session)
            .await
            .is_some_and(|s| s.exists() && s.enabled)
    }

    /// First match exists and is disabled
    pub async fn is_disabled<D: BrowserDriver>(&self, session: &Session<D>) -> bool {
        self.state(session)
            .await
            .is_some_and(|s| s.exists() && !s.enabled)
    }

    /// First match exists and is read-only
    pub async fn is_read_only<D: BrowserDriver>(&self, session: &Session<D>) -> bool {
        self.state(session)
            .await
            .is_some_and(|s| s.exists() && s.readonly)
    }

    /// First match is checked (checkbox, radio or `aria-checked`)
    pub async fn is_checked<D: BrowserDriver>(&self, session: &Session<D>) -> bool {
        self.state(session)
            .await
            .is_some_and(|s| s.exists() && s.checked)
    }

    /// Number of matches; `0` on lookup errors
    pub async fn count<D: BrowserDriver>(&self, session: &Session<D>) -> usize {
        self.state(session).await.map_or(0, |s| s.count)
    }

    /// First match carries the CSS class
    pub async fn has_class<D: BrowserDriver>(&self, session: &Session<D>, class: &str) -> bool {
        match session
            .driver()
            .attribute(session.context(), self.selector(), "class")
            .await
        {
            Ok(classes) => classes.is_some_and(|c| c.split_whitespace().any(|c| c == class)),
            Err(e) => {
                warn!(element = %self.name, error = %e, "Class lookup failed");
                false
            }
        }
    }

    // =========================================================================
    // Waits
    // =========================================================================

    /// Wait for a condition up to this element's timeout
    ///
    /// # Errors
    ///
    /// [`PageError::Timeout`] naming the element and the condition.
    pub async fn wait_for<D: BrowserDriver>(
        &self,
        session: &Session<D>,
        condition: &ElementCondition,
    ) -> PageResult<WaitResult> {
        let result = session.wait_for(&self.locator, condition).await;
        if result.success {
            debug!(
                element = %self.name,
                condition = %condition,
                elapsed_ms = result.elapsed.as_millis() as u64,
                "Condition met"
            );
            Ok(result)
        } else {
            let timeout_ms = session.element_waiter(&self.locator).options().timeout_ms();
            warn!(element = %self.name, condition = %condition, timeout_ms, "Condition not met");
            Err(PageError::Timeout {
                element: self.name.clone(),
                condition: condition.to_string(),
                timeout_ms,
            })
        }
    }

    /// Wait until visible
    pub async fn wait_for_visible<D: BrowserDriver>(
        &self,
        session: &Session<D>,
    ) -> PageResult<WaitResult> {
        self.wait_for(session, &ElementCondition::Visible).await
    }

    /// Wait until visible and enabled
    pub async fn wait_for_clickable<D: BrowserDriver>(
        &self,
        session: &Session<D>,
    ) -> PageResult<WaitResult> {
        self.wait_for(session, &ElementCondition::Clickable).await
    }

    /// Wait until present in the DOM
    pub async fn wait_for_exists<D: BrowserDriver>(
        &self,
        session: &Session<D>,
    ) -> PageResult<WaitResult> {
        self.wait_for(session, &ElementCondition::Exists).await
    }

    /// Wait until gone or invisible
    pub async fn wait_for_hidden<D: BrowserDriver>(
        &self,
        session: &Session<D>,
    ) -> PageResult<WaitResult> {
        self.wait_for(session, &ElementCondition::Hidden).await
    }

    /// Wait until the trimmed text equals `text`
    pub async fn wait_for_text<D: BrowserDriver>(
        &self,
        session: &Session<D>,
        text: &str,
    ) -> PageResult<WaitResult> {
        self.wait_for(session, &ElementCondition::TextEquals(text.to_string()))
            .await
    }

    /// Wait until the text contains `part`
    pub async fn wait_for_text_contains<D: BrowserDriver>(
        &self,
        session: &Session<D>,
        part: &str,
    ) -> PageResult<WaitResult> {
        self.wait_for(session, &ElementCondition::TextContains(part.to_string()))
            .await
    }

    /// Wait until an attribute has a value
    pub async fn wait_for_attribute<D: BrowserDriver>(
        &self,
        session: &Session<D>,
        name: &str,
        value: &str,
    ) -> PageResult<WaitResult> {
        self.wait_for(
            session,
            &ElementCondition::AttributeEquals {
                name: name.to_string(),
                value: value.to_string(),
            },
        )
        .await
    }

    // =========================================================================
    // Actions
    // =========================================================================

    /// Run a driver call under the session's stale retry policy
    ///
    /// Stale element errors are retried; anything else, and exhaustion, is
    /// logged against this element and returned.
    pub async fn execute_with_retry<D, T, F, Fut>(
        &self,
        session: &Session<D>,
        description: &str,
        op: F,
    ) -> PageResult<T>
    where
        D: BrowserDriver,
        F: FnMut() -> Fut,
        Fut: Future<Output = PageResult<T>>,
    {
        let result = session.retry_policy().run(&self.name, op).await;
        if let Err(ref e) = result {
            error!(element = %self.name, action = description, error = %e, "Action failed");
        }
        result
    }

    /// Log, wait for `precondition`, run `op` with stale retry, log the outcome
    pub(crate) async fn perform<D, T, F, Fut>(
        &self,
        session: &Session<D>,
        action: &str,
        precondition: Option<ElementCondition>,
        op: F,
    ) -> PageResult<T>
    where
        D: BrowserDriver,
        F: FnMut() -> Fut,
        Fut: Future<Output = PageResult<T>>,
    {
        info!(element = %self.name, action, "Performing action");
        if let Some(condition) = precondition {
            if let Err(e) = self.wait_for(session, &condition).await {
                error!(element = %self.name, action, error = %e, "Precondition failed");
                return Err(e);
            }
        }
        let value = self.execute_with_retry(session, action, op).await?;
        debug!(element = %self.name, action, "Action succeeded");
        Ok(value)
    }

    async fn click_kind<D: BrowserDriver>(
        &self,
        session: &Session<D>,
        kind: ClickKind,
    ) -> PageResult<()> {
        let (driver, ctx, selector) = (session.driver(), session.context(), self.selector());
        self.perform(
            session,
            kind.name(),
            Some(ElementCondition::Clickable),
            move || driver.click(ctx, selector, kind),
        )
        .await
    }

    /// Click once clickable
    pub async fn click<D: BrowserDriver>(&self, session: &Session<D>) -> PageResult<()> {
        self.click_kind(session, ClickKind::Single).await
    }

    /// Double click once clickable
    pub async fn double_click<D: BrowserDriver>(&self, session: &Session<D>) -> PageResult<()> {
        self.click_kind(session, ClickKind::Double).await
    }

    /// Context click once clickable
    pub async fn right_click<D: BrowserDriver>(&self, session: &Session<D>) -> PageResult<()> {
        self.click_kind(session, ClickKind::Context).await
    }

    /// Hover once visible
    pub async fn hover<D: BrowserDriver>(&self, session: &Session<D>) -> PageResult<()> {
        let (driver, ctx, selector) = (session.driver(), session.context(), self.selector());
        self.perform(session, "hover", Some(ElementCondition::Visible), move || {
            driver.hover(ctx, selector)
        })
        .await
    }

    /// Focus once visible
    pub async fn focus<D: BrowserDriver>(&self, session: &Session<D>) -> PageResult<()> {
        let (driver, ctx, selector) = (session.driver(), session.context(), self.selector());
        self.perform(session, "focus", Some(ElementCondition::Visible), move || {
            driver.focus(ctx, selector)
        })
        .await
    }

    /// Scroll into view once visible
    pub async fn scroll_into_view<D: BrowserDriver>(&self, session: &Session<D>) -> PageResult<()> {
        let (driver, ctx, selector) = (session.driver(), session.context(), self.selector());
        self.perform(
            session,
            "scroll_into_view",
            Some(ElementCondition::Visible),
            move || driver.scroll_into_view(ctx, selector),
        )
        .await
    }

    /// Replace the field's content with `text`
    pub async fn set_text<D: BrowserDriver>(
        &self,
        session: &Session<D>,
        text: &str,
    ) -> PageResult<()> {
        let (driver, ctx, selector) = (session.driver(), session.context(), self.selector());
        self.perform(
            session,
            "set_text",
            Some(ElementCondition::Clickable),
            move || async move {
                driver.clear(ctx, selector).await?;
                driver.type_text(ctx, selector, text).await
            },
        )
        .await
    }

    /// Visible text once visible; form fields report their value
    pub async fn get_text<D: BrowserDriver>(&self, session: &Session<D>) -> PageResult<String> {
        let (driver, ctx, selector) = (session.driver(), session.context(), self.selector());
        self.perform(session, "get_text", Some(ElementCondition::Visible), move || {
            driver.text(ctx, selector)
        })
        .await
    }

    /// `value` property once present
    pub async fn get_value<D: BrowserDriver>(&self, session: &Session<D>) -> PageResult<String> {
        let (driver, ctx, selector) = (session.driver(), session.context(), self.selector());
        self.perform(session, "get_value", Some(ElementCondition::Exists), move || {
            driver.value(ctx, selector)
        })
        .await
    }

    /// Attribute once present; `None` when the attribute is absent
    pub async fn get_attribute<D: BrowserDriver>(
        &self,
        session: &Session<D>,
        name: &str,
    ) -> PageResult<Option<String>> {
        let (driver, ctx, selector) = (session.driver(), session.context(), self.selector());
        self.perform(
            session,
            "get_attribute",
            Some(ElementCondition::Exists),
            move || driver.attribute(ctx, selector, name),
        )
        .await
    }

    /// Computed style property once present
    pub async fn css_value<D: BrowserDriver>(
        &self,
        session: &Session<D>,
        property: &str,
    ) -> PageResult<String> {
        let (driver, ctx, selector) = (session.driver(), session.context(), self.selector());
        self.perform(session, "css_value", Some(ElementCondition::Exists), move || {
            driver.css_value(ctx, selector, property)
        })
        .await
    }

    /// Text of every match, without waiting; empty when nothing matches
    pub async fn texts<D: BrowserDriver>(&self, session: &Session<D>) -> PageResult<Vec<String>> {
        let (driver, ctx, selector) = (session.driver(), session.context(), self.selector());
        self.perform(session, "texts", None, move || driver.texts(ctx, selector))
            .await
    }

    /// Attribute of every match, without waiting
    pub async fn attributes<D: BrowserDriver>(
        &self,
        session: &Session<D>,
        name: &str,
    ) -> PageResult<Vec<Option<String>>> {
        let (driver, ctx, selector) = (session.driver(), session.context(), self.selector());
        self.perform(session, "attributes", None, move || {
            driver.attributes(ctx, selector, name)
        })
        .await
    }

    /// Text of the match at `index` once that many matches exist
    pub async fn nth_text<D: BrowserDriver>(
        &self,
        session: &Session<D>,
        index: usize,
    ) -> PageResult<String> {
        let (driver, ctx, selector) = (session.driver(), session.context(), self.selector());
        let texts = self
            .perform(
                session,
                "nth_text",
                Some(ElementCondition::CountAtLeast(index + 1)),
                move || driver.texts(ctx, selector),
            )
            .await?;
        texts.into_iter().nth(index).ok_or_else(|| {
            PageError::invalid_argument(format!("'{}' has no item at index {index}", self.name))
        })
    }

    /// Click the match at `index` once that many matches exist
    pub async fn click_nth<D: BrowserDriver>(
        &self,
        session: &Session<D>,
        index: usize,
    ) -> PageResult<()> {
        let (driver, ctx, selector) = (session.driver(), session.context(), self.selector());
        self.perform(
            session,
            "click_nth",
            Some(ElementCondition::CountAtLeast(index + 1)),
            move || driver.click_nth(ctx, selector, index),
        )
        .await
    }

    /// Evaluate a function body with the first match bound to `el`
    pub async fn evaluate<D: BrowserDriver>(
        &self,
        session: &Session<D>,
        body: &str,
    ) -> PageResult<serde_json::Value> {
        let (driver, ctx, selector) = (session.driver(), session.context(), self.selector());
        self.perform(session, "evaluate", Some(ElementCondition::Exists), move || {
            driver.evaluate_on(ctx, selector, body)
        })
        .await
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.name, self.locator)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::{MockDriver, MockElement};

    mod capability_tests {
        use super::*;

        #[test]
        fn test_kind_capabilities() {
            assert!(ElementKind::TextBox.capabilities().contains(Capabilities::TEXT));
            assert!(ElementKind::ListBox
                .capabilities()
                .contains(Capabilities::OPTIONS | Capabilities::MULTI_SELECT));
            assert!(!ElementKind::Dropdown
                .capabilities()
                .contains(Capabilities::MULTI_SELECT));
            assert_eq!(ElementKind::Image.capabilities(), Capabilities::NONE);
        }

        #[test]
        fn test_type_names() {
            assert_eq!(ElementKind::from_type_name("TextBox"), Some(ElementKind::TextBox));
            assert_eq!(
                ElementKind::from_type_name("ElementCollection"),
                Some(ElementKind::Collection)
            );
            assert_eq!(ElementKind::from_type_name("Spaceship"), None);
        }

        #[test]
        fn test_require_names_missing_capability() {
            let label = Element::label("#title", "Title");
            let err = label.require(Capabilities::OPTIONS).unwrap_err();
            assert_eq!(err.to_string(), "'Title' does not support options");
            let widened = label.with_capability(Capabilities::OPTIONS);
            assert!(widened.require(Capabilities::OPTIONS).is_ok());
        }

        #[test]
        fn test_display() {
            assert_eq!(Capabilities::NONE.to_string(), "none");
            assert_eq!(
                (Capabilities::TEXT | Capabilities::KEYS).to_string(),
                "text, keys"
            );
            assert_eq!(
                (Capabilities::TEXT | Capabilities::KEYS).without(Capabilities::KEYS),
                Capabilities::TEXT
            );
        }
    }

    mod element_tests {
        use super::*;

        fn session(driver: MockDriver) -> Session<MockDriver> {
            Session::new(driver)
        }

        #[tokio::test]
        async fn test_exists_is_false_not_error() {
            let s = session(MockDriver::new());
            let missing = Element::new("#nope", "Missing");
            assert!(!missing.exists(&s).await);
            assert!(!missing.is_visible(&s).await);
            assert!(!missing.is_disabled(&s).await);
            assert_eq!(missing.count(&s).await, 0);
        }

        #[tokio::test]
        async fn test_state_queries() {
            let s = session(
                MockDriver::new()
                    .with_element(MockElement::new("#ro").input("text").readonly())
                    .with_element(MockElement::new("#off").tag("button").disabled())
                    .with_element(MockElement::new("#tag").class("active").class("big")),
            );
            assert!(Element::new("#ro", "Read only").is_read_only(&s).await);
            assert!(Element::new("#off", "Off").is_disabled(&s).await);
            assert!(!Element::new("#off", "Off").is_enabled(&s).await);
            assert!(Element::new("#tag", "Tag").has_class(&s, "big").await);
            assert!(!Element::new("#tag", "Tag").has_class(&s, "bi").await);
        }

        #[tokio::test]
        async fn test_set_then_get_text() {
            let s = session(MockDriver::new().with_element(
                MockElement::new("#city").input("text").value("old"),
            ));
            let city = Element::text_box("#city", "City");
            city.set_text(&s, "Da Nang").await.unwrap();
            assert_eq!(city.get_text(&s).await.unwrap(), "Da Nang");
            assert_eq!(city.get_value(&s).await.unwrap(), "Da Nang");
        }

        #[tokio::test]
        async fn test_collection_helpers() {
            let s = session(
                MockDriver::new()
                    .with_element(MockElement::new(".hotel").text("A"))
                    .with_element(MockElement::new(".hotel").text("B")),
            );
            let hotels = Element::collection(".hotel", "Hotels");
            assert_eq!(hotels.texts(&s).await.unwrap(), vec!["A", "B"]);
            assert_eq!(hotels.nth_text(&s, 1).await.unwrap(), "B");
            hotels.click_nth(&s, 0).await.unwrap();
            assert!(s.driver().was_called("click_nth:.hotel:0"));
        }

        #[tokio::test]
        async fn test_attribute_absent_is_none() {
            let s = session(MockDriver::new().with_element(
                MockElement::new("a.more").attr("href", "/more"),
            ));
            let link = Element::new("a.more", "More");
            assert_eq!(link.get_attribute(&s, "href").await.unwrap().as_deref(), Some("/more"));
            assert_eq!(link.get_attribute(&s, "target").await.unwrap(), None);
        }

        #[tokio::test]
        async fn test_child_scopes_locator() {
            let nav = Element::new("nav.crumbs", "Breadcrumbs");
            let items = nav.child(ElementKind::Collection, "li", "Crumb");
            assert_eq!(items.locator().to_string(), "nav.crumbs >> li");
            assert_eq!(items.kind(), ElementKind::Collection);
        }
    }
}
