//! Browser Driver Abstraction
//!
//! Every element and page operation goes through [`BrowserDriver`]. Two
//! implementations ship with the crate: [`crate::mock::MockDriver`], an
//! in-memory scripted DOM for deterministic tests, and the Chromium backend
//! behind the `browser` feature.
//!
//! Calls never hold a resolved node. Each one names a [`Selector`] and the
//! [`SessionContext`] (tab plus frame path) it acts in, and the driver
//! resolves the selector afresh.

use crate::locator::Selector;
use crate::result::PageResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Where a driver call acts: a tab index and a stack of frame selectors
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SessionContext {
    /// Zero-based tab index in opening order
    pub tab: usize,
    /// Frames entered from the tab's top document, outermost first
    pub frames: Vec<Selector>,
}

impl SessionContext {
    /// Top-level document of the given tab
    #[must_use]
    pub const fn tab(tab: usize) -> Self {
        Self {
            tab,
            frames: Vec::new(),
        }
    }

    /// Derived context one frame deeper, leaving `self` untouched
    #[must_use]
    pub fn with_frame(&self, frame: Selector) -> Self {
        let mut frames = self.frames.clone();
        frames.push(frame);
        Self {
            tab: self.tab,
            frames,
        }
    }

    /// Whether this context targets a top-level document
    #[must_use]
    pub fn is_top_level(&self) -> bool {
        self.frames.is_empty()
    }
}

impl fmt::Display for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab {}", self.tab)?;
        for frame in &self.frames {
            write!(f, " / frame {frame}")?;
        }
        Ok(())
    }
}

/// Snapshot of the first node matching a selector
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementState {
    /// Number of matching nodes
    pub count: usize,
    /// First match is rendered and visible
    pub visible: bool,
    /// First match is enabled
    pub enabled: bool,
    /// First match is a checked checkbox/radio or carries `aria-checked="true"`
    pub checked: bool,
    /// First match is read-only
    pub readonly: bool,
}

impl ElementState {
    /// State reported when nothing matches
    #[must_use]
    pub fn absent() -> Self {
        Self::default()
    }

    /// At least one node matched
    #[must_use]
    pub const fn exists(&self) -> bool {
        self.count > 0
    }

    /// Visible and enabled
    #[must_use]
    pub const fn clickable(&self) -> bool {
        self.count > 0 && self.visible && self.enabled
    }
}

/// Mouse click variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClickKind {
    /// Primary button single click
    Single,
    /// Primary button double click
    Double,
    /// Secondary button (context menu) click
    Context,
}

impl ClickKind {
    /// Name used in logs and call history
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Single => "click",
            Self::Double => "double_click",
            Self::Context => "right_click",
        }
    }
}

/// Keys that can be pressed on an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Enter / Return
    Enter,
    /// Tab
    Tab,
    /// Space bar
    Space,
    /// Escape
    Escape,
    /// Backspace
    Backspace,
    /// Arrow up
    ArrowUp,
    /// Arrow down
    ArrowDown,
}

impl Key {
    /// DOM `KeyboardEvent.key` value
    #[must_use]
    pub const fn dom_key(&self) -> &'static str {
        match self {
            Self::Enter => "Enter",
            Self::Tab => "Tab",
            Self::Space => " ",
            Self::Escape => "Escape",
            Self::Backspace => "Backspace",
            Self::ArrowUp => "ArrowUp",
            Self::ArrowDown => "ArrowDown",
        }
    }

    /// DOM `KeyboardEvent.code` value
    #[must_use]
    pub const fn dom_code(&self) -> &'static str {
        match self {
            Self::Enter => "Enter",
            Self::Tab => "Tab",
            Self::Space => "Space",
            Self::Escape => "Escape",
            Self::Backspace => "Backspace",
            Self::ArrowUp => "ArrowUp",
            Self::ArrowDown => "ArrowDown",
        }
    }

    /// Windows virtual key code
    #[must_use]
    pub const fn key_code(&self) -> i64 {
        match self {
            Self::Enter => 13,
            Self::Tab => 9,
            Self::Space => 32,
            Self::Escape => 27,
            Self::Backspace => 8,
            Self::ArrowUp => 38,
            Self::ArrowDown => 40,
        }
    }

    /// Text produced by the key press, if any
    #[must_use]
    pub const fn text(&self) -> Option<&'static str> {
        match self {
            Self::Enter => Some("\r"),
            Self::Space => Some(" "),
            _ => None,
        }
    }
}

/// One `<option>` of a select element
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    /// Visible text, trimmed
    pub text: String,
    /// `value` attribute
    pub value: String,
    /// Currently selected
    pub selected: bool,
    /// Disabled options cannot be selected
    pub disabled: bool,
}

impl SelectOption {
    /// Option whose value equals its text
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            value: text.clone(),
            text,
            selected: false,
            disabled: false,
        }
    }

    /// Option with a distinct value
    #[must_use]
    pub fn with_value(text: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            value: value.into(),
            selected: false,
            disabled: false,
        }
    }

    /// Mark the option selected
    #[must_use]
    pub const fn selected(mut self) -> Self {
        self.selected = true;
        self
    }

    /// Mark the option disabled
    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }
}

/// How an option is picked out of a select element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionMatch {
    /// Exact visible text
    Text(String),
    /// Exact `value` attribute
    Value(String),
    /// Zero-based position in rendered order
    Index(usize),
}

impl OptionMatch {
    /// Position of the matching option in `options`
    #[must_use]
    pub fn position(&self, options: &[SelectOption]) -> Option<usize> {
        match self {
            Self::Text(text) => options.iter().position(|o| o.text == *text),
            Self::Value(value) => options.iter().position(|o| o.value == *value),
            Self::Index(i) => (*i < options.len()).then_some(*i),
        }
    }
}

impl fmt::Display for OptionMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(t) => write!(f, "text '{t}'"),
            Self::Value(v) => write!(f, "value '{v}'"),
            Self::Index(i) => write!(f, "index {i}"),
        }
    }
}

/// Browser driver trait for abstracting over implementations
///
/// Element operations act on the first match of the selector unless the
/// method says otherwise. A selector matching nothing fails with
/// [`crate::PageError::ElementNotFound`]; a node detached mid-call fails
/// with [`crate::PageError::StaleElement`].
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Navigate the context's tab to a URL
    async fn navigate(&self, ctx: &SessionContext, url: &str) -> PageResult<()>;

    /// Current URL of the tab
    async fn current_url(&self, ctx: &SessionContext) -> PageResult<String>;

    /// Document title of the tab
    async fn title(&self, ctx: &SessionContext) -> PageResult<String>;

    /// Reload the tab
    async fn reload(&self, ctx: &SessionContext) -> PageResult<()>;

    /// History back
    async fn go_back(&self, ctx: &SessionContext) -> PageResult<()>;

    /// History forward
    async fn go_forward(&self, ctx: &SessionContext) -> PageResult<()>;

    /// Evaluate a script in the context's document and return its JSON value
    async fn execute_js(&self, ctx: &SessionContext, script: &str)
        -> PageResult<serde_json::Value>;

    /// Evaluate a function body with the first match bound to `el`
    async fn evaluate_on(
        &self,
        ctx: &SessionContext,
        selector: &Selector,
        body: &str,
    ) -> PageResult<serde_json::Value>;

    /// `document.readyState` of the context's document
    async fn ready_state(&self, ctx: &SessionContext) -> PageResult<String>;

    /// Snapshot of the selector's matches; never fails for zero matches
    async fn probe(&self, ctx: &SessionContext, selector: &Selector) -> PageResult<ElementState>;

    /// Click the first match
    async fn click(&self, ctx: &SessionContext, selector: &Selector, kind: ClickKind)
        -> PageResult<()>;

    /// Click the match at `index`
    async fn click_nth(&self, ctx: &SessionContext, selector: &Selector, index: usize)
        -> PageResult<()>;

    /// Move the pointer over the first match
    async fn hover(&self, ctx: &SessionContext, selector: &Selector) -> PageResult<()>;

    /// Focus the first match
    async fn focus(&self, ctx: &SessionContext, selector: &Selector) -> PageResult<()>;

    /// Scroll the first match into view
    async fn scroll_into_view(&self, ctx: &SessionContext, selector: &Selector) -> PageResult<()>;

    /// Empty a text field
    async fn clear(&self, ctx: &SessionContext, selector: &Selector) -> PageResult<()>;

    /// Type text at the end of the field's current content
    async fn type_text(&self, ctx: &SessionContext, selector: &Selector, text: &str)
        -> PageResult<()>;

    /// Assign the `value` property and fire `input` and `change`
    async fn set_value(&self, ctx: &SessionContext, selector: &Selector, value: &str)
        -> PageResult<()>;

    /// Press a key with the first match focused
    async fn press_key(&self, ctx: &SessionContext, selector: &Selector, key: Key)
        -> PageResult<()>;

    /// Visible text; form fields report their value
    async fn text(&self, ctx: &SessionContext, selector: &Selector) -> PageResult<String>;

    /// Text of every match, in document order
    async fn texts(&self, ctx: &SessionContext, selector: &Selector) -> PageResult<Vec<String>>;

    /// `value` property of the first match
    async fn value(&self, ctx: &SessionContext, selector: &Selector) -> PageResult<String>;

    /// Attribute of the first match, `None` when absent
    async fn attribute(
        &self,
        ctx: &SessionContext,
        selector: &Selector,
        name: &str,
    ) -> PageResult<Option<String>>;

    /// Attribute of every match, in document order
    async fn attributes(
        &self,
        ctx: &SessionContext,
        selector: &Selector,
        name: &str,
    ) -> PageResult<Vec<Option<String>>>;

    /// Computed style property of the first match
    async fn css_value(
        &self,
        ctx: &SessionContext,
        selector: &Selector,
        property: &str,
    ) -> PageResult<String>;

    /// Options of a select element in rendered order
    async fn options(&self, ctx: &SessionContext, selector: &Selector)
        -> PageResult<Vec<SelectOption>>;

    /// Select one option; single selects drop their previous selection
    async fn select_option(
        &self,
        ctx: &SessionContext,
        selector: &Selector,
        option: &OptionMatch,
    ) -> PageResult<()>;

    /// Deselect one option, or every option when `option` is `None`
    async fn deselect_option(
        &self,
        ctx: &SessionContext,
        selector: &Selector,
        option: Option<&OptionMatch>,
    ) -> PageResult<()>;

    /// Attach local files to a file input
    async fn upload_files(
        &self,
        ctx: &SessionContext,
        selector: &Selector,
        paths: &[PathBuf],
    ) -> PageResult<()>;

    /// PNG screenshot of the tab's viewport
    async fn screenshot(&self, ctx: &SessionContext) -> PageResult<Vec<u8>>;

    /// Number of open tabs
    async fn tab_count(&self) -> PageResult<usize>;

    /// Close the tab at `index`; later tabs shift down by one
    async fn close_tab(&self, index: usize) -> PageResult<()>;

    /// Shut the browser down
    async fn close(&self) -> PageResult<()>;
}
