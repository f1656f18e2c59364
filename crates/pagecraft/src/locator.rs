//! Locators: selector strings classified once, resolved on every use.
//!
//! A locator never caches a resolved node. Each driver call receives the
//! selector and looks it up again, so DOM re-renders between calls are seen
//! as a fresh lookup rather than a stale handle.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Separator used in the raw form of a scoped selector
pub const SCOPE_SEPARATOR: &str = " >> ";

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Selector {
    /// CSS selector (e.g., "button.primary")
    Css(String),
    /// XPath selector
    XPath(String),
    /// Elements whose normalized own text equals the value
    Text(String),
    /// Test ID selector (data-testid attribute)
    TestId(String),
    /// Child selector evaluated inside every match of the parent
    Within {
        /// Container selector
        parent: Box<Selector>,
        /// Selector evaluated relative to the container
        child: Box<Selector>,
    },
}

impl Selector {
    /// Classify a raw locator string
    ///
    /// Strings starting with `/`, `./` or `(` are XPath; `text=` and
    /// `testid=` prefixes select by text or test id; ` >> ` scopes the right
    /// side inside the left; everything else is CSS.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if let Some((parent, child)) = raw.split_once(SCOPE_SEPARATOR) {
            return Self::within(Self::parse(parent), Self::parse(child));
        }
        let trimmed = raw.trim();
        if let Some(text) = trimmed.strip_prefix("text=") {
            Self::Text(text.to_string())
        } else if let Some(id) = trimmed.strip_prefix("testid=") {
            Self::TestId(id.to_string())
        } else if trimmed.starts_with('/') || trimmed.starts_with("./") || trimmed.starts_with('(')
        {
            Self::XPath(trimmed.to_string())
        } else {
            Self::Css(trimmed.to_string())
        }
    }

    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create an XPath selector
    #[must_use]
    pub fn xpath(selector: impl Into<String>) -> Self {
        Self::XPath(selector.into())
    }

    /// Create a text selector
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Create a test ID selector
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::TestId(id.into())
    }

    /// Scope `child` inside `parent`
    #[must_use]
    pub fn within(parent: Self, child: Self) -> Self {
        Self::Within {
            parent: Box::new(parent),
            child: Box::new(child),
        }
    }

    /// Whether this selector is evaluated as XPath
    #[must_use]
    pub const fn is_xpath(&self) -> bool {
        matches!(self, Self::XPath(_) | Self::Text(_))
    }

    /// The raw string form, stable and parseable back with [`Selector::parse`]
    #[must_use]
    pub fn raw(&self) -> String {
        match self {
            Self::Css(s) | Self::XPath(s) => s.clone(),
            Self::Text(t) => format!("text={t}"),
            Self::TestId(id) => format!("testid={id}"),
            Self::Within { parent, child } => {
                format!("{}{SCOPE_SEPARATOR}{}", parent.raw(), child.raw())
            }
        }
    }

    /// Expression the browser evaluates: CSS or XPath text
    ///
    /// For `Within` this is the child's expression; callers resolve the
    /// parent first.
    #[must_use]
    pub fn expression(&self) -> String {
        match self {
            Self::Css(s) | Self::XPath(s) => s.clone(),
            Self::Text(t) => format!(".//*[normalize-space(text())={}]", xpath_literal(t)),
            Self::TestId(id) => format!("[data-testid=\"{}\"]", id.replace('"', "\\\"")),
            Self::Within { child, .. } => child.expression(),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw())
    }
}

impl From<&str> for Selector {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

/// Quote a string for use inside an XPath expression
fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        format!("'{value}'")
    } else if !value.contains('"') {
        format!("\"{value}\"")
    } else {
        let parts: Vec<String> = value.split('\'').map(|p| format!("'{p}'")).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

/// A selector plus an optional timeout override
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    selector: Selector,
    timeout: Option<Duration>,
}

impl Locator {
    /// Create a locator from a raw string
    #[must_use]
    pub fn new(raw: &str) -> Self {
        Self::from_selector(Selector::parse(raw))
    }

    /// Create a locator from an already classified selector
    #[must_use]
    pub const fn from_selector(selector: Selector) -> Self {
        Self {
            selector,
            timeout: None,
        }
    }

    /// Override the wait timeout for this locator
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Locator for `child` scoped inside this one
    #[must_use]
    pub fn child(&self, child: &str) -> Self {
        Self {
            selector: Selector::within(self.selector.clone(), Selector::parse(child)),
            timeout: self.timeout,
        }
    }

    /// The selector
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Timeout override, if any
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.selector.fmt(f)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod selector_tests {
        use super::*;

        #[test]
        fn test_css_is_default() {
            assert_eq!(Selector::parse("button.primary"), Selector::css("button.primary"));
            assert_eq!(Selector::parse("  #id "), Selector::css("#id"));
        }

        #[test]
        fn test_xpath_detection() {
            assert!(Selector::parse("//div[@id='x']").is_xpath());
            assert!(Selector::parse("(//li)[2]").is_xpath());
            assert!(Selector::parse("./span").is_xpath());
            assert!(!Selector::parse("div > span").is_xpath());
        }

        #[test]
        fn test_prefixed_forms() {
            assert_eq!(Selector::parse("text=Search"), Selector::text("Search"));
            assert_eq!(Selector::parse("testid=submit"), Selector::test_id("submit"));
        }

        #[test]
        fn test_raw_round_trips() {
            for raw in ["#a", "//b", "text=Hello", "testid=x", "nav.crumbs >> li"] {
                assert_eq!(Selector::parse(raw).raw(), raw);
            }
        }

        #[test]
        fn test_within_parses_both_sides() {
            let sel = Selector::parse("ul.pages >> //li");
            match sel {
                Selector::Within { parent, child } => {
                    assert_eq!(*parent, Selector::css("ul.pages"));
                    assert_eq!(*child, Selector::xpath("//li"));
                }
                other => panic!("unexpected {other:?}"),
            }
        }

        #[test]
        fn test_text_expression_quotes() {
            assert_eq!(
                Selector::text("Go").expression(),
                ".//*[normalize-space(text())='Go']"
            );
            assert_eq!(
                Selector::text("it's").expression(),
                ".//*[normalize-space(text())=\"it's\"]"
            );
            assert!(Selector::text("a'b\"c").expression().contains("concat("));
        }

        #[test]
        fn test_test_id_expression() {
            assert_eq!(Selector::test_id("go").expression(), "[data-testid=\"go\"]");
        }
    }

    mod locator_tests {
        use super::*;

        #[test]
        fn test_timeout_override() {
            let loc = Locator::new("#a").with_timeout(Duration::from_secs(2));
            assert_eq!(loc.timeout(), Some(Duration::from_secs(2)));
            assert_eq!(Locator::new("#a").timeout(), None);
        }

        #[test]
        fn test_child_scopes_and_keeps_timeout() {
            let loc = Locator::new("nav").with_timeout(Duration::from_secs(1));
            let child = loc.child("li");
            assert_eq!(child.to_string(), "nav >> li");
            assert_eq!(child.timeout(), Some(Duration::from_secs(1)));
        }
    }
}
