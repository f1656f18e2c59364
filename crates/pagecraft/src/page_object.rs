//! Page Object Model support.
//!
//! A page object is a struct of [`Element`]s plus workflow methods. The
//! [`PageObject`] trait carries what the framework needs to know about the
//! page itself: its name for logs, the URL pattern it lives at and how long it
//! may take to load. [`DynamicPage`] builds a page straight from a locator
//! file when no hand-written struct is wanted.

use crate::driver::BrowserDriver;
use crate::element::Element;
use crate::repository::LocatorRepository;
use crate::result::{PageError, PageResult};
use crate::session::Session;
use crate::wait::{WaitOptions, Waiter};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tracing::{debug, error, info};

/// Default page load allowance (30s)
pub const DEFAULT_LOAD_TIMEOUT_MS: u64 = 30_000;

/// A page or component of the UI under test
///
/// # Example
///
/// ```
/// use pagecraft::{Element, PageObject};
///
/// struct CheckoutPage {
///     guest_name: Element,
///     pay: Element,
/// }
///
/// impl PageObject for CheckoutPage {
///     fn url_pattern(&self) -> &str {
///         "/booking/:id/checkout"
///     }
///
///     fn page_name(&self) -> &str {
///         "Checkout"
///     }
/// }
/// ```
pub trait PageObject {
    /// URL path pattern of this page, e.g. `/search`, `/hotel/*/:id`
    fn url_pattern(&self) -> &str;

    /// Time the page may take to load, in milliseconds
    fn load_timeout_ms(&self) -> u64 {
        DEFAULT_LOAD_TIMEOUT_MS
    }

    /// Page name for logs and errors
    fn page_name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Matcher built from [`PageObject::url_pattern`]
    fn url_matcher(&self) -> UrlMatcher {
        UrlMatcher::new(self.url_pattern())
    }
}

/// Path portion of a URL: no scheme, host, query or fragment
#[must_use]
pub fn url_path(url: &str) -> &str {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let path = if url.contains("://") {
        without_scheme.find('/').map_or("/", |i| &without_scheme[i..])
    } else {
        without_scheme
    };
    let end = path.find(['?', '#']).unwrap_or(path.len());
    &path[..end]
}

/// Whether the session's current URL path matches the page
pub async fn is_on_page<D, P>(session: &Session<D>, page: &P) -> PageResult<bool>
where
    D: BrowserDriver,
    P: PageObject + ?Sized,
{
    let url = session.current_url().await?;
    Ok(page.url_matcher().matches(url_path(&url)))
}

/// Wait up to the page's load timeout for the URL to match it
///
/// # Errors
///
/// [`PageError::Timeout`] naming the page when the URL never matches.
pub async fn verify_on_page<D, P>(session: &Session<D>, page: &P) -> PageResult<()>
where
    D: BrowserDriver,
    P: PageObject + ?Sized,
{
    let matcher = page.url_matcher();
    let options = WaitOptions::new()
        .with_timeout(Duration::from_millis(page.load_timeout_ms()))
        .with_poll_interval(session.wait_policy().page_load.poll_interval);
    let matcher = &matcher;
    let result = Waiter::new(options)
        .until(format!("url {}", matcher.pattern()), move || async move {
            session
                .current_url()
                .await
                .is_ok_and(|url| matcher.matches(url_path(&url)))
        })
        .await;
    if result.success {
        debug!(page = page.page_name(), "On expected page");
        Ok(())
    } else {
        let current = session.current_url().await.unwrap_or_default();
        error!(
            page = page.page_name(),
            url = %current,
            pattern = matcher.pattern(),
            "Not on expected page"
        );
        Err(PageError::Timeout {
            element: page.page_name().to_string(),
            condition: format!("at {}", matcher.pattern()),
            timeout_ms: page.load_timeout_ms(),
        })
    }
}

// =============================================================================
// DYNAMIC PAGES
// =============================================================================

/// Page whose elements come from a locator file
#[derive(Debug, Clone)]
pub struct DynamicPage {
    name: String,
    url_pattern: String,
    load_timeout_ms: u64,
    elements: BTreeMap<String, Element>,
}

impl DynamicPage {
    /// Build every element `page` defines in `file`
    pub fn load(repository: &mut LocatorRepository, file: &str, page: &str) -> PageResult<Self> {
        let elements: BTreeMap<String, Element> = repository
            .page(file, page)?
            .iter()
            .map(|(key, definition)| (key.clone(), definition.to_element(key)))
            .collect();
        info!(page, file, elements = elements.len(), "Loaded page definition");
        Ok(Self {
            name: page.to_string(),
            url_pattern: "/".to_string(),
            load_timeout_ms: DEFAULT_LOAD_TIMEOUT_MS,
            elements,
        })
    }

    /// URL pattern the page lives at
    #[must_use]
    pub fn with_url_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.url_pattern = pattern.into();
        self
    }

    /// Load allowance in milliseconds
    #[must_use]
    pub const fn with_load_timeout(mut self, timeout_ms: u64) -> Self {
        self.load_timeout_ms = timeout_ms;
        self
    }

    /// Element by key
    ///
    /// # Errors
    ///
    /// [`PageError::UnknownElement`] when the page defines no such key.
    pub fn element(&self, key: &str) -> PageResult<&Element> {
        self.elements
            .get(key)
            .ok_or_else(|| PageError::UnknownElement {
                page: self.name.clone(),
                element: key.to_string(),
            })
    }

    /// Defined element keys, sorted
    #[must_use]
    pub fn element_names(&self) -> Vec<&str> {
        self.elements.keys().map(String::as_str).collect()
    }
}

impl PageObject for DynamicPage {
    fn url_pattern(&self) -> &str {
        &self.url_pattern
    }

    fn load_timeout_ms(&self) -> u64 {
        self.load_timeout_ms
    }

    fn page_name(&self) -> &str {
        &self.name
    }
}

// =============================================================================
// URL MATCHING
// =============================================================================

/// URL path pattern
#[derive(Debug, Clone)]
pub struct UrlMatcher {
    pattern: String,
    segments: Vec<UrlSegment>,
}

#[derive(Debug, Clone)]
enum UrlSegment {
    Literal(String),
    Wildcard,
    Parameter(String),
}

impl UrlMatcher {
    /// Matcher for `pattern`
    ///
    /// Patterns support:
    /// - Literal segments: `/search`
    /// - Wildcards: `/hotel/*`
    /// - Named parameters: `/hotel/:slug`
    #[must_use]
    pub fn new(pattern: &str) -> Self {
        let segments = split(pattern)
            .map(|s| {
                if s == "*" {
                    UrlSegment::Wildcard
                } else if let Some(name) = s.strip_prefix(':') {
                    UrlSegment::Parameter(name.to_string())
                } else {
                    UrlSegment::Literal(s.to_lowercase())
                }
            })
            .collect();

        Self {
            pattern: pattern.to_string(),
            segments,
        }
    }

    /// Whether `path` matches, segment for segment, case-insensitively
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        let path_segments: Vec<&str> = split(path).collect();
        if path_segments.len() != self.segments.len() {
            return false;
        }
        self.segments
            .iter()
            .zip(path_segments)
            .all(|(segment, actual)| match segment {
                UrlSegment::Literal(lit) => lit.eq_ignore_ascii_case(actual),
                UrlSegment::Wildcard | UrlSegment::Parameter(_) => true,
            })
    }

    /// Named parameter values of a matching path
    #[must_use]
    pub fn extract_params(&self, path: &str) -> HashMap<String, String> {
        self.segments
            .iter()
            .zip(split(path))
            .filter_map(|(segment, value)| match segment {
                UrlSegment::Parameter(name) => Some((name.clone(), value.to_string())),
                _ => None,
            })
            .collect()
    }

    /// Pattern text
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}
