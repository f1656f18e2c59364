//! Numbered pagination controls.

use crate::driver::BrowserDriver;
use crate::element::{Element, ElementKind};
use crate::result::{PageError, PageResult};
use crate::session::Session;
use regex::Regex;
use std::sync::OnceLock;
use tracing::{info, warn};

fn first_number(text: &str) -> Option<usize> {
    static NUMBER: OnceLock<Option<Regex>> = OnceLock::new();
    let re = NUMBER.get_or_init(|| Regex::new(r"\d+").ok()).as_ref()?;
    re.find(text)?.as_str().parse().ok()
}

/// Page buttons with next/previous controls and an active page marker
#[derive(Debug, Clone)]
pub struct Pagination {
    container: Element,
    pages: Element,
    next: Element,
    previous: Element,
    active: Element,
}

impl Pagination {
    /// Pagination inside `container`
    ///
    /// `next`, `previous` and `active` are located inside the container;
    /// `pages` matches every numbered page button.
    #[must_use]
    pub fn new(
        container: &str,
        pages: &str,
        next: &str,
        previous: &str,
        active: &str,
        name: &str,
    ) -> Self {
        let container = Element::new(container, name);
        Self {
            pages: Element::collection(pages, &format!("{name} pages")),
            next: container.child(ElementKind::Button, next, &format!("{name} next")),
            previous: container.child(ElementKind::Button, previous, &format!("{name} previous")),
            active: container.child(ElementKind::Label, active, &format!("{name} active page")),
            container,
        }
    }

    /// The container element
    #[must_use]
    pub const fn container(&self) -> &Element {
        &self.container
    }

    /// Number of page buttons
    pub async fn total_pages<D: BrowserDriver>(&self, session: &Session<D>) -> usize {
        self.pages.count(session).await
    }

    /// Click the 1-based page `number`
    ///
    /// # Errors
    ///
    /// [`PageError::InvalidArgument`] when `number` is outside `1..=total`.
    pub async fn go_to_page<D: BrowserDriver>(
        &self,
        session: &Session<D>,
        number: usize,
    ) -> PageResult<()> {
        let total = self.total_pages(session).await;
        if number == 0 || number > total {
            return Err(PageError::invalid_argument(format!(
                "page {number} is outside 1..={total} for '{}'",
                self.container.name()
            )));
        }
        info!(element = self.container.name(), page = number, "Going to page");
        self.pages.click_nth(session, number - 1).await
    }

    async fn step<D: BrowserDriver>(
        &self,
        session: &Session<D>,
        control: &Element,
    ) -> PageResult<bool> {
        if !control.is_enabled(session).await || control.has_class(session, "disabled").await {
            warn!(element = control.name(), "Control is disabled, staying on current page");
            return Ok(false);
        }
        control.click(session).await?;
        Ok(true)
    }

    /// Click next; `false` when it is disabled
    pub async fn next_page<D: BrowserDriver>(&self, session: &Session<D>) -> PageResult<bool> {
        self.step(session, &self.next).await
    }

    /// Click previous; `false` when it is disabled
    pub async fn previous_page<D: BrowserDriver>(&self, session: &Session<D>) -> PageResult<bool> {
        self.step(session, &self.previous).await
    }

    /// Current 1-based page
    ///
    /// Read from the active control's text, else from the position of the
    /// page button with class `active`, else 1.
    pub async fn current_page<D: BrowserDriver>(&self, session: &Session<D>) -> usize {
        if self.active.exists(session).await {
            if let Ok(text) = self.active.get_text(session).await {
                if let Some(n) = first_number(&text) {
                    return n;
                }
            }
        }
        match self.pages.attributes(session, "class").await {
            Ok(classes) => classes
                .iter()
                .position(|c| {
                    c.as_deref()
                        .is_some_and(|c| c.split_whitespace().any(|c| c == "active"))
                })
                .map_or(1, |i| i + 1),
            Err(e) => {
                warn!(element = self.container.name(), error = %e, "Could not read page buttons");
                1
            }
        }
    }

    /// Next control shown and enabled
    pub async fn has_next_page<D: BrowserDriver>(&self, session: &Session<D>) -> bool {
        self.next.is_visible(session).await && self.next.is_enabled(session).await
    }

    /// Previous control shown and enabled
    pub async fn has_previous_page<D: BrowserDriver>(&self, session: &Session<D>) -> bool {
        self.previous.is_visible(session).await && self.previous.is_enabled(session).await
    }

    /// Go to page 1
    pub async fn go_to_first_page<D: BrowserDriver>(&self, session: &Session<D>) -> PageResult<()> {
        self.go_to_page(session, 1).await
    }

    /// Go to the last page
    pub async fn go_to_last_page<D: BrowserDriver>(&self, session: &Session<D>) -> PageResult<()> {
        let total = self.total_pages(session).await;
        self.go_to_page(session, total).await
    }
}
