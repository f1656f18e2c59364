//! Expandable panels.

use crate::driver::BrowserDriver;
use crate::element::{Element, ElementKind};
use crate::result::PageResult;
use crate::session::Session;
use tracing::debug;

/// Panel with expand/collapse controls and a content region
///
/// The panel counts as expanded while its content is visible.
#[derive(Debug, Clone)]
pub struct Panel {
    container: Element,
    expand: Element,
    collapse: Element,
    content: Element,
    heading: Element,
}

impl Panel {
    /// Panel at `container`; the other locators are resolved inside it
    #[must_use]
    pub fn new(container: &str, expand: &str, collapse: &str, content: &str, name: &str) -> Self {
        let container = Element::new(container, name);
        Self {
            expand: container.child(ElementKind::Button, expand, &format!("{name} expand")),
            collapse: container.child(ElementKind::Button, collapse, &format!("{name} collapse")),
            content: container.child(ElementKind::Element, content, &format!("{name} content")),
            heading: container.child(
                ElementKind::Label,
                "[role='heading']",
                &format!("{name} title"),
            ),
            container,
        }
    }

    /// The container element
    #[must_use]
    pub const fn container(&self) -> &Element {
        &self.container
    }

    /// Content visible
    pub async fn is_expanded<D: BrowserDriver>(&self, session: &Session<D>) -> bool {
        self.content.is_visible(session).await
    }

    /// Expand and wait for the content to show; no-op when already expanded
    pub async fn expand<D: BrowserDriver>(&self, session: &Session<D>) -> PageResult<()> {
        if self.is_expanded(session).await {
            debug!(element = self.container.name(), "Already expanded");
            return Ok(());
        }
        self.expand.click(session).await?;
        self.content.wait_for_visible(session).await?;
        Ok(())
    }

    /// Collapse and wait for the content to hide; no-op when already collapsed
    pub async fn collapse<D: BrowserDriver>(&self, session: &Session<D>) -> PageResult<()> {
        if !self.is_expanded(session).await {
            debug!(element = self.container.name(), "Already collapsed");
            return Ok(());
        }
        self.collapse.click(session).await?;
        self.content.wait_for_hidden(session).await?;
        Ok(())
    }

    /// Flip the state; returns whether the panel is now expanded
    pub async fn toggle<D: BrowserDriver>(&self, session: &Session<D>) -> PageResult<bool> {
        if self.is_expanded(session).await {
            self.collapse(session).await?;
            Ok(false)
        } else {
            self.expand(session).await?;
            Ok(true)
        }
    }

    /// Heading text
    pub async fn title<D: BrowserDriver>(&self, session: &Session<D>) -> PageResult<String> {
        self.heading.get_text(session).await
    }

    /// Content text
    pub async fn content<D: BrowserDriver>(&self, session: &Session<D>) -> PageResult<String> {
        self.content.get_text(session).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::{MockDriver, MockEffect, MockElement};

    #[tokio::test(start_paused = true)]
    async fn test_expand_collapse_cycle() {
        let s = Session::new(
            MockDriver::new()
                .with_element(
                    MockElement::new("#faq >> button.open")
                        .tag("button")
                        .on_click(MockEffect::Show("#faq >> .body".into())),
                )
                .with_element(
                    MockElement::new("#faq >> button.close")
                        .tag("button")
                        .on_click(MockEffect::Hide("#faq >> .body".into())),
                )
                .with_element(MockElement::new("#faq >> .body").text("Free cancellation").hidden())
                .with_element(MockElement::new("#faq >> [role='heading']").text("Policies")),
        );
        let panel = Panel::new("#faq", "button.open", "button.close", ".body", "FAQ");
        assert!(!panel.is_expanded(&s).await);
        assert!(panel.toggle(&s).await.unwrap());
        assert_eq!(panel.content(&s).await.unwrap(), "Free cancellation");
        assert_eq!(panel.title(&s).await.unwrap(), "Policies");
        panel.expand(&s).await.unwrap();
        assert_eq!(s.driver().call_count("click:#faq >> button.open"), 1);
        panel.collapse(&s).await.unwrap();
        assert!(!panel.is_expanded(&s).await);
    }
}
