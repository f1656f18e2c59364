//! Fluent element chains.
//!
//! ```no_run
//! # use pagecraft::prelude::*;
//! # async fn demo(session: &Session<MockDriver>) -> PageResult<()> {
//! Chain::new(session, Element::text_box("#q", "Search"))
//!     .set_text("Da Nang")
//!     .await?
//!     .press_enter()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use crate::driver::BrowserDriver;
use crate::element::Element;
use crate::result::PageResult;
use crate::session::Session;
use crate::widgets::{checkable, select, slider, text};

/// An element bound to a session, consumed and returned by every step
#[derive(Debug)]
pub struct Chain<'s, D: BrowserDriver> {
    session: &'s Session<D>,
    element: Element,
}

impl<'s, D: BrowserDriver> Chain<'s, D> {
    /// Start a chain on `element`
    #[must_use]
    pub const fn new(session: &'s Session<D>, element: Element) -> Self {
        Self { session, element }
    }

    /// Continue with another element on the same session
    #[must_use]
    pub fn then(self, element: Element) -> Self {
        Self {
            session: self.session,
            element,
        }
    }

    /// Current element
    #[must_use]
    pub const fn element(&self) -> &Element {
        &self.element
    }

    /// End the chain
    #[must_use]
    pub fn done(self) -> Element {
        self.element
    }

    /// Click
    pub async fn click(self) -> PageResult<Self> {
        self.element.click(self.session).await?;
        Ok(self)
    }

    /// Double click
    pub async fn double_click(self) -> PageResult<Self> {
        self.element.double_click(self.session).await?;
        Ok(self)
    }

    /// Hover
    pub async fn hover(self) -> PageResult<Self> {
        self.element.hover(self.session).await?;
        Ok(self)
    }

    /// Wait until visible
    pub async fn wait_for_visible(self) -> PageResult<Self> {
        self.element.wait_for_visible(self.session).await?;
        Ok(self)
    }

    /// Wait until clickable
    pub async fn wait_for_clickable(self) -> PageResult<Self> {
        self.element.wait_for_clickable(self.session).await?;
        Ok(self)
    }

    /// Replace the text
    pub async fn set_text(self, value: &str) -> PageResult<Self> {
        text::set_text(self.session, &self.element, value).await?;
        Ok(self)
    }

    /// Append text
    pub async fn append_text(self, value: &str) -> PageResult<Self> {
        text::append_text(self.session, &self.element, value).await?;
        Ok(self)
    }

    /// Clear the field
    pub async fn clear(self) -> PageResult<Self> {
        text::clear(self.session, &self.element).await?;
        Ok(self)
    }

    /// Press Enter
    pub async fn press_enter(self) -> PageResult<Self> {
        text::press_enter(self.session, &self.element).await?;
        Ok(self)
    }

    /// Check a checkbox
    pub async fn check(self) -> PageResult<Self> {
        checkable::check(self.session, &self.element).await?;
        Ok(self)
    }

    /// Uncheck a checkbox
    pub async fn uncheck(self) -> PageResult<Self> {
        checkable::uncheck(self.session, &self.element).await?;
        Ok(self)
    }

    /// Select by visible text
    pub async fn select_by_text(self, option: &str) -> PageResult<Self> {
        select::select_by_text(self.session, &self.element, option).await?;
        Ok(self)
    }

    /// Select by value
    pub async fn select_by_value(self, value: &str) -> PageResult<Self> {
        select::select_by_value(self.session, &self.element, value).await?;
        Ok(self)
    }

    /// Select by 0-based index
    pub async fn select_by_index(self, index: usize) -> PageResult<Self> {
        select::select_by_index(self.session, &self.element, index).await?;
        Ok(self)
    }

    /// Move a slider to `percent` of its range
    pub async fn slide_to(self, percent: f64) -> PageResult<Self> {
        slider::slide_to(self.session, &self.element, percent).await?;
        Ok(self)
    }

    /// Move a slider by `delta` percent
    pub async fn move_by_percent(self, delta: f64) -> PageResult<Self> {
        slider::move_by_percent(self.session, &self.element, delta).await?;
        Ok(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::SelectOption;
    use crate::mock::{MockDriver, MockElement};
    use crate::widgets::select::selected_value;

    #[tokio::test]
    async fn test_chain_across_elements() {
        let s = Session::new(
            MockDriver::new()
                .with_element(MockElement::new("#city").input("text"))
                .with_element(MockElement::new("#cabin").select(vec![
                    SelectOption::with_value("Economy", "Y"),
                    SelectOption::with_value("Business", "C"),
                ]))
                .with_element(MockElement::new("#flex").checkbox()),
        );
        let last = Chain::new(&s, Element::text_box("#city", "City"))
            .set_text("Hanoi")
            .await
            .unwrap()
            .append_text(" Old Quarter")
            .await
            .unwrap()
            .then(Element::dropdown("#cabin", "Cabin"))
            .select_by_text("Business")
            .await
            .unwrap()
            .then(Element::checkbox("#flex", "Flexible"))
            .check()
            .await
            .unwrap()
            .done();
        assert_eq!(last.name(), "Flexible");
        assert_eq!(s.driver().value_of("#city").unwrap(), "Hanoi Old Quarter");
        assert_eq!(selected_value(&s, &Element::dropdown("#cabin", "Cabin")).await.unwrap(), "C");
    }

    #[tokio::test]
    async fn test_chain_stops_at_first_error() {
        let s = Session::new(MockDriver::new().with_element(MockElement::new("h1")));
        let result = Chain::new(&s, Element::label("h1", "Heading")).set_text("x").await;
        assert!(result.is_err());
    }
}
