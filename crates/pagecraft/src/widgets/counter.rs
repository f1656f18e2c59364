//! Plus/minus counters such as guest and room pickers.

use crate::driver::BrowserDriver;
use crate::element::Element;
use crate::result::{PageError, PageResult};
use crate::session::Session;
use tracing::{debug, info};

/// Upper bound on clicks for one `set_value`
const MAX_STEPS: usize = 100;

/// Counter made of a plus button, a minus button and a value display
#[derive(Debug, Clone)]
pub struct Counter {
    name: String,
    plus: Element,
    minus: Element,
    display: Element,
    value_attribute: Option<String>,
}

impl Counter {
    /// Counter whose value is the display's text
    #[must_use]
    pub fn new(plus: &str, minus: &str, display: &str, name: &str) -> Self {
        Self {
            name: name.to_string(),
            plus: Element::button(plus, &format!("{name} Plus")),
            minus: Element::button(minus, &format!("{name} Minus")),
            display: Element::label(display, &format!("{name} Value")),
            value_attribute: None,
        }
    }

    /// Read the value from an attribute of the display instead of its text
    #[must_use]
    pub fn with_value_attribute(mut self, attribute: &str) -> Self {
        self.value_attribute = Some(attribute.to_string());
        self
    }

    /// Display name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current value
    pub async fn value<D: BrowserDriver>(&self, session: &Session<D>) -> PageResult<i64> {
        let raw = match &self.value_attribute {
            Some(attribute) => self
                .display
                .get_attribute(session, attribute)
                .await?
                .unwrap_or_default(),
            None => self.display.get_text(session).await?,
        };
        raw.trim().parse().map_err(|_| {
            PageError::invalid_state(format!("'{}' shows '{raw}', not a number", self.name))
        })
    }

    /// Click plus once
    pub async fn increment<D: BrowserDriver>(&self, session: &Session<D>) -> PageResult<()> {
        self.plus.click(session).await
    }

    /// Click minus once
    pub async fn decrement<D: BrowserDriver>(&self, session: &Session<D>) -> PageResult<()> {
        self.minus.click(session).await
    }

    /// Whether plus is enabled
    pub async fn can_increment<D: BrowserDriver>(&self, session: &Session<D>) -> bool {
        self.plus.is_enabled(session).await
    }

    /// Whether minus is enabled
    pub async fn can_decrement<D: BrowserDriver>(&self, session: &Session<D>) -> bool {
        self.minus.is_enabled(session).await
    }

    /// Whether the value display is visible
    pub async fn is_shown<D: BrowserDriver>(&self, session: &Session<D>) -> bool {
        self.display.is_visible(session).await
    }

    /// Click plus or minus until the value equals `target`
    ///
    /// # Errors
    ///
    /// [`PageError::InvalidState`] when a click leaves the value unchanged,
    /// which happens at the counter's limits.
    pub async fn set_value<D: BrowserDriver>(
        &self,
        session: &Session<D>,
        target: i64,
    ) -> PageResult<()> {
        info!(element = %self.name, target, "Setting counter");
        let mut current = self.value(session).await?;
        for _ in 0..MAX_STEPS {
            if current == target {
                debug!(element = %self.name, value = current, "Counter set");
                return Ok(());
            }
            if current < target {
                self.increment(session).await?;
            } else {
                self.decrement(session).await?;
            }
            let next = self.value(session).await?;
            if next == current {
                return Err(PageError::invalid_state(format!(
                    "'{}' is stuck at {current}, cannot reach {target}",
                    self.name
                )));
            }
            current = next;
        }
        Err(PageError::invalid_state(format!(
            "'{}' did not reach {target} within {MAX_STEPS} clicks",
            self.name
        )))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::{MockDriver, MockEffect, MockElement};

    fn session() -> Session<MockDriver> {
        Session::new(
            MockDriver::new()
                .with_element(
                    MockElement::new("[data-selenium='plus']")
                        .tag("button")
                        .on_click(MockEffect::Increment("[data-selenium='value']".into(), 1)),
                )
                .with_element(
                    MockElement::new("[data-selenium='minus']")
                        .tag("button")
                        .on_click(MockEffect::Increment("[data-selenium='value']".into(), -1)),
                )
                .with_element(
                    MockElement::new("[data-selenium='value']")
                        .text("2")
                        .attr("min", "1")
                        .attr("max", "9"),
                ),
        )
    }

    fn adults() -> Counter {
        Counter::new(
            "[data-selenium='plus']",
            "[data-selenium='minus']",
            "[data-selenium='value']",
            "Adults",
        )
    }

    #[tokio::test]
    async fn test_set_value_clicks_up_and_down() {
        let s = session();
        let counter = adults();
        counter.set_value(&s, 5).await.unwrap();
        assert_eq!(counter.value(&s).await.unwrap(), 5);
        assert_eq!(s.driver().call_count("click:[data-selenium='plus']"), 3);
        counter.set_value(&s, 3).await.unwrap();
        assert_eq!(counter.value(&s).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_stuck_counter_fails() {
        let s = session();
        let err = adults().set_value(&s, 0).await.unwrap_err();
        assert!(matches!(err, PageError::InvalidState { .. }));
        assert!(adults().can_decrement(&s).await);
    }

    #[tokio::test]
    async fn test_value_from_attribute() {
        let s = Session::new(MockDriver::new().with_element(
            MockElement::new("#rooms").input("text").value("4"),
        ));
        let rooms = Counter::new("#p", "#m", "#rooms", "Rooms").with_value_attribute("value");
        assert_eq!(rooms.value(&s).await.unwrap(), 4);
    }
}
