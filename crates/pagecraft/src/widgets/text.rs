//! Text inputs.

use super::press;
use crate::driver::{BrowserDriver, Key};
use crate::element::{Capabilities, Element};
use crate::result::PageResult;
use crate::session::Session;
use crate::wait::ElementCondition;
use tracing::{debug, warn};

/// Replace the content with `text`
pub async fn set_text<D: BrowserDriver>(
    session: &Session<D>,
    element: &Element,
    text: &str,
) -> PageResult<()> {
    element.require(Capabilities::TEXT)?;
    element.set_text(session, text).await
}

/// Clear, then type `text` key by key
pub async fn clear_and_type<D: BrowserDriver>(
    session: &Session<D>,
    element: &Element,
    text: &str,
) -> PageResult<()> {
    clear(session, element).await?;
    append_text(session, element, text).await
}

/// Type `text` after the current content
pub async fn append_text<D: BrowserDriver>(
    session: &Session<D>,
    element: &Element,
    text: &str,
) -> PageResult<()> {
    element.require(Capabilities::TEXT)?;
    let (driver, ctx, selector) = (session.driver(), session.context(), element.selector());
    element
        .perform(
            session,
            "append_text",
            Some(ElementCondition::Visible),
            move || driver.type_text(ctx, selector, text),
        )
        .await
}

/// Empty the field
pub async fn clear<D: BrowserDriver>(session: &Session<D>, element: &Element) -> PageResult<()> {
    element.require(Capabilities::TEXT)?;
    let (driver, ctx, selector) = (session.driver(), session.context(), element.selector());
    element
        .perform(session, "clear", Some(ElementCondition::Visible), move || {
            driver.clear(ctx, selector)
        })
        .await
}

/// Press Enter in the field
pub async fn press_enter<D: BrowserDriver>(
    session: &Session<D>,
    element: &Element,
) -> PageResult<()> {
    press(session, element, Key::Enter, "press_enter").await
}

/// Press Tab in the field
pub async fn press_tab<D: BrowserDriver>(
    session: &Session<D>,
    element: &Element,
) -> PageResult<()> {
    press(session, element, Key::Tab, "press_tab").await
}

/// Whether the trimmed value is empty; `true` when the value can't be read
pub async fn is_empty<D: BrowserDriver>(session: &Session<D>, element: &Element) -> bool {
    match session
        .driver()
        .value(session.context(), element.selector())
        .await
    {
        Ok(value) => {
            let empty = value.trim().is_empty();
            debug!(element = element.name(), empty, "Checked field content");
            empty
        }
        Err(e) => {
            warn!(element = element.name(), error = %e, "Could not read field value");
            true
        }
    }
}

/// `placeholder` attribute
pub async fn placeholder<D: BrowserDriver>(
    session: &Session<D>,
    element: &Element,
) -> PageResult<Option<String>> {
    element.get_attribute(session, "placeholder").await
}
