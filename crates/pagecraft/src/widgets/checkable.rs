//! Checkboxes, radio buttons and toggle switches.
//!
//! State changes are idempotent: each setter reads the current state and only
//! clicks when it differs. Toggles count as on when the control is checked or
//! carries `aria-checked="true"`.

use crate::driver::BrowserDriver;
use crate::element::{Capabilities, Element};
use crate::result::PageResult;
use crate::session::Session;
use crate::wait::ElementCondition;
use tracing::debug;

async fn checked<D: BrowserDriver>(session: &Session<D>, element: &Element) -> PageResult<bool> {
    element.require(Capabilities::CHECKED)?;
    let (driver, ctx, selector) = (session.driver(), session.context(), element.selector());
    let state = element
        .perform(session, "read_checked", Some(ElementCondition::Exists), move || {
            driver.probe(ctx, selector)
        })
        .await?;
    Ok(state.checked)
}

/// Click until the checked state equals `on`
pub async fn set_checked<D: BrowserDriver>(
    session: &Session<D>,
    element: &Element,
    on: bool,
) -> PageResult<()> {
    if checked(session, element).await? == on {
        debug!(element = element.name(), on, "Already in requested state");
        return Ok(());
    }
    element.click(session).await
}

/// Checked state of a checkbox
pub async fn is_checked<D: BrowserDriver>(
    session: &Session<D>,
    element: &Element,
) -> PageResult<bool> {
    checked(session, element).await
}

/// Check the box
pub async fn check<D: BrowserDriver>(session: &Session<D>, element: &Element) -> PageResult<()> {
    set_checked(session, element, true).await
}

/// Uncheck the box
pub async fn uncheck<D: BrowserDriver>(session: &Session<D>, element: &Element) -> PageResult<()> {
    set_checked(session, element, false).await
}

/// Select a radio button
pub async fn select_radio<D: BrowserDriver>(
    session: &Session<D>,
    element: &Element,
) -> PageResult<()> {
    set_checked(session, element, true).await
}

/// Whether a radio button is selected
pub async fn is_selected<D: BrowserDriver>(
    session: &Session<D>,
    element: &Element,
) -> PageResult<bool> {
    checked(session, element).await
}

/// Switch a toggle on
pub async fn turn_on<D: BrowserDriver>(session: &Session<D>, element: &Element) -> PageResult<()> {
    set_checked(session, element, true).await
}

/// Switch a toggle off
pub async fn turn_off<D: BrowserDriver>(session: &Session<D>, element: &Element) -> PageResult<()> {
    set_checked(session, element, false).await
}

/// Flip a toggle and return the new state
pub async fn toggle<D: BrowserDriver>(session: &Session<D>, element: &Element) -> PageResult<bool> {
    let before = checked(session, element).await?;
    element.click(session).await?;
    debug!(element = element.name(), from = before, to = !before, "Toggled");
    Ok(!before)
}

/// Whether a toggle is on
pub async fn is_on<D: BrowserDriver>(session: &Session<D>, element: &Element) -> PageResult<bool> {
    checked(session, element).await
}
