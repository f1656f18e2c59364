//! Dropdowns and list boxes.
//!
//! Single-choice functions need [`Capabilities::OPTIONS`]; the multi-choice
//! ones also need [`Capabilities::MULTI_SELECT`].

use crate::driver::{BrowserDriver, OptionMatch, SelectOption};
use crate::element::{Capabilities, Element};
use crate::result::{PageError, PageResult};
use crate::session::Session;
use crate::wait::ElementCondition;
use tracing::warn;

async fn select<D: BrowserDriver>(
    session: &Session<D>,
    element: &Element,
    option: OptionMatch,
) -> PageResult<()> {
    element.require(Capabilities::OPTIONS)?;
    let (driver, ctx, selector) = (session.driver(), session.context(), element.selector());
    let option = &option;
    element
        .perform(
            session,
            "select_option",
            Some(ElementCondition::Clickable),
            move || driver.select_option(ctx, selector, option),
        )
        .await
}

/// Options in rendered order
pub async fn options<D: BrowserDriver>(
    session: &Session<D>,
    element: &Element,
) -> PageResult<Vec<SelectOption>> {
    element.require(Capabilities::OPTIONS)?;
    let (driver, ctx, selector) = (session.driver(), session.context(), element.selector());
    element
        .perform(session, "options", Some(ElementCondition::Exists), move || {
            driver.options(ctx, selector)
        })
        .await
}

/// Select the option whose visible text is `text`
pub async fn select_by_text<D: BrowserDriver>(
    session: &Session<D>,
    element: &Element,
    text: &str,
) -> PageResult<()> {
    select(session, element, OptionMatch::Text(text.to_string())).await
}

/// Select the option whose `value` is `value`
pub async fn select_by_value<D: BrowserDriver>(
    session: &Session<D>,
    element: &Element,
    value: &str,
) -> PageResult<()> {
    select(session, element, OptionMatch::Value(value.to_string())).await
}

/// Select the option at a 0-based position
pub async fn select_by_index<D: BrowserDriver>(
    session: &Session<D>,
    element: &Element,
    index: usize,
) -> PageResult<()> {
    select(session, element, OptionMatch::Index(index)).await
}

/// Text of the first selected option; empty when nothing is selected
pub async fn selected_text<D: BrowserDriver>(
    session: &Session<D>,
    element: &Element,
) -> PageResult<String> {
    Ok(options(session, element)
        .await?
        .into_iter()
        .find(|o| o.selected)
        .map(|o| o.text)
        .unwrap_or_default())
}

/// Value of the first selected option; empty when nothing is selected
pub async fn selected_value<D: BrowserDriver>(
    session: &Session<D>,
    element: &Element,
) -> PageResult<String> {
    Ok(options(session, element)
        .await?
        .into_iter()
        .find(|o| o.selected)
        .map(|o| o.value)
        .unwrap_or_default())
}

/// Every option's text
pub async fn option_texts<D: BrowserDriver>(
    session: &Session<D>,
    element: &Element,
) -> PageResult<Vec<String>> {
    Ok(options(session, element)
        .await?
        .into_iter()
        .map(|o| o.text)
        .collect())
}

/// Every option's value
pub async fn option_values<D: BrowserDriver>(
    session: &Session<D>,
    element: &Element,
) -> PageResult<Vec<String>> {
    Ok(options(session, element)
        .await?
        .into_iter()
        .map(|o| o.value)
        .collect())
}

async fn passive_options<D: BrowserDriver>(
    session: &Session<D>,
    element: &Element,
) -> Option<Vec<SelectOption>> {
    if let Err(e) = element.require(Capabilities::OPTIONS) {
        warn!(element = element.name(), error = %e, "Option lookup refused");
        return None;
    }
    match session
        .driver()
        .options(session.context(), element.selector())
        .await
    {
        Ok(options) => Some(options),
        Err(e) => {
            warn!(element = element.name(), error = %e, "Option lookup failed");
            None
        }
    }
}

/// Whether an option with this text exists
pub async fn has_option<D: BrowserDriver>(
    session: &Session<D>,
    element: &Element,
    text: &str,
) -> bool {
    passive_options(session, element)
        .await
        .is_some_and(|opts| opts.iter().any(|o| o.text == text))
}

/// Whether an option with this value exists
pub async fn has_value<D: BrowserDriver>(
    session: &Session<D>,
    element: &Element,
    value: &str,
) -> bool {
    passive_options(session, element)
        .await
        .is_some_and(|opts| opts.iter().any(|o| o.value == value))
}

/// Number of options; `0` when they can't be read
pub async fn options_count<D: BrowserDriver>(session: &Session<D>, element: &Element) -> usize {
    passive_options(session, element)
        .await
        .map_or(0, |opts| opts.len())
}

// =============================================================================
// Multi-select
// =============================================================================

fn require_multi(element: &Element) -> PageResult<()> {
    element.require(Capabilities::OPTIONS | Capabilities::MULTI_SELECT)
}

/// Add every option with one of these texts to the selection
pub async fn select_by_texts<D: BrowserDriver>(
    session: &Session<D>,
    element: &Element,
    texts: &[&str],
) -> PageResult<()> {
    require_multi(element)?;
    for text in texts {
        select_by_text(session, element, text).await?;
    }
    Ok(())
}

/// Add every option with one of these values to the selection
pub async fn select_by_values<D: BrowserDriver>(
    session: &Session<D>,
    element: &Element,
    values: &[&str],
) -> PageResult<()> {
    require_multi(element)?;
    for value in values {
        select_by_value(session, element, value).await?;
    }
    Ok(())
}

/// Texts of all selected options
pub async fn selected_texts<D: BrowserDriver>(
    session: &Session<D>,
    element: &Element,
) -> PageResult<Vec<String>> {
    require_multi(element)?;
    Ok(options(session, element)
        .await?
        .into_iter()
        .filter(|o| o.selected)
        .map(|o| o.text)
        .collect())
}

/// Values of all selected options
pub async fn selected_values<D: BrowserDriver>(
    session: &Session<D>,
    element: &Element,
) -> PageResult<Vec<String>> {
    require_multi(element)?;
    Ok(options(session, element)
        .await?
        .into_iter()
        .filter(|o| o.selected)
        .map(|o| o.value)
        .collect())
}

async fn deselect<D: BrowserDriver>(
    session: &Session<D>,
    element: &Element,
    option: Option<OptionMatch>,
) -> PageResult<()> {
    require_multi(element)?;
    let (driver, ctx, selector) = (session.driver(), session.context(), element.selector());
    let option = option.as_ref();
    element
        .perform(
            session,
            "deselect_option",
            Some(ElementCondition::Clickable),
            move || driver.deselect_option(ctx, selector, option),
        )
        .await
}

/// Clear the selection
pub async fn deselect_all<D: BrowserDriver>(
    session: &Session<D>,
    element: &Element,
) -> PageResult<()> {
    deselect(session, element, None).await
}

/// Remove options with these texts from the selection
pub async fn deselect_by_texts<D: BrowserDriver>(
    session: &Session<D>,
    element: &Element,
    texts: &[&str],
) -> PageResult<()> {
    for text in texts {
        deselect(session, element, Some(OptionMatch::Text((*text).to_string()))).await?;
    }
    Ok(())
}

/// Whether the underlying `<select>` has the `multiple` attribute
pub async fn is_multiple<D: BrowserDriver>(
    session: &Session<D>,
    element: &Element,
) -> PageResult<bool> {
    let multiple = element.get_attribute(session, "multiple").await?;
    Ok(multiple.is_some_and(|m| m != "false"))
}

/// Fail unless the element is a multi-select in the DOM too
pub async fn ensure_multiple<D: BrowserDriver>(
    session: &Session<D>,
    element: &Element,
) -> PageResult<()> {
    if is_multiple(session, element).await? {
        Ok(())
    } else {
        Err(PageError::invalid_state(format!(
            "'{}' is not a multi-select",
            element.name()
        )))
    }
}
