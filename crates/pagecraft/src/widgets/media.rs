//! Images, icons and tooltips.

use crate::dom_script;
use crate::driver::BrowserDriver;
use crate::element::{Element, ElementKind};
use crate::result::{PageError, PageResult};
use crate::session::Session;
use tracing::warn;

/// Whether the image finished loading with a non-zero natural size
pub async fn is_loaded<D: BrowserDriver>(session: &Session<D>, image: &Element) -> bool {
    match session
        .driver()
        .evaluate_on(session.context(), image.selector(), dom_script::IMAGE_LOADED)
        .await
    {
        Ok(value) => value.as_bool().unwrap_or(false),
        Err(e) => {
            warn!(element = image.name(), error = %e, "Image state unavailable");
            false
        }
    }
}

/// `src` attribute; empty when absent
pub async fn source<D: BrowserDriver>(session: &Session<D>, image: &Element) -> PageResult<String> {
    Ok(image
        .get_attribute(session, "src")
        .await?
        .unwrap_or_default())
}

/// `alt` attribute; empty when absent
pub async fn alt_text<D: BrowserDriver>(
    session: &Session<D>,
    image: &Element,
) -> PageResult<String> {
    Ok(image
        .get_attribute(session, "alt")
        .await?
        .unwrap_or_default())
}

/// Intrinsic `(width, height)` of the loaded image
pub async fn natural_size<D: BrowserDriver>(
    session: &Session<D>,
    image: &Element,
) -> PageResult<(u32, u32)> {
    let value = image.evaluate(session, dom_script::IMAGE_NATURAL_SIZE).await?;
    let dimension = |i: usize| {
        value
            .get(i)
            .and_then(serde_json::Value::as_u64)
            .and_then(|n| u32::try_from(n).ok())
    };
    match (dimension(0), dimension(1)) {
        (Some(w), Some(h)) => Ok((w, h)),
        _ => Err(PageError::Script {
            message: format!("'{}' reported size {value}", image.name()),
        }),
    }
}

/// Icon class list, e.g. `fa fa-star`
pub async fn icon_type<D: BrowserDriver>(
    session: &Session<D>,
    icon: &Element,
) -> PageResult<String> {
    Ok(icon
        .get_attribute(session, "class")
        .await?
        .unwrap_or_default())
}

/// Tooltip shown while hovering a trigger
#[derive(Debug, Clone)]
pub struct Tooltip {
    tooltip: Element,
    trigger: Element,
}

impl Tooltip {
    /// Tooltip at `locator` revealed by hovering `trigger`
    #[must_use]
    pub fn new(locator: &str, trigger: &str, name: &str) -> Self {
        Self {
            tooltip: Element::of_kind(ElementKind::Label, locator, name),
            trigger: Element::new(trigger, &format!("{name} trigger")),
        }
    }

    /// Hover the trigger and wait for the tooltip
    pub async fn show<D: BrowserDriver>(&self, session: &Session<D>) -> PageResult<()> {
        self.trigger.hover(session).await?;
        self.tooltip.wait_for_visible(session).await?;
        Ok(())
    }

    /// Show, then read the tooltip text
    pub async fn text<D: BrowserDriver>(&self, session: &Session<D>) -> PageResult<String> {
        self.show(session).await?;
        self.tooltip.get_text(session).await
    }

    /// Tooltip currently visible
    pub async fn is_shown<D: BrowserDriver>(&self, session: &Session<D>) -> bool {
        self.tooltip.is_visible(session).await
    }
}
