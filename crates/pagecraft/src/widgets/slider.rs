//! Range sliders.
//!
//! Positions are given as a percentage of the `min..=max` range. The target
//! value is snapped to the nearest `step`, clamped, and written through the
//! driver's `set_value`, which fires `input` and `change`.

use crate::driver::BrowserDriver;
use crate::element::{Capabilities, Element};
use crate::result::{PageError, PageResult};
use crate::session::Session;
use crate::wait::ElementCondition;
use tracing::debug;

/// `min`, `max` and `step` of a range input
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderBounds {
    /// Lowest value
    pub min: f64,
    /// Highest value
    pub max: f64,
    /// Granularity
    pub step: f64,
}

impl Default for SliderBounds {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 100.0,
            step: 1.0,
        }
    }
}

impl SliderBounds {
    /// Bounds from raw attribute values; missing or bad ones use defaults
    #[must_use]
    pub fn from_attributes(min: Option<&str>, max: Option<&str>, step: Option<&str>) -> Self {
        let default = Self::default();
        let parse = |raw: Option<&str>, fallback: f64| {
            raw.and_then(|v| v.trim().parse::<f64>().ok())
                .filter(|v| v.is_finite())
                .unwrap_or(fallback)
        };
        let min = parse(min, default.min);
        let max = parse(max, default.max).max(min);
        let step = parse(step, default.step);
        Self {
            min,
            max,
            step: if step > 0.0 { step } else { default.step },
        }
    }

    /// Snap to the nearest step from `min` and clamp into range
    #[must_use]
    pub fn snap(&self, value: f64) -> f64 {
        let steps = ((value - self.min) / self.step).round();
        let snapped = steps.mul_add(self.step, self.min);
        snapped.clamp(self.min, self.max)
    }

    /// Value at `percent` of the range, snapped
    #[must_use]
    pub fn value_at(&self, percent: f64) -> f64 {
        let raw = (self.max - self.min).mul_add(percent / 100.0, self.min);
        self.snap(raw)
    }

    /// Percentage position of `value`
    #[must_use]
    pub fn percent_of(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 {
            return 0.0;
        }
        ((value - self.min) / span * 100.0).clamp(0.0, 100.0)
    }
}

/// Render a slider value the way a range input reports it
#[must_use]
pub fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        let text = format!("{value:.6}");
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Read `min`, `max` and `step`
pub async fn bounds<D: BrowserDriver>(
    session: &Session<D>,
    element: &Element,
) -> PageResult<SliderBounds> {
    element.require(Capabilities::RANGE)?;
    let min = element.get_attribute(session, "min").await?;
    let max = element.get_attribute(session, "max").await?;
    let step = element.get_attribute(session, "step").await?;
    Ok(SliderBounds::from_attributes(
        min.as_deref(),
        max.as_deref(),
        step.as_deref(),
    ))
}

/// Current value as reported by the input
pub async fn value<D: BrowserDriver>(
    session: &Session<D>,
    element: &Element,
) -> PageResult<String> {
    element.require(Capabilities::RANGE)?;
    element.get_value(session).await
}

/// Move to `percent` (0 to 100) of the range; returns the new value
pub async fn slide_to<D: BrowserDriver>(
    session: &Session<D>,
    element: &Element,
    percent: f64,
) -> PageResult<String> {
    element.require(Capabilities::RANGE)?;
    if !(0.0..=100.0).contains(&percent) {
        return Err(PageError::invalid_argument(format!(
            "slider position must be between 0 and 100 percent, got {percent}"
        )));
    }
    let bounds = bounds(session, element).await?;
    let target = format_value(bounds.value_at(percent));
    let (driver, ctx, selector) = (session.driver(), session.context(), element.selector());
    let value = target.as_str();
    element
        .perform(session, "slide_to", Some(ElementCondition::Clickable), move || {
            driver.set_value(ctx, selector, value)
        })
        .await?;
    debug!(element = element.name(), percent, value = %target, "Slider moved");
    Ok(target)
}

/// Move by `delta` percent from the current position, clamped at the ends
pub async fn move_by_percent<D: BrowserDriver>(
    session: &Session<D>,
    element: &Element,
    delta: f64,
) -> PageResult<String> {
    let bounds = bounds(session, element).await?;
    let current = value(session, element)
        .await?
        .trim()
        .parse::<f64>()
        .unwrap_or(bounds.min);
    let target = (bounds.percent_of(current) + delta).clamp(0.0, 100.0);
    slide_to(session, element, target).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::{MockDriver, MockElement};
    use proptest::prelude::*;

    fn session() -> Session<MockDriver> {
        Session::new(
            MockDriver::new().with_element(
                MockElement::new("input[type='range']")
                    .input("range")
                    .attr("min", "0")
                    .attr("max", "5")
                    .attr("step", "0.5")
                    .value("2.5"),
            ),
        )
    }

    fn slider() -> Element {
        Element::slider("input[type='range']", "Horizontal Slider")
    }

    #[tokio::test]
    async fn test_slide_to_percentages() {
        let s = session();
        assert_eq!(slide_to(&s, &slider(), 80.0).await.unwrap(), "4");
        assert_eq!(slide_to(&s, &slider(), 0.0).await.unwrap(), "0");
        assert_eq!(slide_to(&s, &slider(), 100.0).await.unwrap(), "5");
        assert_eq!(value(&s, &slider()).await.unwrap(), "5");
    }

    #[tokio::test]
    async fn test_move_by_percent() {
        let s = session();
        slide_to(&s, &slider(), 50.0).await.unwrap();
        let up: f64 = move_by_percent(&s, &slider(), 30.0).await.unwrap().parse().unwrap();
        assert!(up > 2.5);
        let down: f64 = move_by_percent(&s, &slider(), -60.0).await.unwrap().parse().unwrap();
        assert!(down < up);
        assert_eq!(move_by_percent(&s, &slider(), -500.0).await.unwrap(), "0");
    }

    #[tokio::test]
    async fn test_out_of_range_percent() {
        let s = session();
        assert!(slide_to(&s, &slider(), 101.0).await.is_err());
    }

    #[test]
    fn test_bounds_defaults() {
        let b = SliderBounds::from_attributes(None, Some("abc"), Some("0"));
        assert_eq!(b, SliderBounds::default());
        assert_eq!(format_value(2.5), "2.5");
        assert_eq!(format_value(3.0), "3");
    }

    mod property_tests {
        use super::*;

        proptest! {
            #[test]
            fn prop_snapped_value_stays_in_range(
                min in -100i32..100,
                span in 1i32..200,
                step in 1u32..10,
                percent in 0.0f64..=100.0,
            ) {
                let bounds = SliderBounds {
                    min: f64::from(min),
                    max: f64::from(min + span),
                    step: f64::from(step),
                };
                let v = bounds.value_at(percent);
                prop_assert!(v >= bounds.min && v <= bounds.max);
            }
        }
    }
}
