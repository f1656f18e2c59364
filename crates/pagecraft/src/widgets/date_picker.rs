//! Calendar date pickers.

use crate::driver::BrowserDriver;
use crate::element::{Capabilities, Element, ElementKind};
use crate::result::{PageError, PageResult};
use crate::session::Session;
use chrono::{Datelike, NaiveDate};
use tracing::info;

/// Input that opens a calendar, plus the calendar's day cells
///
/// Day cells are found through a locator template; `{day}`, `{month}`,
/// `{year}` and `{iso}` are replaced with the target date's day of month,
/// month number, year and `YYYY-MM-DD` form.
#[derive(Debug, Clone)]
pub struct DatePicker {
    input: Element,
    day_template: String,
    format: String,
    next: Element,
    previous: Element,
}

impl DatePicker {
    /// Picker on `locator`, writing dates in the chrono `format`
    #[must_use]
    pub fn new(locator: &str, day_template: &str, format: &str, name: &str) -> Self {
        let input = Element::of_kind(ElementKind::DatePicker, locator, name);
        let next = input.child(ElementKind::Button, "[data-action='next']", "Next month");
        let previous =
            input.child(ElementKind::Button, "[data-action='previous']", "Previous month");
        Self {
            input,
            day_template: day_template.to_string(),
            format: format.to_string(),
            next,
            previous,
        }
    }

    /// Use separate month navigation controls
    #[must_use]
    pub fn with_navigation(mut self, next: &str, previous: &str) -> Self {
        self.next = Element::button(next, "Next month");
        self.previous = Element::button(previous, "Previous month");
        self
    }

    /// The input element
    #[must_use]
    pub const fn input(&self) -> &Element {
        &self.input
    }

    /// chrono format of the input's value
    #[must_use]
    pub fn format(&self) -> &str {
        &self.format
    }

    /// Day cell for `date`
    #[must_use]
    pub fn day_cell(&self, date: NaiveDate) -> Element {
        let locator = self
            .day_template
            .replace("{day}", &date.day().to_string())
            .replace("{month}", &date.month().to_string())
            .replace("{year}", &date.year().to_string())
            .replace("{iso}", &date.format("%Y-%m-%d").to_string());
        Element::button(&locator, &format!("{} day {date}", self.input.name()))
    }

    /// Open the calendar and click the day cell
    pub async fn select_date<D: BrowserDriver>(
        &self,
        session: &Session<D>,
        date: NaiveDate,
    ) -> PageResult<()> {
        info!(element = self.input.name(), %date, "Selecting date");
        self.input.click(session).await?;
        self.day_cell(date).click(session).await
    }

    /// Parse `date` with the picker format, then select it
    pub async fn set_date<D: BrowserDriver>(
        &self,
        session: &Session<D>,
        date: &str,
    ) -> PageResult<()> {
        let parsed = NaiveDate::parse_from_str(date, &self.format).map_err(|e| {
            PageError::invalid_argument(format!(
                "'{date}' does not match date format {}: {e}",
                self.format
            ))
        })?;
        self.select_date(session, parsed).await
    }

    /// Raw value of the input
    pub async fn selected_date<D: BrowserDriver>(
        &self,
        session: &Session<D>,
    ) -> PageResult<String> {
        self.input.get_value(session).await
    }

    /// Value of the input parsed with the picker format
    pub async fn selected_naive_date<D: BrowserDriver>(
        &self,
        session: &Session<D>,
    ) -> PageResult<NaiveDate> {
        let raw = self.selected_date(session).await?;
        NaiveDate::parse_from_str(raw.trim(), &self.format).map_err(|e| {
            PageError::invalid_state(format!(
                "'{}' shows '{raw}', not a {} date: {e}",
                self.input.name(),
                self.format
            ))
        })
    }

    /// Empty the input
    pub async fn clear<D: BrowserDriver>(&self, session: &Session<D>) -> PageResult<()> {
        self.input.require(Capabilities::TEXT)?;
        super::text::clear(session, &self.input).await
    }

    /// Whether the day cell for `date` is shown and enabled
    pub async fn is_date_enabled<D: BrowserDriver>(
        &self,
        session: &Session<D>,
        date: NaiveDate,
    ) -> bool {
        self.day_cell(date).is_enabled(session).await
    }

    /// Show the next month
    pub async fn next_month<D: BrowserDriver>(&self, session: &Session<D>) -> PageResult<()> {
        self.next.click(session).await
    }

    /// Show the previous month
    pub async fn previous_month<D: BrowserDriver>(&self, session: &Session<D>) -> PageResult<()> {
        self.previous.click(session).await
    }
}
