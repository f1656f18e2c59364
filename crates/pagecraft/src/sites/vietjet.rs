//! Vietjet flight search.

use crate::dom_script::js_string;
use crate::driver::BrowserDriver;
use crate::element::Element;
use crate::page_object::PageObject;
use crate::repository::LocatorRepository;
use crate::result::{PageError, PageResult};
use crate::session::Session;
use crate::widgets::{checkable, text};
use chrono::NaiveDate;
use std::fmt;
use tracing::{error, info};

/// Locator file of the Vietjet pages
pub const LOCATOR_FILE: &str = "vietjet.json";

/// Format the date inputs take
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// One way or return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightType {
    /// Outbound only
    OneWay,
    /// Outbound and return
    RoundTrip,
}

impl fmt::Display for FlightType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::OneWay => "one way",
            Self::RoundTrip => "round trip",
        })
    }
}

/// Vietjet landing page with the flight search form
#[derive(Debug, Clone)]
pub struct VietjetHomePage {
    one_way: Element,
    round_trip: Element,
    origin: Element,
    destination: Element,
    depart_picker: Element,
    depart_input: Element,
    return_picker: Element,
    return_input: Element,
    search_button: Element,
}

impl VietjetHomePage {
    /// Page name in the locator file
    pub const PAGE: &'static str = "VietjetHomePage";

    /// Build from the Vietjet locator file
    pub fn new(repository: &mut LocatorRepository) -> PageResult<Self> {
        let mut element = |key: &str| repository.element(LOCATOR_FILE, Self::PAGE, key);
        Ok(Self {
            one_way: element("oneWayRadio")?,
            round_trip: element("roundTripRadio")?,
            origin: element("originInput")?,
            destination: element("destinationInput")?,
            depart_picker: element("departDatePicker")?,
            depart_input: element("departDateInput")?,
            return_picker: element("returnDatePicker")?,
            return_input: element("returnDateInput")?,
            search_button: element("searchButton")?,
        })
    }

    /// Choose one way or round trip
    pub async fn select_flight_type<D: BrowserDriver>(
        &self,
        session: &Session<D>,
        flight_type: FlightType,
    ) -> PageResult<()> {
        info!(%flight_type, "Selecting flight type");
        let radio = match flight_type {
            FlightType::OneWay => &self.one_way,
            FlightType::RoundTrip => &self.round_trip,
        };
        checkable::select_radio(session, radio).await.map_err(|e| {
            error!(%flight_type, error = %e, "Failed to select flight type");
            e
        })
    }

    /// Fill origin and destination airports
    pub async fn set_route<D: BrowserDriver>(
        &self,
        session: &Session<D>,
        origin: &str,
        destination: &str,
    ) -> PageResult<()> {
        info!(origin, destination, "Setting route");
        text::set_text(session, &self.origin, origin).await?;
        text::set_text(session, &self.destination, destination).await
    }

    async fn fill_date<D: BrowserDriver>(
        &self,
        session: &Session<D>,
        picker: &Element,
        input: &Element,
        date: NaiveDate,
    ) -> PageResult<()> {
        picker.click(session).await?;
        let literal = js_string(&date.format(DATE_FORMAT).to_string());
        input
            .evaluate(
                session,
                &format!(
                    "el.value = {literal}; \
                     el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
                     return el.value;"
                ),
            )
            .await?;
        Ok(())
    }

    /// Set the outbound date
    pub async fn set_departure_date<D: BrowserDriver>(
        &self,
        session: &Session<D>,
        date: NaiveDate,
    ) -> PageResult<()> {
        info!(%date, "Setting departure date");
        self.fill_date(session, &self.depart_picker, &self.depart_input, date)
            .await
    }

    /// Set the return date
    pub async fn set_return_date<D: BrowserDriver>(
        &self,
        session: &Session<D>,
        date: NaiveDate,
    ) -> PageResult<()> {
        info!(%date, "Setting return date");
        self.fill_date(session, &self.return_picker, &self.return_input, date)
            .await
    }

    /// Submit the search
    pub async fn search<D: BrowserDriver>(&self, session: &Session<D>) -> PageResult<()> {
        info!("Searching flights");
        self.search_button.click(session).await
    }

    /// Whole one-way search
    pub async fn search_one_way<D: BrowserDriver>(
        &self,
        session: &Session<D>,
        origin: &str,
        destination: &str,
        depart: NaiveDate,
    ) -> PageResult<()> {
        self.select_flight_type(session, FlightType::OneWay).await?;
        self.set_route(session, origin, destination).await?;
        self.set_departure_date(session, depart).await?;
        self.search(session).await
    }

    /// Whole round-trip search
    ///
    /// # Errors
    ///
    /// [`PageError::InvalidArgument`] when the return precedes departure.
    pub async fn search_round_trip<D: BrowserDriver>(
        &self,
        session: &Session<D>,
        origin: &str,
        destination: &str,
        depart: NaiveDate,
        return_date: NaiveDate,
    ) -> PageResult<()> {
        if return_date < depart {
            return Err(PageError::invalid_argument(format!(
                "return {return_date} is before departure {depart}"
            )));
        }
        self.select_flight_type(session, FlightType::RoundTrip).await?;
        self.set_route(session, origin, destination).await?;
        self.set_departure_date(session, depart).await?;
        self.set_return_date(session, return_date).await?;
        self.search(session).await
    }
}

impl PageObject for VietjetHomePage {
    fn url_pattern(&self) -> &str {
        "/*"
    }

    fn page_name(&self) -> &str {
        Self::PAGE
    }
}
