//! Agoda hotel search.
//!
//! The search flow is: type a destination and pick the first suggestion,
//! choose check-in and check-out days in the calendar, set rooms and guests,
//! then search. Results usually open in a new tab.

use crate::dates::{Stay, DEFAULT_FORMAT, ISO_FORMAT};
use crate::driver::BrowserDriver;
use crate::element::Element;
use crate::page_object::PageObject;
use crate::repository::LocatorRepository;
use crate::result::{PageError, PageResult};
use crate::session::Session;
use crate::strategy::{StrategyChain, StrategyOutcome};
use crate::wait::Waiter;
use crate::widgets::{Counter, DatePicker};
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Locator file of every Agoda page
pub const LOCATOR_FILE: &str = "agoda.json";

/// How long to wait for the results tab after searching
pub const NEW_TAB_TIMEOUT: Duration = Duration::from_secs(10);

/// Months the calendar is paged forward looking for a day
const MAX_CALENDAR_MONTHS: usize = 12;

/// Results checked when verifying a sort
const SORT_CHECK_COUNT: usize = 5;

/// Amount in a price label, e.g. `1,234,567 ₫` or `US$45.50`
///
/// A separator followed by exactly two trailing digits is a decimal point;
/// any other `.` or `,` groups thousands.
#[must_use]
pub fn parse_price(text: &str) -> Option<f64> {
    static AMOUNT: OnceLock<Option<Regex>> = OnceLock::new();
    let re = AMOUNT.get_or_init(|| Regex::new(r"\d[\d.,]*").ok()).as_ref()?;
    let raw = re.find(text)?.as_str().trim_end_matches(['.', ',']);
    let (whole, fraction) = match raw.rfind(['.', ',']) {
        Some(i) if raw.len() - i - 1 == 2 => (&raw[..i], &raw[i + 1..]),
        _ => (raw, ""),
    };
    let digits: String = whole.chars().filter(char::is_ascii_digit).collect();
    if fraction.is_empty() {
        digits.parse().ok()
    } else {
        format!("{digits}.{fraction}").parse().ok()
    }
}

fn with_query_param(url: &str, key: &str, value: &str) -> PageResult<String> {
    let re = Regex::new(&format!(r"([?&]{}=)[^&#]*", regex::escape(key)))
        .map_err(|e| PageError::invalid_argument(e.to_string()))?;
    if re.is_match(url) {
        return Ok(re.replace(url, format!("${{1}}{value}")).into_owned());
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    Ok(format!("{url}{separator}{key}={value}"))
}

// =============================================================================
// SEARCH REQUEST
// =============================================================================

/// What to search for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotelSearch {
    /// City or area typed into the search box
    pub destination: String,
    /// Check-in and check-out
    pub stay: Stay,
    /// Adults
    pub adults: u32,
    /// Children
    pub children: u32,
    /// Rooms
    pub rooms: u32,
}

impl HotelSearch {
    /// Two adults in one room
    #[must_use]
    pub fn new(destination: impl Into<String>, stay: Stay) -> Self {
        Self {
            destination: destination.into(),
            stay,
            adults: 2,
            children: 0,
            rooms: 1,
        }
    }

    /// Set guests and rooms
    #[must_use]
    pub const fn with_occupancy(mut self, adults: u32, children: u32, rooms: u32) -> Self {
        self.adults = adults;
        self.children = children;
        self.rooms = rooms;
        self
    }
}

// =============================================================================
// HOME PAGE
// =============================================================================

/// Agoda landing page with the hotel search form
#[derive(Debug, Clone)]
pub struct AgodaHomePage {
    search_box: Element,
    suggestions: Element,
    calendar: DatePicker,
    occupancy_button: Element,
    family_travelers: Element,
    rooms: Counter,
    adults: Counter,
    children: Counter,
    search_button: Element,
}

fn occupancy_counter(
    repository: &mut LocatorRepository,
    prefix: &str,
    name: &str,
) -> PageResult<Counter> {
    let page = AgodaHomePage::PAGE;
    let plus = repository.locator(LOCATOR_FILE, page, &format!("{prefix}Plus"))?;
    let minus = repository.locator(LOCATOR_FILE, page, &format!("{prefix}Minus"))?;
    let value = repository.locator(LOCATOR_FILE, page, &format!("{prefix}Value"))?;
    Ok(Counter::new(&plus, &minus, &value, name))
}

impl AgodaHomePage {
    /// Page name in the locator file
    pub const PAGE: &'static str = "AgodaHomePage";

    /// Build from the Agoda locator file
    pub fn new(repository: &mut LocatorRepository) -> PageResult<Self> {
        let page = Self::PAGE;
        let calendar = DatePicker::new(
            &repository.locator(LOCATOR_FILE, page, "checkInButton")?,
            &repository.locator(LOCATOR_FILE, page, "calendarDay")?,
            ISO_FORMAT,
            "Stay dates",
        )
        .with_navigation(
            &repository.locator(LOCATOR_FILE, page, "nextMonth")?,
            &repository.locator(LOCATOR_FILE, page, "previousMonth")?,
        );
        Ok(Self {
            search_box: repository.element(LOCATOR_FILE, page, "searchBox")?,
            suggestions: repository.element(LOCATOR_FILE, page, "suggestions")?,
            calendar,
            occupancy_button: repository.element(LOCATOR_FILE, page, "occupancyButton")?,
            family_travelers: repository.element(LOCATOR_FILE, page, "familyTravelers")?,
            rooms: occupancy_counter(repository, "rooms", "Rooms")?,
            adults: occupancy_counter(repository, "adults", "Adults")?,
            children: occupancy_counter(repository, "children", "Children")?,
            search_button: repository.element(LOCATOR_FILE, page, "searchButton")?,
        })
    }

    /// Type the destination and pick the first suggestion
    pub async fn search_destination<D: BrowserDriver>(
        &self,
        session: &Session<D>,
        destination: &str,
    ) -> PageResult<()> {
        info!(destination, "Searching destination");
        self.search_box.set_text(session, destination).await?;
        self.suggestions.click_nth(session, 0).await
    }

    /// Page the open calendar forward until `date` can be picked
    async fn reveal_day<D: BrowserDriver>(
        &self,
        session: &Session<D>,
        date: chrono::NaiveDate,
    ) -> PageResult<()> {
        for _ in 0..MAX_CALENDAR_MONTHS {
            if self.calendar.is_date_enabled(session, date).await {
                return Ok(());
            }
            self.calendar.next_month(session).await?;
        }
        Err(PageError::invalid_state(format!(
            "{date} is not selectable within {MAX_CALENDAR_MONTHS} months"
        )))
    }

    /// Pick check-in and check-out days
    ///
    /// # Errors
    ///
    /// [`PageError::InvalidArgument`] when check-out is not after check-in.
    pub async fn set_dates<D: BrowserDriver>(
        &self,
        session: &Session<D>,
        stay: Stay,
    ) -> PageResult<()> {
        if stay.check_out <= stay.check_in {
            return Err(PageError::invalid_argument(format!(
                "check-out must follow check-in: {stay}"
            )));
        }
        info!(%stay, "Setting stay dates");
        if !self.calendar.day_cell(stay.check_in).exists(session).await {
            self.calendar.input().click(session).await?;
        }
        for date in [stay.check_in, stay.check_out] {
            self.reveal_day(session, date).await?;
            self.calendar.day_cell(date).click(session).await?;
        }
        debug!(
            check_in = %stay.check_in.format(DEFAULT_FORMAT),
            check_out = %stay.check_out.format(DEFAULT_FORMAT),
            "Stay dates set"
        );
        Ok(())
    }

    /// Set rooms, adults and children
    ///
    /// # Errors
    ///
    /// [`PageError::InvalidArgument`] unless `adults >= rooms >= 1`.
    pub async fn set_occupancy<D: BrowserDriver>(
        &self,
        session: &Session<D>,
        adults: u32,
        children: u32,
        rooms: u32,
    ) -> PageResult<()> {
        if rooms == 0 || adults < rooms {
            return Err(PageError::invalid_argument(format!(
                "every room needs an adult: {adults} adults for {rooms} rooms"
            )));
        }
        info!(adults, children, rooms, "Setting occupancy");
        if !self.rooms.is_shown(session).await {
            self.occupancy_button.click(session).await?;
        }
        // Best effort: the traveller type tabs are only shown on some layouts.
        if self.family_travelers.is_visible(session).await {
            if let Err(e) = self.family_travelers.click(session).await {
                warn!(error = %e, "Could not choose family travellers, continuing");
            }
        }
        self.rooms.set_value(session, i64::from(rooms)).await?;
        self.adults.set_value(session, i64::from(adults)).await?;
        self.children.set_value(session, i64::from(children)).await
    }

    /// Click search and move to the results tab when one opens
    ///
    /// Returns whether a new tab was opened and switched to.
    pub async fn click_search<D: BrowserDriver>(
        &self,
        session: &mut Session<D>,
    ) -> PageResult<bool> {
        let tabs_before = session.tab_count().await?;
        self.search_button.click(session).await?;
        if session.wait_for_tab_count(tabs_before + 1, NEW_TAB_TIMEOUT).await {
            session.switch_to_last_tab().await?;
            info!("Switched to search results tab");
            Ok(true)
        } else {
            warn!("No results tab opened, continuing in the current tab");
            Ok(false)
        }
    }

    /// Run the whole search form
    pub async fn search<D: BrowserDriver>(
        &self,
        session: &mut Session<D>,
        search: &HotelSearch,
    ) -> PageResult<bool> {
        self.search_destination(session, &search.destination).await?;
        self.set_dates(session, search.stay).await?;
        self.set_occupancy(session, search.adults, search.children, search.rooms)
            .await?;
        self.click_search(session).await
    }
}

impl PageObject for AgodaHomePage {
    fn url_pattern(&self) -> &str {
        "/"
    }

    fn page_name(&self) -> &str {
        Self::PAGE
    }
}

// =============================================================================
// SEARCH RESULTS
// =============================================================================

/// Hotel result list
#[derive(Debug, Clone)]
pub struct SearchResultsPage {
    hotels: Element,
    names: Element,
    locations: Element,
    prices: Element,
    lowest_price_tab: Element,
    sort_button: Element,
    price_ascending_option: Element,
}

impl SearchResultsPage {
    /// Page name in the locator file
    pub const PAGE: &'static str = "SearchResultsPage";

    /// Build from the Agoda locator file
    pub fn new(repository: &mut LocatorRepository) -> PageResult<Self> {
        let mut element = |key: &str| repository.element(LOCATOR_FILE, Self::PAGE, key);
        Ok(Self {
            hotels: element("hotelItems")?,
            names: element("hotelNames")?,
            locations: element("hotelLocations")?,
            prices: element("priceList")?,
            lowest_price_tab: element("lowestPriceTab")?,
            sort_button: element("sortButton")?,
            price_ascending_option: element("priceAscendingOption")?,
        })
    }

    /// Wait for the first result, then count them
    pub async fn number_of_results<D: BrowserDriver>(
        &self,
        session: &Session<D>,
    ) -> PageResult<usize> {
        self.hotels.wait_for_visible(session).await?;
        let count = self.hotels.count(session).await;
        info!(count, "Search results");
        Ok(count)
    }

    /// Name of the result at `index`
    pub async fn hotel_name<D: BrowserDriver>(
        &self,
        session: &Session<D>,
        index: usize,
    ) -> PageResult<String> {
        self.names.nth_text(session, index).await
    }

    /// Area and city of the result at `index`
    pub async fn hotel_location<D: BrowserDriver>(
        &self,
        session: &Session<D>,
        index: usize,
    ) -> PageResult<String> {
        self.locations.nth_text(session, index).await
    }

    /// Displayed price of the result at `index`
    pub async fn hotel_price<D: BrowserDriver>(
        &self,
        session: &Session<D>,
        index: usize,
    ) -> PageResult<f64> {
        let text = self.prices.nth_text(session, index).await?;
        parse_price(&text).ok_or_else(|| {
            PageError::invalid_state(format!("result {index} shows price '{text}'"))
        })
    }

    /// Locations of the first `limit` results
    pub async fn locations<D: BrowserDriver>(
        &self,
        session: &Session<D>,
        limit: usize,
    ) -> PageResult<Vec<String>> {
        let mut texts = self.locations.texts(session).await?;
        texts.truncate(limit);
        Ok(texts)
    }

    /// Whether each of the first `limit` locations names one of `keywords`
    pub async fn all_located_in<D: BrowserDriver>(
        &self,
        session: &Session<D>,
        limit: usize,
        keywords: &[&str],
    ) -> PageResult<bool> {
        let locations = self.locations(session, limit).await?;
        let mismatched: Vec<&String> = locations
            .iter()
            .filter(|location| {
                let location = location.to_lowercase();
                !keywords.iter().any(|k| location.contains(&k.to_lowercase()))
            })
            .collect();
        if !mismatched.is_empty() {
            warn!(?mismatched, ?keywords, "Results outside the destination");
        }
        Ok(mismatched.is_empty())
    }

    /// Prices of the first `limit` results once the list stops changing
    pub async fn prices<D: BrowserDriver>(
        &self,
        session: &Session<D>,
        limit: usize,
    ) -> PageResult<Vec<f64>> {
        let waiter = Waiter::new(session.wait_policy().element);
        let prices = &self.prices;
        let texts = waiter
            .settle(move || async move {
                prices
                    .texts(session)
                    .await
                    .ok()
                    .filter(|texts| !texts.is_empty())
            })
            .await
            .ok_or_else(|| PageError::Timeout {
                element: self.prices.name().to_string(),
                condition: "settled".to_string(),
                timeout_ms: waiter.options().timeout_ms(),
            })?;
        texts
            .iter()
            .take(limit)
            .map(|text| {
                parse_price(text)
                    .ok_or_else(|| PageError::invalid_state(format!("unreadable price '{text}'")))
            })
            .collect()
    }

    /// Whether the first `limit` prices never decrease
    pub async fn are_prices_ascending<D: BrowserDriver>(
        &self,
        session: &Session<D>,
        limit: usize,
    ) -> PageResult<bool> {
        let prices = self.prices(session, limit).await?;
        let ascending = prices.windows(2).all(|pair| pair[0] <= pair[1]);
        debug!(?prices, ascending, "Checked price order");
        Ok(ascending)
    }

    async fn expect_ascending<D: BrowserDriver>(&self, session: &Session<D>) -> PageResult<()> {
        if self.are_prices_ascending(session, SORT_CHECK_COUNT).await? {
            Ok(())
        } else {
            Err(PageError::invalid_state("prices are not ascending after sorting"))
        }
    }

    /// Sort by lowest price, trying the sort bar, the sort menu, then the URL
    ///
    /// Each way counts as done only once the first results are in ascending
    /// price order.
    pub async fn sort_by_lowest_price<D: BrowserDriver>(
        &self,
        session: &Session<D>,
    ) -> StrategyOutcome {
        StrategyChain::new("sort by lowest price")
            .with("sort bar", move || async move {
                self.lowest_price_tab.click(session).await?;
                self.expect_ascending(session).await
            })
            .with("sort menu", move || async move {
                self.sort_button.click(session).await?;
                self.price_ascending_option.click(session).await?;
                self.expect_ascending(session).await
            })
            .with("sort url", move || async move {
                let url = session.current_url().await?;
                session
                    .open(&with_query_param(&url, "sort", "priceLowToHigh")?)
                    .await?;
                session.wait_for_page_load().await?;
                self.expect_ascending(session).await
            })
            .run()
            .await
    }
}

impl PageObject for SearchResultsPage {
    fn url_pattern(&self) -> &str {
        "/search"
    }

    fn load_timeout_ms(&self) -> u64 {
        60_000
    }

    fn page_name(&self) -> &str {
        Self::PAGE
    }
}

// =============================================================================
// HOTEL DETAILS
// =============================================================================

/// A single hotel's page
#[derive(Debug, Clone)]
pub struct HotelDetailsPage {
    name: Element,
    address: Element,
    rating: Element,
    room_types: Element,
    room_prices: Element,
    book_buttons: Element,
    amenities: Element,
    show_all_amenities: Element,
}

impl Default for HotelDetailsPage {
    fn default() -> Self {
        Self::new()
    }
}

impl HotelDetailsPage {
    /// Page with the standard hotel page selectors
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: Element::label("[data-selenium='hotel-header-name']", "Hotel name"),
            address: Element::label("[data-selenium='hotel-address-map']", "Hotel address"),
            rating: Element::label("[data-selenium='hotel-header-review-score']", "Hotel rating"),
            room_types: Element::collection(
                "[data-selenium='masterroom-title-name']",
                "Room types",
            ),
            room_prices: Element::collection("[data-selenium='PriceDisplay']", "Room prices"),
            book_buttons: Element::collection(
                "[data-selenium='ChildRoomsList-bookButtonInput']",
                "Book buttons",
            ),
            amenities: Element::collection("[data-selenium='hotel-facility-item']", "Amenities"),
            show_all_amenities: Element::button(
                "[data-selenium='hotel-facilities-show-all']",
                "Show all amenities",
            ),
        }
    }

    /// Hotel name once shown
    pub async fn hotel_name<D: BrowserDriver>(&self, session: &Session<D>) -> PageResult<String> {
        self.name.wait_for_visible(session).await?;
        self.name.get_text(session).await
    }

    /// Street address
    pub async fn address<D: BrowserDriver>(&self, session: &Session<D>) -> PageResult<String> {
        self.address.get_text(session).await
    }

    /// Review score as shown
    pub async fn rating<D: BrowserDriver>(&self, session: &Session<D>) -> PageResult<String> {
        self.rating.get_text(session).await
    }

    /// Room type names
    pub async fn room_types<D: BrowserDriver>(
        &self,
        session: &Session<D>,
    ) -> PageResult<Vec<String>> {
        self.room_types.texts(session).await
    }

    /// Price label of the room at `index`
    pub async fn room_price<D: BrowserDriver>(
        &self,
        session: &Session<D>,
        index: usize,
    ) -> PageResult<String> {
        self.room_prices.nth_text(session, index).await
    }

    /// Book the room at `index`
    pub async fn book_room<D: BrowserDriver>(
        &self,
        session: &Session<D>,
        index: usize,
    ) -> PageResult<()> {
        info!(index, "Booking room");
        self.book_buttons.click_nth(session, index).await
    }

    /// Expand the amenity list; no-op when already expanded
    pub async fn show_all_amenities<D: BrowserDriver>(
        &self,
        session: &Session<D>,
    ) -> PageResult<()> {
        if self.show_all_amenities.is_visible(session).await {
            self.show_all_amenities.click(session).await?;
        }
        Ok(())
    }

    /// Amenity names
    pub async fn amenities<D: BrowserDriver>(
        &self,
        session: &Session<D>,
    ) -> PageResult<Vec<String>> {
        self.amenities.texts(session).await
    }
}

impl PageObject for HotelDetailsPage {
    fn url_pattern(&self) -> &str {
        "/*/hotel/*"
    }

    fn page_name(&self) -> &str {
        "HotelDetailsPage"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("1,234,567 ₫"), Some(1_234_567.0));
        assert_eq!(parse_price("₫ 850.000"), Some(850_000.0));
        assert_eq!(parse_price("US$45.50"), Some(45.5));
        assert_eq!(parse_price("Price: 99"), Some(99.0));
        assert_eq!(parse_price("Sold out"), None);
    }

    #[test]
    fn test_with_query_param() {
        assert_eq!(
            with_query_param("https://a.test/search?city=16440", "sort", "priceLowToHigh").unwrap(),
            "https://a.test/search?city=16440&sort=priceLowToHigh"
        );
        assert_eq!(
            with_query_param(
                "https://a.test/search?sort=agodaRecommended&x=1",
                "sort",
                "priceLowToHigh"
            )
            .unwrap(),
            "https://a.test/search?sort=priceLowToHigh&x=1"
        );
        assert_eq!(
            with_query_param("https://a.test/search", "sort", "p").unwrap(),
            "https://a.test/search?sort=p"
        );
    }

    #[test]
    fn test_pages_build_from_bundled_locators() {
        let mut repository =
            LocatorRepository::new(concat!(env!("CARGO_MANIFEST_DIR"), "/locators"));
        assert!(AgodaHomePage::new(&mut repository).is_ok());
        assert!(SearchResultsPage::new(&mut repository).is_ok());
    }

    #[test]
    fn test_hotel_search_defaults() {
        let stay = crate::dates::hotel_dates(
            chrono::NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
            4,
            3,
        );
        let search = HotelSearch::new("Da Nang", stay).with_occupancy(4, 0, 2);
        assert_eq!((search.adults, search.children, search.rooms), (4, 0, 2));
        assert_eq!(HotelSearch::new("Hue", stay).rooms, 1);
    }
}
