//! Page objects for the travel sites under test.
//!
//! Home and results pages take their elements from the JSON locator files
//! under `locators/`, so selector changes on the live sites are fixed in
//! data rather than code.

pub mod agoda;
pub mod vietjet;

pub use agoda::{parse_price, AgodaHomePage, HotelDetailsPage, HotelSearch, SearchResultsPage};
pub use vietjet::{FlightType, VietjetHomePage};
