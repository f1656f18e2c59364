//! End-to-end runs against the real sites.
//!
//! These need a Chromium install and network access, so they are ignored by
//! default:
//!
//! ```bash
//! cargo test -p pagecraft --features browser --test live_sites_test -- --ignored
//! ```

#![cfg(feature = "browser")]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::Weekday;
use pagecraft::dates;
use pagecraft::prelude::*;
use pagecraft::sites::agoda::{AgodaHomePage, HotelSearch, SearchResultsPage};
use pagecraft::sites::vietjet::VietjetHomePage;

async fn start() -> (Config, Session<ChromiumDriver>, LocatorRepository) {
    let config = Config::discover().unwrap_or_default();
    pagecraft::logging::init_from_config(&config);
    let driver = ChromiumDriver::launch(&config).await.expect("browser launch");
    let session = Session::from_config(driver, &config);
    let repository = LocatorRepository::from_config(&config);
    (config, session, repository)
}

#[tokio::test]
#[ignore = "requires chromium and network access"]
async fn test_agoda_weekend_search_sorted_by_price() {
    let (config, mut session, mut repository) = start().await;
    let stay = dates::weekend_stay(dates::today(), Weekday::Fri, 3).unwrap();
    let home = AgodaHomePage::new(&mut repository).unwrap();
    session.open_and_wait(&config.agoda_url()).await.unwrap();

    home.search(&mut session, &HotelSearch::new("Da Nang", stay))
        .await
        .unwrap();

    let results = SearchResultsPage::new(&mut repository).unwrap();
    assert!(results.number_of_results(&session).await.unwrap() > 0);
    let outcome = results.sort_by_lowest_price(&session).await;
    assert!(outcome.is_success(), "no sort strategy worked: {outcome:?}");
    assert!(results.all_located_in(&session, 5, &["Da Nang", "Đà Nẵng"]).await.unwrap());

    session.close().await.unwrap();
}

#[tokio::test]
#[ignore = "requires chromium and network access"]
async fn test_vietjet_one_way_search() {
    let (config, session, mut repository) = start().await;
    let home = VietjetHomePage::new(&mut repository).unwrap();
    session.open_and_wait(&config.vietjet_url()).await.unwrap();

    let depart = dates::future_date(dates::today(), 14);
    home.search_one_way(&session, "SGN", "HAN", depart)
        .await
        .unwrap();
    assert!(session.current_url().await.unwrap().contains("vietjetair.com"));

    session.close().await.unwrap();
}
