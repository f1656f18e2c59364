//! Behavioural contract of elements, waits, retries and configuration.
//!
//! Every test runs against the scripted driver with tokio's clock paused,
//! so timeouts are exact and the suite stays fast.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use pagecraft::prelude::*;
use pagecraft::widgets::{checkable, select};
use pagecraft::{RetryPolicy, WaitOptions, WaitPolicy};
use proptest::prelude::*;
use std::time::Duration;
use tokio::time::Instant;

fn session_with(driver: MockDriver) -> Session<MockDriver> {
    Session::new(driver).with_wait_policy(WaitPolicy {
        element: WaitOptions::new()
            .with_timeout(Duration::from_millis(2_000))
            .with_poll_interval(Duration::from_millis(100)),
        page_load: WaitOptions::new(),
    })
}

fn three_options() -> MockElement {
    MockElement::new("#choice").select(vec![
        SelectOption::with_value("Option 1", "1"),
        SelectOption::with_value("Option 2", "2"),
        SelectOption::with_value("Option 3", "3"),
    ])
}

// =============================================================================
// Existence and waits
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_exists_is_false_not_an_error() {
    let s = session_with(MockDriver::new());
    let ghost = Element::new("#ghost", "Ghost");
    assert!(!ghost.exists(&s).await);
    assert!(!ghost.is_visible(&s).await);
    assert_eq!(ghost.count(&s).await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_click_on_missing_element_times_out_within_bounds() {
    let s = session_with(MockDriver::new());
    let start = Instant::now();
    let err = Element::button("#never", "Never").click(&s).await.unwrap_err();
    let elapsed = start.elapsed();

    assert!(err.is_timeout(), "unexpected error: {err}");
    assert!(elapsed >= Duration::from_millis(2_000));
    assert!(elapsed <= Duration::from_millis(2_100));
    match err {
        PageError::Timeout { element, timeout_ms, .. } => {
            assert_eq!(element, "Never");
            assert_eq!(timeout_ms, 2_000);
        }
        other => panic!("expected timeout, got {other}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_click_waits_for_late_element() {
    let s = session_with(
        MockDriver::new().with_element(
            MockElement::new("#late")
                .tag("button")
                .appears_after(Duration::from_millis(700)),
        ),
    );
    let start = Instant::now();
    Element::button("#late", "Late").click(&s).await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(700));
    assert!(s.driver().was_called("click:#late"));
}

#[tokio::test(start_paused = true)]
async fn test_locator_timeout_overrides_session_policy() {
    let s = session_with(MockDriver::new());
    let quick = Element::button("#never", "Quick").with_timeout(Duration::from_millis(300));
    let start = Instant::now();
    assert!(quick.click(&s).await.is_err());
    assert!(start.elapsed() < Duration::from_millis(500));
}

// =============================================================================
// Text, select and checkbox round trips
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_set_text_then_get_text_is_exact() {
    let s = session_with(MockDriver::new().with_element(
        MockElement::new("#name").input("text").value("previous"),
    ));
    let name = Element::text_box("#name", "Name");
    name.set_text(&s, "  Nguyen Van A <a@b.c>  ").await.unwrap();
    assert_eq!(name.get_text(&s).await.unwrap(), "  Nguyen Van A <a@b.c>  ");
}

#[tokio::test(start_paused = true)]
async fn test_select_by_index_then_selected_text() {
    let s = session_with(MockDriver::new().with_element(three_options()));
    let choice = Element::dropdown("#choice", "Choice");
    for i in 0..3 {
        select::select_by_index(&s, &choice, i).await.unwrap();
        assert_eq!(
            select::selected_text(&s, &choice).await.unwrap(),
            format!("Option {}", i + 1)
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_select_by_text_reports_value() {
    let s = session_with(MockDriver::new().with_element(three_options()));
    let choice = Element::dropdown("#choice", "Choice");
    select::select_by_text(&s, &choice, "Option 1").await.unwrap();
    assert_eq!(select::selected_value(&s, &choice).await.unwrap(), "1");
    let err = select::select_by_text(&s, &choice, "Option 9").await.unwrap_err();
    assert!(matches!(err, PageError::InvalidArgument { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_check_twice_stays_checked() {
    let s = session_with(MockDriver::new().with_element(MockElement::new("#terms").checkbox()));
    let terms = Element::checkbox("#terms", "Terms");
    checkable::check(&s, &terms).await.unwrap();
    checkable::check(&s, &terms).await.unwrap();
    assert!(checkable::is_checked(&s, &terms).await.unwrap());
    assert_eq!(s.driver().call_count("click:#terms"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_capability_mismatch_is_unsupported() {
    let s = session_with(MockDriver::new().with_element(MockElement::new("#label").text("Hi")));
    let label = Element::label("#label", "Greeting");
    let err = select::select_by_index(&s, &label, 0).await.unwrap_err();
    assert!(matches!(err, PageError::Unsupported { .. }));
}

// =============================================================================
// Stale retry
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_stale_errors_are_retried_up_to_the_limit() {
    let driver = MockDriver::new().with_element(MockElement::new("#go").tag("button"));
    driver.fail_stale("#go", 2);
    let s = session_with(driver).with_retry_policy(RetryPolicy {
        max_attempts: 3,
        delay: Duration::from_millis(500),
    });
    Element::button("#go", "Go").click(&s).await.unwrap();
    assert_eq!(s.driver().call_count("click:#go"), 3);
}

#[tokio::test(start_paused = true)]
async fn test_stale_retries_exhausted() {
    let driver = MockDriver::new().with_element(MockElement::new("#go").tag("button"));
    driver.fail_stale("#go", 10);
    let s = session_with(driver).with_retry_policy(RetryPolicy {
        max_attempts: 3,
        delay: Duration::from_millis(500),
    });
    let err = Element::button("#go", "Go").click(&s).await.unwrap_err();
    match err {
        PageError::StaleRetriesExhausted { element, attempts } => {
            assert_eq!(element, "Go");
            assert_eq!(attempts, 3);
        }
        other => panic!("expected exhausted retries, got {other}"),
    }
    assert_eq!(s.driver().call_count("click:#go"), 3);
}

#[tokio::test(start_paused = true)]
async fn test_other_errors_are_not_retried() {
    let driver = MockDriver::new().with_element(MockElement::new("#go").tag("button"));
    driver.fail_action("#go", "renderer crashed");
    let s = session_with(driver);
    let err = Element::button("#go", "Go").click(&s).await.unwrap_err();
    assert!(matches!(err, PageError::Driver { .. }));
    assert_eq!(s.driver().call_count("click:#go"), 1);
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn test_element_timeout_from_config_and_default() {
    let config = Config::from_toml_str("elementTimeout = 10000\n").unwrap();
    assert_eq!(config.element_timeout_ms(), 10_000);
    let config = Config::from_toml_str("headless = true\n").unwrap();
    assert_eq!(config.element_timeout_ms(), 10_000);
    let config = Config::from_toml_str("elementTimeout = 2500\npollInterval = 50\n").unwrap();
    let policy = WaitPolicy::from_config(&config);
    assert_eq!(policy.element.timeout, Duration::from_millis(2_500));
    assert_eq!(policy.element.poll_interval, Duration::from_millis(50));
}

#[test]
fn test_stale_retries_from_config() {
    let config = Config::from_toml_str("staleRetries = 5\nstaleRetryDelay = 100\n").unwrap();
    let policy = RetryPolicy::from_config(&config);
    assert_eq!(policy.max_attempts, 5);
    assert_eq!(policy.delay, Duration::from_millis(100));
}

// =============================================================================
// Selector classification
// =============================================================================

proptest! {
    #[test]
    fn prop_selector_raw_form_parses_back(id in "[a-z][a-z0-9-]{0,12}", text in "[A-Za-z ]{1,12}") {
        for raw in [
            format!("#{id}"),
            format!("//div[@id='{id}']"),
            format!("text={}", text.trim()),
            format!("testid={id}"),
            format!("#{id} >> text={}", text.trim()),
        ] {
            let selector = Selector::parse(&raw);
            prop_assert_eq!(Selector::parse(&selector.raw()), selector);
        }
    }
}
