//! Pagecraft: page objects and resilient element wrappers for browser UI tests
//!
//! Tests talk to page objects, page objects are made of [`Element`]s, and
//! every element call goes through a [`Session`] to a [`BrowserDriver`]. The
//! driver is either a real Chromium instance (feature `browser`) or the
//! scripted [`MockDriver`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   PAGECRAFT Architecture                         │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Test /     │    │ Element +  │    │ Session    │            │
//! │   │ Page       │───►│ Widgets    │───►│ (tab,      │            │
//! │   │ Object     │    │            │    │  frames)   │            │
//! │   └────────────┘    └────────────┘    └─────┬──────┘            │
//! │                                             ▼                   │
//! │                          ┌──────────────────────────────┐       │
//! │                          │ BrowserDriver                │       │
//! │                          │  ChromiumDriver | MockDriver │       │
//! │                          └──────────────────────────────┘       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use pagecraft::prelude::*;
//!
//! # async fn demo() -> PageResult<()> {
//! let driver = MockDriver::new()
//!     .with_element(MockElement::new("#q").input("text"));
//! let session = Session::new(driver);
//! let search = Element::text_box("#q", "Search box");
//! search.set_text(&session, "Da Nang").await?;
//! assert_eq!(search.get_text(&session).await?, "Da Nang");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]
#![cfg_attr(test, allow(clippy::large_stack_arrays, clippy::large_stack_frames))]

/// Chromium backend over the DevTools protocol
#[cfg(feature = "browser")]
#[allow(clippy::missing_errors_doc, clippy::doc_markdown)]
pub mod browser;

/// Fluent element chains
pub mod chain;

/// Configuration file loading and typed getters
#[allow(clippy::missing_errors_doc)]
pub mod config;

/// Test data date arithmetic
pub mod dates;

/// JavaScript snippets run in the page by the Chromium backend
#[allow(clippy::needless_raw_string_hashes)]
pub mod dom_script;

/// Driver seam and the values passed across it
#[allow(clippy::missing_errors_doc)]
pub mod driver;

/// Named elements with waits and stale retry
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
pub mod element;

/// Locators and selectors
pub mod locator;

/// Tracing subscriber setup
pub mod logging;

/// Scripted in-memory driver
#[allow(clippy::missing_errors_doc, clippy::too_many_lines)]
pub mod mock;

/// Page object trait, URL matching and repository-backed pages
#[allow(clippy::missing_errors_doc)]
pub mod page_object;

/// JSON locator repository
#[allow(clippy::missing_errors_doc)]
pub mod repository;

/// Error taxonomy
pub mod result;

/// Stale-element retry policy
pub mod retry;

/// Driver, context and policies for one test
#[allow(clippy::missing_errors_doc)]
pub mod session;

/// Travel-site page objects
#[allow(clippy::missing_errors_doc)]
pub mod sites;

/// Ordered fallback strategies
pub mod strategy;

/// Polling waits
pub mod wait;

/// Capability-specific element operations
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
pub mod widgets;

#[cfg(feature = "browser")]
pub use browser::ChromiumDriver;
pub use chain::Chain;
pub use config::Config;
pub use driver::{
    BrowserDriver, ClickKind, ElementState, Key, OptionMatch, SelectOption, SessionContext,
};
pub use element::{Capabilities, Element, ElementKind};
pub use locator::{Locator, Selector};
pub use mock::{MockDriver, MockEffect, MockElement};
pub use page_object::{verify_on_page, DynamicPage, PageObject, UrlMatcher};
pub use repository::LocatorRepository;
pub use result::{PageError, PageResult};
pub use retry::{with_stale_retry, RetryPolicy};
pub use session::Session;
pub use strategy::{StrategyChain, StrategyOutcome};
pub use wait::{ElementCondition, LoadState, WaitOptions, WaitPolicy, WaitResult, Waiter};

/// Prelude for convenient imports
pub mod prelude {
    #[cfg(feature = "browser")]
    pub use super::browser::ChromiumDriver;
    pub use super::chain::Chain;
    pub use super::config::Config;
    pub use super::driver::{
        BrowserDriver, ClickKind, Key, OptionMatch, SelectOption, SessionContext,
    };
    pub use super::element::{Capabilities, Element, ElementKind};
    pub use super::locator::{Locator, Selector};
    pub use super::mock::{MockDriver, MockEffect, MockElement};
    pub use super::page_object::{verify_on_page, DynamicPage, PageObject, UrlMatcher};
    pub use super::repository::LocatorRepository;
    pub use super::result::{PageError, PageResult};
    pub use super::session::Session;
    pub use super::strategy::{StrategyChain, StrategyOutcome};
    pub use super::wait::{ElementCondition, WaitResult};
    pub use super::widgets;
}
