//! Result and error types for pagecraft.

use thiserror::Error;

/// Result type for pagecraft operations
pub type PageResult<T> = Result<T, PageError>;

/// Errors that can occur while driving a page
#[derive(Debug, Error)]
pub enum PageError {
    /// A wait precondition was not met in time
    #[error("'{element}' was not {condition} after {timeout_ms}ms")]
    Timeout {
        /// Display name of the element (or page) being waited on
        element: String,
        /// Human readable condition, e.g. "visible"
        condition: String,
        /// Timeout in milliseconds
        timeout_ms: u64,
    },

    /// A previously resolved node was detached from the DOM
    #[error("Stale element for selector {selector}")]
    StaleElement {
        /// Selector that resolved to the stale node
        selector: String,
    },

    /// Stale element retries were used up
    #[error("'{element}' kept going stale after {attempts} attempts")]
    StaleRetriesExhausted {
        /// Display name of the element
        element: String,
        /// Attempts made before giving up
        attempts: u32,
    },

    /// Nothing matched the selector
    #[error("No element matches {selector}")]
    ElementNotFound {
        /// Selector that matched nothing
        selector: String,
    },

    /// The element does not carry the capability needed by the call
    #[error("'{element}' does not support {capability}")]
    Unsupported {
        /// Display name of the element
        element: String,
        /// Missing capability
        capability: String,
    },

    /// A caller supplied argument is out of range or malformed
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },

    /// The page is in a state the operation cannot work with
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Error message
        message: String,
    },

    /// Driver level failure
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Browser launch or connection failure
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Script evaluation failed
    #[error("Script evaluation failed: {message}")]
    Script {
        /// Error message
        message: String,
    },

    /// Tab index out of range
    #[error("No tab at index {index} ({count} open)")]
    NoSuchTab {
        /// Requested index
        index: usize,
        /// Number of open tabs
        count: usize,
    },

    /// File download failed or never completed
    #[error("Download failed: {message}")]
    Download {
        /// Error message
        message: String,
    },

    /// Configuration file is missing
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// Path that was looked up
        path: String,
    },

    /// Configuration file could not be parsed
    #[error("Invalid configuration: {message}")]
    ConfigParse {
        /// Error message
        message: String,
    },

    /// Locator definition file could not be read or parsed
    #[error("Locator file {path}: {message}")]
    LocatorFile {
        /// File path
        path: String,
        /// Error message
        message: String,
    },

    /// Page missing from the locator repository
    #[error("Unknown page '{page}'")]
    UnknownPage {
        /// Page name
        page: String,
    },

    /// Element missing from a page's locator definitions
    #[error("Unknown element '{element}' on page '{page}'")]
    UnknownElement {
        /// Page name
        page: String,
        /// Element key
        element: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PageError {
    /// Shorthand for a driver error carrying a message
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Shorthand for an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Shorthand for an invalid state error
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Whether the error signals a detached node and the action may be retried
    #[must_use]
    pub const fn is_stale(&self) -> bool {
        matches!(self, Self::StaleElement { .. })
    }

    /// Whether the error is a wait timeout
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_names_element_and_condition() {
        let err = PageError::Timeout {
            element: "Search button".to_string(),
            condition: "clickable".to_string(),
            timeout_ms: 10_000,
        };
        assert_eq!(
            err.to_string(),
            "'Search button' was not clickable after 10000ms"
        );
        assert!(err.is_timeout());
        assert!(!err.is_stale());
    }

    #[test]
    fn test_stale_classification() {
        let err = PageError::StaleElement {
            selector: "#price".to_string(),
        };
        assert!(err.is_stale());
        let exhausted = PageError::StaleRetriesExhausted {
            element: "Price".to_string(),
            attempts: 3,
        };
        assert!(!exhausted.is_stale());
        assert!(exhausted.to_string().contains("3 attempts"));
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: PageError = io.into();
        assert!(matches!(err, PageError::Io(_)));
    }

    #[test]
    fn test_unknown_element_message() {
        let err = PageError::UnknownElement {
            page: "AgodaHomePage".to_string(),
            element: "searchBox".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unknown element 'searchBox' on page 'AgodaHomePage'"
        );
    }
}
