//! Ordered fallback strategies.
//!
//! Third-party pages change their markup often, so some workflow steps have
//! more than one way of getting done. A [`StrategyChain`] tries each named
//! strategy in order and stops at the first that succeeds. The caller gets a
//! [`StrategyOutcome`] saying which one worked, or every failure when none
//! did; nothing is swallowed silently.

use crate::result::{PageError, PageResult};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use tracing::{info, warn};

type StrategyFuture<'a> = Pin<Box<dyn Future<Output = PageResult<()>> + 'a>>;
type Strategy<'a> = Box<dyn FnOnce() -> StrategyFuture<'a> + 'a>;

/// Result of running a chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyOutcome {
    /// A strategy succeeded
    Succeeded {
        /// Name of the strategy that worked
        strategy: String,
        /// Its 0-based position in the chain
        index: usize,
    },
    /// Every strategy failed
    AllFailed {
        /// `(strategy, error)` for each attempt, in order
        failures: Vec<(String, String)>,
    },
}

impl StrategyOutcome {
    /// Whether some strategy worked
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    /// Name of the winning strategy
    #[must_use]
    pub fn strategy(&self) -> Option<&str> {
        match self {
            Self::Succeeded { strategy, .. } => Some(strategy),
            Self::AllFailed { .. } => None,
        }
    }

    /// Winning strategy name, or [`PageError::InvalidState`] listing failures
    pub fn into_result(self, action: &str) -> PageResult<String> {
        match self {
            Self::Succeeded { strategy, .. } => Ok(strategy),
            failed @ Self::AllFailed { .. } => Err(PageError::InvalidState {
                message: format!("{action}: {failed}"),
            }),
        }
    }
}

impl fmt::Display for StrategyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded { strategy, index } => {
                write!(f, "succeeded with '{strategy}' (#{})", index + 1)
            }
            Self::AllFailed { failures } => {
                write!(f, "all {} strategies failed", failures.len())?;
                for (name, error) in failures {
                    write!(f, "; {name}: {error}")?;
                }
                Ok(())
            }
        }
    }
}

/// Named strategies tried in insertion order
pub struct StrategyChain<'a> {
    action: String,
    strategies: Vec<(String, Strategy<'a>)>,
}

impl fmt::Debug for StrategyChain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyChain")
            .field("action", &self.action)
            .field("strategies", &self.names())
            .finish()
    }
}

impl<'a> StrategyChain<'a> {
    /// Empty chain for `action`, used in logs
    #[must_use]
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            strategies: Vec::new(),
        }
    }

    /// Append a strategy
    #[must_use]
    pub fn with<F, Fut>(mut self, name: impl Into<String>, strategy: F) -> Self
    where
        F: FnOnce() -> Fut + 'a,
        Fut: Future<Output = PageResult<()>> + 'a,
    {
        self.strategies
            .push((name.into(), Box::new(move || Box::pin(strategy()))));
        self
    }

    /// Strategy names in order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.strategies.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Number of strategies
    #[must_use]
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Whether the chain has no strategies
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Try each strategy until one succeeds
    pub async fn run(self) -> StrategyOutcome {
        let mut failures = Vec::new();
        for (index, (name, strategy)) in self.strategies.into_iter().enumerate() {
            match strategy().await {
                Ok(()) => {
                    info!(action = %self.action, strategy = %name, index, "Strategy succeeded");
                    return StrategyOutcome::Succeeded {
                        strategy: name,
                        index,
                    };
                }
                Err(e) => {
                    warn!(
                        action = %self.action,
                        strategy = %name,
                        error = %e,
                        "Strategy failed, trying next"
                    );
                    failures.push((name, e.to_string()));
                }
            }
        }
        warn!(action = %self.action, attempts = failures.len(), "No strategy succeeded");
        StrategyOutcome::AllFailed { failures }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[tokio::test]
    async fn test_first_success_wins() {
        let ran = RefCell::new(Vec::new());
        let ran_ref = &ran;
        let outcome = StrategyChain::new("sort")
            .with("dropdown", move || async move {
                ran_ref.borrow_mut().push("dropdown");
                Err(PageError::invalid_argument("no dropdown"))
            })
            .with("tab", move || async move {
                ran_ref.borrow_mut().push("tab");
                Ok(())
            })
            .with("url", move || async move {
                ran_ref.borrow_mut().push("url");
                Ok(())
            })
            .run()
            .await;
        assert_eq!(
            outcome,
            StrategyOutcome::Succeeded {
                strategy: "tab".to_string(),
                index: 1
            }
        );
        assert_eq!(*ran.borrow(), vec!["dropdown", "tab"]);
        assert_eq!(outcome.into_result("sort").unwrap(), "tab");
    }

    #[tokio::test]
    async fn test_all_failed_lists_every_error() {
        let outcome = StrategyChain::new("sort")
            .with("a", || async { Err(PageError::invalid_argument("first")) })
            .with("b", || async { Err(PageError::invalid_argument("second")) })
            .run()
            .await;
        match &outcome {
            StrategyOutcome::AllFailed { failures } => {
                assert_eq!(failures.len(), 2);
                assert_eq!(failures[0].0, "a");
                assert!(failures[1].1.contains("second"));
            }
            other => panic!("unexpected outcome: {other}"),
        }
        assert!(!outcome.is_success());
        let err = outcome.into_result("sort").unwrap_err();
        assert!(matches!(err, PageError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn test_empty_chain_fails() {
        let chain = StrategyChain::new("noop");
        assert!(chain.is_empty());
        assert_eq!(
            chain.run().await,
            StrategyOutcome::AllFailed { failures: vec![] }
        );
    }
}
