//! Test outcomes and the failures that produce them
//!
//! A test action reports trouble by returning a [`Failure`] or by
//! panicking. Either way [`crate::invoker::run`] turns it into a
//! [`TestOutcome`]; an outcome-carrying failure keeps its exact outcome,
//! everything else becomes `Failed`.

use serde::Serialize;
use std::any::Any;
use std::fmt;
use thiserror::Error;

/// Coarse result of running a test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TestStatus {
    Passed,
    Failed,
    Inconclusive,
    Skipped,
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TestStatus::Passed => "passed",
            TestStatus::Failed => "failed",
            TestStatus::Inconclusive => "inconclusive",
            TestStatus::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

/// Status plus an optional refining category (e.g. "error", "ignored")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TestOutcome {
    pub status: TestStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl TestOutcome {
    /// Outcome with a status and no category
    pub const fn new(status: TestStatus) -> Self {
        Self {
            status,
            category: None,
        }
    }

    /// Outcome with a status and category
    pub fn with_category(status: TestStatus, category: impl Into<String>) -> Self {
        Self {
            status,
            category: Some(category.into()),
        }
    }

    pub const fn passed() -> Self {
        Self::new(TestStatus::Passed)
    }

    pub const fn failed() -> Self {
        Self::new(TestStatus::Failed)
    }

    /// Failed because of an error in the harness rather than an assertion
    pub fn error() -> Self {
        Self::with_category(TestStatus::Failed, "error")
    }

    pub const fn inconclusive() -> Self {
        Self::new(TestStatus::Inconclusive)
    }

    pub fn pending() -> Self {
        Self::with_category(TestStatus::Inconclusive, "pending")
    }

    pub fn timeout() -> Self {
        Self::with_category(TestStatus::Failed, "timeout")
    }

    pub const fn skipped() -> Self {
        Self::new(TestStatus::Skipped)
    }

    pub fn ignored() -> Self {
        Self::with_category(TestStatus::Skipped, "ignored")
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.category {
            Some(category) => write!(f, "{} ({})", self.status, category),
            None => write!(f, "{}", self.status),
        }
    }
}

/// A failure raised by test logic
#[derive(Debug, Error)]
pub enum Failure {
    /// Carries the exact outcome the test wants reported
    #[error("{message}")]
    Outcome { outcome: TestOutcome, message: String },

    /// Wrapper added when a method is invoked through the code model
    #[error("invocation of '{target}' failed: {inner}")]
    Invocation {
        target: String,
        #[source]
        inner: Box<Failure>,
    },

    /// A panic caught while running test logic
    #[error("panicked: {0}")]
    Panic(String),

    /// Plain failure message
    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl Failure {
    /// Plain failure
    pub fn message(message: impl Into<String>) -> Self {
        Failure::Message(message.into())
    }

    /// Failure carrying an explicit outcome
    pub fn with_outcome(outcome: TestOutcome, message: impl Into<String>) -> Self {
        Failure::Outcome {
            outcome,
            message: message.into(),
        }
    }

    /// The test could not decide; reported as a warning, not a failure
    pub fn inconclusive(message: impl Into<String>) -> Self {
        Self::with_outcome(TestOutcome::inconclusive(), message)
    }

    /// Wrap a failure raised by an invoked method
    pub fn invocation(target: impl Into<String>, inner: Failure) -> Self {
        Failure::Invocation {
            target: target.into(),
            inner: Box::new(inner),
        }
    }

    /// Convert a caught panic payload
    ///
    /// Payloads raised with [`Failure::raise`] are recovered as-is.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let payload = match payload.downcast::<Failure>() {
            Ok(failure) => return *failure,
            Err(other) => other,
        };

        if let Some(s) = payload.downcast_ref::<&str>() {
            Failure::Panic((*s).to_string())
        } else if let Some(s) = payload.downcast_ref::<String>() {
            Failure::Panic(s.clone())
        } else {
            Failure::Panic("<non-string panic payload>".to_string())
        }
    }

    /// Strip invocation wrappers down to the failure that caused them
    pub fn unwrap_invocation(self) -> Self {
        let mut failure = self;
        while let Failure::Invocation { inner, .. } = failure {
            failure = *inner;
        }
        failure
    }

    /// The outcome this failure maps to
    pub fn outcome(&self) -> TestOutcome {
        match self {
            Failure::Outcome { outcome, .. } => outcome.clone(),
            _ => TestOutcome::failed(),
        }
    }

    /// Raise this failure as a panic so it can cross code that cannot return it
    pub fn raise(self) -> ! {
        std::panic::panic_any(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_display() {
        assert_eq!(TestOutcome::passed().to_string(), "passed");
        assert_eq!(TestOutcome::error().to_string(), "failed (error)");
        assert_eq!(TestOutcome::ignored().to_string(), "skipped (ignored)");
    }

    #[test]
    fn test_plain_failure_maps_to_failed() {
        assert_eq!(Failure::message("boom").outcome(), TestOutcome::failed());
    }

    #[test]
    fn test_outcome_failure_keeps_outcome() {
        let failure = Failure::with_outcome(TestOutcome::pending(), "later");
        assert_eq!(failure.outcome(), TestOutcome::pending());
        assert_eq!(failure.to_string(), "later");
    }

    #[test]
    fn test_unwrap_invocation_reaches_cause() {
        let wrapped = Failure::invocation(
            "outer",
            Failure::invocation("inner", Failure::inconclusive("unsure")),
        );
        assert_eq!(wrapped.outcome(), TestOutcome::failed());

        let cause = wrapped.unwrap_invocation();
        assert_eq!(cause.outcome(), TestOutcome::inconclusive());
    }

    #[test]
    fn test_from_panic_payloads() {
        let failure = Failure::from_panic(Box::new("static message"));
        assert!(matches!(failure, Failure::Panic(ref m) if m == "static message"));

        let failure = Failure::from_panic(Box::new(String::from("owned")));
        assert!(matches!(failure, Failure::Panic(ref m) if m == "owned"));

        let failure = Failure::from_panic(Box::new(42_u8));
        assert!(matches!(failure, Failure::Panic(_)));
    }

    #[test]
    fn test_raise_round_trips_through_panic() {
        let payload = std::panic::catch_unwind(|| Failure::inconclusive("nope").raise()).unwrap_err();
        let failure = Failure::from_panic(payload);
        assert_eq!(failure.outcome(), TestOutcome::inconclusive());
    }
}
