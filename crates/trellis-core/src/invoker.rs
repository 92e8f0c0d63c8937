//! Safe execution of test logic
//!
//! [`run`] executes one action and never lets a failure escape: returned
//! failures and panics alike are classified into a [`TestOutcome`] and
//! logged to the matching stream.

use crate::log::{LogSink, LogStream};
use crate::outcome::{Failure, TestOutcome, TestStatus};
use std::panic::{self, AssertUnwindSafe};

/// Run an action, catching and logging whatever goes wrong
///
/// - success: `Passed`, nothing logged
/// - invocation wrappers are stripped before classification
/// - an outcome-carrying failure yields its own outcome
/// - anything else (including panics) yields `Failed`
///
/// `Inconclusive` outcomes go to the warnings stream and `Failed` outcomes
/// to the failures stream, tagged with `description`.
pub fn run<F>(log: &dyn LogSink, action: F, description: Option<&str>) -> TestOutcome
where
    F: FnOnce() -> Result<(), Failure>,
{
    let failure = match panic::catch_unwind(AssertUnwindSafe(action)) {
        Ok(Ok(())) => return TestOutcome::passed(),
        Ok(Err(failure)) => failure,
        Err(payload) => Failure::from_panic(payload),
    };

    let failure = failure.unwrap_invocation();
    let outcome = failure.outcome();

    match outcome.status {
        TestStatus::Inconclusive => log.write_failure(LogStream::Warnings, &failure, description),
        TestStatus::Failed => log.write_failure(LogStream::Failures, &failure, description),
        TestStatus::Passed | TestStatus::Skipped => {}
    }

    outcome
}
