//! Test runner - execute the leaves of a test model

use crate::error::ModelResult;
use crate::invoker;
use crate::log::{LogSink, TracingLogSink};
use crate::model::{TestModel, TestNode};
use crate::outcome::{TestOutcome, TestStatus};
use rayon::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use trellis_config::RunnerConfig;

/// A completed test run
#[derive(Debug, Clone, Serialize)]
pub struct TestRun {
    pub id: String,
    pub name: String,
    pub outcome: TestOutcome,
    pub duration: Duration,
}

/// Counts per status over a set of runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub inconclusive: usize,
    pub skipped: usize,
    pub duration: Duration,
}

impl RunSummary {
    pub fn from_runs(runs: &[TestRun]) -> Self {
        let mut summary = RunSummary {
            total: runs.len(),
            ..Default::default()
        };

        for run in runs {
            match run.outcome.status {
                TestStatus::Passed => summary.passed += 1,
                TestStatus::Failed => summary.failed += 1,
                TestStatus::Inconclusive => summary.inconclusive += 1,
                TestStatus::Skipped => summary.skipped += 1,
            }
            summary.duration += run.duration;
        }

        summary
    }

    /// No failures
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Test runner with configuration
pub struct TestRunner {
    /// Whether to run tests in parallel
    parallel: bool,
    /// Only run tests whose name contains this
    filter: Option<String>,
    log: Arc<dyn LogSink>,
}

impl Default for TestRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl TestRunner {
    /// Create a new test runner logging through `tracing`
    pub fn new() -> Self {
        Self {
            parallel: true,
            filter: None,
            log: Arc::new(TracingLogSink),
        }
    }

    pub fn from_config(config: &RunnerConfig) -> Self {
        Self::new()
            .with_parallel(config.parallel)
            .with_filter(config.filter.clone())
    }

    /// Set whether to run tests in parallel
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_filter(mut self, filter: Option<String>) -> Self {
        self.filter = filter;
        self
    }

    /// Send warnings and failures somewhere other than `tracing`
    pub fn with_log_sink(mut self, log: Arc<dyn LogSink>) -> Self {
        self.log = log;
        self
    }

    /// Every runnable node in pre-order, after applying the filter
    pub fn collect(&self, model: &TestModel) -> ModelResult<Vec<Arc<TestNode>>> {
        // Fails on duplicate ids before anything runs
        model.tests()?;

        let mut leaves = Vec::new();
        let mut stack = vec![model.root_test()];
        while let Some(node) = stack.pop() {
            stack.extend(node.children.iter().rev().cloned());
            if node.is_test_case() && self.matches(&node) {
                leaves.push(node);
            }
        }

        Ok(leaves)
    }

    /// Run all selected tests, reporting them in pre-order
    pub fn run(&self, model: &TestModel) -> ModelResult<Vec<TestRun>> {
        let leaves = self.collect(model)?;
        tracing::debug!(tests = leaves.len(), parallel = self.parallel, "running tests");

        let runs: Vec<TestRun> = if self.parallel {
            leaves.par_iter().map(|node| self.run_single_test(node)).collect()
        } else {
            leaves.iter().map(|node| self.run_single_test(node)).collect()
        };

        Ok(runs)
    }

    fn matches(&self, node: &TestNode) -> bool {
        match &self.filter {
            Some(filter) => node.name.contains(filter.as_str()),
            None => true,
        }
    }

    /// Run a single test
    fn run_single_test(&self, node: &TestNode) -> TestRun {
        let start = Instant::now();
        let outcome = match &node.action {
            Some(action) => invoker::run(self.log.as_ref(), || action(), Some(&node.name)),
            None => TestOutcome::skipped(),
        };

        TestRun {
            id: node.id.clone(),
            name: node.name.clone(),
            outcome,
            duration: start.elapsed(),
        }
    }
}
