//! Batch orchestration over an ordered task list

use crate::executor::TransferExecutor;
use crate::report::FailureReport;
use crate::runner::TaskRunner;
use ferrobatch_types::{
    AgeWindowPolicy, Clock, NoopReporter, ProgressReporter, SystemClock, Task, TaskConcurrency,
    TaskResult,
};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Runs every task of a batch and collects one result per task
///
/// Tasks are isolated: whatever happens to one task, the next is still run.
/// With a concurrency of 1 tasks run strictly one after another; with more,
/// up to that many run at once and results are still reported in the order
/// the tasks were given.
pub struct BatchOrchestrator {
    runner: TaskRunner,
    clock: Arc<dyn Clock>,
    max_concurrent: TaskConcurrency,
    reporter: Arc<dyn ProgressReporter>,
}

impl std::fmt::Debug for BatchOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchOrchestrator")
            .field("runner", &self.runner)
            .field("max_concurrent", &self.max_concurrent)
            .finish_non_exhaustive()
    }
}

impl Default for BatchOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchOrchestrator {
    /// Create a sequential orchestrator on the system clock
    pub fn new() -> Self {
        OrchestratorBuilder::new().build()
    }

    /// Start building an orchestrator
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    /// Maximum number of tasks run at once
    pub fn max_concurrent(&self) -> TaskConcurrency {
        self.max_concurrent
    }

    /// Run all tasks and return the report
    pub async fn run_all(&self, tasks: &[Task]) -> FailureReport {
        let mut report = FailureReport::new(Uuid::new_v4(), self.clock.now());
        info!(
            "Starting run {} with {} task(s), up to {} at a time",
            report.run_id,
            tasks.len(),
            self.max_concurrent.get()
        );

        if self.max_concurrent.is_sequential() {
            for (index, task) in tasks.iter().enumerate() {
                let result = self.run_task(index, task).await;
                report.push(result);
            }
        } else {
            let results: Vec<TaskResult> = stream::iter(tasks.iter().enumerate())
                .map(|(index, task)| self.run_task(index, task))
                .buffered(self.max_concurrent.get())
                .collect()
                .await;
            for result in results {
                report.push(result);
            }
        }

        report.finish(self.clock.now());
        let summary = report.summary();
        if report.has_failures() {
            warn!("Run {} finished with failures: {}", report.run_id, summary);
        } else {
            info!("Run {} finished: {}", report.run_id, summary);
        }
        report
    }

    async fn run_task(&self, index: usize, task: &Task) -> TaskResult {
        self.reporter.task_started(index, task);
        let result = self.runner.run(task).await;
        self.reporter.task_finished(index, &result);
        result
    }
}

/// Builder for [`BatchOrchestrator`]
pub struct OrchestratorBuilder {
    clock: Arc<dyn Clock>,
    age_policy: AgeWindowPolicy,
    max_concurrent: TaskConcurrency,
    executor: TransferExecutor,
    reporter: Arc<dyn ProgressReporter>,
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OrchestratorBuilder {
    /// Create a builder with sequential execution on the system clock
    pub fn new() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            age_policy: AgeWindowPolicy::default(),
            max_concurrent: TaskConcurrency::SEQUENTIAL,
            executor: TransferExecutor::new(),
            reporter: Arc::new(NoopReporter),
        }
    }

    /// Set the clock
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Set the age window policy
    pub fn with_age_policy(mut self, age_policy: AgeWindowPolicy) -> Self {
        self.age_policy = age_policy;
        self
    }

    /// Set how many tasks may run at once
    pub fn with_max_concurrent(mut self, max_concurrent: TaskConcurrency) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }

    /// Set the transfer executor
    pub fn with_executor(mut self, executor: TransferExecutor) -> Self {
        self.executor = executor;
        self
    }

    /// Set the progress reporter
    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Build the orchestrator
    pub fn build(self) -> BatchOrchestrator {
        let runner = TaskRunner::new(self.clock.clone())
            .with_age_policy(self.age_policy)
            .with_executor(self.executor)
            .with_reporter(self.reporter.clone());

        BatchOrchestrator {
            runner,
            clock: self.clock,
            max_concurrent: self.max_concurrent,
            reporter: self.reporter,
        }
    }
}
